/// 后端 API 客户端
///
/// 封装对象存储、数据表、RPC 与云函数四类 HTTP 调用
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{ListOptions, StoredObject};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// 数据表查询条件
#[derive(Debug, Clone, Default)]
pub struct TableQuery {
    params: Vec<(String, String)>,
}

impl TableQuery {
    /// 选择列，如 `*` 或 `file_path`
    pub fn select(columns: &str) -> Self {
        Self {
            params: vec![("select".to_string(), columns.to_string())],
        }
    }

    /// 仅用于 update：没有 select 的空条件
    pub fn filter() -> Self {
        Self::default()
    }

    /// 等值过滤
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.params
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// 排序
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    /// 限制返回行数
    pub fn limit(mut self, n: usize) -> Self {
        self.params.push(("limit".to_string(), n.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// 后端 API 客户端
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BackendClient {
    /// 创建新的后端客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::request_failed("client", e))?;

        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            api_key: config.backend_key.clone(),
        })
    }

    // ========== 对象存储 ==========

    /// 上传对象
    ///
    /// # 参数
    /// - `bucket`: 存储桶
    /// - `path`: 对象路径
    /// - `body`: 文件内容
    /// - `content_type`: MIME 类型
    /// - `upsert`: 是否覆盖已存在的对象
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> AppResult<()> {
        let mut segments = vec!["storage", "v1", "object", bucket];
        segments.extend(path.split('/'));
        let url = self.url(&segments)?;

        debug!("上传对象 {}/{} ({} 字节)", bucket, path, body.len());

        let request = self
            .request(Method::POST, url)
            .header("content-type", content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(body);

        self.send("storage/upload", request).await?;
        Ok(())
    }

    /// 列出存储桶中的对象
    pub async fn list_objects(
        &self,
        bucket: &str,
        options: &ListOptions,
    ) -> AppResult<Vec<StoredObject>> {
        let url = self.url(&["storage", "v1", "object", "list", bucket])?;
        let body = json!({
            "prefix": options.prefix,
            "limit": options.limit,
            "offset": options.offset,
            "sortBy": {
                "column": options.sort_column,
                "order": options.sort_order,
            }
        });

        let request = self.request(Method::POST, url).json(&body);
        let text = self.send("storage/list", request).await?;
        parse_json("storage/list", &text)
    }

    // ========== 数据表 ==========

    /// 查询数据表
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> AppResult<Vec<T>> {
        let url = self.url(&["rest", "v1", table])?;
        let request = self.request(Method::GET, url).query(query.params());

        let endpoint = format!("select {}", table);
        let text = self.send(&endpoint, request).await?;
        parse_json(&endpoint, &text)
    }

    /// 插入一行或多行
    pub async fn insert(&self, table: &str, rows: &Value) -> AppResult<()> {
        let url = self.url(&["rest", "v1", table])?;
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(rows);

        self.send(&format!("insert {}", table), request).await?;
        Ok(())
    }

    /// 按条件更新
    pub async fn update(&self, table: &str, filter: &TableQuery, changes: &Value) -> AppResult<()> {
        let url = self.url(&["rest", "v1", table])?;
        let request = self
            .request(Method::PATCH, url)
            .query(filter.params())
            .header("Prefer", "return=minimal")
            .json(changes);

        self.send(&format!("update {}", table), request).await?;
        Ok(())
    }

    // ========== RPC 与云函数 ==========

    /// 调用远程存储过程
    pub async fn rpc(&self, name: &str, args: &Value) -> AppResult<Value> {
        let url = self.url(&["rest", "v1", "rpc", name])?;
        let request = self.request(Method::POST, url).json(args);

        let text = self.send(&format!("rpc {}", name), request).await?;
        Ok(parse_loose(&text))
    }

    /// 调用云函数
    pub async fn invoke_function(&self, name: &str, payload: &Value) -> AppResult<Value> {
        let url = self.url(&["functions", "v1", name])?;
        let request = self.request(Method::POST, url).json(payload);

        debug!("调用云函数 {} Payload: {}", name, payload);

        let text = self.send(&format!("function {}", name), request).await?;
        Ok(parse_loose(&text))
    }

    // ========== 辅助函数 ==========

    fn url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Other(format!("无效的后端地址 {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Other(format!("后端地址不能作为基础路径: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// 发送请求；非 2xx 响应转换为带错误码的 BadResponse
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> AppResult<String> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::request_failed(endpoint, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::request_failed(endpoint, e))?;

        if status.is_success() {
            return Ok(text);
        }

        let body = parse_loose(&text);
        let code = extract_error_code(&body);
        let message = extract_error_message(&body).unwrap_or_else(|| text.clone());

        Err(AppError::bad_response(endpoint, status.as_u16(), code, message))
    }
}

fn parse_json<T: DeserializeOwned>(endpoint: &str, text: &str) -> AppResult<T> {
    serde_json::from_str(text).map_err(|e| {
        AppError::Backend(crate::error::BackendError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source: e,
        })
    })
}

/// 空响应为 Null，非 JSON 响应保留为字符串
fn parse_loose(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// 提取错误码（数据表错误的 `code` 字段）
pub fn extract_error_code(body: &Value) -> Option<String> {
    match body.get("code") {
        Some(Value::String(code)) => Some(code.clone()),
        Some(Value::Number(code)) => Some(code.to_string()),
        _ => None,
    }
}

fn extract_error_message(body: &Value) -> Option<String> {
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| body.get(key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_query_params() {
        let query = TableQuery::select("*")
            .eq("file_path", "1_a.pdf")
            .order("created_at", false)
            .limit(1);

        let params: Vec<(&str, &str)> = query
            .params()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("select", "*"),
                ("file_path", "eq.1_a.pdf"),
                ("order", "created_at.desc"),
                ("limit", "1"),
            ]
        );
    }

    #[test]
    fn test_extract_error_code() {
        let body = json!({ "code": "42P01", "message": "relation \"public.questions\" does not exist" });
        assert_eq!(extract_error_code(&body).as_deref(), Some("42P01"));
        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some("relation \"public.questions\" does not exist")
        );

        let storage_body = json!({ "statusCode": "409", "error": "Duplicate" });
        assert_eq!(extract_error_code(&storage_body), None);
        assert_eq!(extract_error_message(&storage_body).as_deref(), Some("Duplicate"));
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!(parse_loose(""), Value::Null);
        assert_eq!(parse_loose("{\"ok\":true}"), json!({ "ok": true }));
        assert_eq!(parse_loose("done"), Value::String("done".into()));
    }
}
