//! 书籍服务 - 业务能力层
//!
//! 把界面上的操作翻译成后端调用。对外的每个方法都不返回错误：
//! 失败时记录日志，并返回 `None` / `false` / 空列表

use crate::config::Config;
use crate::error::{AppError, AppResult, BusinessError, FileError};
use crate::models::{attach_progress, BookWithProgress, ListOptions, NewBook, ProcessingStatus};
use crate::services::csv_export::{export_file_name, render_questions_csv};
use crate::services::scanner::find_new_books;
use crate::services::schema::SchemaBootstrap;
use crate::store::{Stores, BASIC_SCAN_FN, EXTRACT_METADATA_FN, GENERATE_QUESTIONS_FN};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// 书籍服务
///
/// 职责：
/// - 上传、列出、扫描书籍
/// - 触发元数据抽取与题目生成
/// - 取消处理、导出题目
/// - 不持有状态，每次调用相互独立
#[derive(Clone)]
pub struct BookService {
    stores: Stores,
    books_bucket: String,
    export_bucket: String,
    scan_page_size: usize,
    bootstrap_schema_on_scan: bool,
}

impl BookService {
    /// 创建新的书籍服务
    pub fn new(stores: Stores, config: &Config) -> Self {
        Self {
            stores,
            books_bucket: config.books_bucket.clone(),
            export_bucket: config.export_bucket.clone(),
            scan_page_size: config.scan_page_size,
            bootstrap_schema_on_scan: config.bootstrap_schema_on_scan,
        }
    }

    /// 上传 PDF
    ///
    /// # 参数
    /// - `file_name`: 原始文件名
    /// - `body`: 文件内容
    ///
    /// # 返回
    /// 成功时返回 `<毫秒时间戳>_<原始文件名>` 形式的存储路径
    pub async fn upload(&self, file_name: &str, body: Vec<u8>) -> Option<String> {
        match self.try_upload(file_name, body).await {
            Ok(path) => {
                info!("✓ 上传成功: {}", path);
                Some(path)
            }
            Err(e) => {
                error!("❌ 上传 {} 失败: {}", file_name, e);
                None
            }
        }
    }

    async fn try_upload(&self, file_name: &str, body: Vec<u8>) -> AppResult<String> {
        if file_name.is_empty() {
            return Err(BusinessError::EmptyFileName.into());
        }
        let path = storage_path(chrono::Utc::now().timestamp_millis(), file_name);
        self.stores
            .objects
            .upload(&self.books_bucket, &path, body, "application/pdf", false)
            .await?;
        Ok(path)
    }

    /// 读取本地文件并上传
    pub async fn upload_file(&self, local_path: &Path) -> Option<String> {
        let file_name = match local_path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                let err = FileError::NoFileName {
                    path: local_path.display().to_string(),
                };
                error!("❌ {}", err);
                return None;
            }
        };

        match tokio::fs::read(local_path).await {
            Ok(body) => self.upload(&file_name, body).await,
            Err(e) => {
                error!(
                    "❌ {}",
                    AppError::file_read_failed(local_path.display().to_string(), e)
                );
                None
            }
        }
    }

    /// 列出全部书籍及其进度（新书在前）
    ///
    /// 进度查询失败时仍返回书籍，只是不带进度
    pub async fn list_books_with_progress(&self) -> Vec<BookWithProgress> {
        let books = match self.stores.books.list_books().await {
            Ok(books) => books,
            Err(e) => {
                error!("❌ 获取书籍列表失败: {}", e);
                return Vec::new();
            }
        };

        let progress = match self.stores.progress.list_progress().await {
            Ok(progress) => progress,
            Err(e) => {
                warn!("⚠️ 获取处理进度失败，仅返回书籍: {}", e);
                Vec::new()
            }
        };

        debug!("书籍 {} 本，进度记录 {} 条", books.len(), progress.len());
        attach_progress(books, &progress)
    }

    /// 触发元数据抽取
    pub async fn extract_metadata(&self, file_path: &str) -> bool {
        self.trigger(EXTRACT_METADATA_FN, file_path).await
    }

    /// 触发题目生成
    pub async fn start_question_generation(&self, file_path: &str) -> bool {
        self.trigger(GENERATE_QUESTIONS_FN, file_path).await
    }

    async fn trigger(&self, function: &str, file_path: &str) -> bool {
        let payload = json!({ "filePath": file_path });
        match self.stores.functions.invoke(function, &payload).await {
            Ok(response) => {
                debug!("{} 返回: {}", function, response);
                info!("✓ 已触发 {}: {}", function, file_path);
                true
            }
            Err(e) => {
                error!("❌ 触发 {} 失败 ({}): {}", function, file_path, e);
                false
            }
        }
    }

    /// 取消处理：把进度状态重置为 not_started
    ///
    /// 幂等，重复调用同样成功
    pub async fn cancel_processing(&self, file_path: &str) -> bool {
        match self
            .stores
            .progress
            .set_status(file_path, ProcessingStatus::NotStarted)
            .await
        {
            Ok(()) => {
                info!("✓ 已取消处理: {}", file_path);
                true
            }
            Err(e) => {
                error!("❌ 取消处理失败 ({}): {}", file_path, e);
                false
            }
        }
    }

    /// 扫描新书
    ///
    /// 先尝试远程扫描函数，失败时在本地对比存储桶与元数据表
    pub async fn scan_for_new_books(&self) -> bool {
        if self.bootstrap_schema_on_scan {
            self.ensure_tables_exist().await;
        }

        info!("🔍 调用远程扫描...");
        match self.stores.functions.invoke(BASIC_SCAN_FN, &json!({})).await {
            Ok(response) => {
                info!("✓ 远程扫描完成: {}", response);
                return true;
            }
            Err(e) => {
                warn!("⚠️ 远程扫描失败: {}，改用本地扫描", e);
            }
        }

        match self.client_side_scan().await {
            Ok(added) => {
                info!("✓ 本地扫描完成，新增 {} 本书", added);
                true
            }
            Err(e) => {
                error!("❌ 本地扫描失败: {}", e);
                false
            }
        }
    }

    /// 本地兜底扫描，返回新增的书籍数量
    ///
    /// 分页大小只限制存储列举，已登记路径总是全量读取
    pub async fn client_side_scan(&self) -> AppResult<usize> {
        let objects = self
            .stores
            .objects
            .list(&self.books_bucket, &ListOptions::first_page(self.scan_page_size))
            .await?;
        let known = self.stores.books.list_file_paths().await?;

        let new_paths = find_new_books(&objects, &known);
        debug!(
            "存储对象 {} 个，已登记 {} 个，待新增 {} 个",
            objects.len(),
            known.len(),
            new_paths.len()
        );

        for path in &new_paths {
            self.stores.books.insert_book(&NewBook::from_path(path)).await?;
            info!("📗 新增书籍: {}", path);
        }

        Ok(new_paths.len())
    }

    /// 确认所需数据表存在
    pub async fn ensure_tables_exist(&self) {
        SchemaBootstrap::new(self.stores.schema.clone())
            .ensure_tables_exist()
            .await;
    }

    /// 导出某本书的题目为 CSV 并上传到导出存储桶
    ///
    /// # 返回
    /// 成功时返回生成的文件名；书籍不存在时返回 None，且不会查询题目
    pub async fn export_questions_csv(&self, book_id: &str) -> Option<String> {
        match self.try_export(book_id).await {
            Ok((file_name, _)) => Some(file_name),
            Err(e) => {
                error!("❌ 导出题目失败 (书籍 {}): {}", book_id, e);
                None
            }
        }
    }

    /// 导出并同时写入本地目录，返回本地文件路径
    pub async fn export_questions_csv_to(&self, book_id: &str, dir: &Path) -> Option<PathBuf> {
        let (file_name, csv) = match self.try_export(book_id).await {
            Ok(result) => result,
            Err(e) => {
                error!("❌ 导出题目失败 (书籍 {}): {}", book_id, e);
                return None;
            }
        };

        let local_path = dir.join(&file_name);
        match tokio::fs::write(&local_path, csv).await {
            Ok(()) => {
                info!("💾 已保存到本地: {}", local_path.display());
                Some(local_path)
            }
            Err(e) => {
                error!(
                    "❌ {}",
                    AppError::file_write_failed(local_path.display().to_string(), e)
                );
                None
            }
        }
    }

    async fn try_export(&self, book_id: &str) -> AppResult<(String, String)> {
        let book = self
            .stores
            .books
            .get_book(book_id)
            .await?
            .ok_or_else(|| BusinessError::BookNotFound {
                book_id: book_id.to_string(),
            })?;

        let questions = self.stores.questions.questions_for_book(&book.id).await?;
        let csv = render_questions_csv(&questions);
        let file_name = export_file_name(&book);

        self.stores
            .objects
            .upload(
                &self.export_bucket,
                &file_name,
                csv.clone().into_bytes(),
                "text/csv",
                true,
            )
            .await?;

        info!(
            "✓ 已导出 {} 道题目到 {}/{}",
            questions.len(),
            self.export_bucket,
            file_name
        );
        Ok((file_name, csv))
    }
}

/// 存储路径：`<毫秒时间戳>_<原始文件名>`
pub fn storage_path(timestamp_millis: i64, file_name: &str) -> String {
    format!("{}_{}", timestamp_millis, file_name)
}
