use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "quiz_dashboard.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端服务地址
    pub backend_url: String,
    /// 后端访问密钥
    pub backend_key: String,
    /// 存放上传 PDF 的存储桶
    pub books_bucket: String,
    /// 存放导出 CSV 的存储桶
    pub export_bucket: String,
    /// 本地兜底扫描时一次列出的最大对象数
    pub scan_page_size: usize,
    /// 扫描前是否自动检查并创建数据表
    pub bootstrap_schema_on_scan: bool,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            backend_key: String::new(),
            books_bucket: "books".to_string(),
            export_bucket: "questions-csv".to_string(),
            scan_page_size: 1000,
            bootstrap_schema_on_scan: true,
            request_timeout_secs: 60,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（如存在）→ 环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        base.with_env()
    }

    /// 从 TOML 文件读取配置
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::AppError::file_read_failed(path.display().to_string(), e))?;
        let config = toml::from_str(&content).map_err(|e| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(config)
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env(self) -> AppResult<Self> {
        Ok(Self {
            backend_url: std::env::var("BACKEND_URL").unwrap_or(self.backend_url),
            backend_key: std::env::var("BACKEND_KEY").unwrap_or(self.backend_key),
            books_bucket: std::env::var("BOOKS_BUCKET").unwrap_or(self.books_bucket),
            export_bucket: std::env::var("EXPORT_BUCKET").unwrap_or(self.export_bucket),
            scan_page_size: env_parse("SCAN_PAGE_SIZE", "usize")?.unwrap_or(self.scan_page_size),
            bootstrap_schema_on_scan: env_parse("BOOTSTRAP_SCHEMA_ON_SCAN", "bool")?
                .unwrap_or(self.bootstrap_schema_on_scan),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
        })
    }

    /// 在发起任何网络请求前检查必填项
    pub fn validate(&self) -> AppResult<()> {
        if self.backend_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "backend_url".to_string(),
            }
            .into());
        }
        if self.backend_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "backend_key".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => value.parse().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}
