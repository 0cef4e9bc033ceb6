use thiserror::Error;

/// 后端返回的"表不存在"错误码
pub const RELATION_MISSING_CODE: &str = "42P01";
/// 后端返回的"主键重复"错误码
pub const DUPLICATE_KEY_CODE: &str = "23505";

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 后端调用错误
    #[error("后端错误: {0}")]
    Backend(#[from] BackendError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 业务逻辑错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 后端调用错误
#[derive(Debug, Error)]
pub enum BackendError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 后端返回错误响应
    #[error("后端返回错误 ({endpoint}): status={status}, code={code:?}, message={message}")]
    BadResponse {
        endpoint: String,
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少必填项
    #[error("缺少配置项 {key}")]
    Missing { key: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 路径中没有文件名
    #[error("无法从路径中取得文件名: {path}")]
    NoFileName { path: String },
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 书籍不存在
    #[error("书籍不存在: {book_id}")]
    BookNotFound { book_id: String },
    /// 文件名为空
    #[error("文件名不能为空")]
    EmptyFileName,
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Backend(BackendError::JsonParseFailed {
            endpoint: String::new(),
            source: err,
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建请求失败错误
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Backend(BackendError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建后端错误响应
    pub fn bad_response(
        endpoint: impl Into<String>,
        status: u16,
        code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        AppError::Backend(BackendError::BadResponse {
            endpoint: endpoint.into(),
            status,
            code,
            message: message.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 后端返回的错误码（如 42P01）
    pub fn backend_code(&self) -> Option<&str> {
        match self {
            AppError::Backend(BackendError::BadResponse { code, .. }) => code.as_deref(),
            _ => None,
        }
    }

    /// 是否为"表不存在"
    pub fn is_relation_missing(&self) -> bool {
        self.backend_code() == Some(RELATION_MISSING_CODE)
    }

    /// 是否为"主键重复"
    pub fn is_duplicate_key(&self) -> bool {
        self.backend_code() == Some(DUPLICATE_KEY_CODE)
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
