//! 存储接口层
//!
//! 把后端的数据表、对象存储、RPC 与云函数抽象为几个窄接口：
//! - `remote` - 基于 `BackendClient` 的真实实现
//! - `memory` - 内存实现，用于测试
//!
//! 服务层只依赖这些 trait，不关心请求如何发出

pub mod memory;
pub mod remote;

use crate::error::AppResult;
use crate::models::{Book, ListOptions, NewBook, ProcessingProgress, ProcessingStatus, Question, StoredObject};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub use memory::MemoryBackend;
pub use remote::RemoteBackend;

/// 书籍元数据表
pub const BOOKS_TABLE: &str = "books_metadata";
/// 处理进度表
pub const PROGRESS_TABLE: &str = "processing_progress";
/// 题目表
pub const QUESTIONS_TABLE: &str = "questions";
/// 需要存在的全部数据表
pub const REQUIRED_TABLES: [&str; 3] = [BOOKS_TABLE, PROGRESS_TABLE, QUESTIONS_TABLE];

/// 元数据抽取云函数
pub const EXTRACT_METADATA_FN: &str = "extract-metadata";
/// 题目生成云函数
pub const GENERATE_QUESTIONS_FN: &str = "generate-questions";
/// 远程扫描云函数
pub const BASIC_SCAN_FN: &str = "basic-scan";

#[async_trait]
pub trait BookStore: Send + Sync {
    /// 全部书籍，按创建时间倒序
    async fn list_books(&self) -> AppResult<Vec<Book>>;
    /// 全部已登记的文件路径
    async fn list_file_paths(&self) -> AppResult<Vec<String>>;
    async fn get_book(&self, id: &str) -> AppResult<Option<Book>>;
    async fn insert_book(&self, book: &NewBook) -> AppResult<()>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn list_progress(&self) -> AppResult<Vec<ProcessingProgress>>;
    /// 设置匹配路径的进度状态；没有匹配行时也视为成功
    async fn set_status(&self, file_path: &str, status: ProcessingStatus) -> AppResult<()>;
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// 某本书的全部题目，按题号升序
    async fn questions_for_book(&self, book_id: &str) -> AppResult<Vec<Question>>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> AppResult<()>;
    async fn list(&self, bucket: &str, options: &ListOptions) -> AppResult<Vec<StoredObject>>;
}

#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke(&self, name: &str, payload: &Value) -> AppResult<Value>;
}

/// 表结构引导所需的底层能力
#[async_trait]
pub trait SchemaAdmin: Send + Sync {
    /// 查询 1 行以探测表是否存在
    async fn probe_table(&self, table: &str) -> AppResult<()>;
    async fn call_rpc(&self, name: &str, args: &Value) -> AppResult<Value>;
    async fn insert_placeholder(&self, table: &str, row: &Value) -> AppResult<()>;
}

/// 服务层持有的全部存储接口
#[derive(Clone)]
pub struct Stores {
    pub books: Arc<dyn BookStore>,
    pub progress: Arc<dyn ProgressStore>,
    pub questions: Arc<dyn QuestionStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub functions: Arc<dyn FunctionInvoker>,
    pub schema: Arc<dyn SchemaAdmin>,
}

impl Stores {
    /// 由一个同时实现全部接口的后端构建
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: BookStore + ProgressStore + QuestionStore + ObjectStore + FunctionInvoker + SchemaAdmin + 'static,
    {
        Self {
            books: backend.clone(),
            progress: backend.clone(),
            questions: backend.clone(),
            objects: backend.clone(),
            functions: backend.clone(),
            schema: backend,
        }
    }
}
