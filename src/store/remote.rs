//! 基于 HTTP 后端的存储实现

use crate::clients::{BackendClient, TableQuery};
use crate::error::AppResult;
use crate::models::{Book, ListOptions, NewBook, ProcessingProgress, ProcessingStatus, Question, StoredObject};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    BookStore, FunctionInvoker, ObjectStore, ProgressStore, QuestionStore, SchemaAdmin, BOOKS_TABLE,
    PROGRESS_TABLE, QUESTIONS_TABLE,
};

/// 远程后端
pub struct RemoteBackend {
    client: BackendClient,
}

impl RemoteBackend {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct FilePathRow {
    file_path: String,
}

#[async_trait]
impl BookStore for RemoteBackend {
    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let query = TableQuery::select("*").order("created_at", false);
        self.client.select(BOOKS_TABLE, &query).await
    }

    async fn list_file_paths(&self) -> AppResult<Vec<String>> {
        let query = TableQuery::select("file_path");
        let rows: Vec<FilePathRow> = self.client.select(BOOKS_TABLE, &query).await?;
        Ok(rows.into_iter().map(|r| r.file_path).collect())
    }

    async fn get_book(&self, id: &str) -> AppResult<Option<Book>> {
        let query = TableQuery::select("*").eq("id", id).limit(1);
        let rows: Vec<Book> = self.client.select(BOOKS_TABLE, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<()> {
        self.client.insert(BOOKS_TABLE, &serde_json::to_value(book)?).await
    }
}

#[async_trait]
impl ProgressStore for RemoteBackend {
    async fn list_progress(&self) -> AppResult<Vec<ProcessingProgress>> {
        self.client
            .select(PROGRESS_TABLE, &TableQuery::select("*"))
            .await
    }

    async fn set_status(&self, file_path: &str, status: ProcessingStatus) -> AppResult<()> {
        let filter = TableQuery::filter().eq("file_path", file_path);
        self.client
            .update(PROGRESS_TABLE, &filter, &json!({ "status": status }))
            .await
    }
}

#[async_trait]
impl QuestionStore for RemoteBackend {
    async fn questions_for_book(&self, book_id: &str) -> AppResult<Vec<Question>> {
        let query = TableQuery::select("*")
            .eq("book_id", book_id)
            .order("question_number", true);
        self.client.select(QUESTIONS_TABLE, &query).await
    }
}

#[async_trait]
impl ObjectStore for RemoteBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> AppResult<()> {
        self.client
            .upload_object(bucket, path, body, content_type, upsert)
            .await
    }

    async fn list(&self, bucket: &str, options: &ListOptions) -> AppResult<Vec<StoredObject>> {
        self.client.list_objects(bucket, options).await
    }
}

#[async_trait]
impl FunctionInvoker for RemoteBackend {
    async fn invoke(&self, name: &str, payload: &Value) -> AppResult<Value> {
        self.client.invoke_function(name, payload).await
    }
}

#[async_trait]
impl SchemaAdmin for RemoteBackend {
    async fn probe_table(&self, table: &str) -> AppResult<()> {
        let _: Vec<Value> = self
            .client
            .select(table, &TableQuery::select("*").limit(1))
            .await?;
        Ok(())
    }

    async fn call_rpc(&self, name: &str, args: &Value) -> AppResult<Value> {
        self.client.rpc(name, args).await
    }

    async fn insert_placeholder(&self, table: &str, row: &Value) -> AppResult<()> {
        self.client.insert(table, row).await
    }
}
