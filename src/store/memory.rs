//! 内存后端
//!
//! 以内存数据模拟数据表、对象存储、RPC 与云函数，可按需注入故障，
//! 并记录调用日志供测试断言

use crate::error::{AppError, AppResult, DUPLICATE_KEY_CODE, RELATION_MISSING_CODE};
use crate::models::{Book, ListOptions, NewBook, ProcessingProgress, ProcessingStatus, Question, SortOrder, StoredObject};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::{
    BookStore, FunctionInvoker, ObjectStore, ProgressStore, QuestionStore, SchemaAdmin, BOOKS_TABLE,
    PROGRESS_TABLE, QUESTIONS_TABLE,
};

#[derive(Default)]
struct State {
    books: Vec<Book>,
    progress: Vec<ProcessingProgress>,
    questions: Vec<Question>,
    objects: HashMap<String, BTreeMap<String, Vec<u8>>>,
    missing_tables: HashSet<String>,
    placeholder_tables: HashSet<String>,
    failing_functions: HashSet<String>,
    rpc_disabled: bool,
    fail_book_reads: bool,
    fail_progress_reads: bool,
    fail_uploads: bool,
    next_seq: i64,
    calls: Vec<String>,
    invocations: Vec<(String, Value)>,
}

impl State {
    fn next_seq(&mut self) -> i64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn ensure_table(&self, table: &str) -> AppResult<()> {
        if self.missing_tables.contains(table) {
            return Err(AppError::bad_response(
                table,
                404,
                Some(RELATION_MISSING_CODE.to_string()),
                format!("relation \"public.{}\" does not exist", table),
            ));
        }
        Ok(())
    }
}

/// 内存后端，同时实现全部存储接口
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ========== 数据准备 ==========

    /// 登记一本书，返回生成的 id；越晚登记的越"新"
    pub fn add_book(
        &self,
        file_path: &str,
        grade: Option<&str>,
        subject: Option<&str>,
        semester: Option<&str>,
    ) -> String {
        let mut state = self.lock();
        let seq = state.next_seq();
        let id = seq.to_string();
        state.books.push(Book {
            id: id.clone(),
            file_path: file_path.to_string(),
            grade: grade.map(str::to_string),
            subject: subject.map(str::to_string),
            semester: semester.map(str::to_string),
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000 + seq, 0),
        });
        id
    }

    pub fn add_progress(&self, progress: ProcessingProgress) {
        self.lock().progress.push(progress);
    }

    pub fn add_question(&self, question: Question) {
        self.lock().questions.push(question);
    }

    pub fn add_object(&self, bucket: &str, name: &str, body: &[u8]) {
        self.lock()
            .objects
            .entry(bucket.to_string())
            .or_default()
            .insert(name.to_string(), body.to_vec());
    }

    // ========== 故障注入 ==========

    pub fn drop_table(&self, table: &str) {
        self.lock().missing_tables.insert(table.to_string());
    }

    pub fn disable_rpc(&self) {
        self.lock().rpc_disabled = true;
    }

    pub fn fail_function(&self, name: &str) {
        self.lock().failing_functions.insert(name.to_string());
    }

    pub fn fail_book_reads(&self) {
        self.lock().fail_book_reads = true;
    }

    pub fn fail_progress_reads(&self) {
        self.lock().fail_progress_reads = true;
    }

    pub fn fail_uploads(&self) {
        self.lock().fail_uploads = true;
    }

    // ========== 状态查看 ==========

    pub fn books(&self) -> Vec<Book> {
        self.lock().books.clone()
    }

    pub fn progress(&self) -> Vec<ProcessingProgress> {
        self.lock().progress.clone()
    }

    pub fn object(&self, bucket: &str, name: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(bucket)
            .and_then(|objects| objects.get(name).cloned())
    }

    pub fn has_table(&self, table: &str) -> bool {
        !self.lock().missing_tables.contains(table)
    }

    /// 是否曾以占位行方式建表
    pub fn used_placeholder(&self, table: &str) -> bool {
        self.lock().placeholder_tables.contains(table)
    }

    /// 调用日志，形如 `"questions_for_book 3"`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// 云函数调用记录
    pub fn invocations(&self) -> Vec<(String, Value)> {
        self.lock().invocations.clone()
    }
}

#[async_trait]
impl BookStore for MemoryBackend {
    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let mut state = self.lock();
        state.calls.push("list_books".to_string());
        state.ensure_table(BOOKS_TABLE)?;
        if state.fail_book_reads {
            return Err(AppError::bad_response(BOOKS_TABLE, 500, None, "injected failure"));
        }

        let mut books = state.books.clone();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(books)
    }

    async fn list_file_paths(&self) -> AppResult<Vec<String>> {
        let mut state = self.lock();
        state.calls.push("list_file_paths".to_string());
        state.ensure_table(BOOKS_TABLE)?;

        Ok(state
            .books
            .iter()
            .map(|b| b.file_path.clone())
            .collect())
    }

    async fn get_book(&self, id: &str) -> AppResult<Option<Book>> {
        let mut state = self.lock();
        state.calls.push(format!("get_book {}", id));
        state.ensure_table(BOOKS_TABLE)?;

        Ok(state.books.iter().find(|b| b.id == id).cloned())
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<()> {
        let mut state = self.lock();
        state.calls.push(format!("insert_book {}", book.file_path));
        state.ensure_table(BOOKS_TABLE)?;

        let seq = state.next_seq();
        state.books.push(Book {
            id: seq.to_string(),
            file_path: book.file_path.clone(),
            grade: book.grade.clone(),
            subject: book.subject.clone(),
            semester: book.semester.clone(),
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000 + seq, 0),
        });
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for MemoryBackend {
    async fn list_progress(&self) -> AppResult<Vec<ProcessingProgress>> {
        let mut state = self.lock();
        state.calls.push("list_progress".to_string());
        state.ensure_table(PROGRESS_TABLE)?;
        if state.fail_progress_reads {
            return Err(AppError::bad_response(PROGRESS_TABLE, 500, None, "injected failure"));
        }
        Ok(state.progress.clone())
    }

    async fn set_status(&self, file_path: &str, status: ProcessingStatus) -> AppResult<()> {
        let mut state = self.lock();
        state.calls.push(format!("set_status {} {}", file_path, status));
        state.ensure_table(PROGRESS_TABLE)?;

        for row in state.progress.iter_mut().filter(|p| p.file_path == file_path) {
            row.status = Some(status);
        }
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for MemoryBackend {
    async fn questions_for_book(&self, book_id: &str) -> AppResult<Vec<Question>> {
        let mut state = self.lock();
        state.calls.push(format!("questions_for_book {}", book_id));
        state.ensure_table(QUESTIONS_TABLE)?;

        let mut questions: Vec<Question> = state
            .questions
            .iter()
            .filter(|q| q.book_id == book_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.question_number);
        Ok(questions)
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: Vec<u8>,
        _content_type: &str,
        upsert: bool,
    ) -> AppResult<()> {
        let mut state = self.lock();
        state.calls.push(format!("upload {}/{}", bucket, path));
        if state.fail_uploads {
            return Err(AppError::bad_response("storage/upload", 500, None, "injected failure"));
        }

        let objects = state.objects.entry(bucket.to_string()).or_default();
        if !upsert && objects.contains_key(path) {
            return Err(AppError::bad_response(
                "storage/upload",
                409,
                None,
                "The resource already exists",
            ));
        }
        objects.insert(path.to_string(), body);
        Ok(())
    }

    async fn list(&self, bucket: &str, options: &ListOptions) -> AppResult<Vec<StoredObject>> {
        let mut state = self.lock();
        state.calls.push(format!("list {}", bucket));

        let mut names: Vec<String> = state
            .objects
            .get(bucket)
            .map(|objects| {
                objects
                    .keys()
                    .filter(|name| name.starts_with(&options.prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if options.sort_order == SortOrder::Desc {
            names.reverse();
        }

        Ok(names
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .map(StoredObject::named)
            .collect())
    }
}

#[async_trait]
impl FunctionInvoker for MemoryBackend {
    async fn invoke(&self, name: &str, payload: &Value) -> AppResult<Value> {
        let mut state = self.lock();
        state.calls.push(format!("invoke {}", name));
        state.invocations.push((name.to_string(), payload.clone()));

        if state.failing_functions.contains(name) {
            return Err(AppError::bad_response(
                format!("function {}", name),
                500,
                None,
                "function failed",
            ));
        }
        Ok(json!({ "success": true }))
    }
}

#[async_trait]
impl SchemaAdmin for MemoryBackend {
    async fn probe_table(&self, table: &str) -> AppResult<()> {
        let mut state = self.lock();
        state.calls.push(format!("probe {}", table));
        state.ensure_table(table)
    }

    async fn call_rpc(&self, name: &str, _args: &Value) -> AppResult<Value> {
        let mut state = self.lock();
        state.calls.push(format!("rpc {}", name));
        if state.rpc_disabled {
            return Err(AppError::bad_response(
                format!("rpc {}", name),
                404,
                Some("PGRST202".to_string()),
                "Could not find the function",
            ));
        }

        let table = name
            .strip_prefix("create_")
            .and_then(|rest| rest.strip_suffix("_table"))
            .unwrap_or(name)
            .to_string();
        state.missing_tables.remove(&table);
        Ok(Value::Null)
    }

    async fn insert_placeholder(&self, table: &str, _row: &Value) -> AppResult<()> {
        let mut state = self.lock();
        state.calls.push(format!("placeholder {}", table));

        if state.placeholder_tables.contains(table) {
            return Err(AppError::bad_response(
                table,
                409,
                Some(DUPLICATE_KEY_CODE.to_string()),
                "duplicate key value violates unique constraint",
            ));
        }
        // 写入即建表
        state.missing_tables.remove(table);
        state.placeholder_tables.insert(table.to_string());
        Ok(())
    }
}
