use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient;

/// 书籍元数据（books_metadata 表的一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    /// 存储中的对象路径，也是与进度表关联的键
    pub file_path: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub grade: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub semester: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Book {
    /// 年级，缺省为 "0"
    pub fn grade_or_default(&self) -> &str {
        self.grade.as_deref().unwrap_or("0")
    }

    /// 科目，缺省为 "Unknown"
    pub fn subject_or_default(&self) -> &str {
        self.subject.as_deref().unwrap_or("Unknown")
    }

    /// 学期，缺省为 "00"
    pub fn semester_or_default(&self) -> &str {
        self.semester.as_deref().unwrap_or("00")
    }
}

/// 扫描发现新文件时插入的行，年级/科目/学期留空
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBook {
    pub file_path: String,
    pub grade: Option<String>,
    pub subject: Option<String>,
    pub semester: Option<String>,
}

impl NewBook {
    pub fn from_path(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            grade: None,
            subject: None,
            semester: None,
        }
    }
}

/// 处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    NotStarted,
    Processing,
    Completed,
}

impl ProcessingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingStatus::NotStarted => "not_started",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 处理进度（processing_progress 表的一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingProgress {
    pub file_path: String,
    #[serde(default)]
    pub status: Option<ProcessingStatus>,
    #[serde(default)]
    pub last_processed_page: Option<i64>,
    #[serde(default)]
    pub questions_generated: Option<i64>,
}

impl ProcessingProgress {
    pub fn new(file_path: impl Into<String>, status: ProcessingStatus) -> Self {
        Self {
            file_path: file_path.into(),
            status: Some(status),
            last_processed_page: None,
            questions_generated: None,
        }
    }
}

/// 书籍 + 进度的组合视图，每次查询时重新构建
#[derive(Debug, Clone, PartialEq)]
pub struct BookWithProgress {
    pub book: Book,
    pub progress: Option<ProcessingProgress>,
}

impl BookWithProgress {
    /// 进度状态；没有进度记录或状态为空时返回 None
    pub fn status(&self) -> Option<ProcessingStatus> {
        self.progress.as_ref().and_then(|p| p.status)
    }
}

/// 按文件路径把进度挂到书籍上
///
/// 没有匹配进度的书籍 progress 为 None
pub fn attach_progress(
    books: Vec<Book>,
    progress: &[ProcessingProgress],
) -> Vec<BookWithProgress> {
    books
        .into_iter()
        .map(|book| {
            let matched = progress
                .iter()
                .find(|p| p.file_path == book.file_path)
                .cloned();
            BookWithProgress {
                book,
                progress: matched,
            }
        })
        .collect()
}
