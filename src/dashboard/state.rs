use crate::models::{BookWithProgress, ProcessingStatus};

/// 仪表盘统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub total: usize,
    /// 状态为 completed
    pub processed: usize,
    /// 状态为 processing
    pub in_progress: usize,
    /// 其余：not_started、状态为空、没有进度记录
    pub pending: usize,
}

impl DashboardCounts {
    pub fn derive(books: &[BookWithProgress]) -> Self {
        let total = books.len();
        let processed = count_status(books, ProcessingStatus::Completed);
        let in_progress = count_status(books, ProcessingStatus::Processing);

        Self {
            total,
            processed,
            in_progress,
            pending: total - processed - in_progress,
        }
    }
}

fn count_status(books: &[BookWithProgress], status: ProcessingStatus) -> usize {
    books.iter().filter(|b| b.status() == Some(status)).count()
}

/// 提示消息类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// 短暂显示的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub description: String,
}

impl Toast {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// 界面本地状态
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub books: Vec<BookWithProgress>,
    pub loading: bool,
    pub scanning: bool,
    pub counts: DashboardCounts,
}
