use super::state::{DashboardState, Toast, ToastKind};
use crate::models::BookWithProgress;
use crate::utils::truncate_text;

const PATH_WIDTH: usize = 40;

/// 渲染仪表盘文本
pub fn render_dashboard(state: &DashboardState, toasts: &[Toast]) -> String {
    let mut out = Vec::new();
    let c = &state.counts;

    out.push("=".repeat(60));
    out.push(format!(
        "📚 书籍总数: {}  ✅ 已完成: {}  ⏳ 处理中: {}  🕒 待处理: {}",
        c.total, c.processed, c.in_progress, c.pending
    ));
    out.push("=".repeat(60));

    if state.loading {
        out.push("加载中...".to_string());
    } else if state.books.is_empty() {
        out.push("暂无书籍，请上传 PDF 或执行扫描".to_string());
    } else {
        out.push(format!(
            "{:<40}  {:<18}  {:<12}  {:>5}  {:>5}",
            "文件", "年级/科目/学期", "状态", "页", "题数"
        ));
        for entry in &state.books {
            out.push(render_row(entry));
        }
    }

    if state.scanning {
        out.push("🔍 正在扫描...".to_string());
    }

    for toast in toasts {
        let icon = match toast.kind {
            ToastKind::Success => "✓",
            ToastKind::Error => "❌",
        };
        out.push(format!("{} {}: {}", icon, toast.title, toast.description));
    }

    out.join("\n")
}

fn render_row(entry: &BookWithProgress) -> String {
    let book = &entry.book;
    let meta = format!(
        "{}/{}/{}",
        book.grade.as_deref().unwrap_or("-"),
        book.subject.as_deref().unwrap_or("-"),
        book.semester.as_deref().unwrap_or("-")
    );
    let status = match &entry.progress {
        None => "无进度".to_string(),
        Some(p) => p
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "未知".to_string()),
    };
    let page = entry
        .progress
        .as_ref()
        .and_then(|p| p.last_processed_page)
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    let generated = entry
        .progress
        .as_ref()
        .and_then(|p| p.questions_generated)
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<40}  {:<18}  {:<12}  {:>5}  {:>5}",
        truncate_text(&book.file_path, PATH_WIDTH - 3),
        meta,
        status,
        page,
        generated
    )
}
