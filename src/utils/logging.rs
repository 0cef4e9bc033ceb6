/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use crate::config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// `RUST_LOG` 优先；否则 `verbose` 为真时使用 debug 级别
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quiz_dashboard={}", default_level)));

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(command: &str, config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", command);
    info!("🌐 后端地址: {}", config.backend_url);
    info!(
        "📦 存储桶: {} (书籍) / {} (导出)",
        config.books_bucket, config.export_bucket
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("高一数学上册.pdf", 4), "高一数学...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
