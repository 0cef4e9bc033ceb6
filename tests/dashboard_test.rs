use async_trait::async_trait;
use quiz_dashboard::dashboard::{DashboardCounts, ToastKind};
use quiz_dashboard::models::{ProcessingProgress, ProcessingStatus};
use quiz_dashboard::store::{FunctionInvoker, BASIC_SCAN_FN, BOOKS_TABLE};
use quiz_dashboard::{AppResult, BookService, Config, DashboardView, MemoryBackend, Stores};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn view_with(config: Config) -> (Arc<MemoryBackend>, DashboardView) {
    let backend = Arc::new(MemoryBackend::new());
    let service = BookService::new(Stores::from_backend(backend.clone()), &config);
    (backend, DashboardView::new(service))
}

/// 远程扫描在 `gate` 放行前挂起，进入时通知 `entered`
struct GatedFunctions {
    inner: Arc<MemoryBackend>,
    gate: Arc<Notify>,
    entered: Arc<Notify>,
}

#[async_trait]
impl FunctionInvoker for GatedFunctions {
    async fn invoke(&self, name: &str, payload: &Value) -> AppResult<Value> {
        if name == BASIC_SCAN_FN {
            self.entered.notify_one();
            self.gate.notified().await;
        }
        self.inner.invoke(name, payload).await
    }
}

struct GatedView {
    backend: Arc<MemoryBackend>,
    view: DashboardView,
    gate: Arc<Notify>,
    entered: Arc<Notify>,
}

fn gated_view() -> GatedView {
    let backend = Arc::new(MemoryBackend::new());
    let gate = Arc::new(Notify::new());
    let entered = Arc::new(Notify::new());

    let mut stores = Stores::from_backend(backend.clone());
    stores.functions = Arc::new(GatedFunctions {
        inner: backend.clone(),
        gate: gate.clone(),
        entered: entered.clone(),
    });
    let service = BookService::new(stores, &Config::default());

    GatedView {
        backend,
        view: DashboardView::new(service),
        gate,
        entered,
    }
}

fn basic_scan_count(backend: &MemoryBackend) -> usize {
    backend
        .invocations()
        .iter()
        .filter(|(name, _)| name.as_str() == BASIC_SCAN_FN)
        .count()
}

#[tokio::test]
async fn test_mount_derives_counts() {
    let (backend, view) = view_with(Config::default());
    backend.add_book("a.pdf", None, None, None);
    backend.add_book("b.pdf", None, None, None);
    backend.add_book("c.pdf", None, None, None);
    backend.add_book("d.pdf", None, None, None);
    backend.add_progress(ProcessingProgress::new("a.pdf", ProcessingStatus::Completed));
    backend.add_progress(ProcessingProgress::new("b.pdf", ProcessingStatus::Processing));
    backend.add_progress(ProcessingProgress::new("c.pdf", ProcessingStatus::NotStarted));

    view.mount().await;

    let state = view.state();
    assert!(!state.loading);
    assert_eq!(state.books.len(), 4);
    assert_eq!(
        state.counts,
        DashboardCounts {
            total: 4,
            processed: 1,
            in_progress: 1,
            pending: 2,
        }
    );
}

#[tokio::test]
async fn test_scan_success_toasts_and_refetches() {
    let (backend, view) = view_with(Config::default());
    backend.fail_function(BASIC_SCAN_FN);
    backend.add_object("books", "1_new.pdf", b"x");

    view.mount().await;
    assert_eq!(view.state().counts.total, 0);

    assert!(view.scan().await);

    let state = view.state();
    assert!(!state.scanning);
    assert_eq!(state.counts.total, 1);
    assert_eq!(state.counts.pending, 1);

    let toasts = view.take_toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Success);
    assert!(view.take_toasts().is_empty());
}

#[tokio::test]
async fn test_scan_failure_toasts_error_without_refetch() {
    let config = Config {
        bootstrap_schema_on_scan: false,
        ..Config::default()
    };
    let (backend, view) = view_with(config);
    backend.fail_function(BASIC_SCAN_FN);
    backend.drop_table(BOOKS_TABLE);

    assert!(!view.scan().await);

    assert!(!view.state().scanning);
    assert!(!backend.calls().contains(&"list_books".to_string()));

    let rendered = view.render();
    assert!(rendered.contains("扫描失败"));
    assert!(view.take_toasts().is_empty());
}

#[tokio::test]
async fn test_render_lists_books_after_mount() {
    let (backend, view) = view_with(Config::default());
    backend.add_book("1_chemistry.pdf", Some("11"), Some("Chemistry"), Some("02"));

    view.mount().await;
    let rendered = view.render();

    assert!(rendered.contains("书籍总数: 1"));
    assert!(rendered.contains("1_chemistry.pdf"));
    assert!(rendered.contains("11/Chemistry/02"));
    assert!(rendered.contains("无进度"));
}

#[tokio::test]
async fn test_scan_ignores_trigger_while_running() {
    let GatedView {
        backend,
        view,
        gate,
        entered,
    } = gated_view();

    let second = async {
        entered.notified().await;
        assert!(view.state().scanning);
        let result = view.scan().await;
        gate.notify_one();
        result
    };
    let (first, second) = tokio::join!(view.scan(), second);

    assert!(first);
    assert!(!second);
    assert_eq!(basic_scan_count(&backend), 1);
    assert!(!view.state().scanning);

    let toasts = view.take_toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Success);
}

#[tokio::test]
async fn test_dropped_scan_clears_scanning_flag() {
    let GatedView {
        backend,
        view,
        gate,
        entered: _entered,
    } = gated_view();

    let timed_out = tokio::time::timeout(Duration::from_millis(50), view.scan()).await;
    assert!(timed_out.is_err());
    assert!(!view.state().scanning);
    assert!(view.take_toasts().is_empty());

    // 放行后下一次扫描正常执行
    gate.notify_one();
    assert!(view.scan().await);
    assert_eq!(basic_scan_count(&backend), 1);
    assert!(!view.state().scanning);
}
