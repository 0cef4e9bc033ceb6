//! 仪表盘视图 - 编排层
//!
//! 持有界面本地状态，响应"挂载"和"扫描"两个触发，
//! 调用书籍服务后重新计算统计

use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::render::render_dashboard;
use super::state::{DashboardCounts, DashboardState, Toast};
use crate::services::BookService;

/// 扫描结束时清除 `scanning`，future 中途被丢弃也一样
struct ScanGuard<'a>(&'a DashboardView);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.state_mut().scanning = false;
    }
}

/// 仪表盘视图
///
/// 状态放在互斥锁内，允许多个触发并发进入；锁不会跨越 await
pub struct DashboardView {
    service: BookService,
    state: Mutex<DashboardState>,
    toasts: Mutex<Vec<Toast>>,
}

impl DashboardView {
    pub fn new(service: BookService) -> Self {
        Self {
            service,
            state: Mutex::new(DashboardState::default()),
            toasts: Mutex::new(Vec::new()),
        }
    }

    fn state_mut(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push_toast(&self, toast: Toast) {
        info!("🔔 {}: {}", toast.title, toast.description);
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(toast);
    }

    /// 当前状态快照
    pub fn state(&self) -> DashboardState {
        self.state_mut().clone()
    }

    /// 取走尚未显示的提示
    pub fn take_toasts(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// 首次挂载：拉取书籍
    pub async fn mount(&self) {
        self.refresh().await;
    }

    /// 重新拉取书籍并计算统计
    pub async fn refresh(&self) {
        self.state_mut().loading = true;

        let books = self.service.list_books_with_progress().await;
        let counts = DashboardCounts::derive(&books);
        debug!("统计: {:?}", counts);

        let mut state = self.state_mut();
        state.books = books;
        state.counts = counts;
        state.loading = false;
    }

    /// 扫描新书
    ///
    /// 扫描进行中再次触发时直接忽略（相当于按钮被禁用），返回 false
    pub async fn scan(&self) -> bool {
        {
            let mut state = self.state_mut();
            if state.scanning {
                debug!("扫描进行中，忽略重复触发");
                return false;
            }
            state.scanning = true;
        }
        let guard = ScanGuard(self);

        let ok = self.service.scan_for_new_books().await;
        if ok {
            self.push_toast(Toast::success("扫描完成", "已检查存储中的新书"));
            self.refresh().await;
        } else {
            self.push_toast(Toast::error("扫描失败", "无法扫描新书，请稍后重试"));
        }

        drop(guard);
        ok
    }

    /// 渲染为文本，并清空已显示的提示
    pub fn render(&self) -> String {
        let state = self.state();
        let toasts = self.take_toasts();
        render_dashboard(&state, &toasts)
    }
}
