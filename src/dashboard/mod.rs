pub mod render;
pub mod state;
pub mod view;

pub use render::render_dashboard;
pub use state::{DashboardCounts, DashboardState, Toast, ToastKind};
pub use view::DashboardView;
