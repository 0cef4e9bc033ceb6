//! # Quiz Dashboard
//!
//! 管理教材 PDF、跟踪题目生成进度并导出 CSV 的命令行仪表盘。
//! 抽取与出题都由远程后端完成，本 crate 只负责发请求和整理结果。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层
//! - `clients/` - `BackendClient`，对象存储 / 数据表 / RPC / 云函数的 HTTP 调用
//! - `store/` - 存储接口（trait），远程实现与内存实现
//!
//! ### ② 业务能力层（Services）
//! - `BookService` - 上传、列表、扫描、触发处理、取消、导出
//! - `scanner` - 新书发现（集合差）
//! - `csv_export` - CSV 渲染与文件命名
//! - `schema` - 数据表引导
//!
//! ### ③ 编排层
//! - `dashboard/` - 界面状态、统计与渲染
//! - `app` / `cli` - 命令分发
//!
//! ## 模块结构

pub mod app;
pub mod cli;
pub mod clients;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use dashboard::DashboardView;
pub use error::{AppError, AppResult};
pub use models::{Book, BookWithProgress, ProcessingProgress, ProcessingStatus, Question};
pub use services::BookService;
pub use store::{MemoryBackend, RemoteBackend, Stores};
