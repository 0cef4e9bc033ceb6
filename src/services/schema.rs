//! 表结构引导 - 业务能力层
//!
//! 确认三张数据表存在；缺失时先调用建表 RPC，失败再写入占位行触发建表

use crate::store::{SchemaAdmin, BOOKS_TABLE, PROGRESS_TABLE, QUESTIONS_TABLE, REQUIRED_TABLES};
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 单张表的引导结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOutcome {
    /// 表已存在
    Exists,
    /// 通过 RPC 建表
    CreatedByRpc,
    /// 通过占位行建表
    CreatedByPlaceholder,
    /// 占位行主键冲突，视为已存在
    AlreadyExists,
    /// 引导失败（已记录日志）
    Failed,
}

/// 表结构引导服务
pub struct SchemaBootstrap {
    schema: Arc<dyn SchemaAdmin>,
}

impl SchemaBootstrap {
    pub fn new(schema: Arc<dyn SchemaAdmin>) -> Self {
        Self { schema }
    }

    /// 并发检查全部数据表，返回每张表的结果
    pub async fn ensure_tables_exist(&self) -> Vec<(&'static str, TableOutcome)> {
        let outcomes = join_all(REQUIRED_TABLES.iter().map(|table| self.ensure_table(table))).await;
        REQUIRED_TABLES.iter().copied().zip(outcomes).collect()
    }

    /// 检查单张表
    pub async fn ensure_table(&self, table: &str) -> TableOutcome {
        match self.schema.probe_table(table).await {
            Ok(()) => {
                debug!("数据表 {} 已存在", table);
                return TableOutcome::Exists;
            }
            Err(e) if e.is_relation_missing() => {
                info!("🛠️ 数据表 {} 不存在，尝试创建...", table);
            }
            Err(e) => {
                warn!("⚠️ 检查数据表 {} 失败: {}", table, e);
                return TableOutcome::Failed;
            }
        }

        let rpc_name = create_rpc_name(table);
        match self.schema.call_rpc(&rpc_name, &json!({})).await {
            Ok(_) => {
                info!("✓ 已通过 {} 创建数据表 {}", rpc_name, table);
                return TableOutcome::CreatedByRpc;
            }
            Err(e) => {
                warn!("⚠️ RPC {} 失败: {}，改用占位行建表", rpc_name, e);
            }
        }

        match self
            .schema
            .insert_placeholder(table, &placeholder_row(table))
            .await
        {
            Ok(()) => {
                info!("✓ 已通过占位行创建数据表 {}", table);
                TableOutcome::CreatedByPlaceholder
            }
            Err(e) if e.is_duplicate_key() => {
                debug!("数据表 {} 的占位行已存在", table);
                TableOutcome::AlreadyExists
            }
            Err(e) => {
                warn!("❌ 无法创建数据表 {}: {}", table, e);
                TableOutcome::Failed
            }
        }
    }
}

/// 建表 RPC 名称，如 `create_questions_table`
pub fn create_rpc_name(table: &str) -> String {
    format!("create_{}_table", table)
}

fn placeholder_row(table: &str) -> Value {
    match table {
        BOOKS_TABLE => json!({ "file_path": "__placeholder__" }),
        PROGRESS_TABLE => json!({ "file_path": "__placeholder__", "status": "not_started" }),
        QUESTIONS_TABLE => json!({ "question_number": 0, "question_text": "__placeholder__" }),
        _ => json!({}),
    }
}
