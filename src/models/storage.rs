use serde::{Deserialize, Serialize};

/// 存储桶列表中的一个对象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub name: String,
    /// 目录占位项没有 id
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl StoredObject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// 列出对象时的分页与排序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub prefix: String,
    pub limit: usize,
    pub offset: usize,
    pub sort_column: String,
    pub sort_order: SortOrder,
}

impl ListOptions {
    /// 从根目录开始、按名称升序列出前 `limit` 个对象
    pub fn first_page(limit: usize) -> Self {
        Self {
            prefix: String::new(),
            limit,
            offset: 0,
            sort_column: "name".to_string(),
            sort_order: SortOrder::Asc,
        }
    }
}
