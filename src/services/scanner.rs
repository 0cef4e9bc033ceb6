//! 新书发现 - 业务能力层
//!
//! 对比存储桶与元数据表，找出尚未登记的 PDF

use crate::models::StoredObject;
use std::collections::HashSet;

/// 找出存储中存在、元数据中缺失的 PDF 文件
///
/// 扩展名不区分大小写；路径按完全相等比较；保持存储列表的顺序
pub fn find_new_books(objects: &[StoredObject], known_paths: &[String]) -> Vec<String> {
    let known: HashSet<&str> = known_paths.iter().map(String::as_str).collect();

    objects
        .iter()
        .map(|o| o.name.as_str())
        .filter(|name| is_pdf(name))
        .filter(|name| !known.contains(name))
        .map(str::to_string)
        .collect()
}

/// 文件名是否以 `.pdf` 结尾（不区分大小写）
pub fn is_pdf(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf")
}
