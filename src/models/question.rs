use serde::{Deserialize, Serialize};

use super::lenient;

/// 生成的选择题（questions 表的一行），本层只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(deserialize_with = "lenient::text")]
    pub book_id: String,
    pub question_number: i64,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub question_text: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub choice_1: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub choice_2: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub choice_3: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub choice_4: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub correct_choice: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub difficulty_level: String,
}

impl Question {
    /// 四个选项，按顺序
    pub fn choices(&self) -> [&str; 4] {
        [&self.choice_1, &self.choice_2, &self.choice_3, &self.choice_4]
    }
}
