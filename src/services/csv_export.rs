//! 题目导出为 CSV

use crate::models::{Book, Question};

/// 固定的 9 列表头
pub const CSV_HEADER: &str = "question_number,category,difficulty_level,question_text,choice_1,choice_2,choice_3,choice_4,correct_choice";

/// 把题目渲染为 CSV 文本
///
/// 题干和四个选项加双引号，内部的双引号写成两个；行之间用 `\n` 连接，末尾不换行
pub fn render_questions_csv(questions: &[Question]) -> String {
    let mut lines = Vec::with_capacity(questions.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for q in questions {
        let [c1, c2, c3, c4] = q.choices();
        lines.push(format!(
            "{},{},{},{},{},{},{},{},{}",
            q.question_number,
            q.category,
            q.difficulty_level,
            quote(&q.question_text),
            quote(c1),
            quote(c2),
            quote(c3),
            quote(c4),
            q.correct_choice,
        ));
    }

    lines.join("\n")
}

/// 导出文件名：`<年级>_<科目>_<学期>.csv`
pub fn export_file_name(book: &Book) -> String {
    format!(
        "{}_{}_{}.csv",
        book.grade_or_default(),
        book.subject_or_default(),
        book.semester_or_default()
    )
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
