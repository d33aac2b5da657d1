//! 答题界面渲染 - 展示层
//!
//! 纯文本渲染，不做任何 I/O，方便单独测试

use crate::models::{AnswerValue, QuestionType};
use crate::workflow::ExamSession;

/// 把秒数格式化为 mm:ss
pub fn format_time(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// 渲染当前题目视图
pub fn render_question(session: &ExamSession) -> String {
    let question = session.current_question();
    let answer = session.answer_for(question.id);

    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "─".repeat(60)));
    out.push_str(&format!(
        "第 {}/{} 题 [{}]  ⏱ 剩余 {}  已答 {}/{}\n",
        session.current_index() + 1,
        session.question_count(),
        question.question_type.label(),
        format_time(session.remaining_secs()),
        session.answered_count(),
        session.question_count(),
    ));
    out.push_str(&format!("{}\n\n", "─".repeat(60)));
    out.push_str(&format!("{}\n", question.prompt));

    // 选项列表（简答题没有选项）
    if !question.option_list().is_empty() {
        out.push('\n');
        for (i, option) in question.option_list().iter().enumerate() {
            let marker = match answer.map(|a| &a.value) {
                Some(AnswerValue::Single(value)) if value == option => "●",
                Some(AnswerValue::Multiple(values)) if values.contains(option) => "■",
                _ => "○",
            };
            out.push_str(&format!("  {} {}. {}\n", marker, i + 1, option));
        }
    }

    // 已有作答回显
    if let Some(answer) = answer {
        if !answer.value.is_empty() && question.question_type == QuestionType::ShortAnswer {
            out.push_str(&format!("\n当前作答: {}\n", answer.value.as_text()));
        }
    }

    out.push('\n');
    out.push_str(match question.question_type {
        QuestionType::MultipleChoice | QuestionType::TrueFalse => {
            "输入选项编号作答；:n 下一题 / :p 上一题 / :submit 交卷"
        }
        QuestionType::MultipleSelect => {
            "输入逗号分隔的选项编号作答（如 1,3）；:n 下一题 / :p 上一题 / :submit 交卷"
        }
        QuestionType::ShortAnswer => {
            "直接输入一行文字作答；:n 下一题 / :p 上一题 / :submit 交卷"
        }
    });
    out.push('\n');

    out
}
