//! 成绩报告渲染 - 展示层
//!
//! 评分引擎输出的只读消费者，纯文本渲染

use crate::models::{Exam, QuestionType, UserAnswer};
use crate::services::ScoreReport;

/// 渲染完整成绩报告
pub fn render_report(exam: &Exam, answers: &[UserAnswer], report: &ScoreReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", "=".repeat(60)));
    out.push_str(&format!("📋 考试结果 - 《{}》\n", exam.title));
    out.push_str(&format!("{}\n", "=".repeat(60)));

    if report.is_pending() {
        out.push_str(&format!(
            "总分: 评分中... (还有 {} 道简答题待评分)\n",
            report.pending
        ));
    } else {
        out.push_str(&format!(
            "总分: {}%  (答对 {}/{})\n",
            report.percent, report.correct, report.total
        ));
        out.push_str(&format!("{}\n", verdict_line(report.percent)));
    }
    out.push_str(&format!("{}\n", "=".repeat(60)));

    for (index, question) in exam.questions.iter().enumerate() {
        let answer = answers.iter().find(|a| a.question_id == question.id);
        out.push_str(&render_question_result(index, question, answer));
    }

    out
}

/// 按分数段给出评语
fn verdict_line(percent: u32) -> &'static str {
    if percent >= 80 {
        "🏆 非常出色，你已经掌握了这份材料！"
    } else if percent >= 60 {
        "👍 不错，但还有提升空间。"
    } else {
        "📖 继续努力，建议复习材料后再试一次。"
    }
}

/// 渲染单题结果块
fn render_question_result(
    index: usize,
    question: &crate::models::Question,
    answer: Option<&UserAnswer>,
) -> String {
    let is_short_answer = question.question_type == QuestionType::ShortAnswer;
    let is_pending = is_short_answer && answer.map_or(true, |a| a.score.is_none());

    let marker = if is_pending {
        "…"
    } else if answer.and_then(|a| a.is_correct) == Some(true) {
        "✓"
    } else if is_short_answer && answer.and_then(|a| a.score).unwrap_or(0) > 50 {
        // 简答题得分过半按部分正确展示
        "△"
    } else {
        "✗"
    };

    let mut out = String::new();
    out.push_str(&format!(
        "\n{} Q{}. [{}] {}\n",
        marker,
        index + 1,
        question.question_type.label(),
        question.prompt
    ));

    let answer_text = answer
        .map(|a| a.value.as_text())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "(未作答)".to_string());
    out.push_str(&format!("   你的答案: {}\n", answer_text));

    if is_short_answer {
        out.push_str(&format!(
            "   评分标准: {}\n",
            question.correct_answer.display_text()
        ));
        match answer.and_then(|a| a.score) {
            Some(score) => out.push_str(&format!("   得分: {}/100\n", score)),
            None => out.push_str("   得分: 评分中...\n"),
        }
        if let Some(feedback) = answer.and_then(|a| a.feedback.as_deref()) {
            out.push_str(&format!("   AI 评语: {}\n", feedback));
        }
    } else {
        out.push_str(&format!(
            "   正确答案: {}\n",
            question.correct_answer.display_text()
        ));
    }

    if let Some(explanation) = &question.explanation {
        out.push_str(&format!("   解析: {}\n", explanation));
    }

    out
}
