//! 评分引擎 - 业务能力层
//!
//! 对精度要求最高的模块：
//! - 客观题（单选/多选/判断）本地判分，结果必须确定且可复现
//! - 简答题逐题调用远端按评分标准打分，各题相互独立、并发执行、
//!   完成顺序不限，按题目 id 归并（键不冲突）
//! - 任何评分调用失败都降级为 0 分兜底结果，错误绝不离开本引擎，
//!   保证会话一定能到达"全部评分完成"的终态

use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::error::GradingError;
use crate::models::{Exam, Question, QuestionType, UserAnswer};

/// 评分采样温度（偏低，评分应尽量稳定）
const GRADING_TEMPERATURE: f32 = 0.2;
/// 评分最大输出 token 数
const GRADING_MAX_TOKENS: u32 = 1024;
/// 评分服务失败时的固定兜底评语
pub const GRADING_FALLBACK_FEEDBACK: &str = "评分服务暂时不可用，本题按 0 分处理。";

/// 一道简答题的评分结果
#[derive(Debug, Clone, PartialEq)]
pub struct ShortAnswerGrade {
    pub score: u32,
    pub is_correct: bool,
    pub feedback: String,
}

impl ShortAnswerGrade {
    /// 远端失败时的兜底结果
    pub fn fallback() -> Self {
        Self {
            score: 0,
            is_correct: false,
            feedback: GRADING_FALLBACK_FEEDBACK.to_string(),
        }
    }
}

/// 评分结果汇总
///
/// percent 只有在 is_pending() 为 false 时才是最终成绩
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    /// 总分百分比（四舍五入；未评分的简答题按 0 计入）
    pub percent: u32,
    /// 尚未评分的简答题数量
    pub pending: usize,
    /// 已判定为答对的题目数量
    pub correct: usize,
    /// 题目总数
    pub total: usize,
}

impl ScoreReport {
    /// 是否仍有题目在等待评分
    pub fn is_pending(&self) -> bool {
        self.pending > 0
    }
}

/// 评分引擎
pub struct GradingService {
    llm: LlmClient,
    max_concurrent: usize,
}

impl GradingService {
    /// 创建新的评分引擎
    pub fn new(config: &Config) -> Self {
        Self {
            llm: LlmClient::new(config),
            max_concurrent: config.max_concurrent_gradings.max(1),
        }
    }

    /// 对一份已交卷的作答集合评分
    ///
    /// 客观题先本地判分；简答题并发发起评分请求并按完成顺序归并。
    /// 本函数永不失败：所有远端错误都已在内部降级为兜底结果。
    pub async fn grade(&self, exam: &Exam, mut answers: Vec<UserAnswer>) -> Vec<UserAnswer> {
        // ========== 第一步：客观题本地判分 ==========
        for answer in answers.iter_mut() {
            let Some(question) = exam.questions.iter().find(|q| q.id == answer.question_id)
            else {
                continue;
            };
            if question.question_type.is_objective() {
                answer.is_correct = Some(grade_objective(question, answer));
            }
        }

        // ========== 第二步：简答题并发评分 ==========
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::new();

        for question in exam
            .questions
            .iter()
            .filter(|q| q.question_type == QuestionType::ShortAnswer)
        {
            let Some(answer) = answers.iter().find(|a| a.question_id == question.id) else {
                continue;
            };

            let llm = self.llm.clone();
            let semaphore = semaphore.clone();
            let prompt = question.prompt.clone();
            let rubric = question.correct_answer.display_text();
            let student_answer = answer.value.as_text();
            let question_id = question.id;

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                grade_short_answer(&llm, &prompt, &rubric, &student_answer).await
            });
            handles.push((question_id, handle));
        }

        // 按完成顺序归并到作答记录（按题目 id 定位，互不冲突）
        for (question_id, handle) in handles {
            let grade = match handle.await {
                Ok(grade) => {
                    info!("✓ 简答题 {} 评分完成: {} 分", question_id, grade.score);
                    grade
                }
                Err(e) => {
                    error!("❌ 简答题 {} 评分任务异常: {}", question_id, e);
                    ShortAnswerGrade::fallback()
                }
            };

            if let Some(answer) = answers.iter_mut().find(|a| a.question_id == question_id) {
                answer.score = Some(grade.score);
                answer.is_correct = Some(grade.is_correct);
                answer.feedback = Some(grade.feedback);
            }
        }

        answers
    }
}

/// 客观题判分规则
///
/// - 单选/判断：作答与标准答案逐字节相等才算对
/// - 多选：作答集合与标准答案集合相等才算对（与顺序、重复无关）；
///   标准答案不是数组时按空集处理
pub fn grade_objective(question: &Question, answer: &UserAnswer) -> bool {
    match question.question_type {
        QuestionType::MultipleSelect => {
            let answer_set = answer.value.as_set();
            let correct_set = question.correct_answer.multi_set();
            answer_set == correct_set
        }
        _ => match (&answer.value, question.correct_answer.as_single()) {
            (crate::models::AnswerValue::Single(value), Some(correct)) => value == correct,
            _ => false,
        },
    }
}

/// 汇总总分
///
/// 客观题按对/错计 100/0；已评分的简答题计 AI 给出的分数；
/// 未评分的简答题计 0 分并计入 pending。
/// 全部题目都在等待评分（或试卷为空）时总分为 0，不做除零运算。
pub fn aggregate(exam: &Exam, answers: &[UserAnswer]) -> ScoreReport {
    let total = exam.questions.len();
    let mut sum: u64 = 0;
    let mut pending = 0usize;
    let mut correct = 0usize;

    for question in &exam.questions {
        let Some(answer) = answers.iter().find(|a| a.question_id == question.id) else {
            continue;
        };

        if question.question_type == QuestionType::ShortAnswer {
            match answer.score {
                Some(score) => {
                    sum += u64::from(score);
                    if answer.is_correct == Some(true) {
                        correct += 1;
                    }
                }
                None => pending += 1,
            }
        } else if answer.is_correct == Some(true) {
            sum += 100;
            correct += 1;
        }
    }

    let percent = if total == 0 || pending == total {
        0
    } else {
        ((sum as f64) / (total as f64)).round() as u32
    };

    ScoreReport {
        percent,
        pending,
        correct,
        total,
    }
}

/// 评一道简答题（内部吞掉所有错误，保证一定返回结果）
async fn grade_short_answer(
    llm: &LlmClient,
    question: &str,
    rubric: &str,
    student_answer: &str,
) -> ShortAnswerGrade {
    match request_grade(llm, question, rubric, student_answer).await {
        Ok(grade) => grade,
        Err(e) => {
            warn!("⚠️ 简答题评分失败，使用兜底结果: {}", e);
            ShortAnswerGrade::fallback()
        }
    }
}

/// 发起一次评分请求并解析结果
async fn request_grade(
    llm: &LlmClient,
    question: &str,
    rubric: &str,
    student_answer: &str,
) -> Result<ShortAnswerGrade, GradingError> {
    let (user_message, system_message) = build_grading_messages(question, rubric, student_answer);

    let response = llm
        .chat(
            &user_message,
            Some(&system_message),
            GRADING_TEMPERATURE,
            GRADING_MAX_TOKENS,
        )
        .await
        .map_err(|e| GradingError::ApiCallFailed {
            model: llm.model_name().to_string(),
            source: e.into(),
        })?;

    parse_grade_response(&response)
}

/// 构建评分提示词
///
/// 返回 (user_message, system_message)
fn build_grading_messages(
    question: &str,
    rubric: &str,
    student_answer: &str,
) -> (String, String) {
    let system_message = "你是一位严格但公正的阅卷助手。你只输出 JSON，不输出任何其他内容。"
        .to_string();

    let user_message = format!(
        r#"请根据评分标准给学生的答案打分。

题目: "{question}"
评分标准: "{rubric}"
学生答案: "{student_answer}"

只输出一个 JSON 对象，不要包含 markdown 代码块标记，形如：
{{"score": 85, "isCorrect": true, "feedback": "评语"}}

其中 score 为 0-100 的整数，isCorrect 表示是否达到合格水平，feedback 为简短评语。"#,
    );

    (user_message, system_message)
}

/// 解析评分响应
pub fn parse_grade_response(raw: &str) -> Result<ShortAnswerGrade, GradingError> {
    #[derive(Deserialize)]
    struct GradePayload {
        score: i64,
        #[serde(rename = "isCorrect")]
        is_correct: bool,
        feedback: String,
    }

    let trimmed = raw.trim();
    let json_text = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|inner| inner.strip_suffix("```").unwrap_or(inner))
        .unwrap_or(trimmed)
        .trim();

    let payload: GradePayload =
        serde_json::from_str(json_text).map_err(|e| GradingError::JsonParseFailed {
            snippet: crate::utils::logging::truncate_text(json_text, 120),
            source: e.into(),
        })?;

    if !(0..=100).contains(&payload.score) {
        debug!("评分 {} 超出范围，收拢到 0-100", payload.score);
    }

    Ok(ShortAnswerGrade {
        score: payload.score.clamp(0, 100) as u32,
        is_correct: payload.is_correct,
        feedback: payload.feedback,
    })
}
