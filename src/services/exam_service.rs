//! 出题服务 - 业务能力层
//!
//! 只负责"把一组文档变成一份结构化试卷"能力，不关心流程
//!
//! 模型输出是弱类型 JSON，进入会话状态之前必须在边界处完成
//! 结构校验（按题型分派检查 correctAnswer 的形态），
//! 判断题无条件做一次规范化处理

use tracing::{debug, info};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::error::{AppError, AppResult, GenerationError};
use crate::models::{CorrectAnswer, Document, Exam, QuestionType};

/// 出题采样温度（偏高，保证重复出题时题目不同）
const GENERATION_TEMPERATURE: f32 = 0.8;
/// 出题最大输出 token 数
const GENERATION_MAX_TOKENS: u32 = 8192;

/// 出题服务
pub struct ExamService {
    llm: LlmClient,
    question_count: usize,
}

impl ExamService {
    /// 创建新的出题服务
    pub fn new(config: &Config) -> Self {
        Self {
            llm: LlmClient::new(config),
            question_count: config.question_count,
        }
    }

    /// 根据一组文档生成一份试卷
    ///
    /// 所有文档拼接为一个带文件名标注的上下文块，一次请求完成出题。
    /// 远端调用失败、返回为空、JSON 解析失败或结构校验失败
    /// 都会返回出题错误，由调用方退回文件选择阶段。
    pub async fn author_exam(&self, documents: &[Document]) -> AppResult<Exam> {
        info!("📝 正在根据 {} 个文档出题...", documents.len());

        let (user_message, system_message) = self.build_generation_messages(documents);

        let response = self
            .llm
            .chat(
                &user_message,
                Some(&system_message),
                GENERATION_TEMPERATURE,
                GENERATION_MAX_TOKENS,
            )
            .await
            .map_err(|e| AppError::generation_api_failed(self.llm.model_name(), e))?;

        if response.is_empty() {
            return Err(GenerationError::EmptyResponse {
                model: self.llm.model_name().to_string(),
            }
            .into());
        }

        let exam = parse_exam_payload(&response)?;

        info!(
            "✓ 出题完成: 《{}》 共 {} 道题",
            exam.title,
            exam.questions.len()
        );

        Ok(exam)
    }

    /// 构建出题提示词
    ///
    /// 返回 (user_message, system_message)
    fn build_generation_messages(&self, documents: &[Document]) -> (String, String) {
        let system_message = "你是一位资深的出题教授和监考官，\
                              擅长根据技术文档编写覆盖核心概念、语法和逻辑的考试题。\
                              你只输出 JSON，不输出任何其他内容。"
            .to_string();

        // 拼接文档内容为一个上下文块，按文件名标注
        let mut context = String::from("学习材料:\n\n");
        for doc in documents {
            context.push_str(&format!("--- FILE: {} ---\n{}\n\n", doc.name, doc.content));
        }

        // 加入随机种子，避免相同材料重复出题时得到相同的题目
        let random_seed = chrono::Utc::now().timestamp_millis();

        let user_message = format!(
            r#"请分析以下仓库中的 markdown 文档，出一份测试学生对其核心概念理解程度的考试卷。

重要：每次出题都必须生成不同的题目。随机种子: {seed}

题目数量：约 {count} 道，均匀覆盖所有提供的文件，混合使用四种题型。
题目语言与学习材料保持一致。题目必须只基于提供的文本，有挑战性但公平。

题型规则（必须严格遵守）：
- "multiple_choice"（单选）：options 提供恰好 4 个选项，correctAnswer 是其中一个选项的完整字符串
- "multiple_select"（多选）：options 提供 4-6 个选项，correctAnswer 是字符串数组，至少包含 2 个正确选项
- "true_false"（判断）：options 必须是 ["True", "False"]，correctAnswer 是 "True" 或 "False"
- "short_answer"（简答）：不提供 options，correctAnswer 是一段评分标准文本

输出格式：只输出一个 JSON 对象，不要包含 markdown 代码块标记，形如：
{{
  "title": "试卷标题",
  "description": "试卷简介",
  "questions": [
    {{
      "id": 1,
      "type": "multiple_choice",
      "question": "题干",
      "options": ["A", "B", "C", "D"],
      "correctAnswer": "A",
      "explanation": "答案解析"
    }}
  ]
}}

id 从 1 开始递增且不重复。

{context}"#,
            seed = random_seed,
            count = self.question_count,
            context = context,
        );

        debug!("出题提示词长度: {} 字符", user_message.len());

        (user_message, system_message)
    }
}

/// 解析并校验模型返回的试卷 JSON
///
/// 流程：剥掉可能存在的代码块围栏 → JSON 反序列化 →
/// 判断题规范化 → 结构校验
pub fn parse_exam_payload(raw: &str) -> AppResult<Exam> {
    let json_text = strip_code_fences(raw);

    let mut exam: Exam = serde_json::from_str(json_text).map_err(|e| {
        AppError::Generation(GenerationError::JsonParseFailed {
            snippet: crate::utils::logging::truncate_text(json_text, 120),
            source: e.into(),
        })
    })?;

    normalize_exam(&mut exam);
    validate_exam(&exam)?;

    Ok(exam)
}

/// 剥掉 markdown 代码块围栏（模型偶尔会包一层 ```json ... ```）
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

/// 创建后唯一允许的修改：判断题规范化
///
/// - options 强制为 ["True", "False"]
/// - correctAnswer 大小写/空白规范化为 "True" 或 "False"
/// - 简答题的空选项列表清理为无选项
fn normalize_exam(exam: &mut Exam) {
    for question in exam.questions.iter_mut() {
        match question.question_type {
            QuestionType::TrueFalse => {
                question.options = Some(vec!["True".to_string(), "False".to_string()]);
                if let CorrectAnswer::Single(raw) = &question.correct_answer {
                    let normalized = if raw.trim().to_lowercase() == "true" {
                        "True"
                    } else {
                        "False"
                    };
                    question.correct_answer = CorrectAnswer::Single(normalized.to_string());
                }
            }
            QuestionType::ShortAnswer => {
                if question
                    .options
                    .as_ref()
                    .is_some_and(|options| options.is_empty())
                {
                    question.options = None;
                }
            }
            _ => {}
        }
    }
}

/// 校验试卷结构约束
///
/// 任何一条不满足都视为出题失败，绝不让畸形数据进入会话
fn validate_exam(exam: &Exam) -> AppResult<()> {
    if exam.questions.is_empty() {
        return Err(GenerationError::NoQuestions.into());
    }

    let mut seen_ids = std::collections::HashSet::new();
    for question in &exam.questions {
        if !seen_ids.insert(question.id) {
            return Err(AppError::generation_schema_mismatch(
                Some(question.id),
                "题目 id 重复",
            ));
        }

        let options = question.option_list();
        match question.question_type {
            QuestionType::MultipleChoice | QuestionType::TrueFalse => {
                if options.is_empty() {
                    return Err(AppError::generation_schema_mismatch(
                        Some(question.id),
                        "缺少选项列表",
                    ));
                }
                let Some(answer) = question.correct_answer.as_single() else {
                    return Err(AppError::generation_schema_mismatch(
                        Some(question.id),
                        "correctAnswer 应为单个字符串",
                    ));
                };
                if !options.iter().any(|option| option == answer) {
                    return Err(AppError::generation_schema_mismatch(
                        Some(question.id),
                        "correctAnswer 不在选项列表中",
                    ));
                }
            }
            QuestionType::MultipleSelect => {
                if options.is_empty() {
                    return Err(AppError::generation_schema_mismatch(
                        Some(question.id),
                        "缺少选项列表",
                    ));
                }
                let CorrectAnswer::Multiple(answers) = &question.correct_answer else {
                    return Err(AppError::generation_schema_mismatch(
                        Some(question.id),
                        "correctAnswer 应为字符串数组",
                    ));
                };
                if answers.len() < 2 {
                    return Err(AppError::generation_schema_mismatch(
                        Some(question.id),
                        "多选题至少需要 2 个正确选项",
                    ));
                }
                if answers
                    .iter()
                    .any(|answer| !options.iter().any(|option| option == answer))
                {
                    return Err(AppError::generation_schema_mismatch(
                        Some(question.id),
                        "correctAnswer 包含不在选项列表中的项",
                    ));
                }
            }
            QuestionType::ShortAnswer => {
                if question.correct_answer.as_single().is_none() {
                    return Err(AppError::generation_schema_mismatch(
                        Some(question.id),
                        "correctAnswer 应为评分标准文本",
                    ));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 一份各题型齐全的合法载荷
    const VALID_PAYLOAD: &str = r#"{
        "title": "Sample Exam",
        "description": "covers the basics",
        "questions": [
            {
                "id": 1,
                "type": "multiple_choice",
                "question": "Pick one.",
                "options": ["a", "b", "c", "d"],
                "correctAnswer": "b"
            },
            {
                "id": 2,
                "type": "multiple_select",
                "question": "Pick several.",
                "options": ["a", "b", "c", "d"],
                "correctAnswer": ["a", "c"]
            },
            {
                "id": 3,
                "type": "true_false",
                "question": "Yes or no?",
                "options": ["True", "False"],
                "correctAnswer": "true"
            },
            {
                "id": 4,
                "type": "short_answer",
                "question": "Explain.",
                "correctAnswer": "Mentions the key point."
            }
        ]
    }"#;

    #[test]
    fn test_parse_valid_payload() {
        let exam = parse_exam_payload(VALID_PAYLOAD).unwrap();
        assert_eq!(exam.title, "Sample Exam");
        assert_eq!(exam.questions.len(), 4);
    }

    #[test]
    fn test_parse_payload_with_code_fences() {
        let fenced = format!("```json\n{}\n```", VALID_PAYLOAD);
        let exam = parse_exam_payload(&fenced).unwrap();
        assert_eq!(exam.questions.len(), 4);
    }

    #[test]
    fn test_true_false_normalization() {
        // 无论模型返回什么大小写/空白，规范化后都必须是精确的 "True"/"False"
        for raw in ["true", "TRUE", " True ", "tRuE"] {
            let payload = format!(
                r#"{{
                    "title": "t",
                    "questions": [{{
                        "id": 1,
                        "type": "true_false",
                        "question": "q",
                        "options": ["yes", "no"],
                        "correctAnswer": "{}"
                    }}]
                }}"#,
                raw
            );
            let exam = parse_exam_payload(&payload).unwrap();
            let q = &exam.questions[0];
            assert_eq!(
                q.option_list(),
                &["True".to_string(), "False".to_string()]
            );
            assert_eq!(q.correct_answer.as_single(), Some("True"));
        }

        let payload = r#"{
            "title": "t",
            "questions": [{
                "id": 1,
                "type": "true_false",
                "question": "q",
                "correctAnswer": "FALSE "
            }]
        }"#;
        let exam = parse_exam_payload(payload).unwrap();
        assert_eq!(exam.questions[0].correct_answer.as_single(), Some("False"));
    }

    #[test]
    fn test_reject_invalid_json() {
        assert!(parse_exam_payload("not json at all").is_err());
    }

    #[test]
    fn test_reject_empty_question_list() {
        let payload = r#"{ "title": "t", "questions": [] }"#;
        assert!(parse_exam_payload(payload).is_err());
    }

    #[test]
    fn test_reject_wrong_correct_answer_type_for_multi_select() {
        // 多选题 correctAnswer 为单个字符串时应拒绝
        let payload = r#"{
            "title": "t",
            "questions": [{
                "id": 1,
                "type": "multiple_select",
                "question": "q",
                "options": ["a", "b", "c"],
                "correctAnswer": "a"
            }]
        }"#;
        assert!(parse_exam_payload(payload).is_err());
    }

    #[test]
    fn test_reject_multi_select_with_single_correct_option() {
        let payload = r#"{
            "title": "t",
            "questions": [{
                "id": 1,
                "type": "multiple_select",
                "question": "q",
                "options": ["a", "b", "c"],
                "correctAnswer": ["a"]
            }]
        }"#;
        assert!(parse_exam_payload(payload).is_err());
    }

    #[test]
    fn test_reject_correct_answer_outside_options() {
        let payload = r#"{
            "title": "t",
            "questions": [{
                "id": 1,
                "type": "multiple_choice",
                "question": "q",
                "options": ["a", "b"],
                "correctAnswer": "z"
            }]
        }"#;
        assert!(parse_exam_payload(payload).is_err());
    }

    #[test]
    fn test_reject_duplicate_ids() {
        let payload = r#"{
            "title": "t",
            "questions": [
                {
                    "id": 1,
                    "type": "multiple_choice",
                    "question": "q1",
                    "options": ["a", "b"],
                    "correctAnswer": "a"
                },
                {
                    "id": 1,
                    "type": "multiple_choice",
                    "question": "q2",
                    "options": ["a", "b"],
                    "correctAnswer": "b"
                }
            ]
        }"#;
        assert!(parse_exam_payload(payload).is_err());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        // 缺少 correctAnswer
        let payload = r#"{
            "title": "t",
            "questions": [{
                "id": 1,
                "type": "multiple_choice",
                "question": "q",
                "options": ["a", "b"]
            }]
        }"#;
        assert!(parse_exam_payload(payload).is_err());
    }
}
