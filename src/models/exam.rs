//! 试卷数据结构
//!
//! 试卷由出题服务一次性创建，创建后不再修改
//! （唯一例外是判断题的规范化处理，见出题服务）

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    /// 单选题
    #[serde(rename = "multiple_choice")]
    MultipleChoice,
    /// 多选题
    #[serde(rename = "multiple_select")]
    MultipleSelect,
    /// 简答题
    #[serde(rename = "short_answer")]
    ShortAnswer,
    /// 判断题
    #[serde(rename = "true_false")]
    TrueFalse,
}

impl QuestionType {
    /// 是否可在本地直接判分（非简答题）
    pub fn is_objective(&self) -> bool {
        !matches!(self, QuestionType::ShortAnswer)
    }

    /// 显示用标签
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "单选题",
            QuestionType::MultipleSelect => "多选题",
            QuestionType::ShortAnswer => "简答题",
            QuestionType::TrueFalse => "判断题",
        }
    }
}

/// 标准答案
///
/// 单选/判断题为单个字符串，多选题为字符串数组，
/// 简答题为评分标准文本；其他 JSON 类型视为结构不合法
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Single(String),
    Multiple(Vec<String>),
}

impl CorrectAnswer {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            CorrectAnswer::Single(s) => Some(s),
            CorrectAnswer::Multiple(_) => None,
        }
    }

    /// 以集合形式返回多选答案；非数组形式按空集处理
    pub fn multi_set(&self) -> HashSet<&str> {
        match self {
            CorrectAnswer::Multiple(items) => items.iter().map(|s| s.as_str()).collect(),
            CorrectAnswer::Single(_) => HashSet::new(),
        }
    }

    /// 显示用文本（多选答案以逗号连接）
    pub fn display_text(&self) -> String {
        match self {
            CorrectAnswer::Single(s) => s.clone(),
            CorrectAnswer::Multiple(items) => items.join(", "),
        }
    }
}

/// 单个题目
///
/// id 在试卷内唯一且终身不变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// 题干
    #[serde(rename = "question")]
    pub prompt: String,
    /// 选项列表（单选/多选/判断题必有，简答题无）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: CorrectAnswer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// 选项列表（无选项时返回空切片）
    pub fn option_list(&self) -> &[String] {
        self.options.as_deref().unwrap_or(&[])
    }
}

/// 一份完整试卷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_wire_names() {
        let t: QuestionType = serde_json::from_str(r#""multiple_choice""#).unwrap();
        assert_eq!(t, QuestionType::MultipleChoice);
        let t: QuestionType = serde_json::from_str(r#""true_false""#).unwrap();
        assert_eq!(t, QuestionType::TrueFalse);
        assert_eq!(
            serde_json::to_string(&QuestionType::MultipleSelect).unwrap(),
            r#""multiple_select""#
        );
    }

    #[test]
    fn test_correct_answer_string_or_array() {
        let single: CorrectAnswer = serde_json::from_str(r#""Paris""#).unwrap();
        assert_eq!(single, CorrectAnswer::Single("Paris".to_string()));

        let multi: CorrectAnswer = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(
            multi,
            CorrectAnswer::Multiple(vec!["a".to_string(), "b".to_string()])
        );

        // 其他 JSON 类型应当解析失败
        assert!(serde_json::from_str::<CorrectAnswer>("42").is_err());
        assert!(serde_json::from_str::<CorrectAnswer>("{}").is_err());
    }

    #[test]
    fn test_multi_set_coerces_single_to_empty() {
        let single = CorrectAnswer::Single("a".to_string());
        assert!(single.multi_set().is_empty());
    }

    #[test]
    fn test_question_deserialization() {
        let json = r#"{
            "id": 1,
            "type": "multiple_choice",
            "question": "1 + 1 = ?",
            "options": ["1", "2", "3", "4"],
            "correctAnswer": "2",
            "explanation": "basic arithmetic"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id, 1);
        assert_eq!(q.question_type, QuestionType::MultipleChoice);
        assert_eq!(q.option_list().len(), 4);
        assert_eq!(q.correct_answer.as_single(), Some("2"));
    }

    #[test]
    fn test_question_without_options() {
        let json = r#"{
            "id": 7,
            "type": "short_answer",
            "question": "Explain ownership.",
            "correctAnswer": "Mentions move semantics and borrowing."
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert!(q.options.is_none());
        assert!(q.option_list().is_empty());
        assert!(q.explanation.is_none());
    }
}
