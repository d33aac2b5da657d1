//! 作答数据结构
//!
//! 每道题对应一条作答记录：value 字段只由会话写入，
//! is_correct / feedback / score 只由评分引擎写入

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::exam::{Question, QuestionType};

/// 作答内容
///
/// 多选题为字符串集合，其余题型为单个字符串
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Multiple(Vec<String>),
}

impl AnswerValue {
    /// 按题型创建空白作答
    pub fn empty_for(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::MultipleSelect => AnswerValue::Multiple(Vec::new()),
            _ => AnswerValue::Single(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Single(s) => s.is_empty(),
            AnswerValue::Multiple(items) => items.is_empty(),
        }
    }

    /// 以集合形式返回多选作答；非数组形式按空集处理
    pub fn as_set(&self) -> HashSet<&str> {
        match self {
            AnswerValue::Multiple(items) => items.iter().map(|s| s.as_str()).collect(),
            AnswerValue::Single(_) => HashSet::new(),
        }
    }

    /// 作答文本（简答题评分与结果展示用）
    pub fn as_text(&self) -> String {
        match self {
            AnswerValue::Single(s) => s.clone(),
            AnswerValue::Multiple(items) => items.join(", "),
        }
    }
}

/// 一道题的作答记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnswer {
    #[serde(rename = "questionId")]
    pub question_id: i64,
    /// 作答内容（会话期间由用户覆盖写入）
    #[serde(rename = "answer")]
    pub value: AnswerValue,
    /// 是否答对（评分后写入）
    #[serde(rename = "isCorrect", default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    /// 简答题的 AI 评语（评分后写入）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// 简答题得分 0-100（评分后写入；缺席表示尚未评分）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl UserAnswer {
    /// 按题目创建空白作答记录
    pub fn empty(question: &Question) -> Self {
        Self {
            question_id: question.id,
            value: AnswerValue::empty_for(question.question_type),
            is_correct: None,
            feedback: None,
            score: None,
        }
    }
}
