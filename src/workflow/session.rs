//! 考试会话 - 流程层
//!
//! 管理一次作答过程：当前题目指针、每题作答缓冲、剩余时间预算、
//! 交卷标记。交卷（手动或到时）之后所有作答内容冻结。
//!
//! 到时提交必须恰好发生一次：tick 与手动交卷竞争时以先到者为准，
//! 之后的 tick 不再产生第二次提交

use crate::error::SessionError;
use crate::models::{AnswerValue, Exam, Question, QuestionType, UserAnswer};

/// 每道单选/判断题的时间配额（秒）
const CHOICE_TIME_SECS: u64 = 90;
/// 其他题型的时间配额（秒）
const LONG_TIME_SECS: u64 = 180;
/// 时间预算下限（秒）
const MIN_TIME_BUDGET_SECS: u64 = 300;
/// 时间预算上限（秒）
const MAX_TIME_BUDGET_SECS: u64 = 3600;

/// 计算一份试卷的时间预算（秒）
///
/// 单选/判断题每题 90 秒，其余题型每题 180 秒，
/// 总和收拢到 [300, 3600] 区间
pub fn time_budget_secs(questions: &[Question]) -> u64 {
    let total: u64 = questions
        .iter()
        .map(|q| match q.question_type {
            QuestionType::MultipleChoice | QuestionType::TrueFalse => CHOICE_TIME_SECS,
            _ => LONG_TIME_SECS,
        })
        .sum();
    total.clamp(MIN_TIME_BUDGET_SECS, MAX_TIME_BUDGET_SECS)
}

/// 一次考试会话
///
/// 注意：试卷必须至少包含一道题（出题服务的校验保证了这一点）
#[derive(Debug)]
pub struct ExamSession {
    exam: Exam,
    answers: Vec<UserAnswer>,
    current_index: usize,
    remaining_secs: u64,
    submitted: bool,
}

impl ExamSession {
    /// 进入考试：为每道题创建空白作答，计算时间预算，题目指针归零
    pub fn new(exam: Exam) -> Self {
        let answers = exam.questions.iter().map(UserAnswer::empty).collect();
        let remaining_secs = time_budget_secs(&exam.questions);
        Self {
            exam,
            answers,
            current_index: 0,
            remaining_secs,
            submitted: false,
        }
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.exam.questions[self.current_index]
    }

    pub fn question_count(&self) -> usize {
        self.exam.questions.len()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// 已作答的题目数量
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| !a.value.is_empty()).count()
    }

    /// 查找某道题的作答记录
    pub fn answer_for(&self, question_id: i64) -> Option<&UserAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    /// 下一题（停在最后一题，不越界）
    pub fn next(&mut self) {
        if self.current_index + 1 < self.exam.questions.len() {
            self.current_index += 1;
        }
    }

    /// 上一题（停在第一题，不越界）
    pub fn previous(&mut self) {
        if self.current_index > 0 {
            self.current_index -= 1;
        }
    }

    /// 记录当前题目的作答
    ///
    /// 只允许覆盖当前题目的 value，不与标准答案做任何比对
    pub fn record_answer(
        &mut self,
        question_id: i64,
        value: AnswerValue,
    ) -> Result<(), SessionError> {
        if self.submitted {
            return Err(SessionError::InvalidTransition {
                from: "Submitted",
                event: "record_answer",
            });
        }
        if self.current_question().id != question_id {
            return Err(SessionError::NotCurrentQuestion { question_id });
        }

        if let Some(answer) = self
            .answers
            .iter_mut()
            .find(|a| a.question_id == question_id)
        {
            answer.value = value;
        }
        Ok(())
    }

    /// 时钟走一秒
    ///
    /// 返回 true 表示本次 tick 将剩余时间耗尽并触发了到时交卷；
    /// 已交卷后再 tick 不会产生第二次提交
    pub fn tick(&mut self) -> bool {
        if self.submitted || self.remaining_secs == 0 {
            return false;
        }
        self.remaining_secs -= 1;
        if self.remaining_secs == 0 {
            self.submitted = true;
            return true;
        }
        false
    }

    /// 手动交卷（幂等）
    ///
    /// 返回 true 表示本次调用完成了交卷，false 表示此前已交卷
    pub fn submit(&mut self) -> bool {
        if self.submitted {
            return false;
        }
        self.submitted = true;
        true
    }

    /// 交卷后拆出试卷与冻结的作答集合
    pub fn into_parts(self) -> (Exam, Vec<UserAnswer>) {
        (self.exam, self.answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CorrectAnswer;

    fn question(id: i64, question_type: QuestionType) -> Question {
        Question {
            id,
            question_type,
            prompt: format!("q{}", id),
            options: Some(vec!["a".to_string(), "b".to_string()]),
            correct_answer: CorrectAnswer::Single("a".to_string()),
            explanation: None,
        }
    }

    fn exam_of(questions: Vec<Question>) -> Exam {
        Exam {
            title: "t".to_string(),
            description: String::new(),
            questions,
        }
    }

    #[test]
    fn test_time_budget_sixty_single_choice() {
        let questions: Vec<Question> = (1..=60)
            .map(|id| question(id, QuestionType::MultipleChoice))
            .collect();
        // 60 * 90 = 5400，收拢到上限 3600
        assert_eq!(time_budget_secs(&questions), 3600);
    }

    #[test]
    fn test_time_budget_two_short_answers() {
        let questions = vec![
            question(1, QuestionType::ShortAnswer),
            question(2, QuestionType::ShortAnswer),
        ];
        assert_eq!(time_budget_secs(&questions), 360);
    }

    #[test]
    fn test_time_budget_minimum_clamp() {
        let questions = vec![question(1, QuestionType::TrueFalse)];
        // 90 秒不足下限，收拢到 300
        assert_eq!(time_budget_secs(&questions), 300);
    }

    #[test]
    fn test_true_false_uses_choice_allowance() {
        let questions: Vec<Question> = (1..=4)
            .map(|id| question(id, QuestionType::TrueFalse))
            .collect();
        assert_eq!(time_budget_secs(&questions), 360);
    }

    #[test]
    fn test_new_session_initial_state() {
        let session = ExamSession::new(exam_of(vec![
            question(1, QuestionType::MultipleChoice),
            question(2, QuestionType::ShortAnswer),
        ]));
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.question_count(), 2);
        assert_eq!(session.answered_count(), 0);
        assert!(!session.is_submitted());
        // 90 + 180 = 270，收拢到 300
        assert_eq!(session.remaining_secs(), 300);
    }

    #[test]
    fn test_navigation_clamped_to_bounds() {
        let mut session = ExamSession::new(exam_of(vec![
            question(1, QuestionType::MultipleChoice),
            question(2, QuestionType::MultipleChoice),
        ]));

        session.previous();
        assert_eq!(session.current_index(), 0);

        session.next();
        assert_eq!(session.current_index(), 1);
        session.next();
        assert_eq!(session.current_index(), 1);

        session.previous();
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn test_record_answer_roundtrip() {
        let mut session = ExamSession::new(exam_of(vec![question(
            1,
            QuestionType::MultipleChoice,
        )]));

        session
            .record_answer(1, AnswerValue::Single("b".to_string()))
            .unwrap();
        session.submit();

        let (_, answers) = session.into_parts();
        // 交卷后作答内容与录入时完全一致，无任何隐式转换
        assert_eq!(answers[0].value, AnswerValue::Single("b".to_string()));
    }

    #[test]
    fn test_record_answer_rejects_non_current_question() {
        let mut session = ExamSession::new(exam_of(vec![
            question(1, QuestionType::MultipleChoice),
            question(2, QuestionType::MultipleChoice),
        ]));

        let result = session.record_answer(2, AnswerValue::Single("a".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_record_answer_rejected_after_submit() {
        let mut session = ExamSession::new(exam_of(vec![question(
            1,
            QuestionType::MultipleChoice,
        )]));
        session.submit();
        assert!(session
            .record_answer(1, AnswerValue::Single("a".to_string()))
            .is_err());
    }

    #[test]
    fn test_tick_counts_down_and_forces_single_submission() {
        let mut session = ExamSession::new(exam_of(vec![question(
            1,
            QuestionType::MultipleChoice,
        )]));
        let budget = session.remaining_secs();

        // 走到只剩 1 秒
        for _ in 0..budget - 1 {
            assert!(!session.tick());
        }
        assert_eq!(session.remaining_secs(), 1);

        // 最后一秒触发到时交卷，且只触发一次
        assert!(session.tick());
        assert!(session.is_submitted());
        assert!(!session.tick());
        assert!(!session.tick());
    }

    #[test]
    fn test_manual_submit_then_tick_does_not_resubmit() {
        let mut session = ExamSession::new(exam_of(vec![question(
            1,
            QuestionType::MultipleChoice,
        )]));

        assert!(session.submit());
        // 手动交卷后紧跟的时钟 tick 不得再次触发提交
        assert!(!session.tick());
        // 重复交卷也是幂等的
        assert!(!session.submit());
    }

    #[test]
    fn test_unanswered_questions_keep_empty_default() {
        let mut session = ExamSession::new(exam_of(vec![
            question(1, QuestionType::MultipleChoice),
            question(2, QuestionType::MultipleChoice),
        ]));
        session
            .record_answer(1, AnswerValue::Single("a".to_string()))
            .unwrap();
        session.submit();

        let (_, answers) = session.into_parts();
        assert_eq!(answers[1].value, AnswerValue::Single(String::new()));
    }
}
