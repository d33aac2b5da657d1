//! 应用阶段状态机 - 流程层
//!
//! 整个应用的生命周期用一个带数据的枚举表达：
//! 每个阶段只携带该阶段合法的数据，"进行中却没有试卷"
//! 这类非法组合在类型层面就不可能出现。
//! 所有阶段切换都经过本模块的转移方法，非法转移返回错误而不是 panic。

use crate::error::SessionError;
use crate::models::{Exam, RepoFileRef, UserAnswer};
use crate::workflow::session::ExamSession;

/// 应用所处的阶段
#[derive(Debug)]
pub enum Phase {
    /// 等待用户输入仓库地址
    AwaitingContent,
    /// 文件清单已就绪，等待用户选择
    SelectingFiles { files: Vec<RepoFileRef> },
    /// 正在出题（保留清单以便失败后重选）
    Generating { files: Vec<RepoFileRef> },
    /// 考试进行中
    InProgress { session: ExamSession },
    /// 已交卷，作答集合已冻结
    Submitted {
        exam: Exam,
        answers: Vec<UserAnswer>,
    },
}

/// 阶段标签（无数据的快照，供调度分派使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    AwaitingContent,
    SelectingFiles,
    Generating,
    InProgress,
    Submitted,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::AwaitingContent => PhaseKind::AwaitingContent,
            Phase::SelectingFiles { .. } => PhaseKind::SelectingFiles,
            Phase::Generating { .. } => PhaseKind::Generating,
            Phase::InProgress { .. } => PhaseKind::InProgress,
            Phase::Submitted { .. } => PhaseKind::Submitted,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind() {
            PhaseKind::AwaitingContent => "AwaitingContent",
            PhaseKind::SelectingFiles => "SelectingFiles",
            PhaseKind::Generating => "Generating",
            PhaseKind::InProgress => "InProgress",
            PhaseKind::Submitted => "Submitted",
        }
    }
}

/// 应用阶段状态机
#[derive(Debug)]
pub struct ExamFlow {
    phase: Phase,
}

impl Default for ExamFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamFlow {
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitingContent,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_name(&self) -> &'static str {
        self.phase.name()
    }

    /// 当前阶段持有的文件清单（选择/出题阶段）
    pub fn files(&self) -> Option<&[RepoFileRef]> {
        match &self.phase {
            Phase::SelectingFiles { files } | Phase::Generating { files } => Some(files),
            _ => None,
        }
    }

    /// 考试进行中的会话
    pub fn session_mut(&mut self) -> Option<&mut ExamSession> {
        match &mut self.phase {
            Phase::InProgress { session } => Some(session),
            _ => None,
        }
    }

    /// 已交卷阶段的试卷与作答集合
    pub fn submitted(&self) -> Option<(&Exam, &[UserAnswer])> {
        match &self.phase {
            Phase::Submitted { exam, answers } => Some((exam, answers)),
            _ => None,
        }
    }

    /// 文档清单就绪：等待输入 → 选择文件
    ///
    /// 空清单不构成转移（调用方应提示用户换一个仓库）
    pub fn documents_listed(&mut self, files: Vec<RepoFileRef>) -> Result<(), SessionError> {
        if files.is_empty() {
            return Err(self.invalid("documents_listed"));
        }
        match self.phase {
            Phase::AwaitingContent => {
                self.phase = Phase::SelectingFiles { files };
                Ok(())
            }
            _ => Err(self.invalid("documents_listed")),
        }
    }

    /// 返回仓库输入：选择文件 → 等待输入，丢弃清单
    pub fn back_to_input(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::SelectingFiles { .. } => {
                self.phase = Phase::AwaitingContent;
                Ok(())
            }
            _ => Err(self.invalid("back_to_input")),
        }
    }

    /// 用户确认选择：选择文件 → 出题中（清单保留）
    pub fn selection_confirmed(&mut self) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.phase, Phase::AwaitingContent) {
            Phase::SelectingFiles { files } => {
                self.phase = Phase::Generating { files };
                Ok(())
            }
            other => {
                self.phase = other;
                Err(self.invalid("selection_confirmed"))
            }
        }
    }

    /// 出题成功：出题中 → 考试进行中
    ///
    /// 会话初始化：每题一条空白作答、计算时间预算、指针归零
    pub fn generation_succeeded(&mut self, exam: Exam) -> Result<(), SessionError> {
        match self.phase {
            Phase::Generating { .. } => {
                self.phase = Phase::InProgress {
                    session: ExamSession::new(exam),
                };
                Ok(())
            }
            _ => Err(self.invalid("generation_succeeded")),
        }
    }

    /// 出题失败：出题中 → 选择文件（清单原样保留，用户可重选）
    pub fn generation_failed(&mut self) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.phase, Phase::AwaitingContent) {
            Phase::Generating { files } => {
                self.phase = Phase::SelectingFiles { files };
                Ok(())
            }
            other => {
                self.phase = other;
                Err(self.invalid("generation_failed"))
            }
        }
    }

    /// 交卷落定：考试进行中（已交卷）→ 已交卷
    ///
    /// 作答集合从会话中移出并冻结，交给评分引擎
    pub fn finalize_submission(&mut self) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.phase, Phase::AwaitingContent) {
            Phase::InProgress { session } if session.is_submitted() => {
                let (exam, answers) = session.into_parts();
                self.phase = Phase::Submitted { exam, answers };
                Ok(())
            }
            other => {
                self.phase = other;
                Err(self.invalid("finalize_submission"))
            }
        }
    }

    /// 评分引擎写回评分结果（仅已交卷阶段）
    pub fn apply_grades(&mut self, graded: Vec<UserAnswer>) -> Result<(), SessionError> {
        match &mut self.phase {
            Phase::Submitted { answers, .. } => {
                *answers = graded;
                Ok(())
            }
            _ => Err(self.invalid("apply_grades")),
        }
    }

    /// 重新开始：已交卷 → 等待输入，丢弃试卷、作答和文件清单
    pub fn restart(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Submitted { .. } => {
                self.phase = Phase::AwaitingContent;
                Ok(())
            }
            _ => Err(self.invalid("restart")),
        }
    }

    fn invalid(&self, event: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.phase_name(),
            event,
        }
    }
}
