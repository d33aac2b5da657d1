//! # Repo Exam
//!
//! 一个把仓库 markdown 文档变成交互式 AI 考试的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 只封装远端 API 调用，不含业务逻辑
//! - `GithubClient` - 仓库内容 API（目录清单、原始文件下载）
//! - `LlmClient` - 生成式模型 API（兼容 OpenAI 接口）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `DocumentService` - 递归发现与并发下载文档能力
//! - `ExamService` - 出题能力（含边界结构校验）
//! - `GradingService` - 评分能力（客观题本地判分 + 简答题远端评分）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义一次考试的完整生命周期
//! - `ExamFlow` - 应用阶段状态机（等待输入 → 选择文件 → 出题 → 考试 → 交卷）
//! - `ExamSession` - 答题会话（题目指针、作答缓冲、时间预算）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 交互式主循环，按阶段驱动整个流程
//!
//! 展示层（`presentation/`）是纯文本渲染，评分结果的只读消费者。
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod presentation;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AnswerValue, CorrectAnswer, Document, Exam, Question, QuestionType, UserAnswer};
pub use orchestrator::App;
pub use services::{DocumentService, ExamService, GradingService, ScoreReport};
pub use workflow::{ExamFlow, ExamSession, Phase};
