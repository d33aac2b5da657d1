//! 交互式应用 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，按当前阶段驱动完整的考试流程：
//!
//! 1. **输入仓库**：校验 URL（不合法时不发起任何网络请求）、扫描文档
//! 2. **选择文件**：展示清单、解析用户选择
//! 3. **出题**：下载选中文件、调用出题服务；失败退回选择阶段
//! 4. **考试**：答题循环，stdin 输入与 1 秒时钟并发等待，
//!    到时自动交卷；离开考试阶段后时钟随循环一起结束
//! 5. **评分与报告**：调用评分引擎、渲染报告、等待重新开始
//!
//! ## 设计特点
//!
//! - **单一状态消费者**：所有阶段切换都经过 ExamFlow
//! - **向下委托**：具体能力全部委托给 services

use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{parse_repo_url, AnswerValue, Question, QuestionType, RepoFileRef};
use crate::presentation::{report, taker};
use crate::services::grading_service;
use crate::services::{DocumentService, ExamService, GradingService};
use crate::utils::logging;
use crate::workflow::{ExamFlow, ExamSession, PhaseKind};

/// 应用主结构
pub struct App {
    document_service: DocumentService,
    exam_service: ExamService,
    grading_service: GradingService,
    flow: ExamFlow,
    /// 用户确认出题的文件子集（仅在出题阶段使用）
    selected_files: Vec<RepoFileRef>,
    input: Lines<BufReader<Stdin>>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        logging::log_startup(&config.llm_model_name);

        Self {
            document_service: DocumentService::new(&config),
            exam_service: ExamService::new(&config),
            grading_service: GradingService::new(&config),
            flow: ExamFlow::new(),
            selected_files: Vec::new(),
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// 运行应用主循环
    pub async fn run(&mut self) -> Result<()> {
        info!("💡 随时输入 :quit 退出");

        loop {
            let kind = self.flow.phase().kind();
            let proceed = match kind {
                PhaseKind::AwaitingContent => self.step_await_content().await?,
                PhaseKind::SelectingFiles => self.step_select_files().await?,
                PhaseKind::Generating => self.step_generate().await?,
                PhaseKind::InProgress => self.step_take_exam().await?,
                PhaseKind::Submitted => self.step_review().await?,
            };
            if !proceed {
                break;
            }
        }

        info!("👋 再见");
        Ok(())
    }

    /// 阶段一：等待用户输入仓库 URL
    async fn step_await_content(&mut self) -> Result<bool> {
        println!("\n请输入公开仓库 URL（如 https://github.com/owner/repo）:");

        let Some(line) = self.input.next_line().await? else {
            return Ok(false);
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            return Ok(true);
        }
        if line == ":quit" || line == ":q" {
            return Ok(false);
        }

        // URL 校验失败时不发起任何网络请求，也不发生阶段转移
        let repo = match parse_repo_url(&line) {
            Ok(repo) => repo,
            Err(e) => {
                error!("❌ {}", e);
                return Ok(true);
            }
        };

        info!("🔍 正在扫描仓库 {} 的文档...", repo);
        let files = self.document_service.list_documents(&repo).await;
        if files.is_empty() {
            warn!("⚠️ 仓库中没有找到匹配的文档文件，请换一个仓库");
            return Ok(true);
        }

        info!("✓ 找到 {} 个文档文件", files.len());
        self.flow.documents_listed(files)?;
        Ok(true)
    }

    /// 阶段二：选择出题文件
    async fn step_select_files(&mut self) -> Result<bool> {
        if let Some(files) = self.flow.files() {
            println!("\n可选文档:");
            for (index, file) in files.iter().enumerate() {
                println!("  {}. {}", index + 1, file.path);
            }
        }
        println!("\n输入要出题的文件编号（如 1,3,5 或 all），:back 返回:");

        let Some(line) = self.input.next_line().await? else {
            return Ok(false);
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "" => Ok(true),
            ":quit" | ":q" => Ok(false),
            ":back" => {
                self.flow.back_to_input()?;
                Ok(true)
            }
            _ => {
                let selection = self
                    .flow
                    .files()
                    .map(|files| parse_selection(&line, files))
                    .unwrap_or_else(|| Ok(Vec::new()));

                match selection {
                    Ok(selected) if !selected.is_empty() => {
                        info!("✓ 已选择 {} 个文件", selected.len());
                        self.selected_files = selected;
                        self.flow.selection_confirmed()?;
                    }
                    Ok(_) => error!("❌ 未选择任何文件"),
                    Err(msg) => error!("❌ {}", msg),
                }
                Ok(true)
            }
        }
    }

    /// 阶段三：下载选中文件并出题
    async fn step_generate(&mut self) -> Result<bool> {
        info!("📥 正在下载 {} 个选中文件...", self.selected_files.len());

        let documents = match self
            .document_service
            .fetch_documents(&self.selected_files)
            .await
        {
            Ok(documents) => documents,
            Err(e) => {
                // 选中文件下载失败对本次出题是致命的，退回文件选择
                error!("❌ 获取文件内容失败: {}", e);
                self.flow.generation_failed()?;
                return Ok(true);
            }
        };

        match self.exam_service.author_exam(&documents).await {
            Ok(exam) => self.flow.generation_succeeded(exam)?,
            Err(e) => {
                error!("❌ 出题失败: {}", e);
                self.flow.generation_failed()?;
            }
        }
        Ok(true)
    }

    /// 阶段四：答题循环
    async fn step_take_exam(&mut self) -> Result<bool> {
        if let Some(session) = self.flow.session_mut() {
            info!(
                "📝 考试开始: 《{}》 共 {} 题，限时 {}",
                session.exam().title,
                session.question_count(),
                taker::format_time(session.remaining_secs())
            );
            Self::exam_loop(session, &mut self.input).await;
        }

        self.flow.finalize_submission()?;
        Ok(true)
    }

    /// 答题内层循环：stdin 输入与 1 秒时钟并发等待
    ///
    /// 循环退出即离开考试阶段，时钟随之停止
    async fn exam_loop(session: &mut ExamSession, input: &mut Lines<BufReader<Stdin>>) {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval 的第一次 tick 立即到期，先消费掉
        interval.tick().await;

        println!("{}", taker::render_question(session));

        while !session.is_submitted() {
            tokio::select! {
                _ = interval.tick() => {
                    if session.tick() {
                        println!("\n⏰ 时间到，自动交卷");
                    } else if session.remaining_secs() == 60 {
                        println!("\n⏳ 剩余 1 分钟");
                    }
                }
                line = input.next_line() => {
                    match line {
                        Ok(Some(line)) => Self::handle_exam_input(session, line.trim()),
                        // EOF 或读取失败：按交卷处理
                        _ => {
                            session.submit();
                        }
                    }
                }
            }
        }
    }

    /// 处理答题期间的一行输入
    fn handle_exam_input(session: &mut ExamSession, line: &str) {
        match line {
            "" => return,
            ":submit" | ":s" => {
                if session.submit() {
                    info!("📤 已交卷");
                }
                return;
            }
            ":n" | ":next" => session.next(),
            ":p" | ":prev" => session.previous(),
            _ => {
                let value = parse_answer_input(session.current_question(), line);
                match value {
                    Ok(value) => {
                        let question_id = session.current_question().id;
                        if let Err(e) = session.record_answer(question_id, value) {
                            warn!("⚠️ {}", e);
                        }
                    }
                    Err(msg) => warn!("⚠️ {}", msg),
                }
            }
        }

        if !session.is_submitted() {
            println!("{}", taker::render_question(session));
        }
    }

    /// 阶段五：评分、渲染报告、等待重新开始
    async fn step_review(&mut self) -> Result<bool> {
        let graded = {
            let Some((exam, answers)) = self.flow.submitted() else {
                return Ok(true);
            };

            info!("🤖 正在评分（简答题将并发请求远端评分）...");
            let graded = self.grading_service.grade(exam, answers.to_vec()).await;

            let score = grading_service::aggregate(exam, &graded);
            println!("{}", report::render_report(exam, &graded, &score));
            graded
        };
        self.flow.apply_grades(graded)?;

        loop {
            println!("\n输入 :restart 重新开始，:quit 退出:");
            let Some(line) = self.input.next_line().await? else {
                return Ok(false);
            };
            match line.trim() {
                ":restart" | ":r" => {
                    self.flow.restart()?;
                    return Ok(true);
                }
                ":quit" | ":q" => return Ok(false),
                _ => {}
            }
        }
    }
}

/// 解析文件选择输入（1 开始的编号列表或 all）
fn parse_selection(line: &str, files: &[RepoFileRef]) -> Result<Vec<RepoFileRef>, String> {
    if line.eq_ignore_ascii_case("all") {
        return Ok(files.to_vec());
    }

    let mut selected: Vec<RepoFileRef> = Vec::new();
    for part in line.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let index: usize = part
            .parse()
            .map_err(|_| format!("无法识别的编号: '{}'", part))?;
        if index == 0 || index > files.len() {
            return Err(format!("编号 {} 超出范围 [1, {}]", index, files.len()));
        }
        let file = files[index - 1].clone();
        if !selected.iter().any(|f| f.path == file.path) {
            selected.push(file);
        }
    }
    Ok(selected)
}

/// 把一行输入解析为当前题目的作答内容
fn parse_answer_input(question: &Question, line: &str) -> Result<AnswerValue, String> {
    let options = question.option_list();
    match question.question_type {
        QuestionType::MultipleChoice | QuestionType::TrueFalse => {
            let index: usize = line
                .parse()
                .map_err(|_| format!("请输入 1-{} 的选项编号", options.len()))?;
            if index == 0 || index > options.len() {
                return Err(format!("编号 {} 超出范围 [1, {}]", index, options.len()));
            }
            Ok(AnswerValue::Single(options[index - 1].clone()))
        }
        QuestionType::MultipleSelect => {
            let mut values: Vec<String> = Vec::new();
            for part in line.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let index: usize = part
                    .parse()
                    .map_err(|_| format!("无法识别的编号: '{}'", part))?;
                if index == 0 || index > options.len() {
                    return Err(format!("编号 {} 超出范围 [1, {}]", index, options.len()));
                }
                let option = options[index - 1].clone();
                if !values.contains(&option) {
                    values.push(option);
                }
            }
            Ok(AnswerValue::Multiple(values))
        }
        QuestionType::ShortAnswer => Ok(AnswerValue::Single(line.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CorrectAnswer;

    fn file(name: &str) -> RepoFileRef {
        RepoFileRef {
            name: name.to_string(),
            path: name.to_string(),
            download_url: Some(format!("https://example.com/raw/{}", name)),
            kind: "file".to_string(),
        }
    }

    fn question(question_type: QuestionType, options: Option<Vec<&str>>) -> Question {
        Question {
            id: 1,
            question_type,
            prompt: "q".to_string(),
            options: options.map(|o| o.into_iter().map(String::from).collect()),
            correct_answer: CorrectAnswer::Single("a".to_string()),
            explanation: None,
        }
    }

    #[test]
    fn test_parse_selection_indices() {
        let files = vec![file("a.md"), file("b.md"), file("c.md")];
        let selected = parse_selection("1,3", &files).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].name, "a.md");
        assert_eq!(selected[1].name, "c.md");
    }

    #[test]
    fn test_parse_selection_all_and_duplicates() {
        let files = vec![file("a.md"), file("b.md")];
        assert_eq!(parse_selection("all", &files).unwrap().len(), 2);
        assert_eq!(parse_selection("ALL", &files).unwrap().len(), 2);
        // 重复编号去重
        assert_eq!(parse_selection("1,1,2", &files).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_selection_out_of_range() {
        let files = vec![file("a.md")];
        assert!(parse_selection("2", &files).is_err());
        assert!(parse_selection("0", &files).is_err());
        assert!(parse_selection("x", &files).is_err());
    }

    #[test]
    fn test_parse_answer_input_single_choice() {
        let q = question(QuestionType::MultipleChoice, Some(vec!["a", "b", "c"]));
        assert_eq!(
            parse_answer_input(&q, "2").unwrap(),
            AnswerValue::Single("b".to_string())
        );
        assert!(parse_answer_input(&q, "4").is_err());
        assert!(parse_answer_input(&q, "hello").is_err());
    }

    #[test]
    fn test_parse_answer_input_multi_select() {
        let q = question(QuestionType::MultipleSelect, Some(vec!["a", "b", "c"]));
        assert_eq!(
            parse_answer_input(&q, "1, 3").unwrap(),
            AnswerValue::Multiple(vec!["a".to_string(), "c".to_string()])
        );
        // 重复编号只记一次
        assert_eq!(
            parse_answer_input(&q, "1,1").unwrap(),
            AnswerValue::Multiple(vec!["a".to_string()])
        );
    }

    #[test]
    fn test_parse_answer_input_short_answer_is_verbatim() {
        let q = question(QuestionType::ShortAnswer, None);
        assert_eq!(
            parse_answer_input(&q, "my answer: 42").unwrap(),
            AnswerValue::Single("my answer: 42".to_string())
        );
    }
}
