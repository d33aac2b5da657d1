use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 内容源（仓库 API）错误
    Retrieval(RetrievalError),
    /// 出题服务错误
    Generation(GenerationError),
    /// 评分服务错误
    Grading(GradingError),
    /// 用户输入校验错误
    Validation(ValidationError),
    /// 会话状态机错误
    Session(SessionError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Retrieval(e) => write!(f, "内容源错误: {}", e),
            AppError::Generation(e) => write!(f, "出题错误: {}", e),
            AppError::Grading(e) => write!(f, "评分错误: {}", e),
            AppError::Validation(e) => write!(f, "输入校验错误: {}", e),
            AppError::Session(e) => write!(f, "会话错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Retrieval(e) => Some(e),
            AppError::Generation(e) => Some(e),
            AppError::Grading(e) => Some(e),
            AppError::Validation(e) => Some(e),
            AppError::Session(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 内容源（仓库 API）错误
#[derive(Debug)]
pub enum RetrievalError {
    /// 网络请求失败
    RequestFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 远端返回非成功状态码
    BadStatus {
        url: String,
        status: u16,
    },
    /// 响应体解析失败
    BodyParseFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalError::RequestFailed { url, source } => {
                write!(f, "请求失败 ({}): {}", url, source)
            }
            RetrievalError::BadStatus { url, status } => {
                write!(f, "远端返回错误状态码 {} ({})", status, url)
            }
            RetrievalError::BodyParseFailed { url, source } => {
                write!(f, "响应体解析失败 ({}): {}", url, source)
            }
        }
    }
}

impl std::error::Error for RetrievalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetrievalError::RequestFailed { source, .. }
            | RetrievalError::BodyParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            RetrievalError::BadStatus { .. } => None,
        }
    }
}

/// 出题服务错误
#[derive(Debug)]
pub enum GenerationError {
    /// 模型 API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 模型返回为空
    EmptyResponse {
        model: String,
    },
    /// 返回内容无法解析为 JSON
    JsonParseFailed {
        snippet: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容不符合试卷结构约束
    SchemaMismatch {
        question_id: Option<i64>,
        reason: String,
    },
    /// 生成的试卷不包含任何题目
    NoQuestions,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::ApiCallFailed { model, source } => {
                write!(f, "模型 API 调用失败 (模型: {}): {}", model, source)
            }
            GenerationError::EmptyResponse { model } => {
                write!(f, "模型返回为空 (模型: {})", model)
            }
            GenerationError::JsonParseFailed { snippet, source } => {
                write!(
                    f,
                    "模型返回内容无法解析为 JSON (片段: {}): {}",
                    snippet, source
                )
            }
            GenerationError::SchemaMismatch {
                question_id,
                reason,
            } => match question_id {
                Some(id) => write!(f, "题目 {} 不符合结构约束: {}", id, reason),
                None => write!(f, "试卷不符合结构约束: {}", reason),
            },
            GenerationError::NoQuestions => write!(f, "生成的试卷不包含任何题目"),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::ApiCallFailed { source, .. }
            | GenerationError::JsonParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 评分服务错误
///
/// 该类错误永远不会离开评分引擎：评分引擎会将其降级为 0 分兜底结果
#[derive(Debug)]
pub enum GradingError {
    /// 模型 API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容无法解析为 JSON
    JsonParseFailed {
        snippet: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容不符合评分结构约束
    SchemaMismatch {
        reason: String,
    },
}

impl fmt::Display for GradingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingError::ApiCallFailed { model, source } => {
                write!(f, "评分 API 调用失败 (模型: {}): {}", model, source)
            }
            GradingError::JsonParseFailed { snippet, source } => {
                write!(f, "评分结果无法解析为 JSON (片段: {}): {}", snippet, source)
            }
            GradingError::SchemaMismatch { reason } => {
                write!(f, "评分结果不符合结构约束: {}", reason)
            }
        }
    }
}

impl std::error::Error for GradingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GradingError::ApiCallFailed { source, .. }
            | GradingError::JsonParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            GradingError::SchemaMismatch { .. } => None,
        }
    }
}

/// 用户输入校验错误
#[derive(Debug)]
pub enum ValidationError {
    /// 仓库 URL 格式不合法
    InvalidRepoUrl {
        input: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidRepoUrl { input } => {
                write!(
                    f,
                    "仓库 URL 不合法: '{}' (应形如 https://github.com/{{owner}}/{{repo}})",
                    input
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// 会话状态机错误
#[derive(Debug)]
pub enum SessionError {
    /// 当前阶段不允许该操作
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },
    /// 作答的题目不是当前题目
    NotCurrentQuestion {
        question_id: i64,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidTransition { from, event } => {
                write!(f, "阶段 {} 不允许操作 {}", from, event)
            }
            SessionError::NotCurrentQuestion { question_id } => {
                write!(f, "题目 {} 不是当前题目，无法作答", question_id)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件解析失败
    FileParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileParseFailed { path, source } => {
                write!(f, "配置文件解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::FileParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        AppError::Retrieval(err)
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        AppError::Generation(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建仓库请求失败错误
    pub fn retrieval_request_failed(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::Retrieval(RetrievalError::RequestFailed {
            url: url.into(),
            source: source.into(),
        })
    }

    /// 创建远端状态码错误
    pub fn retrieval_bad_status(url: impl Into<String>, status: u16) -> Self {
        AppError::Retrieval(RetrievalError::BadStatus {
            url: url.into(),
            status,
        })
    }

    /// 创建出题 API 调用错误
    pub fn generation_api_failed(
        model: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::Generation(GenerationError::ApiCallFailed {
            model: model.into(),
            source: source.into(),
        })
    }

    /// 创建试卷结构约束错误
    pub fn generation_schema_mismatch(
        question_id: Option<i64>,
        reason: impl Into<String>,
    ) -> Self {
        AppError::Generation(GenerationError::SchemaMismatch {
            question_id,
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
