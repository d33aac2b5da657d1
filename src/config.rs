use serde::Deserialize;
use tracing::warn;

/// 配置文件名（可选，不存在时退回环境变量）
const CONFIG_FILE: &str = "repo_exam.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 仓库内容 API 根地址
    pub github_api_base_url: String,
    /// 文档扩展名过滤（不区分大小写）
    pub document_extension: String,
    /// 目录递归最大深度（含根目录）
    pub max_scan_depth: usize,
    /// 每次子目录请求前的固定等待毫秒数（远端限流）
    pub dir_fetch_delay_ms: u64,
    /// 期望生成的题目数量
    pub question_count: usize,
    /// 同时进行的简答题评分数量
    pub max_concurrent_gradings: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_api_base_url: "https://api.github.com/repos".to_string(),
            document_extension: ".md".to_string(),
            max_scan_depth: 3,
            dir_fetch_delay_ms: 100,
            question_count: 20,
            max_concurrent_gradings: 8,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai"
                .to_string(),
            llm_model_name: "gemini-2.5-flash".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            github_api_base_url: std::env::var("GITHUB_API_BASE_URL")
                .unwrap_or(default.github_api_base_url),
            document_extension: std::env::var("DOCUMENT_EXTENSION")
                .unwrap_or(default.document_extension),
            max_scan_depth: std::env::var("MAX_SCAN_DEPTH").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_scan_depth),
            dir_fetch_delay_ms: std::env::var("DIR_FETCH_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.dir_fetch_delay_ms),
            question_count: std::env::var("QUESTION_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.question_count),
            max_concurrent_gradings: std::env::var("MAX_CONCURRENT_GRADINGS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_gradings),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }

    /// 加载配置：优先读取 TOML 配置文件，失败或不存在时退回环境变量
    pub fn load() -> Self {
        match std::fs::read_to_string(CONFIG_FILE) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("配置文件 {} 解析失败，使用环境变量配置: {}", CONFIG_FILE, e);
                    Self::from_env()
                }
            },
            Err(_) => Self::from_env(),
        }
    }
}
