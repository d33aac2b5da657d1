//! 仓库内容数据结构
//!
//! 仓库引用、文件清单条目和已下载的文档文本

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppResult, ValidationError};

/// 仓库引用（owner + 仓库名）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// 解析用户输入的仓库 URL
///
/// 只接受 `https://host/{owner}/{repo}[...]` 形式，
/// 在发起任何网络请求之前完成校验
pub fn parse_repo_url(input: &str) -> AppResult<RepoRef> {
    let input = input.trim();
    let re = Regex::new(r"^https://[^/\s]+/([^/\s]+)/([^/\s]+)")
        .expect("仓库 URL 正则表达式不合法");

    match re.captures(input) {
        Some(caps) => Ok(RepoRef {
            owner: caps[1].to_string(),
            repo: caps[2].trim_end_matches(".git").to_string(),
        }),
        None => Err(ValidationError::InvalidRepoUrl {
            input: input.to_string(),
        }
        .into()),
    }
}

/// 仓库文件清单条目
///
/// 对应内容 API 返回数组中的一项；目录条目的 download_url 为空
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoFileRef {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

impl RepoFileRef {
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }

    pub fn is_dir(&self) -> bool {
        self.kind == "dir"
    }

    /// 扩展名匹配（不区分大小写）
    pub fn matches_extension(&self, extension: &str) -> bool {
        self.name
            .to_lowercase()
            .ends_with(&extension.to_lowercase())
    }
}

/// 已下载的文档文本
///
/// 获取后不再修改，仅供出题服务消费
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub content: String,
}
