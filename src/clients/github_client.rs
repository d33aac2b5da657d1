/// 仓库内容 API 客户端
///
/// 封装所有与仓库内容 API 相关的调用逻辑
use reqwest::header::USER_AGENT;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, RetrievalError};
use crate::models::{RepoFileRef, RepoRef};

/// 请求标识（内容 API 拒绝匿名无 UA 的客户端）
const CLIENT_USER_AGENT: &str = "repo-exam/0.1";

/// 仓库内容 API 客户端
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GithubClient {
    /// 创建新的仓库客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.github_api_base_url.clone(),
        }
    }

    /// 列出仓库某一路径下的条目
    ///
    /// # 参数
    /// - `repo`: 仓库引用
    /// - `path`: 仓库内路径（根目录传空字符串）
    ///
    /// # 返回
    /// 返回该路径下的文件/目录清单；响应体不是数组时返回空清单
    pub async fn list_contents(&self, repo: &RepoRef, path: &str) -> AppResult<Vec<RepoFileRef>> {
        let url = format!(
            "{}/{}/{}/contents/{}",
            self.base_url, repo.owner, repo.repo, path
        );
        debug!("列出仓库内容: {}", url);

        let response = self
            .http
            .get(&url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(|e| AppError::retrieval_request_failed(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::retrieval_bad_status(&url, status.as_u16()));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::Retrieval(RetrievalError::BodyParseFailed {
                url: url.clone(),
                source: e.into(),
            })
        })?;

        Ok(parse_contents(body))
    }

    /// 下载单个文件的原始文本
    ///
    /// 远端返回非成功状态码时报错，由调用方决定如何处理
    pub async fn fetch_raw(&self, download_url: &str) -> AppResult<String> {
        debug!("下载文件: {}", download_url);

        let response = self
            .http
            .get(download_url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(|e| AppError::retrieval_request_failed(download_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::retrieval_bad_status(download_url, status.as_u16()));
        }

        response.text().await.map_err(|e| {
            AppError::Retrieval(RetrievalError::BodyParseFailed {
                url: download_url.to_string(),
                source: e.into(),
            })
        })
    }
}

/// 将内容 API 的响应体解析为清单条目
///
/// 非数组响应（例如单文件对象或错误对象）返回空清单；
/// 无法解析的条目直接跳过
pub fn parse_contents(body: Value) -> Vec<RepoFileRef> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<RepoFileRef>(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_contents_array() {
        let body = json!([
            {
                "name": "README.md",
                "path": "README.md",
                "download_url": "https://example.com/raw/README.md",
                "type": "file"
            },
            {
                "name": "docs",
                "path": "docs",
                "download_url": null,
                "type": "dir"
            }
        ]);
        let entries = parse_contents(body);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_file());
        assert!(entries[1].is_dir());
        assert!(entries[1].download_url.is_none());
    }

    #[test]
    fn test_parse_contents_non_array_yields_empty() {
        assert!(parse_contents(json!({"message": "Not Found"})).is_empty());
        assert!(parse_contents(json!("oops")).is_empty());
        assert!(parse_contents(Value::Null).is_empty());
    }

    #[test]
    fn test_parse_contents_skips_malformed_entries() {
        let body = json!([
            { "name": "ok.md", "path": "ok.md", "download_url": "u", "type": "file" },
            { "unexpected": true }
        ]);
        let entries = parse_contents(body);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "ok.md");
    }
}
