//! 文档发现与下载服务 - 业务能力层
//!
//! 只负责"找到并取回学习材料"能力，不关心流程
//!
//! ## 失败策略
//! - 目录清单：单个子目录失败只记日志，整体降级为部分/空结果，永不报错
//! - 文件下载：任何一个选中文件下载失败都向上传播，由调用方中止本次出题

use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::clients::GithubClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{Document, RepoFileRef, RepoRef};

/// 文档发现与下载服务
pub struct DocumentService {
    github: GithubClient,
    extension: String,
    max_depth: usize,
    dir_fetch_delay: Duration,
}

impl DocumentService {
    /// 创建新的文档服务
    pub fn new(config: &Config) -> Self {
        Self {
            github: GithubClient::new(config),
            extension: config.document_extension.clone(),
            max_depth: config.max_scan_depth,
            dir_fetch_delay: Duration::from_millis(config.dir_fetch_delay_ms),
        }
    }

    /// 递归列出仓库中匹配扩展名的文件
    ///
    /// 从根目录开始向下最多扫描 `max_scan_depth` 层（含根目录），
    /// 每次进入子目录前等待固定延迟以避开远端限流。
    /// 没有匹配文件或目录不可读时返回空清单，不报错。
    pub async fn list_documents(&self, repo: &RepoRef) -> Vec<RepoFileRef> {
        self.walk(repo, "", 0).await
    }

    fn walk<'a>(
        &'a self,
        repo: &'a RepoRef,
        path: &'a str,
        depth: usize,
    ) -> BoxFuture<'a, Vec<RepoFileRef>> {
        async move {
            if depth >= self.max_depth {
                return Vec::new();
            }

            let entries = match self.github.list_contents(repo, path).await {
                Ok(entries) => entries,
                Err(e) => {
                    // 部分结果可接受：跳过不可读的目录
                    warn!("⚠️ 无法读取目录 '{}': {}", path, e);
                    return Vec::new();
                }
            };

            let mut found = Vec::new();
            for entry in entries {
                if entry.is_file() && entry.matches_extension(&self.extension) {
                    debug!("找到文档: {}", entry.path);
                    found.push(entry);
                } else if entry.is_dir() {
                    // 远端限流：每次子目录请求前等待固定延迟
                    sleep(self.dir_fetch_delay).await;
                    let sub = self.walk(repo, &entry.path, depth + 1).await;
                    found.extend(sub);
                }
            }
            found
        }
        .boxed()
    }

    /// 并发下载选中文件的原始文本
    ///
    /// 各文件之间相互独立、无顺序要求；任何一个失败都会使整体失败
    pub async fn fetch_documents(&self, refs: &[RepoFileRef]) -> AppResult<Vec<Document>> {
        let fetches = refs.iter().map(|file| async move {
            let url = file.download_url.as_deref().ok_or_else(|| {
                AppError::retrieval_request_failed(
                    &file.path,
                    anyhow::anyhow!("条目没有下载地址"),
                )
            })?;
            let content = self.github.fetch_raw(url).await?;
            Ok(Document {
                name: file.name.clone(),
                content,
            })
        });

        futures::future::join_all(fetches)
            .await
            .into_iter()
            .collect()
    }
}
