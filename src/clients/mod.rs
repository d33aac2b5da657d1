pub mod github_client;
pub mod llm_client;

pub use github_client::GithubClient;
pub use llm_client::LlmClient;
