use anyhow::Result;
use repo_exam::config::Config;
use repo_exam::orchestrator::App;
use repo_exam::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::load();

    // 初始化并运行应用
    App::initialize(config).run().await?;

    Ok(())
}
