use anyhow::Result;
use clap::Parser;
use quiz_dashboard::cli::Cli;
use quiz_dashboard::utils::logging;
use quiz_dashboard::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    // 初始化并运行应用
    let app = App::initialize(config)?;
    if !app.run(cli.command).await? {
        std::process::exit(1);
    }

    Ok(())
}
