use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use survey_autofill::models::load_access_codes;
use survey_autofill::{logger, AbortSignal, App, Config};

/// 自动填写多页问卷
#[derive(Debug, Parser)]
#[command(name = "survey_autofill", version, about)]
struct Cli {
    /// TOML 配置文件
    #[arg(short, long, env = "SURVEY_CONFIG")]
    config: Option<PathBuf>,

    /// 访问码文件（一行一个），与配置中的访问码合并
    #[arg(long)]
    codes_file: Option<PathBuf>,

    /// 只加载配置、场景库和访问码，不启动浏览器
    #[arg(long)]
    dry_run: bool,

    /// 输出 debug 级别日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.verbose {
        config.verbose_logging = true;
    }

    // 初始化日志
    logger::init(config.verbose_logging);

    if let Some(path) = &cli.codes_file {
        for code in load_access_codes(path).await? {
            if !config.access_codes.contains(&code) {
                config.access_codes.push(code);
            }
        }
    }

    // Ctrl-C 只设置中止标志，当前页面处理完后生效
    let abort = AbortSignal::new();
    let signal = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹ 收到 Ctrl-C，将在当前页面处理完后停止");
            signal.raise();
        }
    });

    // 初始化并运行应用
    let app = App::initialize(config, abort).await?;
    if cli.dry_run {
        app.dry_run();
        return Ok(());
    }

    let report = app.run().await?;
    if report.completed < report.total {
        info!("部分访问码未完成，退出码 1");
        std::process::exit(1);
    }
    Ok(())
}
