use anyhow::{Context, Result};
use badge_batch::utils::logging;
use badge_batch::{App, Config, RunOutcome};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

/// 外部进程失败时的退出码
const EXIT_PROCESS_FAILURE: u8 = 2;

/// 根据名单和 SVG 模板批量生成徽章
#[derive(Debug, Parser)]
#[command(name = "badge_batch", version, about)]
struct Cli {
    /// 工作目录（包含 data.csv、template.svg），默认当前目录
    working_dir: Option<PathBuf>,

    /// 配置文件，默认读取工作目录下的 badge_batch.toml（如果存在）
    #[arg(short, long, env = "BADGE_CONFIG")]
    config: Option<PathBuf>,

    /// 只显示将要生成的批次，不写任何文件
    #[arg(long)]
    dry_run: bool,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let working_dir = cli.working_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    if !working_dir.is_dir() {
        eprintln!("工作目录不存在: {}", working_dir.display());
        eprintln!("{}", Cli::command().render_usage());
        eprintln!("未指定工作目录时使用当前目录。");
        return ExitCode::from(1);
    }

    match run(cli, working_dir).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("错误: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli, working_dir: PathBuf) -> Result<ExitCode> {
    let mut config = Config::load(&working_dir, cli.config.as_deref()).await?;
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    logging::init(config.verbose_logging);

    let app = App::new(config, &working_dir)?;

    if cli.dry_run {
        match app.plan().await.context("规划批次失败")? {
            None => println!("没有新的记录需要处理。"),
            Some(plan) => {
                println!(
                    "将创建 {}：徽章 {} 个，补位 {} 个",
                    plan.directory.display(),
                    plan.real_count(),
                    plan.padding_count
                );
                print!("{}", plan.listing_text);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    match app.run().await? {
        RunOutcome::NothingToDo => {
            println!("没有新的记录需要处理，所有记录都已在之前的批次中。");
            println!("详见 \"{}\"。", app.config().ledger_file);
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Completed(report) if report.is_success() => {
            println!("完成。");
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Completed(report) => {
            eprint!("{}", report);
            Ok(ExitCode::from(EXIT_PROCESS_FAILURE))
        }
    }
}
