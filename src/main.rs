//! matrixchat-notify CLI
//!
//! 把 CI 流水线结果按模板渲染后发送到 Matrix 聊天室

use clap::Parser;
use matrixchat_notify::cli::{
    handle_notify, init_logging, interrupt_signal, process_environment, NotifyArgs, RunOutcome,
};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "matrixchat-notify")]
#[command(about = "Notify of CI pipeline results on Matrix chat")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    args: NotifyArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let environment = process_environment();

    // 日志写 stderr，dry-run 的消息输出保持干净
    init_logging(cli.args.verbose, &environment);

    match handle_notify(&cli.args, &environment, interrupt_signal()).await {
        Ok(RunOutcome::DryRun(message)) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Delivered(_)) | Ok(RunOutcome::Interrupted) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
