//! 通知命令处理：解析配置 → 渲染 → 发送（或 dry-run 打印）

use super::args::NotifyArgs;
use crate::config;
use crate::error::NotifyError;
use crate::notification::{Delivery, DeliveryTarget, MatrixClient, Message, NotificationDispatcher};
use crate::render::render_message;
use crate::Environment;
use anyhow::{Context, Result};
use std::future::Future;
use tracing::debug;

/// 一次运行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// dry-run：只渲染不发送
    DryRun(Message),
    /// 已送达
    Delivered(Delivery),
    /// 用户中断
    Interrupted,
}

/// 读取当前进程环境；非 UTF-8 的变量被忽略
pub fn process_environment() -> Environment {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Ctrl-C 信号；注册失败时永不完成
pub async fn interrupt_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// 执行通知命令，`cancel` 完成时中止发送
pub async fn handle_notify<F>(
    args: &NotifyArgs,
    environment: &Environment,
    cancel: F,
) -> Result<RunOutcome>
where
    F: Future<Output = ()>,
{
    let settings = config::resolve(&args.config, environment, &args.overrides())
        .context("Could not parse configuration")?;

    if args.dry_run {
        return Ok(RunOutcome::DryRun(render_message(&settings, environment)));
    }

    let target = DeliveryTarget::from_settings(&settings)?;
    let message = render_message(&settings, environment);

    debug!("Sending notification to Matrix chat...");
    let client = MatrixClient::new(&target.homeserver)?;
    let mut dispatcher = NotificationDispatcher::new(client);

    match dispatcher.dispatch_until(&target, &message, cancel).await {
        Ok(delivery) => Ok(RunOutcome::Delivered(delivery)),
        Err(NotifyError::Cancelled) => Ok(RunOutcome::Interrupted),
        Err(e) => Err(e.into()),
    }
}
