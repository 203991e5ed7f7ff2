//! 日志初始化
//!
//! - `PLUGIN_LOG_LEVEL`：EnvFilter 指令，默认 `info`；`-v` 强制 `debug`
//! - `PLUGIN_LOG_FORMAT`：`full`（默认）/ `compact` / `pretty` / `json`

use crate::Environment;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_LEVEL_VAR: &str = "PLUGIN_LOG_LEVEL";
pub const LOG_FORMAT_VAR: &str = "PLUGIN_LOG_FORMAT";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    /// 无法识别的值回退为 `Full`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "compact" => Self::Compact,
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => Self::Full,
        }
    }
}

/// 计算过滤指令
pub fn filter_directive(verbose: bool, environment: &Environment) -> String {
    if verbose {
        return "debug".to_string();
    }
    environment
        .get(LOG_LEVEL_VAR)
        .map(|level| level.trim().to_lowercase())
        .filter(|level| !level.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// 初始化全局 tracing 订阅者（进程入口调用一次），输出到 stderr
pub fn init_logging(verbose: bool, environment: &Environment) {
    let directive = filter_directive(verbose, environment);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let format = environment
        .get(LOG_FORMAT_VAR)
        .map(|f| LogFormat::parse(f))
        .unwrap_or_default();

    let builder = fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    let result = match format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {e}");
    }
}
