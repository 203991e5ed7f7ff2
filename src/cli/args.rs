//! 命令行参数

use crate::config::{CliOverrides, CONFIG_FILENAME};
use clap::{ArgAction, Args};
use std::path::PathBuf;

/// 通知命令参数
#[derive(Args, Debug, Clone)]
pub struct NotifyArgs {
    /// 配置文件路径
    #[arg(short, long, value_name = "PATH", default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    /// 不发送通知，只打印渲染后的消息
    #[arg(short, long)]
    pub dry_run: bool,

    /// 环境变量名白名单（支持 shell glob 和逗号分隔，可多次指定，默认 'CI_*'）。
    /// 指定后完全替换配置文件和环境变量中的白名单
    #[arg(
        short = 'e',
        long,
        value_name = "PATTERN",
        num_args = 0..,
        action = ArgAction::Append
    )]
    pub pass_environment: Option<Vec<String>>,

    /// 消息为 Markdown 格式，渲染为 HTML
    #[arg(short = 'm', long)]
    pub render_markdown: bool,

    /// 启用 debug 日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl NotifyArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            pass_environment: self.pass_environment.clone(),
            render_markdown: self.render_markdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: NotifyArgs,
    }

    fn parse(argv: &[&str]) -> NotifyArgs {
        TestCli::parse_from(std::iter::once("matrixchat-notify").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.config, PathBuf::from(CONFIG_FILENAME));
        assert!(!args.dry_run);
        assert!(args.pass_environment.is_none());
        assert!(!args.render_markdown);
        assert!(!args.verbose);
    }

    #[test]
    fn test_pass_environment_repeatable() {
        let args = parse(&["-e", "CI_*", "HOME,USER", "-e", "X_?"]);
        assert_eq!(
            args.pass_environment,
            Some(vec![
                "CI_*".to_string(),
                "HOME,USER".to_string(),
                "X_?".to_string()
            ])
        );
    }

    #[test]
    fn test_empty_pass_environment_is_an_override() {
        let args = parse(&["-d", "-e"]);
        assert_eq!(args.pass_environment, Some(Vec::new()));
        assert!(args.overrides().pass_environment.is_some());
    }

    #[test]
    fn test_short_flags() {
        let args = parse(&["-c", "cfg.json", "-d", "-m", "-v"]);
        assert_eq!(args.config, PathBuf::from("cfg.json"));
        assert!(args.dry_run && args.render_markdown && args.verbose);
        assert!(args.overrides().render_markdown);
    }
}
