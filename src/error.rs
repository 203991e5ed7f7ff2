//! 错误类型
//!
//! 只有 `ConfigError` 和 `NotifyError::Precondition` 会阻止渲染或发送；
//! 模板与 Markdown 错误由调用方降级为纯文本。

use std::path::PathBuf;
use thiserror::Error;

/// 配置文件读取/解析错误（致命，在渲染前终止）
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: top-level value must be a JSON object")]
    NotAnObject { path: PathBuf },
}

/// 沙箱模板引擎错误（可恢复，回退到原始模板文本）
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template engine error: {0}")]
    Engine(String),
}

impl From<tera::Error> for TemplateError {
    fn from(err: tera::Error) -> Self {
        // tera 把真正的原因放在 source 链里
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Engine(message)
    }
}

/// Markdown 转换/清理错误（可恢复，回退到未转换的纯文本）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkdownError {
    #[error("unknown markdown extension '{0}'")]
    UnknownExtension(String),

    #[error("invalid attribute rule '{0}'")]
    InvalidAttributeRule(String),
}

/// 发送阶段错误
#[derive(Debug, Error)]
pub enum NotifyError {
    /// 缺少 room / user / 凭据（致命，不发起任何网络请求）
    #[error("{0}")]
    Precondition(String),

    /// 密码登录被拒绝（致命，不重试）
    #[error("Failed to log in: {0}")]
    Authentication(String),

    /// 服务器拒绝消息
    #[error("Failed to send message: {0}")]
    Delivery(String),

    /// HTTP 层错误
    #[error("transport error: {0}")]
    Transport(String),

    /// 用户中断
    #[error("Interrupted.")]
    Cancelled,
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
