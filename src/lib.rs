//! matrixchat-notify - 渲染 CI 流水线结果并通知 Matrix 聊天室

pub mod cli;
pub mod config;
pub mod error;
pub mod notification;
pub mod render;

/// 环境变量名 → 值
pub type Environment = std::collections::HashMap<String, String>;

pub use config::{resolve, CliOverrides, Settings};
pub use error::{ConfigError, MarkdownError, NotifyError, TemplateError};
pub use notification::{
    ChatClient, Credentials, Delivery, DeliveryTarget, DispatchState, MatrixClient, Message,
    NotificationDispatcher,
};
pub use render::{filter_environment, render_message, TemplateEngine};
