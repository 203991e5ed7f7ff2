//! 配置层 - 设置名集合与分层解析

pub mod resolver;
pub mod settings;

pub use resolver::{merge_layers, resolve, CliOverrides};
pub use settings::{Settings, CONFIG_FILENAME, DEFAULT_PASS_ENVIRONMENT, DEFAULT_TEMPLATE};
