//! 配置解析 - 默认值 < 配置文件 < 环境变量 < CLI 参数
//!
//! 各层先独立构建，再由 [`merge_layers`] 一次性合并为不可变的 [`Settings`]。

use super::settings::{
    env_var_name, is_known_key, Layer, Settings, DEFAULT_HOMESERVER, DEFAULT_PASS_ENVIRONMENT,
    DEFAULT_TEMPLATE, SETTINGS_KEYS,
};
use crate::error::ConfigError;
use crate::Environment;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 来自 CLI 的覆盖项
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `-e/--pass-environment`；`Some(vec![])` 也会整体替换已配置的白名单
    pub pass_environment: Option<Vec<String>>,
    /// `-m/--render-markdown`
    pub render_markdown: bool,
}

impl CliOverrides {
    fn to_layer(&self) -> Layer {
        let mut layer = Layer::new();
        if let Some(patterns) = &self.pass_environment {
            layer.insert(
                "pass_environment".to_string(),
                Value::Array(patterns.iter().cloned().map(Value::String).collect()),
            );
        }
        if self.render_markdown {
            layer.insert("markdown".to_string(), Value::Bool(true));
        }
        layer
    }
}

/// 内置默认值
pub fn default_layer() -> Layer {
    let mut layer = Layer::new();
    layer.insert(
        "homeserver".to_string(),
        Value::String(DEFAULT_HOMESERVER.to_string()),
    );
    layer.insert(
        "pass_environment".to_string(),
        Value::Array(
            DEFAULT_PASS_ENVIRONMENT
                .iter()
                .map(|p| Value::String(p.to_string()))
                .collect(),
        ),
    );
    layer.insert(
        "template".to_string(),
        Value::String(DEFAULT_TEMPLATE.to_string()),
    );
    layer
}

/// 读取 JSON 配置文件；文件不存在时返回空层
pub fn read_config_file(path: &Path) -> Result<Layer, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using environment only");
        return Ok(Layer::new());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Object(map) = value else {
        return Err(ConfigError::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let mut layer = Layer::new();
    for (key, value) in map {
        if is_known_key(&key) {
            layer.insert(key, value);
        } else {
            debug!(key = %key, "Ignoring unknown configuration key");
        }
    }
    Ok(layer)
}

/// 从 `PLUGIN_*` 环境变量构建覆盖层；变量存在即覆盖（空串也算）
pub fn env_layer(environment: &Environment) -> Layer {
    SETTINGS_KEYS
        .iter()
        .filter_map(|key| {
            environment
                .get(&env_var_name(key))
                .map(|val| (key.to_string(), Value::String(val.clone())))
        })
        .collect()
}

/// 按优先级合并四层，后者覆盖前者；未识别的键被丢弃
pub fn merge_layers(defaults: Layer, file: Layer, env: Layer, cli: Layer) -> Settings {
    let mut merged = Layer::new();
    for layer in [defaults, file, env, cli] {
        for (key, value) in layer {
            if is_known_key(&key) {
                merged.insert(key, value);
            }
        }
    }
    Settings::from_values(merged)
}

/// 解析最终设置
pub fn resolve(
    file_path: &Path,
    environment: &Environment,
    cli: &CliOverrides,
) -> Result<Settings, ConfigError> {
    let file = read_config_file(file_path)?;
    let env = env_layer(environment);

    for key in SETTINGS_KEYS {
        let value = env.get(*key).or_else(|| file.get(*key));
        if value.map(is_empty_value).unwrap_or(true) {
            debug!("Configuration setting '{}' not set or empty in config.", key);
        }
    }

    Ok(merge_layers(default_layer(), file, env, cli.to_layer()))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(b) => !b,
        Value::Number(_) => false,
    }
}
