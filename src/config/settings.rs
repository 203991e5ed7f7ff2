//! 设置项定义 - 固定的设置名集合与只读访问器

use serde_json::Value;
use std::collections::BTreeMap;

/// 环境变量覆盖前缀（`PLUGIN_` + 大写设置名）
pub const ENV_PREFIX: &str = "PLUGIN_";

/// 默认配置文件名
pub const CONFIG_FILENAME: &str = "matrixchat-notify-config.json";

/// 默认 homeserver
pub const DEFAULT_HOMESERVER: &str = "https://matrix.org";

/// 默认环境变量白名单
pub const DEFAULT_PASS_ENVIRONMENT: &[&str] = &["CI_*"];

/// 默认消息模板
pub const DEFAULT_TEMPLATE: &str = "${STATUS}";

/// 所有可识别的设置名
pub const SETTINGS_KEYS: &[&str] = &[
    "accesstoken",
    "deviceid",
    "devicename",
    "homeserver",
    "jinja",
    "markdown",
    "markdown_attributes",
    "markdown_extensions",
    "markdown_tags",
    "pass_environment",
    "password",
    "roomid",
    "template",
    "userid",
];

/// 是否为可识别的设置名
pub fn is_known_key(key: &str) -> bool {
    SETTINGS_KEYS.contains(&key)
}

/// 设置名对应的环境变量名
pub fn env_var_name(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key.to_uppercase())
}

/// 单层设置（默认值 / 配置文件 / 环境变量 / CLI 各一层）
pub type Layer = BTreeMap<String, Value>;

/// 解析完成后的设置，构造后不可修改
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, Value>,
}

impl Settings {
    pub(crate) fn from_values(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 字符串值（数字和布尔值转为字符串）
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// 非空字符串值；空串视为未设置
    pub fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get_str(key).filter(|s| !s.is_empty())
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.values.get(key).map(value_to_bool).unwrap_or(false)
    }

    /// 列表值，见 [`split_list`]
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.values.get(key).map(split_list)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

/// strtobool 语义；无法识别的字符串为 false
pub fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "y" | "yes" | "t" | "true" | "on" | "1"
    )
}

pub fn value_to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => parse_bool(s),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    }
}

/// 把单个字符串、字符串列表或逗号分隔字符串展开为扁平列表
///
/// 每一项去除首尾空白，空项被丢弃，保持原有顺序。
pub fn split_list(value: &Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    raw.iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
