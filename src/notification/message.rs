//! 通知消息与 Matrix 消息内容封装

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// 默认消息类型
pub const DEFAULT_MSGTYPE: &str = "m.notice";

/// 房间消息事件类型
pub const ROOM_MESSAGE_EVENT: &str = "m.room.message";

/// 结构化消息 HTML 格式标记
pub const HTML_FORMAT: &str = "org.matrix.custom.html";

/// 渲染后的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// 纯文本（模板输出，或未启用 Markdown）
    PlainText(String),
    /// 纯文本 + 清理后的 HTML
    Rich {
        body: String,
        formatted_body: String,
        format: String,
    },
}

impl Message {
    /// 纯文本部分
    pub fn body(&self) -> &str {
        match self {
            Self::PlainText(body) => body,
            Self::Rich { body, .. } => body,
        }
    }

    /// 构建 `m.room.message` 内容，总是包含 `msgtype` 和 `body`
    pub fn to_content(&self) -> Value {
        match self {
            Self::PlainText(body) => json!({
                "msgtype": DEFAULT_MSGTYPE,
                "body": body,
            }),
            rich @ Self::Rich { .. } => {
                let content = match serde_json::to_value(rich) {
                    Ok(Value::Object(map)) => map,
                    _ => Map::new(),
                };
                Value::Object(with_default_msgtype(content))
            }
        }
    }
}

impl From<String> for Message {
    fn from(body: String) -> Self {
        Self::PlainText(body)
    }
}

impl From<&str> for Message {
    fn from(body: &str) -> Self {
        Self::PlainText(body.to_string())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainText(body) => f.write_str(body),
            rich => {
                let pretty = serde_json::to_string_pretty(rich).map_err(|_| fmt::Error)?;
                f.write_str(&pretty)
            }
        }
    }
}

/// 给已有的内容对象补上默认 `msgtype`，不覆盖已指定的值
pub fn with_default_msgtype(mut content: Map<String, Value>) -> Map<String, Value> {
    content
        .entry("msgtype")
        .or_insert_with(|| Value::String(DEFAULT_MSGTYPE.to_string()));
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_content() {
        let content = Message::from("Build: passed").to_content();
        assert_eq!(content["msgtype"], "m.notice");
        assert_eq!(content["body"], "Build: passed");
        assert!(content.get("formatted_body").is_none());
    }

    #[test]
    fn test_rich_content_keeps_plain_fallback() {
        let message = Message::Rich {
            body: "**ok**".to_string(),
            formatted_body: "<p><strong>ok</strong></p>".to_string(),
            format: HTML_FORMAT.to_string(),
        };
        let content = message.to_content();
        assert_eq!(content["msgtype"], "m.notice");
        assert_eq!(content["body"], "**ok**");
        assert_eq!(content["formatted_body"], "<p><strong>ok</strong></p>");
        assert_eq!(content["format"], HTML_FORMAT);
    }

    #[test]
    fn test_default_msgtype_does_not_overwrite() {
        let mut content = Map::new();
        content.insert("msgtype".to_string(), json!("m.text"));
        content.insert("body".to_string(), json!("hi"));
        assert_eq!(with_default_msgtype(content)["msgtype"], "m.text");

        let mut content = Map::new();
        content.insert("body".to_string(), json!("hi"));
        assert_eq!(with_default_msgtype(content)["msgtype"], "m.notice");
    }

    #[test]
    fn test_display() {
        assert_eq!(Message::from("plain").to_string(), "plain");

        let rich = Message::Rich {
            body: "b".to_string(),
            formatted_body: "<p>b</p>".to_string(),
            format: HTML_FORMAT.to_string(),
        };
        let printed = rich.to_string();
        assert!(printed.contains("\"formatted_body\": \"<p>b</p>\""));
    }
}
