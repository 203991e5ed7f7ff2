//! 消息渲染 - 环境过滤、模板渲染、可选的 Markdown 转换
//!
//! 所有渲染失败都降级为纯文本，不阻止通知发送。

pub mod context;
pub mod markdown;
pub mod template;

pub use context::filter_environment;
pub use markdown::{convert, sanitize_html, AttributeRules, MarkdownOptions};
pub use template::{render, substitute, TemplateEngine};

use crate::config::settings::DEFAULT_TEMPLATE;
use crate::config::Settings;
use crate::notification::Message;
use crate::Environment;
use tracing::{debug, error};

/// 按设置渲染最终消息
///
/// CLI 的 `-m` 在配置解析阶段已合并进 `markdown` 设置。
pub fn render_message(settings: &Settings, environment: &Environment) -> Message {
    let patterns = settings.get_list("pass_environment").unwrap_or_default();
    let context = filter_environment(&patterns, environment);

    let template = settings
        .get_str("template")
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
    let engine = TemplateEngine::from_flag(settings.get_bool("jinja"));
    let text = render(&template, &context, engine);

    if !settings.get_bool("markdown") {
        return Message::PlainText(text);
    }

    debug!("Rendering markdown message to HTML.");
    let converted = MarkdownOptions::from_settings(settings)
        .and_then(|options| convert(&text, &options));
    match converted {
        Ok(message) => message,
        Err(e) => {
            error!(error = %e, "Failed to render message with markdown.");
            Message::PlainText(text)
        }
    }
}
