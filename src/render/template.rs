//! 消息模板渲染
//!
//! 两种策略：
//! - 容错替换：`$name` / `${name}`，未知占位符原样保留
//! - 沙箱引擎：tera，只能访问传入的上下文；失败时回退为原始模板文本

use crate::error::TemplateError;
use crate::Environment;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;
use tera::{Context, Tera};
use tracing::{debug, warn};

/// 渲染策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateEngine {
    /// 容错占位符替换
    #[default]
    Substitute,
    /// 沙箱模板引擎
    Sandboxed,
}

impl TemplateEngine {
    pub fn from_flag(use_sandboxed_engine: bool) -> Self {
        if use_sandboxed_engine {
            Self::Sandboxed
        } else {
            Self::Substitute
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<invalid>))",
        )
        .unwrap()
    })
}

/// 容错替换，永不失败
///
/// `$$` 输出单个 `$`；找不到的名字和不合法的 `$` 序列原样保留。
pub fn substitute(template: &str, context: &Environment) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            if caps.name("escaped").is_some() {
                return "$".to_string();
            }
            let name = caps.name("named").or_else(|| caps.name("braced"));
            match name.and_then(|n| context.get(n.as_str())) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// 用沙箱化的 tera 渲染
///
/// 模板里只能看到上下文中的变量（同时以 `env` map 形式提供以便遍历），
/// `get_env` 被替换为报错函数，没有注册任何可加载的模板文件。
pub fn render_sandboxed(template: &str, context: &Environment) -> Result<String, TemplateError> {
    let mut engine = Tera::default();
    engine.register_function(
        "get_env",
        |_: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
            Err(tera::Error::msg(
                "get_env is not available, use variables from the passed environment",
            ))
        },
    );
    engine.autoescape_on(vec![]);

    let mut tera_context = Context::new();
    for (name, value) in context {
        tera_context.insert(name.as_str(), value);
    }
    tera_context.insert("env", context);

    Ok(engine.render_str(template, &tera_context)?)
}

/// 渲染消息模板
pub fn render(template: &str, context: &Environment, engine: TemplateEngine) -> String {
    match engine {
        TemplateEngine::Substitute => substitute(template, context),
        TemplateEngine::Sandboxed => match render_sandboxed(template, context) {
            Ok(rendered) => {
                debug!("Rendered message template with sandboxed engine");
                rendered
            }
            Err(e) => {
                warn!(error = %e, "Failed to render template, using it unrendered");
                template.to_string()
            }
        },
    }
}
