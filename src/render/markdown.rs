//! Markdown → HTML 转换与清理
//!
//! 转换结果总是同时携带原始纯文本和清理后的 HTML，
//! 不支持 HTML 的客户端仍然能显示纯文本。

use crate::config::settings::split_list;
use crate::config::Settings;
use crate::error::MarkdownError;
use crate::notification::message::{Message, HTML_FORMAT};
use ammonia::{Builder, UrlRelative};
use pulldown_cmark::{html, Options, Parser};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Matrix 客户端支持的 HTML 标签子集
pub const DEFAULT_TAGS: &[&str] = &[
    "font", "del", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "p", "a", "ul", "ol", "sup",
    "sub", "li", "b", "i", "u", "strong", "em", "strike", "code", "hr", "br", "div", "table",
    "thead", "tbody", "tr", "th", "td", "caption", "pre", "span", "img", "details", "summary",
];

/// 默认属性白名单（`tag:attr`）
pub const DEFAULT_ATTRIBUTES: &[&str] = &[
    "a:href",
    "font:color",
    "img:src",
    "img:alt",
    "img:title",
    "img:width",
    "img:height",
    "code:class",
    "ol:start",
    "span:data-mx-color",
    "span:data-mx-bg-color",
];

/// 链接允许的 URL scheme（含 Matrix 媒体 `mxc`）
const URL_SCHEMES: &[&str] = &["http", "https", "ftp", "mailto", "magnet", "mxc"];

/// 属性白名单：对所有标签生效的 + 按标签的
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRules {
    pub generic: Vec<String>,
    pub per_tag: BTreeMap<String, Vec<String>>,
}

impl AttributeRules {
    /// 解析 `tag:attr` / `*:attr` / `attr` 形式的规则
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, MarkdownError> {
        let mut rules = Self::default();
        for token in tokens {
            let token = token.as_ref().trim();
            match token.split_once(':') {
                Some((tag, attr)) => {
                    let (tag, attr) = (tag.trim(), attr.trim());
                    if tag.is_empty() || attr.is_empty() {
                        return Err(MarkdownError::InvalidAttributeRule(token.to_string()));
                    }
                    rules.add(tag, attr);
                }
                None if !token.is_empty() => rules.add("*", token),
                None => {}
            }
        }
        Ok(rules)
    }

    /// 从设置值解析：列表、逗号分隔字符串，或 `{tag: [attr]}` 对象
    pub fn from_value(value: &Value) -> Result<Self, MarkdownError> {
        match value {
            Value::Object(map) => {
                let mut rules = Self::default();
                for (tag, attrs) in map {
                    for attr in split_list(attrs) {
                        rules.add(tag.trim(), &attr);
                    }
                }
                Ok(rules)
            }
            other => Self::from_tokens(&split_list(other)),
        }
    }

    fn add(&mut self, tag: &str, attr: &str) {
        let target = if tag == "*" {
            &mut self.generic
        } else {
            self.per_tag.entry(tag.to_lowercase()).or_default()
        };
        let attr = attr.to_lowercase();
        if !target.contains(&attr) {
            target.push(attr);
        }
    }

    /// 某标签上是否允许该属性
    pub fn allows(&self, tag: &str, attr: &str) -> bool {
        self.generic.iter().any(|a| a == attr)
            || self
                .per_tag
                .get(tag)
                .map(|attrs| attrs.iter().any(|a| a == attr))
                .unwrap_or(false)
    }
}

/// 转换参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub tags: Vec<String>,
    pub attributes: AttributeRules,
    pub extensions: Vec<String>,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            attributes: AttributeRules::from_tokens(DEFAULT_ATTRIBUTES).unwrap_or_default(),
            extensions: Vec::new(),
        }
    }
}

impl MarkdownOptions {
    /// 读取 `markdown_tags` / `markdown_attributes` / `markdown_extensions`，未设置的用默认值
    pub fn from_settings(settings: &Settings) -> Result<Self, MarkdownError> {
        let mut options = Self::default();
        if let Some(tags) = settings.get_list("markdown_tags") {
            options.tags = tags.into_iter().map(|t| t.to_lowercase()).collect();
        }
        if let Some(value) = settings.get("markdown_attributes") {
            options.attributes = AttributeRules::from_value(value)?;
        }
        if let Some(extensions) = settings.get_list("markdown_extensions") {
            options.extensions = extensions;
        }
        Ok(options)
    }
}

/// 扩展名 → pulldown-cmark 选项
pub fn parse_extensions<S: AsRef<str>>(names: &[S]) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for name in names {
        let normalized = name.as_ref().trim().to_lowercase().replace('-', "_");
        options |= match normalized.as_str() {
            "tables" => Options::ENABLE_TABLES,
            "footnotes" => Options::ENABLE_FOOTNOTES,
            "strikethrough" => Options::ENABLE_STRIKETHROUGH,
            "tasklists" => Options::ENABLE_TASKLISTS,
            "smarty" | "smart_punctuation" => Options::ENABLE_SMART_PUNCTUATION,
            "heading_attributes" => Options::ENABLE_HEADING_ATTRIBUTES,
            "admonition" => Options::ENABLE_GFM,
            "extra" => {
                Options::ENABLE_TABLES
                    | Options::ENABLE_FOOTNOTES
                    | Options::ENABLE_HEADING_ATTRIBUTES
            }
            _ => return Err(MarkdownError::UnknownExtension(name.as_ref().to_string())),
        };
    }
    Ok(options)
}

/// 按白名单清理 HTML：不允许的标签去掉标记保留文本，不允许的属性直接删除
pub fn sanitize_html<S: AsRef<str>>(html: &str, tags: &[S], attributes: &AttributeRules) -> String {
    let tag_set: HashSet<&str> = tags.iter().map(|t| t.as_ref()).collect();
    let generic: HashSet<&str> = attributes.generic.iter().map(String::as_str).collect();
    let per_tag: HashMap<&str, HashSet<&str>> = attributes
        .per_tag
        .iter()
        .filter(|(tag, _)| tag_set.contains(tag.as_str()))
        .map(|(tag, attrs)| (tag.as_str(), attrs.iter().map(String::as_str).collect()))
        .collect();

    let cleaned = Builder::default()
        .tags(tag_set)
        .clean_content_tags(HashSet::new())
        .generic_attributes(generic)
        .tag_attributes(per_tag)
        .link_rel(None)
        .url_schemes(URL_SCHEMES.iter().copied().collect())
        .url_relative(UrlRelative::PassThrough)
        .clean(html)
        .to_string();
    cleaned
}

/// Markdown → 未清理的 HTML
pub fn markdown_to_html(text: &str, extensions: Options) -> String {
    let parser = Parser::new_ext(text, extensions);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out.trim_end().to_string()
}

/// 把纯文本当作 Markdown 转换为带 HTML 的结构化消息
pub fn convert(plain_text: &str, options: &MarkdownOptions) -> Result<Message, MarkdownError> {
    let extensions = parse_extensions(&options.extensions)?;
    let raw_html = markdown_to_html(plain_text, extensions);
    let formatted = sanitize_html(&raw_html, &options.tags, &options.attributes);

    debug!(
        extensions = ?options.extensions,
        html_len = formatted.len(),
        "Rendered markdown message to HTML"
    );

    Ok(Message::Rich {
        body: plain_text.to_string(),
        formatted_body: formatted,
        format: HTML_FORMAT.to_string(),
    })
}
