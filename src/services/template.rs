//! 模板渲染服务 - 业务能力层
//!
//! 只负责"字段 → SVG 文本"，不关心文件和进程

use crate::error::{AppError, AppResult};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("模板占位符正则无效")
});

/// 模板渲染能力
pub trait TemplateRenderer: Send + Sync {
    /// 用记录字段渲染一份模板，字段为空切片时渲染空白徽章
    fn render(&self, fields: &[String]) -> String;
}

/// SVG 模板
///
/// 占位符写作 `{{ nome }}`，第 i 个字段绑定到第 i 个变量名。
/// 未知变量渲染为空字符串，字段值会做 XML 转义。
pub struct SvgTemplate {
    source: String,
    variables: Vec<String>,
}

impl SvgTemplate {
    pub fn new(source: impl Into<String>, variables: Vec<String>) -> Self {
        Self {
            source: source.into(),
            variables,
        }
    }

    /// 从文件加载模板
    pub async fn load(path: &Path, variables: Vec<String>) -> AppResult<Self> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::read_failed(path, e))?;
        Ok(Self::new(source, variables))
    }
}

impl TemplateRenderer for SvgTemplate {
    fn render(&self, fields: &[String]) -> String {
        PLACEHOLDER
            .replace_all(&self.source, |caps: &Captures| {
                self.variables
                    .iter()
                    .position(|v| v == &caps[1])
                    .and_then(|idx| fields.get(idx))
                    .map(|value| xml_escape(value))
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
