//! 批次规划结果
//!
//! 规划只描述"要生成什么"，不涉及任何文件操作

use crate::models::record::Record;
use std::path::{Path, PathBuf};

/// 一个打印位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputItem {
    /// `None` 表示补位用的空白徽章
    pub record: Option<Record>,
    /// 转换后的文档路径（相对工作目录）
    pub document_path: PathBuf,
    /// 渲染出的 SVG 路径（相对工作目录）
    pub markup_path: PathBuf,
}

impl OutputItem {
    pub fn is_padding(&self) -> bool {
        self.record.is_none()
    }

    /// 渲染模板用的字段，补位为空
    pub fn fields(&self) -> &[String] {
        self.record.as_ref().map(Record::fields).unwrap_or(&[])
    }
}

/// 本次运行的批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub number: u32,
    pub directory: PathBuf,
    /// 真实记录在前，补位在后
    pub items: Vec<OutputItem>,
    pub padding_count: usize,
    /// 写入 listing.txt 和处理记录的名单（不含补位）
    pub listing_text: String,
}

impl BatchPlan {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn real_items(&self) -> impl Iterator<Item = &OutputItem> {
        self.items.iter().filter(|item| !item.is_padding())
    }

    pub fn real_count(&self) -> usize {
        self.items.len() - self.padding_count
    }

    /// 需要实际渲染的条目：每条真实记录一次，补位只渲染一次
    pub fn distinct_renders(&self) -> impl Iterator<Item = &OutputItem> {
        let blank = self.items.iter().find(|item| item.is_padding());
        self.real_items().chain(blank)
    }

    /// 按打印位顺序排列的文档路径，补位重复指向同一个空白文档
    pub fn document_paths(&self) -> Vec<PathBuf> {
        self.items
            .iter()
            .map(|item| item.document_path.clone())
            .collect()
    }
}
