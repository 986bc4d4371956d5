//! 批次规划 - 流程层
//!
//! 纯计算：去重、批次编号、补位数量、输出文件名。不读写文件，方便单独测试。

use crate::error::PlanningError;
use crate::models::ledger::listing_text;
use crate::models::{BatchPlan, OutputItem, Record};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

pub const MARKUP_EXTENSION: &str = "svg";
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// 空白徽章的文件名，不含逗号，不会与任何记录冲突
pub const BLANK_BASE_NAME: &str = "_blank";

/// 需要处理的新记录：输入减去已处理
pub fn diff_records(input: &BTreeSet<Record>, already_done: &BTreeSet<Record>) -> BTreeSet<Record> {
    input.difference(already_done).cloned().collect()
}

/// 补足到整版所需的空白徽章数量
pub fn padding_count(real_count: usize, multiple: usize) -> usize {
    (multiple - real_count % multiple) % multiple
}

/// 批次目录名，例如 `batch001`
pub fn batch_dir_name(number: u32) -> String {
    format!("batch{:03}", number)
}

/// 规划新批次
///
/// # 参数
/// - `new_records`: 去重后的新记录（非空）
/// - `last_batch`: 处理记录中最后一个批次编号
/// - `multiple`: 每张打印纸的徽章数量
///
/// # 返回
/// 上一个批次编号已是 `u32::MAX` 时返回错误
pub fn plan_batch(
    new_records: &BTreeSet<Record>,
    last_batch: u32,
    multiple: usize,
) -> Result<BatchPlan, PlanningError> {
    let number = last_batch
        .checked_add(1)
        .ok_or(PlanningError::BatchNumberExhausted { last: last_batch })?;
    let directory = PathBuf::from(batch_dir_name(number));

    let mut used_names: HashMap<String, usize> = HashMap::new();
    let mut items: Vec<OutputItem> = new_records
        .iter()
        .map(|record| {
            let base = unique_base_name(record.base_name(), &mut used_names);
            output_item(&directory, &base, Some(record.clone()))
        })
        .collect();

    let padding = padding_count(items.len(), multiple);
    if padding > 0 {
        let blank = output_item(&directory, BLANK_BASE_NAME, None);
        items.extend(std::iter::repeat(blank).take(padding));
    }

    let records: Vec<Record> = new_records.iter().cloned().collect();

    Ok(BatchPlan {
        number,
        directory,
        items,
        padding_count: padding,
        listing_text: listing_text(&records),
    })
}

fn output_item(directory: &Path, base: &str, record: Option<Record>) -> OutputItem {
    OutputItem {
        record,
        document_path: directory.join(format!("{}.{}", base, DOCUMENT_EXTENSION)),
        markup_path: directory.join(format!("{}.{}", base, MARKUP_EXTENSION)),
    }
}

/// 不同记录替换分隔符后可能同名，后出现的追加 `~2`、`~3`……
fn unique_base_name(base: String, used: &mut HashMap<String, usize>) -> String {
    let mut candidate = base.clone();
    loop {
        let count = used.entry(candidate.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            return candidate;
        }
        candidate = format!("{}~{}", base, count);
    }
}
