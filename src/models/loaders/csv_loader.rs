use crate::error::{AppError, AppResult, SetupError};
use crate::models::record::{csv_reader, is_blank_row, row_line, Record};
use std::collections::BTreeSet;
use std::path::Path;
use tokio::fs;

/// 从 CSV 文件加载名单（无表头，重复行合并）
pub async fn load_records(csv_path: &Path) -> AppResult<BTreeSet<Record>> {
    let content = fs::read_to_string(csv_path)
        .await
        .map_err(|e| AppError::read_failed(csv_path, e))?;

    let records = parse_records(&content, csv_path)?;
    tracing::info!("成功加载 {} 条记录: {}", records.len(), csv_path.display());
    Ok(records)
}

/// 解析 CSV 文本，空行跳过，格式错误时报告行号
///
/// 引号内的字段可以包含逗号和换行
pub fn parse_records(content: &str, csv_path: &Path) -> AppResult<BTreeSet<Record>> {
    let malformed = |line: usize, reason: String| {
        AppError::Setup(SetupError::MalformedInput {
            path: csv_path.to_path_buf(),
            line,
            reason,
        })
    };

    let mut records = BTreeSet::new();
    for row in csv_reader(content).records() {
        let row = row.map_err(|e| {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
            malformed(line, e.to_string())
        })?;
        if is_blank_row(&row) {
            continue;
        }
        let record = Record::from_row(&row).map_err(|reason| malformed(row_line(&row), reason))?;
        records.insert(record);
    }

    Ok(records)
}
