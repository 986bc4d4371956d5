//! 处理记录（generated_status.txt）
//!
//! 文件格式：
//!
//! ```text
//! Batch 1:
//! Alice,Acme
//! Bob,Globex
//!
//! Batch 2:
//! Carol,Initech
//! ```
//!
//! 批次之间用空行分隔；旧版本写出的文件没有空行，下一个 `Batch N:` 同样结束上一个批次。
//! 记录行按 CSV 读取，带引号的字段可以跨行。

use crate::error::LedgerError;
use crate::models::record::{csv_reader, is_blank_row, row_line, Record};
use csv::StringRecord;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::LazyLock;

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Batch (.*):$").expect("批次标题正则无效"));

/// 一个批次的处理记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub number: u32,
    pub records: Vec<Record>,
}

impl LedgerEntry {
    /// 批次在处理记录中的文本：标题行 + 每条记录一行
    pub fn to_text(&self) -> String {
        format!("Batch {}:\n{}", self.number, listing_text(&self.records))
    }
}

/// 已解析的处理记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// 最后一个批次的编号，没有批次时为 0
    pub fn last_batch_number(&self) -> u32 {
        self.entries.last().map(|e| e.number).unwrap_or(0)
    }

    /// 所有批次中已经处理过的记录
    pub fn already_done(&self) -> BTreeSet<Record> {
        self.entries
            .iter()
            .flat_map(|e| e.records.iter().cloned())
            .collect()
    }

    /// 出现在多个批次中的记录（正常情况下应为空）
    pub fn duplicate_records(&self) -> Vec<Record> {
        let mut seen = HashSet::new();
        let mut duplicates = BTreeSet::new();
        for entry in &self.entries {
            let in_entry: BTreeSet<&Record> = entry.records.iter().collect();
            for record in in_entry {
                if !seen.insert(record) {
                    duplicates.insert(record.clone());
                }
            }
        }
        duplicates.into_iter().collect()
    }

    /// 解析处理记录文本
    ///
    /// 任何无法识别的内容都是错误，不会跳过
    pub fn parse(text: &str) -> Result<Self, LedgerError> {
        let mut entries: Vec<LedgerEntry> = Vec::new();
        let mut current: Option<(usize, LedgerEntry)> = None;

        for row in csv_reader(text).records() {
            let row = row.map_err(|e| LedgerError::MalformedRecord {
                line: e.position().map(|p| p.line() as usize).unwrap_or(0),
                reason: e.to_string(),
            })?;
            let line_no = row_line(&row);

            if is_blank_row(&row) {
                close_entry(&mut current, &mut entries)?;
                continue;
            }

            if let Some(caps) = header_of(&row).and_then(|h| HEADER.captures(h)) {
                close_entry(&mut current, &mut entries)?;
                let value = &caps[1];
                let number: u32 = value
                    .parse()
                    .map_err(|_| LedgerError::InvalidBatchNumber {
                        line: line_no,
                        value: value.to_string(),
                    })?;
                let previous = entries.last().map(|e| e.number).unwrap_or(0);
                if number <= previous {
                    return Err(LedgerError::NonIncreasingBatch {
                        line: line_no,
                        number,
                        previous,
                    });
                }
                current = Some((
                    line_no,
                    LedgerEntry {
                        number,
                        records: Vec::new(),
                    },
                ));
                continue;
            }

            let Some((_, entry)) = current.as_mut() else {
                return Err(LedgerError::RecordOutsideBatch { line: line_no });
            };
            let record = Record::from_row(&row).map_err(|reason| LedgerError::MalformedRecord {
                line: line_no,
                reason,
            })?;
            entry.records.push(record);
        }

        close_entry(&mut current, &mut entries)?;
        Ok(Self { entries })
    }
}

/// 标题行只有一个字段，记录至少两个
fn header_of(row: &StringRecord) -> Option<&str> {
    match row.len() {
        1 => row.get(0),
        _ => None,
    }
}

fn close_entry(
    current: &mut Option<(usize, LedgerEntry)>,
    entries: &mut Vec<LedgerEntry>,
) -> Result<(), LedgerError> {
    if let Some((header_line, entry)) = current.take() {
        if entry.records.is_empty() {
            return Err(LedgerError::EmptyBatch {
                line: header_line,
                number: entry.number,
            });
        }
        entries.push(entry);
    }
    Ok(())
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(&entry.to_text())?;
        }
        Ok(())
    }
}

/// 名单文本：每条记录一行，以换行结尾
pub fn listing_text(records: &[Record]) -> String {
    records.iter().map(|record| format!("{record}\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_text_means_no_batches() {
        let ledger = Ledger::parse("").unwrap();
        assert_eq!(ledger.last_batch_number(), 0);
        assert!(ledger.already_done().is_empty());
    }

    #[test]
    fn blocks_without_blank_separator_are_split_on_header() {
        let ledger = Ledger::parse("Batch 1:\nAlice,Acme\nBatch 2:\nBob,Globex\nCarol,Initech\n")
            .unwrap();
        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(ledger.last_batch_number(), 2);
        assert_eq!(ledger.already_done().len(), 3);
    }

    #[test]
    fn blank_line_separated_blocks_parse() {
        let ledger = Ledger::parse("Batch 1:\nAlice,Acme\n\nBatch 3:\nBob,Globex\n\n").unwrap();
        assert_eq!(ledger.last_batch_number(), 3);
        assert!(ledger.already_done().contains(&Record::new(["Bob", "Globex"])));
    }

    #[test]
    fn non_integer_batch_number_is_fatal() {
        let err = Ledger::parse("Batch one:\nAlice,Acme\n").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidBatchNumber { line: 1, .. }));
    }

    #[test]
    fn decreasing_batch_number_is_fatal() {
        let err = Ledger::parse("Batch 2:\nAlice,Acme\n\nBatch 2:\nBob,Globex\n").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NonIncreasingBatch {
                line: 4,
                number: 2,
                previous: 2
            }
        ));
    }

    #[test]
    fn record_before_any_header_is_fatal() {
        let err = Ledger::parse("Alice,Acme\n").unwrap_err();
        assert!(matches!(err, LedgerError::RecordOutsideBatch { line: 1 }));
    }

    #[test]
    fn header_without_records_is_fatal() {
        let err = Ledger::parse("Batch 1:\n\nBatch 2:\nAlice,Acme\n").unwrap_err();
        assert!(matches!(err, LedgerError::EmptyBatch { line: 1, number: 1 }));
    }

    #[test]
    fn record_line_without_comma_is_fatal() {
        let err = Ledger::parse("Batch 1:\nAlice\n").unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn duplicates_across_batches_are_detected() {
        let ledger = Ledger::parse("Batch 1:\nAlice,Acme\n\nBatch 2:\nAlice,Acme\nBob,Globex\n")
            .unwrap();
        assert_eq!(ledger.duplicate_records(), vec![Record::new(["Alice", "Acme"])]);
    }

    #[test]
    fn quoted_record_spanning_lines_stays_in_its_batch() {
        let text = "Batch 1:\n\"Alice\nSmith\",Acme\n\nBatch 2:\nBob,Globex\n";
        let ledger = Ledger::parse(text).unwrap();
        assert_eq!(ledger.entries()[0].records, vec![Record::new(["Alice\nSmith", "Acme"])]);
        assert_eq!(ledger.last_batch_number(), 2);
        assert_eq!(ledger.to_string(), text);
    }

    #[test]
    fn crlf_ledger_parses() {
        let ledger = Ledger::parse("Batch 1:\r\nAlice,Acme\r\n").unwrap();
        assert!(ledger.already_done().contains(&Record::new(["Alice", "Acme"])));
    }

    #[test]
    fn entry_text_matches_file_format() {
        let entry = LedgerEntry {
            number: 1,
            records: vec![Record::new(["Alice", "Acme"])],
        };
        assert_eq!(entry.to_text(), "Batch 1:\nAlice,Acme\n");
    }

    fn record_strategy() -> impl Strategy<Value = Record> {
        prop::collection::vec("[a-zA-Z /\",\r\n]{0,8}", 2..4).prop_map(Record::new)
    }

    proptest! {
        #[test]
        fn serialized_ledger_parses_back(
            batches in prop::collection::vec(prop::collection::vec(record_strategy(), 1..5), 0..5),
            gaps in prop::collection::vec(1u32..4, 5),
        ) {
            let mut number = 0;
            let entries: Vec<LedgerEntry> = batches
                .into_iter()
                .zip(gaps)
                .map(|(records, gap)| {
                    number += gap;
                    LedgerEntry { number, records }
                })
                .collect();
            let ledger = Ledger::new(entries);

            let reparsed = Ledger::parse(&ledger.to_string()).unwrap();
            prop_assert_eq!(reparsed.last_batch_number(), ledger.last_batch_number());
            prop_assert_eq!(reparsed.already_done(), ledger.already_done());
            prop_assert_eq!(reparsed, ledger);
        }
    }
}
