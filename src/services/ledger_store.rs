//! 处理记录读写服务 - 业务能力层
//!
//! 只负责读取和追加 generated_status.txt，已有内容永远不会被改写

use crate::error::{AppError, AppResult};
use crate::models::ledger::listing_text;
use crate::models::{Ledger, LedgerEntry};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 处理记录文件
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取原始文本，文件不存在视为空（第一次运行）
    async fn read_text(&self) -> AppResult<String> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(AppError::read_failed(&self.path, e)),
        }
    }

    /// 读取并解析处理记录
    pub async fn load(&self) -> AppResult<Ledger> {
        let text = self.read_text().await?;
        Ok(Ledger::parse(&text)?)
    }

    /// 追加一个批次
    ///
    /// 已有内容不以空行结尾时先补足分隔，保证新批次独立成块
    ///
    /// # 参数
    /// - `number`: 批次编号
    /// - `listing_text`: 本批次名单（以换行结尾）
    pub async fn append(&self, number: u32, listing_text: &str) -> AppResult<()> {
        let existing = self.read_text().await?;
        let separator = if existing.is_empty() || existing.ends_with("\n\n") {
            ""
        } else if existing.ends_with('\n') {
            "\n"
        } else {
            "\n\n"
        };

        let entry = format!("{}Batch {}:\n{}", separator, number, listing_text);
        debug!("追加处理记录: 批次 {} | {} 字节", number, entry.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AppError::write_failed(&self.path, e))?;

        file.write_all(entry.as_bytes())
            .await
            .map_err(|e| AppError::write_failed(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| AppError::write_failed(&self.path, e))?;

        Ok(())
    }

    /// 追加一个已构造的批次
    pub async fn append_entry(&self, entry: &LedgerEntry) -> AppResult<()> {
        self.append(entry.number, &listing_text(&entry.records)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[tokio::test]
    async fn first_append_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path().join("generated_status.txt"));

        assert_eq!(store.load().await.unwrap().last_batch_number(), 0);
        store.append(1, "Alice,Acme\n").await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "Batch 1:\nAlice,Acme\n");
    }

    #[tokio::test]
    async fn later_appends_are_blank_line_separated() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path().join("generated_status.txt"));

        store.append(1, "Alice,Acme\n").await.unwrap();
        store
            .append_entry(&LedgerEntry {
                number: 2,
                records: vec![Record::new(["Bob", "Globex"])],
            })
            .await
            .unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "Batch 1:\nAlice,Acme\n\nBatch 2:\nBob,Globex\n");

        let ledger = store.load().await.unwrap();
        assert_eq!(ledger.last_batch_number(), 2);
        assert_eq!(ledger.already_done().len(), 2);
    }

    #[tokio::test]
    async fn missing_trailing_newline_is_repaired_before_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated_status.txt");
        std::fs::write(&path, "Batch 1:\nAlice,Acme").unwrap();

        let store = LedgerStore::new(&path);
        store.append(2, "Bob,Globex\n").await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Batch 1:\nAlice,Acme"));
        assert_eq!(store.load().await.unwrap().last_batch_number(), 2);
    }

    #[tokio::test]
    async fn corrupted_ledger_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated_status.txt");
        std::fs::write(&path, "Batch x:\nAlice,Acme\n").unwrap();

        let err = LedgerStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, AppError::Ledger(_)));
    }
}
