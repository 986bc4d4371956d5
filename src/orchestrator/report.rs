//! 运行结果汇总

use crate::infrastructure::ProcessOutcome;
use std::fmt;
use std::path::PathBuf;

/// 一次运行的结果
#[derive(Debug)]
pub enum RunOutcome {
    /// 没有新记录，未产生任何文件
    NothingToDo,
    /// 生成了新批次（可能有外部进程失败）
    Completed(RunReport),
}

/// 批次处理报告
#[derive(Debug, Clone)]
pub struct RunReport {
    pub batch_number: u32,
    pub directory: PathBuf,
    pub real_count: usize,
    pub padding_count: usize,
    pub sheet_path: PathBuf,
    pub conversions: Vec<ProcessOutcome>,
    /// `None` 表示因转换失败而跳过拼版
    pub layout: Option<ProcessOutcome>,
}

impl RunReport {
    /// 所有失败的外部进程（转换在前，拼版在后）
    pub fn failures(&self) -> Vec<&ProcessOutcome> {
        self.conversions
            .iter()
            .chain(self.layout.iter())
            .filter(|o| !o.is_success())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.layout.as_ref().is_some_and(ProcessOutcome::is_success) && self.failures().is_empty()
    }

    pub fn succeeded_conversions(&self) -> usize {
        self.conversions.iter().filter(|o| o.is_success()).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "批次 {} ({}): {} 个徽章 + {} 个补位",
            self.batch_number,
            self.directory.display(),
            self.real_count,
            self.padding_count
        )?;
        writeln!(
            f,
            "转换: 成功 {}/{}",
            self.succeeded_conversions(),
            self.conversions.len()
        )?;
        match &self.layout {
            Some(layout) => writeln!(f, "拼版 {}: {}", self.sheet_path.display(), layout.status)?,
            None => writeln!(f, "拼版 {}: 已跳过（存在转换失败）", self.sheet_path.display())?,
        }

        let failures = self.failures();
        if !failures.is_empty() {
            writeln!(f, "失败 {} 项:", failures.len())?;
            for outcome in failures {
                writeln!(f, "  - {} ({}): {}", outcome.label, outcome.program, outcome.status)?;
            }
        }
        Ok(())
    }
}
