//! 外部进程执行器 - 基础设施层
//!
//! 只暴露"启动一个外部程序"的能力，不认识徽章、批次或记录

use crate::error::{AppError, AppResult, ProcessError};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

/// 展开为多个参数的占位符
const INPUTS_PLACEHOLDER: &str = "{inputs}";

/// 外部程序及其参数模板
///
/// 参数中的 `{name}` 占位符在启动前替换，`{inputs}` 单独成参数时展开为多个参数
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ExternalCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// 替换参数模板中的占位符
    ///
    /// # 参数
    /// - `vars`: 单值占位符（不含花括号）
    /// - `inputs`: `{inputs}` 展开的参数列表
    pub fn expand_args(&self, vars: &[(&str, String)], inputs: &[String]) -> Vec<String> {
        let mut expanded = Vec::with_capacity(self.args.len() + inputs.len());
        for arg in &self.args {
            if arg == INPUTS_PLACEHOLDER {
                expanded.extend(inputs.iter().cloned());
                continue;
            }
            let mut value = arg.clone();
            for (name, replacement) in vars {
                value = value.replace(&format!("{{{name}}}"), replacement);
            }
            expanded.push(value);
        }
        expanded
    }
}

/// 进程执行器
///
/// 职责：
/// - 在工作目录中启动外部程序，不等待其结束
/// - 可选地用 Semaphore 限制同时运行的进程数
pub struct ProcessRunner {
    working_dir: PathBuf,
    limiter: Option<Arc<Semaphore>>,
}

impl ProcessRunner {
    /// 创建新的进程执行器
    ///
    /// # 参数
    /// - `working_dir`: 子进程的工作目录
    /// - `max_concurrent`: 同时运行的进程上限，`None` 表示不限制
    pub fn new(working_dir: impl Into<PathBuf>, max_concurrent: Option<usize>) -> Self {
        Self {
            working_dir: working_dir.into(),
            limiter: max_concurrent.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// 启动外部程序并立即返回句柄
    ///
    /// 设置了并发上限时，会先等待一个许可，许可在进程退出后释放。
    /// 程序无法启动（例如不存在）时返回错误。
    pub async fn launch(
        &self,
        label: impl Into<String>,
        command: &ExternalCommand,
        args: Vec<String>,
    ) -> AppResult<ProcessHandle> {
        let label = label.into();

        let permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| ProcessError::SemaphoreClosed)?,
            ),
            None => None,
        };

        debug!("启动: {} {:?}", command.program, args);

        let mut child = Command::new(&command.program)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| AppError::launch_failed(&command.program, e))?;

        let task = tokio::spawn(async move {
            let _permit = permit;
            child.wait().await
        });

        Ok(ProcessHandle {
            label,
            program: command.program.clone(),
            task,
        })
    }
}

/// 尚未等待的外部进程
pub struct ProcessHandle {
    label: String,
    program: String,
    task: JoinHandle<std::io::Result<ExitStatus>>,
}

impl ProcessHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 等待进程结束并返回结果
    pub async fn join(self) -> ProcessOutcome {
        let status = match self.task.await {
            Ok(Ok(status)) if status.success() => ProcessStatus::Succeeded,
            Ok(Ok(status)) => ProcessStatus::Failed {
                code: status.code(),
            },
            Ok(Err(e)) => ProcessStatus::WaitFailed(e.to_string()),
            Err(e) => ProcessStatus::WaitFailed(e.to_string()),
        };

        ProcessOutcome {
            label: self.label,
            program: self.program,
            status,
        }
    }
}

/// 单个外部进程的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// 进程对应的条目（通常是输出文件名）
    pub label: String,
    pub program: String,
    pub status: ProcessStatus,
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        self.status == ProcessStatus::Succeeded
    }
}

/// 进程退出状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    Succeeded,
    /// 非零退出，`code` 为 `None` 表示被信号终止
    Failed { code: Option<i32> },
    /// 等待进程时出错
    WaitFailed(String),
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Succeeded => write!(f, "成功"),
            ProcessStatus::Failed { code: Some(code) } => write!(f, "退出码 {}", code),
            ProcessStatus::Failed { code: None } => write!(f, "被信号终止"),
            ProcessStatus::WaitFailed(msg) => write!(f, "等待失败: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_args_replaces_scalars_and_spreads_inputs() {
        let command = ExternalCommand::new(
            "pdfjam",
            ["--nup", "{columns}x{rows}", "--outfile", "{output}", "{inputs}"],
        );
        let args = command.expand_args(
            &[
                ("columns", "2".to_string()),
                ("rows", "4".to_string()),
                ("output", "out.pdf".to_string()),
            ],
            &["a.pdf".to_string(), "b.pdf".to_string()],
        );
        assert_eq!(
            args,
            vec!["--nup", "2x4", "--outfile", "out.pdf", "a.pdf", "b.pdf"]
        );
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let command = ExternalCommand::new("x", ["{nothing}"]);
        assert_eq!(command.expand_args(&[], &[]), vec!["{nothing}"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_codes_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(dir.path(), None);

        let ok = runner
            .launch("ok", &ExternalCommand::new("true", Vec::<String>::new()), vec![])
            .await
            .unwrap();
        let failed = runner
            .launch(
                "failed",
                &ExternalCommand::new("sh", Vec::<String>::new()),
                vec!["-c".to_string(), "exit 3".to_string()],
            )
            .await
            .unwrap();

        assert!(ok.join().await.is_success());
        let outcome = failed.join().await;
        assert_eq!(outcome.label, "failed");
        assert_eq!(outcome.status, ProcessStatus::Failed { code: Some(3) });
    }

    #[tokio::test]
    async fn missing_program_fails_to_launch() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(dir.path(), None);
        let result = runner
            .launch(
                "x",
                &ExternalCommand::new("badge-batch-no-such-program", Vec::<String>::new()),
                vec![],
            )
            .await;
        assert!(matches!(
            result,
            Err(AppError::Process(ProcessError::LaunchFailed { .. }))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn bounded_runner_still_runs_everything() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(dir.path(), Some(1));
        let command = ExternalCommand::new("true", Vec::<String>::new());

        let mut handles = Vec::new();
        for i in 0..4 {
            handles.push(runner.launch(format!("job{i}"), &command, vec![]).await.unwrap());
        }
        for handle in handles {
            assert!(handle.join().await.is_success());
        }
    }
}
