//! 拼版服务 - 业务能力层
//!
//! 等待所有转换进程结束，再调用拼版程序把文档排到打印纸上

use crate::config::TilingConfig;
use crate::error::AppResult;
use crate::infrastructure::{ExternalCommand, ProcessHandle, ProcessOutcome, ProcessRunner};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 拼版阶段的结果
#[derive(Debug, Clone)]
pub struct SheetOutcome {
    /// 每个转换进程的结果
    pub conversions: Vec<ProcessOutcome>,
    /// 拼版进程的结果，转换有失败时为 `None`（未执行）
    pub layout: Option<ProcessOutcome>,
}

/// 拼版器
pub struct SheetAssembler {
    layout: ExternalCommand,
    tiling: TilingConfig,
}

impl SheetAssembler {
    pub fn new(layout: ExternalCommand, tiling: TilingConfig) -> Self {
        Self { layout, tiling }
    }

    /// 拼版程序的参数
    pub fn layout_args(&self, document_paths: &[PathBuf], sheet_path: &Path) -> Vec<String> {
        let inputs: Vec<String> = document_paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();

        self.layout.expand_args(
            &[
                ("columns", self.tiling.tile_columns.to_string()),
                ("rows", self.tiling.tile_rows.to_string()),
                ("paper", self.tiling.paper_size.clone()),
                ("frame", self.tiling.frame.to_string()),
                ("autoscale", self.tiling.autoscale.to_string()),
                ("noautoscale", (!self.tiling.autoscale).to_string()),
                ("output", sheet_path.to_string_lossy().into_owned()),
            ],
            &inputs,
        )
    }

    /// 等待全部转换结束后拼版
    ///
    /// # 参数
    /// - `handles`: 分发阶段启动的转换进程
    /// - `document_paths`: 按打印位排列的文档路径（相对工作目录）
    /// - `sheet_path`: 输出的打印文件（相对工作目录）
    pub async fn assemble(
        &self,
        runner: &ProcessRunner,
        handles: Vec<ProcessHandle>,
        document_paths: &[PathBuf],
        sheet_path: &Path,
    ) -> AppResult<SheetOutcome> {
        info!("⏳ 等待 {} 个转换进程结束...", handles.len());
        let conversions = wait_all(handles).await;

        let failed = conversions.iter().filter(|o| !o.is_success()).count();
        if failed > 0 {
            warn!("⚠️ {} 个转换失败，跳过拼版", failed);
            return Ok(SheetOutcome {
                conversions,
                layout: None,
            });
        }

        info!(
            "🖨️ 拼版 {} 个打印位 → {}",
            document_paths.len(),
            sheet_path.display()
        );
        let args = self.layout_args(document_paths, sheet_path);
        let handle = runner
            .launch(sheet_path.display().to_string(), &self.layout, args)
            .await?;
        let layout = handle.join().await;

        Ok(SheetOutcome {
            conversions,
            layout: Some(layout),
        })
    }
}

/// 等待所有进程结束，结果顺序与句柄顺序一致
pub async fn wait_all(handles: Vec<ProcessHandle>) -> Vec<ProcessOutcome> {
    join_all(handles.into_iter().map(ProcessHandle::join)).await
}
