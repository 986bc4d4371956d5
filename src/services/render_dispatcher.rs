//! 渲染分发服务 - 业务能力层
//!
//! 为每个需要渲染的条目写出 SVG 并启动转换进程，不等待进程结束

use crate::error::{AppError, AppResult};
use crate::infrastructure::{ExternalCommand, ProcessHandle, ProcessRunner};
use crate::models::BatchPlan;
use crate::services::template::TemplateRenderer;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// 分发结果：尚未等待的进程，以及按打印位排列的文档路径
pub struct Dispatched {
    pub handles: Vec<ProcessHandle>,
    /// 补位重复指向同一个空白文档
    pub document_paths: Vec<PathBuf>,
}

/// 渲染分发器
///
/// 职责：
/// - 渲染模板并写出 SVG（写完才启动对应进程）
/// - 每个真实记录一个转换进程，空白徽章只转换一次
/// - 进程启动失败立即返回错误，退出码留给拼版前统一检查
pub struct RenderDispatcher {
    working_dir: PathBuf,
    renderer: Box<dyn TemplateRenderer>,
    converter: ExternalCommand,
}

impl RenderDispatcher {
    pub fn new(
        working_dir: impl Into<PathBuf>,
        renderer: Box<dyn TemplateRenderer>,
        converter: ExternalCommand,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            renderer,
            converter,
        }
    }

    /// 渲染并启动本批次的所有转换
    pub async fn dispatch(&self, runner: &ProcessRunner, plan: &BatchPlan) -> AppResult<Dispatched> {
        let mut handles = Vec::new();

        for item in plan.distinct_renders() {
            let markup = self.renderer.render(item.fields());
            let markup_path = self.working_dir.join(&item.markup_path);
            fs::write(&markup_path, markup)
                .await
                .map_err(|e| AppError::write_failed(&markup_path, e))?;
            debug!("已写出 {}", item.markup_path.display());

            // 子进程的工作目录就是 working_dir，参数使用相对路径
            let args = self.converter.expand_args(
                &[
                    ("input", item.markup_path.to_string_lossy().into_owned()),
                    ("output", item.document_path.to_string_lossy().into_owned()),
                ],
                &[],
            );
            let label = item.document_path.display().to_string();
            handles.push(runner.launch(label, &self.converter, args).await?);
        }

        info!(
            "🚀 已启动 {} 个转换进程（{} 个真实徽章，{} 个补位）",
            handles.len(),
            plan.real_count(),
            plan.padding_count
        );

        Ok(Dispatched {
            handles,
            document_paths: plan.document_paths(),
        })
    }
}
