//! 批量徽章处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，串起一次完整运行：
//!
//! 1. **加载**：模板、名单、处理记录
//! 2. **去重**：名单减去已处理的记录，没有新记录直接结束
//! 3. **规划**：批次编号、目录、补位（纯计算）
//! 4. **分发**：写出 SVG 并启动转换进程（不等待）
//! 5. **记账**：写 listing.txt，追加处理记录
//! 6. **拼版**：等待全部转换结束后调用拼版程序
//! 7. **汇总**：收集所有外部进程的退出状态
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 ProcessRunner 的模块
//! - **向下委托**：具体能力都在 services 里
//! - **不回滚**：中途失败时已写出的文件和处理记录保持原样

use crate::config::Config;
use crate::error::{AppError, AppResult, PlanningError, SetupError};
use crate::infrastructure::ProcessRunner;
use crate::models::{load_records, BatchPlan};
use crate::orchestrator::report::{RunOutcome, RunReport};
use crate::services::{LedgerStore, RenderDispatcher, SheetAssembler, SvgTemplate};
use crate::utils::logging;
use crate::workflow::batch_planner::{diff_records, plan_batch};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    working_dir: PathBuf,
}

impl App {
    /// 初始化应用
    ///
    /// 工作目录不存在时返回错误
    pub fn new(config: Config, working_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let working_dir = working_dir.into();
        if !working_dir.is_dir() {
            return Err(SetupError::WorkingDirNotFound { path: working_dir }.into());
        }
        Ok(Self {
            config,
            working_dir,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn ledger_store(&self) -> LedgerStore {
        LedgerStore::new(self.working_dir.join(&self.config.ledger_file))
    }

    /// 只规划不执行，没有新记录时返回 `None`
    pub async fn plan(&self) -> AppResult<Option<BatchPlan>> {
        let input = load_records(&self.working_dir.join(&self.config.data_file)).await?;

        let ledger = self.ledger_store().load().await?;
        let duplicates = ledger.duplicate_records();
        if !duplicates.is_empty() {
            warn!(
                "⚠️ 处理记录中有 {} 条记录出现在多个批次: {:?}",
                duplicates.len(),
                duplicates.iter().map(ToString::to_string).collect::<Vec<_>>()
            );
        }

        let new_records = diff_records(&input, &ledger.already_done());
        info!(
            "📋 名单 {} 条，已处理 {} 条，新增 {} 条",
            input.len(),
            input.len() - new_records.len(),
            new_records.len()
        );

        if new_records.is_empty() {
            return Ok(None);
        }

        let plan = plan_batch(
            &new_records,
            ledger.last_batch_number(),
            self.config.tiling.multiple(),
        )?;
        Ok(Some(plan))
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunOutcome> {
        logging::log_startup(&self.config, &self.working_dir);

        let template = SvgTemplate::load(
            &self.working_dir.join(&self.config.template_file),
            self.config.template_fields.clone(),
        )
        .await?;

        let Some(plan) = self.plan().await? else {
            info!("✓ 没有新的记录需要处理，所有记录都已在之前的批次中");
            return Ok(RunOutcome::NothingToDo);
        };
        logging::log_batch_planned(&plan);

        self.create_batch_dir(plan.directory()).await?;

        let runner = ProcessRunner::new(&self.working_dir, self.config.max_concurrent_conversions);
        let dispatcher = RenderDispatcher::new(
            &self.working_dir,
            Box::new(template),
            self.config.converter.clone(),
        );
        let dispatched = dispatcher.dispatch(&runner, &plan).await?;

        self.write_listing(&plan).await?;
        self.ledger_store()
            .append(plan.number, &plan.listing_text)
            .await?;
        info!("📝 已追加批次 {} 到 {}", plan.number, self.config.ledger_file);

        let sheet_path = plan.directory().join(&self.config.sheet_file);
        let assembler =
            SheetAssembler::new(self.config.layout.clone(), self.config.tiling.clone());
        let sheet = assembler
            .assemble(
                &runner,
                dispatched.handles,
                &dispatched.document_paths,
                &sheet_path,
            )
            .await?;

        let report = RunReport {
            batch_number: plan.number,
            directory: plan.directory.clone(),
            real_count: plan.real_count(),
            padding_count: plan.padding_count,
            sheet_path,
            conversions: sheet.conversions,
            layout: sheet.layout,
        };
        logging::print_final_stats(&report);

        Ok(RunOutcome::Completed(report))
    }

    /// 创建批次目录，已存在说明处理记录与文件系统不一致
    async fn create_batch_dir(&self, directory: &Path) -> AppResult<()> {
        let path = self.working_dir.join(directory);
        match fs::create_dir(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(PlanningError::BatchDirExists { path }.into())
            }
            Err(source) => Err(PlanningError::CreateDirFailed { path, source }.into()),
        }
    }

    async fn write_listing(&self, plan: &BatchPlan) -> AppResult<()> {
        let path = self
            .working_dir
            .join(plan.directory())
            .join(&self.config.listing_file);
        fs::write(&path, &plan.listing_text)
            .await
            .map_err(|e| AppError::write_failed(&path, e))?;

        println!("已处理:");
        print!("{}", plan.listing_text);
        Ok(())
    }
}
