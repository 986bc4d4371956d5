//! # Badge Batch
//!
//! 根据名单和 SVG 模板批量生成徽章，并拼成可直接打印的 PDF
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露"启动外部程序"的能力
//! - `ProcessRunner` - 启动进程、可选并发上限、返回未等待的句柄
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `SvgTemplate` - 字段 → SVG
//! - `RenderDispatcher` - 写 SVG 并启动转换
//! - `LedgerStore` - 读取 / 追加处理记录
//! - `SheetAssembler` - 等待转换并拼版
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/batch_planner` - 去重、批次编号、补位（纯计算）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 一次完整运行
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, TilingConfig};
pub use error::{AppError, AppResult};
pub use infrastructure::{ExternalCommand, ProcessRunner};
pub use models::{BatchPlan, Ledger, OutputItem, Record};
pub use orchestrator::{App, RunOutcome, RunReport};
