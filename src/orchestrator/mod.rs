//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次完整运行的调度，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量徽章处理器
//! - 加载输入、去重、规划批次
//! - 持有 ProcessRunner，分发转换并等待
//! - 追加处理记录、拼版
//!
//! ### `report` - 运行结果
//! - 汇总所有外部进程的退出状态
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (一次运行)
//!     ↓
//! workflow::batch_planner (纯规划)
//!     ↓
//! services (能力层：template / render_dispatcher / ledger_store / sheet_assembler)
//!     ↓
//! infrastructure (基础设施：ProcessRunner)
//! ```

pub mod batch_processor;
pub mod report;

pub use batch_processor::App;
pub use report::{RunOutcome, RunReport};
