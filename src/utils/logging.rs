//! 日志工具模块
//!
//! 提供日志初始化和格式化输出的辅助函数

use crate::config::Config;
use crate::models::BatchPlan;
use crate::orchestrator::RunReport;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 日志写到 stderr，stdout 留给处理结果。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）直接忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, working_dir: &Path) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量生成徽章");
    info!("📁 工作目录: {}", working_dir.display());
    info!(
        "🧩 拼版: {}x{} ({})",
        config.tiling.tile_columns, config.tiling.tile_rows, config.tiling.paper_size
    );
    match config.max_concurrent_conversions {
        Some(n) => info!("📊 最大并发转换数: {}", n),
        None => info!("📊 最大并发转换数: 不限制"),
    }
    info!("{}", "=".repeat(60));
}

/// 记录批次规划信息
pub fn log_batch_planned(plan: &BatchPlan) {
    info!("\n{}", "=".repeat(60));
    info!("📦 新批次 {} → {}", plan.number, plan.directory.display());
    info!(
        "📄 徽章 {} 个，补位 {} 个，共 {} 个打印位",
        plan.real_count(),
        plan.padding_count,
        plan.items.len()
    );
    debug!(
        "名单预览: {}",
        truncate_text(&plan.listing_text.replace('\n', "; "), 120)
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(report: &RunReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批次 {} 处理完成统计", report.batch_number);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "✅ 转换成功: {}/{}",
        report.succeeded_conversions(),
        report.conversions.len()
    );

    let failures = report.failures();
    if failures.is_empty() {
        info!("🖨️ 打印文件: {}", report.sheet_path.display());
    } else {
        error!("❌ 失败: {}", failures.len());
        for outcome in failures {
            error!("   {} ({}): {}", outcome.label, outcome.program, outcome.status);
        }
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_text("徽章徽章徽章", 2), "徽章...");
        assert_eq!(truncate_text("abc", 5), "abc");
    }
}
