// ==========================================
// 供应商绩效汇总 - 阶段 1 入口: 原始文件导入
// ==========================================
// 用法:
//   load_raw_data
// 配置来自 vendor_summary.json / VENDOR_SUMMARY_* 环境变量，无命令行参数
// ==========================================

use anyhow::Context;
use vendor_summary::config::PipelineConfig;
use vendor_summary::engine::PipelineOrchestrator;
use vendor_summary::logging;

fn main() -> anyhow::Result<()> {
    let config = PipelineConfig::load().context("加载流水线配置失败")?;

    match &config.log_file {
        Some(path) => logging::init_with_file(path, config.log_format)
            .with_context(|| format!("无法打开日志文件: {}", path.display()))?,
        None => logging::init(),
    }

    tracing::info!("==================================================");
    tracing::info!("供应商绩效汇总 - 原始文件导入");
    tracing::info!("系统版本: {}", vendor_summary::VERSION);
    tracing::info!("==================================================");

    let orchestrator = PipelineOrchestrator::new(config).inspect_err(|e| {
        tracing::error!(error = %e, "初始化失败");
    })?;

    let report = orchestrator.run_load_stage().inspect_err(|e| {
        tracing::error!(error = %e, "原始文件导入失败");
    })?;

    for (path, reason) in report.failures() {
        tracing::warn!(file = %path.display(), reason = %reason, "文件导入失败，已跳过");
    }
    tracing::info!(
        loaded = report.loaded_count(),
        failed = report.failed_count(),
        "导入阶段结束"
    );
    Ok(())
}
