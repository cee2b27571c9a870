// ==========================================
// 供应商绩效汇总 - 阶段 2 入口: 生成汇总表
// ==========================================
// 用法:
//   build_vendor_summary
// 前置: load_raw_data 已导入 vendor_invoice / purchases / purchase_prices / sales
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
    tracing::info!("供应商绩效汇总 - 生成汇总表");
    tracing::info!("系统版本: {}", vendor_summary::VERSION);
    tracing::info!("==================================================");

    let orchestrator = PipelineOrchestrator::new(config).inspect_err(|e| {
        tracing::error!(error = %e, "初始化失败");
    })?;

    let report = orchestrator.run_summary_stage().inspect_err(|e| {
        tracing::error!(error = %e, "汇总阶段失败");
    })?;

    tracing::info!(
        table = %report.sink.table,
        rows = report.sink.rows_written,
        non_finite_replaced = report.enrich.non_finite_replaced,
        elapsed_ms = report.elapsed_ms(),
        "汇总阶段结束"
    );
    Ok(())
}
