// ==========================================
// 供应商绩效汇总 - 流水线编排器
// ==========================================
// 两个具名阶段:
// 1. load_raw_data:        原始文件 → 原始表（逐文件隔离失败）
// 2. build_vendor_summary: 原始表 → 聚合 → 清洗 → 汇总表整表替换
// 契约: 阶段 2 要求阶段 1 的四张原始表均已存在
// 并发: 两个阶段都持有同一把运行锁，跨进程不可重叠
// ==========================================

use crate::config::PipelineConfig;
use crate::db::open_sqlite_connection;
use crate::domain::LoadReport;
use crate::engine::aggregator::VendorSummaryAggregator;
use crate::engine::enricher::{EnrichReport, SummaryEnricher};
use crate::engine::error::PipelineError;
use crate::importer::RawTableLoader;
use crate::perf::{install_sqlite_tracing, PerfGuard};
use crate::repository::{
    RawDatasetRepository, RepositoryError, RunLock, SinkReport, SummaryRepository,
    PIPELINE_LOCK_NAME,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// 调试日志中预览的行数
const PREVIEW_ROWS: usize = 5;

// ==========================================
// SummaryRunReport - 汇总阶段结果
// ==========================================
#[derive(Debug, Clone)]
pub struct SummaryRunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// 连接后的汇总行数（= 采购汇总行数）
    pub aggregated_rows: usize,
    pub enrich: EnrichReport,
    pub sink: SinkReport,
}

impl SummaryRunReport {
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

// ==========================================
// PipelineOrchestrator - 流水线编排器
// ==========================================
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    conn: Arc<Mutex<Connection>>,
    aggregator: VendorSummaryAggregator,
    enricher: SummaryEnricher,
}

impl PipelineOrchestrator {
    /// 按配置打开数据库并创建编排器
    ///
    /// # 参数
    /// - config: 已校验的流水线配置（本次运行内只读）
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let mut conn = open_sqlite_connection(&config.db_path).map_err(RepositoryError::from)?;
        install_sqlite_tracing(&mut conn);
        info!(db_path = %config.db_path, "数据库连接已建立");
        Ok(Self::with_connection(config, Arc::new(Mutex::new(conn))))
    }

    /// 使用已有连接创建编排器（测试或嵌入场景）
    pub fn with_connection(config: PipelineConfig, conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            config,
            conn,
            aggregator: VendorSummaryAggregator::new(),
            enricher: SummaryEnricher::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    fn acquire_run_lock(&self) -> Result<RunLock, PipelineError> {
        let stale_after = Duration::from_secs(self.config.lock_stale_after_secs);
        Ok(RunLock::acquire(
            self.conn.clone(),
            PIPELINE_LOCK_NAME,
            stale_after,
        )?)
    }

    // ==========================================
    // 阶段 1: 原始文件导入
    // ==========================================

    /// 扫描数据目录并逐文件导入原始表
    ///
    /// # 返回
    /// - Ok(LoadReport): 每个文件的成功/失败结果（单文件失败不中断批次）
    /// - Err: 运行锁被占用、数据目录不存在等阶段级错误
    #[instrument(skip(self), fields(data_dir = %self.config.data_dir.display()))]
    pub fn run_load_stage(&self) -> Result<LoadReport, PipelineError> {
        let _lock = self.acquire_run_lock()?;
        let mut perf = PerfGuard::new("load_raw_data");

        let loader = RawTableLoader::new(&self.config);
        let report = {
            let mut conn = self
                .conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            loader.load_directory(&mut conn)?
        };
        perf.record_rows(report.total_rows(), report.loaded_count());

        info!(
            run_id = %report.run_id,
            loaded = report.loaded_count(),
            failed = report.failed_count(),
            total_rows = report.total_rows(),
            elapsed_ms = report.total_elapsed_ms(),
            "原始数据导入完成"
        );
        Ok(report)
    }

    // ==========================================
    // 阶段 2: 供应商汇总
    // ==========================================

    /// 聚合、清洗并整表替换汇总结果
    ///
    /// # 返回
    /// - Ok(SummaryRunReport): 行数、清洗统计与写入批次
    /// - Err(MissingRawTables): 原始表不全，未做任何查询
    /// - Err: 查询/转换/写入失败，汇总表保持运行前状态
    #[instrument(skip(self), fields(summary_table = %self.config.summary_table))]
    pub fn run_summary_stage(&self) -> Result<SummaryRunReport, PipelineError> {
        let _lock = self.acquire_run_lock()?;
        let mut perf = PerfGuard::new("build_vendor_summary");
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        info!(run_id = %run_id, "开始生成供应商汇总");

        let raw_repo = RawDatasetRepository::new(self.conn.clone(), self.config.tables.clone());
        let missing = raw_repo.missing_tables()?;
        if !missing.is_empty() {
            return Err(PipelineError::MissingRawTables(missing));
        }

        let rows = self.aggregator.aggregate(&raw_repo)?;
        let aggregated_rows = rows.len();
        debug!(preview = ?&rows[..rows.len().min(PREVIEW_ROWS)], "聚合结果预览");

        let (enriched, enrich) = self.enricher.enrich(rows)?;
        debug!(preview = ?&enriched[..enriched.len().min(PREVIEW_ROWS)], "清洗结果预览");

        info!(rows = enriched.len(), "写入汇总表");
        let sink = SummaryRepository::new(self.conn.clone()).replace_all(
            &self.config.summary_table,
            &enriched,
            self.config.insert_batch_size,
        )?;
        perf.record_rows(sink.rows_written, sink.batches);

        let report = SummaryRunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            aggregated_rows,
            enrich,
            sink,
        };
        info!(
            run_id = %report.run_id,
            rows = report.sink.rows_written,
            batches = report.sink.batches,
            elapsed_ms = report.elapsed_ms(),
            "供应商汇总完成"
        );
        Ok(report)
    }

    /// 顺序执行两个阶段
    pub fn run_all(&self) -> Result<(LoadReport, SummaryRunReport), PipelineError> {
        let load = self.run_load_stage()?;
        let summary = self.run_summary_stage()?;
        Ok((load, summary))
    }
}
