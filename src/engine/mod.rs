// ==========================================
// 供应商绩效汇总 - 引擎层
// ==========================================
// 职责: 汇总连接、清洗与派生指标、阶段编排
// 红线: Engine 不拼 SQL，数据访问全部经由 repository / importer
// ==========================================

pub mod aggregator;
pub mod enricher;
pub mod error;
pub mod orchestrator;

// 重导出核心引擎
pub use aggregator::VendorSummaryAggregator;
pub use enricher::{EnrichReport, SummaryEnricher};
pub use error::{EngineError, EngineResult, PipelineError};
pub use orchestrator::{PipelineOrchestrator, SummaryRunReport};
