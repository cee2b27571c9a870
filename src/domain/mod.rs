// ==========================================
// 供应商绩效汇总 - 领域模型层
// ==========================================
// 职责: 定义聚合中间结果、汇总行、导入报告
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod load_report;
pub mod summary;

// 重导出核心类型
pub use load_report::{FileLoadOutcome, LoadReport, LoadStatus};
pub use summary::{
    EnrichedSummaryRow, FreightAggregate, PurchaseAggregate, SalesAggregate, VendorSummaryRow,
};
