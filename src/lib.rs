// ==========================================
// 供应商绩效汇总 - 核心库
// ==========================================
// 两阶段批处理:
// 1. 原始文件批量导入 SQLite（全 TEXT 列）
// 2. 采购/销售/运费聚合 → 清洗与派生指标 → 汇总表整表替换
// 技术栈: Rust + SQLite (rusqlite)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 汇总行与导入报告
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 连接/清洗/编排
pub mod engine;

// 导入层 - 原始文件
pub mod importer;

// 配置层 - 流水线配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 阶段性能统计
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{PipelineConfig, RawTableMode};
pub use domain::{EnrichedSummaryRow, LoadReport, VendorSummaryRow};
pub use engine::{
    PipelineError, PipelineOrchestrator, SummaryEnricher, SummaryRunReport,
    VendorSummaryAggregator,
};
pub use importer::RawTableLoader;
pub use repository::SummaryRepository;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "供应商绩效汇总";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
