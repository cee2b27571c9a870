// ==========================================
// 供应商绩效汇总 - 配置层
// ==========================================
// 职责: 流水线配置加载、环境变量覆写、合法性校验
// 生命周期: 每次运行构建一次，以引用传入各组件
// ==========================================

pub mod pipeline_config;

// 重导出核心配置
pub use pipeline_config::{ConfigError, DatasetTables, PipelineConfig, RawTableMode};
