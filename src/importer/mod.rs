// ==========================================
// 供应商绩效汇总 - 导入层
// ==========================================
// 职责: 原始文件 → 原始表（全 TEXT 列，表名取自文件名）
// 支持: 分隔文本文件（默认 CSV）
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod raw_table_loader;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvTable, CsvTableReader, RawRow};
pub use raw_table_loader::{LoadedTable, RawTableLoader};
