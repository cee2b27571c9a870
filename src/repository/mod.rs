// ==========================================
// 供应商绩效汇总 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 值一律参数化绑定,标识符统一经 quote_ident 转义
// ==========================================

pub mod error;
pub mod raw_dataset_repo;
pub mod run_lock_repo;
pub mod summary_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use raw_dataset_repo::RawDatasetRepository;
pub use run_lock_repo::{RunLock, PIPELINE_LOCK_NAME};
pub use summary_repo::{SinkReport, SummaryRepository};
