// ==========================================
// 供应商绩效汇总 - 引擎层错误类型
// ==========================================
// EngineError: 纯计算步骤（连接/清洗）的错误
// PipelineError: 阶段级错误，汇总各层错误供入口统一处理
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 文本字段无法转换为目标数值类型
    #[error("数值转换失败 (row={row}, field={field}, target={target}): {value:?}")]
    Coercion {
        row: usize,
        field: &'static str,
        value: String,
        target: &'static str,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 流水线阶段错误
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("导入失败: {0}")]
    Import(#[from] ImportError),

    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("引擎错误: {0}")]
    Engine(#[from] EngineError),

    /// 汇总阶段依赖的原始表缺失（需先运行导入阶段）
    #[error("原始表缺失: {0:?}")]
    MissingRawTables(Vec<String>),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
