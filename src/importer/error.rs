// ==========================================
// 供应商绩效汇总 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 单文件导入失败在批次内被收集为 LoadStatus::Failed，不中断批次
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（期望扩展名 .{1}）")]
    UnsupportedFormat(String, String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("原始数据目录不存在: {0}")]
    DataDirNotFound(String),

    // ===== 表头/表结构错误 =====
    #[error("表头为空: {0}")]
    EmptyHeader(String),

    #[error("表头非法 (列 {column}): {message}")]
    InvalidHeader { column: usize, message: String },

    #[error("表名非法: {0}")]
    InvalidTableName(String),

    #[error("表结构不一致 (表 {table}): 现有列 {expected:?}，文件表头 {actual:?}")]
    SchemaMismatch {
        table: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    // ===== 数据行错误 =====
    #[error("数据行格式错误 (行 {line}): 期望最多 {expected} 列，实际 {actual} 列")]
    MalformedRow {
        line: u64,
        expected: usize,
        actual: usize,
    },

    // ===== 数据库错误 =====
    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(io) => ImportError::FileReadError(io.to_string()),
            _ => ImportError::CsvParseError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
