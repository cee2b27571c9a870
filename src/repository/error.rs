// ==========================================
// 供应商绩效汇总 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 并发控制错误 =====
    #[error("运行锁已被占用: lock={lock_name}, holder={holder}, acquired_at={acquired_at}")]
    LockHeld {
        lock_name: String,
        holder: String,
        acquired_at: String,
    },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    // ===== 数据库错误 =====
    #[error("数据表不存在: {0}")]
    MissingTable(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if let Some(table) = msg.strip_prefix("no such table: ") {
                    RepositoryError::MissingTable(table.to_string())
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_missing_table_is_mapped() {
        let conn = Connection::open_in_memory().unwrap();
        let err: RepositoryError = conn
            .execute("DELETE FROM sales", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::MissingTable(ref t) if t == "sales"));
    }

    #[test]
    fn test_unique_violation_is_mapped() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE pipeline_run_lock (lock_name TEXT PRIMARY KEY);
             INSERT INTO pipeline_run_lock VALUES ('p');",
        )
        .unwrap();
        let err: RepositoryError = conn
            .execute("INSERT INTO pipeline_run_lock VALUES ('p')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }
}
