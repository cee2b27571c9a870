// ==========================================
// 供应商绩效汇总 - 运行锁（单实例保护）
// ==========================================
// 两次流水线运行不可重叠（汇总表整表替换会互相覆盖）
// 实现: pipeline_run_lock 表主键互斥，IMMEDIATE 事务内检查 + 插入
// 超过 stale_after 的锁视为遗留锁，可被接管
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// 流水线运行锁名
pub const PIPELINE_LOCK_NAME: &str = "vendor_summary_pipeline";

const CREATE_LOCK_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS pipeline_run_lock (
        lock_name TEXT PRIMARY KEY,
        holder TEXT NOT NULL,
        acquired_at TEXT NOT NULL
    )
"#;

// ==========================================
// RunLock - 运行锁守卫（Drop 时释放）
// ==========================================
pub struct RunLock {
    conn: Arc<Mutex<Connection>>,
    lock_name: String,
    holder: String,
    released: bool,
}

impl RunLock {
    /// 获取运行锁
    ///
    /// # 返回
    /// - Ok(RunLock): 获取成功
    /// - Err(LockHeld): 锁被其他运行持有且未过期
    pub fn acquire(
        conn: Arc<Mutex<Connection>>,
        lock_name: &str,
        stale_after: Duration,
    ) -> RepositoryResult<Self> {
        let holder = format!("pid-{}-{}", std::process::id(), Uuid::new_v4());
        let now = Utc::now();

        {
            let mut guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            guard.execute_batch(CREATE_LOCK_TABLE_SQL)?;

            let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let existing: Option<(String, String)> = tx
                .query_row(
                    "SELECT holder, acquired_at FROM pipeline_run_lock WHERE lock_name = ?1",
                    params![lock_name],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            if let Some((current_holder, acquired_at)) = existing {
                if !is_stale(&acquired_at, now, stale_after) {
                    return Err(RepositoryError::LockHeld {
                        lock_name: lock_name.to_string(),
                        holder: current_holder,
                        acquired_at,
                    });
                }
                warn!(
                    lock_name = %lock_name,
                    stale_holder = %current_holder,
                    acquired_at = %acquired_at,
                    "接管过期运行锁"
                );
                tx.execute(
                    "DELETE FROM pipeline_run_lock WHERE lock_name = ?1",
                    params![lock_name],
                )?;
            }

            tx.execute(
                "INSERT INTO pipeline_run_lock (lock_name, holder, acquired_at) VALUES (?1, ?2, ?3)",
                params![lock_name, holder, now.to_rfc3339()],
            )?;
            tx.commit()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        }

        info!(lock_name = %lock_name, holder = %holder, "获取运行锁");
        Ok(Self {
            conn,
            lock_name: lock_name.to_string(),
            holder,
            released: false,
        })
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// 显式释放运行锁
    pub fn release(mut self) -> RepositoryResult<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> RepositoryResult<()> {
        if self.released {
            return Ok(());
        }
        let guard = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        guard.execute(
            "DELETE FROM pipeline_run_lock WHERE lock_name = ?1 AND holder = ?2",
            params![self.lock_name, self.holder],
        )?;
        self.released = true;
        info!(lock_name = %self.lock_name, "释放运行锁");
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner() {
            warn!(lock_name = %self.lock_name, error = %e, "运行锁释放失败");
        }
    }
}

/// 判断锁是否过期；时间戳无法解析时按过期处理
fn is_stale(acquired_at: &str, now: DateTime<Utc>, stale_after: Duration) -> bool {
    match DateTime::parse_from_rfc3339(acquired_at) {
        Ok(ts) => {
            let age = now.signed_duration_since(ts.with_timezone(&Utc));
            age.to_std().map(|d| d >= stale_after).unwrap_or(false)
        }
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let conn = setup_test_db();
        let lock = RunLock::acquire(conn.clone(), "p", Duration::from_secs(60)).unwrap();

        let second = RunLock::acquire(conn.clone(), "p", Duration::from_secs(60));
        assert!(matches!(second, Err(RepositoryError::LockHeld { .. })));

        lock.release().unwrap();
        assert!(RunLock::acquire(conn, "p", Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_lock_released_on_drop() {
        let conn = setup_test_db();
        {
            let _lock = RunLock::acquire(conn.clone(), "p", Duration::from_secs(60)).unwrap();
        }
        assert!(RunLock::acquire(conn, "p", Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_stale_lock_is_taken_over() {
        let conn = setup_test_db();
        {
            let guard = conn.lock().unwrap();
            guard.execute_batch(CREATE_LOCK_TABLE_SQL).unwrap();
            guard
                .execute(
                    "INSERT INTO pipeline_run_lock VALUES ('p', 'old', '2020-01-01T00:00:00+00:00')",
                    [],
                )
                .unwrap();
        }

        let lock = RunLock::acquire(conn.clone(), "p", Duration::from_secs(60)).unwrap();
        assert_ne!(lock.holder(), "old");
    }

    #[test]
    fn test_is_stale() {
        let now = Utc::now();
        let recent = now.to_rfc3339();
        assert!(!is_stale(&recent, now, Duration::from_secs(60)));
        assert!(is_stale("garbage", now, Duration::from_secs(60)));
    }
}
