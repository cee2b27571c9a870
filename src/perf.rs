// ==========================================
// 供应商绩效汇总 - 阶段性能统计
// ==========================================
// 依赖 rusqlite trace/profile 回调统计 SQL 条数与慢 SQL
// 每个阶段结束输出一条 perf 事件（耗时、写入行数、吞吐、SQL 数）
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

static PERF_SQL_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static PERF_DEPTH: Cell<u32> = const { Cell::new(0) };
    static SQL_COUNT: Cell<u64> = const { Cell::new(0) };
    static SLOW_SQL_COUNT: Cell<u64> = const { Cell::new(0) };
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn truncate_sql(sql: &str, max_len: usize) -> String {
    let s = sql.trim().replace('\n', " ");
    if s.len() <= max_len {
        return s;
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &s[..cut])
}

/// 安装 SQLite 语句 trace/profile（用于 SQL 计数 + 慢查询日志）
///
/// 开关：
/// - Debug 默认开启；Release 默认关闭（可通过环境变量开启）
/// - `VENDOR_SUMMARY_PERF_SQL=1` 强制开启
/// - `VENDOR_SUMMARY_SLOW_SQL_MS=500` 配置慢 SQL 阈值（毫秒）
///
/// 批量 INSERT 语句很长，慢 SQL 日志只保留前 420 个字符。
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = match std::env::var("VENDOR_SUMMARY_PERF_SQL") {
        Ok(v) => is_true(&v),
        Err(_) => cfg!(debug_assertions),
    };

    PERF_SQL_ENABLED.store(enabled, Ordering::Relaxed);

    if !enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    let slow_ms = std::env::var("VENDOR_SUMMARY_SLOW_SQL_MS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(if cfg!(debug_assertions) { 200 } else { 1_000 });
    SLOW_SQL_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);

    conn.trace(Some(sql_trace_callback));
    conn.profile(Some(sql_profile_callback));
}

fn sql_trace_callback(_sql: &str) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let active = PERF_DEPTH.with(|d| d.get() > 0);
    if !active {
        return;
    }
    SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
}

fn sql_profile_callback(sql: &str, duration: Duration) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold > 0 && ms >= threshold {
        let sql_short = truncate_sql(sql, 420);
        tracing::warn!(
            target: "slow_sql",
            duration_ms = ms,
            sql = %sql_short,
            "slow sql"
        );
        let active = PERF_DEPTH.with(|d| d.get() > 0);
        if active {
            SLOW_SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
        }
    }
}

/// 阶段写入统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    pub rows: u64,
    /// 写入批次（导入阶段为成功导入的文件数）
    pub batches: u64,
}

/// 流水线阶段统计 Guard：Drop 时输出一条 `perf` 事件
///
/// 字段: stage / elapsed_ms / rows / batches / rows_per_sec / sql_count / slow_sql_count
///
/// ```ignore
/// let mut perf = vendor_summary::perf::PerfGuard::new("build_vendor_summary");
/// perf.record_rows(rows.len(), batches);
/// ```
pub struct PerfGuard {
    stage: &'static str,
    start: Instant,
    sql_start: u64,
    slow_sql_start: u64,
    stats: StageStats,
}

impl PerfGuard {
    pub fn new(stage: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            stage,
            start: Instant::now(),
            sql_start: SQL_COUNT.with(|c| c.get()),
            slow_sql_start: SLOW_SQL_COUNT.with(|c| c.get()),
            stats: StageStats::default(),
        }
    }

    /// 累加本阶段写入的行数与批次数
    pub fn record_rows(&mut self, rows: usize, batches: usize) {
        self.stats.rows = self.stats.rows.saturating_add(rows as u64);
        self.stats.batches = self.stats.batches.saturating_add(batches as u64);
    }

    pub fn stats(&self) -> &StageStats {
        &self.stats
    }

    /// 已耗时（毫秒）
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// 吞吐（行/秒），耗时为 0 时按 1ms 计
fn rows_per_sec(rows: u64, elapsed_ms: u64) -> u64 {
    rows.saturating_mul(1_000) / elapsed_ms.max(1)
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        let sql_count = SQL_COUNT.with(|c| c.get()).saturating_sub(self.sql_start);
        let slow_sql_count = SLOW_SQL_COUNT
            .with(|c| c.get())
            .saturating_sub(self.slow_sql_start);

        tracing::info!(
            target: "perf",
            stage = self.stage,
            elapsed_ms,
            rows = self.stats.rows,
            batches = self.stats.batches,
            rows_per_sec = rows_per_sec(self.stats.rows, elapsed_ms),
            sql_count,
            slow_sql_count,
            "阶段统计"
        );

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql("SELECT\n1", 100), "SELECT 1");
        assert_eq!(truncate_sql("INSERT INTO t VALUES (?)", 6), "INSERT…");
    }

    #[test]
    fn test_is_true() {
        assert!(is_true(" YES "));
        assert!(is_true("1"));
        assert!(!is_true("off"));
    }

    #[test]
    fn test_record_rows_accumulates() {
        let mut perf = PerfGuard::new("load_raw_data");
        perf.record_rows(1_820, 1);
        perf.record_rows(30, 1);
        assert_eq!(perf.stats().rows, 1_850);
        assert_eq!(perf.stats().batches, 2);
    }

    #[test]
    fn test_rows_per_sec() {
        assert_eq!(rows_per_sec(5_000, 500), 10_000);
        assert_eq!(rows_per_sec(7, 0), 7_000);
    }
}
