// ==========================================
// 供应商绩效汇总 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一标识符引用（表名/列名来自文件名与表头，不可信）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::Path;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// SQLite 单条语句可绑定参数上限（SQLITE_MAX_VARIABLE_NUMBER，3.32+ 默认值）
pub const MAX_BOUND_PARAMS: usize = 32_766;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
///
/// 父目录不存在时自动创建（创建失败直接返回错误）；
/// 文件库额外启用 WAL，内存库保持默认日志模式。
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("无法创建数据库目录 {}: {}", parent.display(), e)),
                )
            })?;
        }
    }

    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    if db_path != ":memory:" {
        // journal_mode 会返回一行结果，只能用 query_row
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    }
    Ok(conn)
}

/// 引用 SQL 标识符（双引号包裹，内部双引号加倍）
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// 判断表是否存在
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
            [table],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    Ok(found)
}

/// 读取表的列名（按定义顺序）
///
/// 表不存在时返回空列表
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// 统计表行数
pub fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    conn.query_row(&sql, [], |row| row.get(0))
}

/// 计算多行 INSERT 每批实际行数
///
/// 受 MAX_BOUND_PARAMS 限制，至少为 1
pub fn effective_batch_rows(requested: usize, column_count: usize) -> usize {
    let by_params = MAX_BOUND_PARAMS / column_count.max(1);
    requested.min(by_params).max(1)
}

/// 构建多行 INSERT 语句: INSERT INTO "t" ("a", "b") VALUES (?, ?), (?, ?)
pub fn build_multi_row_insert(table: &str, columns: &[String], rows: usize) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let row_placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![row_placeholders; rows].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        column_list,
        values
    )
}
