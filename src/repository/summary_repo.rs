// ==========================================
// 供应商绩效汇总 - 汇总结果落库
// ==========================================
// 语义: 整表替换（DROP → CREATE → 分批 INSERT），不做增量 upsert
// 红线: 整个替换过程在单一事务内，失败时回滚，旧表保持完整
// ==========================================

use crate::db::{build_multi_row_insert, effective_batch_rows, quote_ident, table_exists};
use crate::domain::summary::{EnrichedSummaryRow, SUMMARY_COLUMNS};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::ToSql;
use rusqlite::{Connection, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// 汇总表列类型（与 SUMMARY_COLUMNS 一一对应）
const SUMMARY_COLUMN_TYPES: [&str; 18] = [
    "INTEGER", // VendorNumber
    "TEXT",    // VendorName
    "TEXT",    // Brand
    "TEXT",    // Description
    "REAL",    // PurchasePrice
    "REAL",    // ActualPrice
    "REAL",    // Volume
    "INTEGER", // TotalPurchaseQuantity
    "REAL",    // TotalPurchaseDollars
    "INTEGER", // TotalSalesQuantity
    "REAL",    // TotalSalesDollars
    "REAL",    // TotalSalesPrice
    "REAL",    // TotalExciseTax
    "REAL",    // FreightCost
    "REAL",    // GrossProfit
    "REAL",    // ProfitMargin
    "REAL",    // StockTurnover
    "REAL",    // SalesToPurchaseRatio
];

/// 落库结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub table: String,
    pub rows_written: usize,
    pub batches: usize,
}

// ==========================================
// SummaryRepository - 汇总表仓储
// ==========================================
pub struct SummaryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SummaryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整表替换汇总结果
    ///
    /// # 参数
    /// - table: 目标表名
    /// - rows: 清洗后的汇总行（按最终顺序写入）
    /// - batch_size: 每批行数（受 SQLite 参数上限约束）
    ///
    /// # 返回
    /// - Ok(SinkReport): 写入行数与批次数
    /// - Err: 数据库错误（事务已回滚，旧表不变）
    pub fn replace_all(
        &self,
        table: &str,
        rows: &[EnrichedSummaryRow],
        batch_size: usize,
    ) -> RepositoryResult<SinkReport> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))?;
        tx.execute_batch(&create_table_sql(table))?;

        let batch_rows = effective_batch_rows(batch_size, SUMMARY_COLUMNS.len());
        let mut batches = 0;
        for chunk in rows.chunks(batch_rows) {
            insert_chunk(&tx, table, chunk)?;
            batches += 1;
            debug!(table = %table, batch = batches, rows = chunk.len(), "汇总批次写入");
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(table = %table, rows = rows.len(), batches, "汇总表替换完成");
        Ok(SinkReport {
            table: table.to_string(),
            rows_written: rows.len(),
            batches,
        })
    }

    /// 读取汇总表全部行（按写入顺序）
    pub fn load_all(&self, table: &str) -> RepositoryResult<Vec<EnrichedSummaryRow>> {
        let conn = self.get_conn()?;
        if !table_exists(&conn, table)? {
            return Err(RepositoryError::MissingTable(table.to_string()));
        }

        let column_list = SUMMARY_COLUMNS
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            column_list,
            quote_ident(table)
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_summary_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn create_table_sql(table: &str) -> String {
    let column_defs = SUMMARY_COLUMNS
        .iter()
        .zip(SUMMARY_COLUMN_TYPES.iter())
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", quote_ident(table), column_defs)
}

fn insert_chunk(
    tx: &Transaction,
    table: &str,
    chunk: &[EnrichedSummaryRow],
) -> RepositoryResult<()> {
    let columns: Vec<String> = SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect();
    let sql = build_multi_row_insert(table, &columns, chunk.len());

    let mut values: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() * SUMMARY_COLUMNS.len());
    for row in chunk {
        values.extend_from_slice(&row_params(row));
    }

    let mut stmt = tx.prepare_cached(&sql)?;
    stmt.execute(&*values)?;
    Ok(())
}

fn row_params(row: &EnrichedSummaryRow) -> [&dyn ToSql; 18] {
    [
        &row.vendor_number,
        &row.vendor_name,
        &row.brand,
        &row.description,
        &row.purchase_price,
        &row.actual_price,
        &row.volume,
        &row.total_purchase_quantity,
        &row.total_purchase_dollars,
        &row.total_sales_quantity,
        &row.total_sales_dollars,
        &row.total_sales_price,
        &row.total_excise_tax,
        &row.freight_cost,
        &row.gross_profit,
        &row.profit_margin,
        &row.stock_turnover,
        &row.sales_to_purchase_ratio,
    ]
}

fn map_summary_row(row: &Row) -> rusqlite::Result<EnrichedSummaryRow> {
    Ok(EnrichedSummaryRow {
        vendor_number: row.get(0)?,
        vendor_name: row.get(1)?,
        brand: row.get(2)?,
        description: row.get(3)?,
        purchase_price: row.get(4)?,
        actual_price: row.get(5)?,
        volume: row.get(6)?,
        total_purchase_quantity: row.get(7)?,
        total_purchase_dollars: row.get(8)?,
        total_sales_quantity: row.get(9)?,
        total_sales_dollars: row.get(10)?,
        total_sales_price: row.get(11)?,
        total_excise_tax: row.get(12)?,
        freight_cost: row.get(13)?,
        gross_profit: row.get(14)?,
        profit_margin: row.get(15)?,
        stock_turnover: row.get(16)?,
        sales_to_purchase_ratio: row.get(17)?,
    })
}
