// ==========================================
// 供应商绩效汇总 - 原始数据集聚合查询
// ==========================================
// 三个具名聚合步骤，各自可独立执行与测试:
// - freight_totals:  运费按 VendorNumber 汇总
// - purchase_totals: 采购明细 JOIN 价格参考，过滤 PurchasePrice <= 0，按属性组汇总
// - sales_totals:    销售按 (VendorNo, Brand) 汇总
// 最终左连接与排序在 engine::aggregator 中完成
// ==========================================
// 说明: 原始表全部为 TEXT 列，数值一律 CAST 为 REAL 后参与比较/求和
// ==========================================

use crate::config::DatasetTables;
use crate::db::{quote_ident, table_exists};
use crate::domain::summary::{FreightAggregate, PurchaseAggregate, SalesAggregate};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// RawDatasetRepository - 原始数据集仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct RawDatasetRepository {
    conn: Arc<Mutex<Connection>>,
    tables: DatasetTables,
}

impl RawDatasetRepository {
    pub fn new(conn: Arc<Mutex<Connection>>, tables: DatasetTables) -> Self {
        Self { conn, tables }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 返回缺失的原始表（按依赖顺序）
    pub fn missing_tables(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut missing = Vec::new();
        for table in self.tables.all() {
            if !table_exists(&conn, table)? {
                missing.push(table.to_string());
            }
        }
        Ok(missing)
    }

    /// 运费汇总: SUM(Freight) GROUP BY VendorNumber
    pub fn freight_totals(&self) -> RepositoryResult<Vec<FreightAggregate>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT
                CAST(VendorNumber AS TEXT) AS VendorNumber,
                SUM(CAST(Freight AS REAL)) AS FreightCost
            FROM {}
            WHERE VendorNumber IS NOT NULL
            GROUP BY VendorNumber
            "#,
            quote_ident(&self.tables.invoices)
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FreightAggregate {
                    vendor_number: row.get(0)?,
                    freight_cost: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(rows = rows.len(), "运费汇总完成");
        Ok(rows)
    }

    /// 采购汇总: purchases JOIN purchase_prices ON Brand，过滤 PurchasePrice <= 0
    pub fn purchase_totals(&self) -> RepositoryResult<Vec<PurchaseAggregate>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT
                CAST(p.VendorNumber AS TEXT) AS VendorNumber,
                CAST(p.VendorName AS TEXT) AS VendorName,
                CAST(p.Brand AS TEXT) AS Brand,
                CAST(p.Description AS TEXT) AS Description,
                CAST(p.PurchasePrice AS TEXT) AS PurchasePrice,
                CAST(pp.Price AS TEXT) AS ActualPrice,
                CAST(pp.Volume AS TEXT) AS Volume,
                SUM(CAST(p.Quantity AS REAL)) AS TotalPurchaseQuantity,
                SUM(CAST(p.Dollars AS REAL)) AS TotalPurchaseDollars
            FROM {purchases} p
            JOIN {prices} pp
                ON p.Brand = pp.Brand
            WHERE CAST(p.PurchasePrice AS REAL) > 0
            GROUP BY p.VendorNumber, p.VendorName, p.Brand, p.Description,
                     p.PurchasePrice, pp.Price, pp.Volume
            "#,
            purchases = quote_ident(&self.tables.purchases),
            prices = quote_ident(&self.tables.purchase_prices),
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PurchaseAggregate {
                    vendor_number: row.get(0)?,
                    vendor_name: row.get(1)?,
                    brand: row.get(2)?,
                    description: row.get(3)?,
                    purchase_price: row.get(4)?,
                    actual_price: row.get(5)?,
                    volume: row.get(6)?,
                    total_purchase_quantity: row.get(7)?,
                    total_purchase_dollars: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(rows = rows.len(), "采购汇总完成");
        Ok(rows)
    }

    /// 销售汇总: GROUP BY (VendorNo, Brand)
    pub fn sales_totals(&self) -> RepositoryResult<Vec<SalesAggregate>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT
                CAST(VendorNo AS TEXT) AS VendorNo,
                CAST(Brand AS TEXT) AS Brand,
                SUM(CAST(SalesQuantity AS REAL)) AS TotalSalesQuantity,
                SUM(CAST(SalesDollars AS REAL)) AS TotalSalesDollars,
                SUM(CAST(SalesPrice AS REAL)) AS TotalSalesPrice,
                SUM(CAST(ExciseTax AS REAL)) AS TotalExciseTax
            FROM {}
            WHERE VendorNo IS NOT NULL AND Brand IS NOT NULL
            GROUP BY VendorNo, Brand
            "#,
            quote_ident(&self.tables.sales)
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SalesAggregate {
                    vendor_no: row.get(0)?,
                    brand: row.get(1)?,
                    total_sales_quantity: row.get(2)?,
                    total_sales_dollars: row.get(3)?,
                    total_sales_price: row.get(4)?,
                    total_excise_tax: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(rows = rows.len(), "销售汇总完成");
        Ok(rows)
    }
}
