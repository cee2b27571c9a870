// ==========================================
// 供应商绩效汇总 - 汇总清洗与派生指标
// ==========================================
// 步骤（对整批数据）:
// 1. 缺失值补 0（空白文本按缺失处理）
// 2. 非有限值（±inf / NaN）同样补 0，并计数上报
// 3. VendorName / Description 去首尾空白
// 4. 数值类型转换: 浮点列 parse，整数列截断取整
// 5. 派生指标: GrossProfit / ProfitMargin / StockTurnover / SalesToPurchaseRatio
// ==========================================
// 红线: 纯函数，不访问数据库；任一文本无法转换即整批失败
// ==========================================

use crate::domain::summary::{EnrichedSummaryRow, VendorSummaryRow};
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 清洗统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichReport {
    /// 输出行数
    pub rows: usize,
    /// 缺失值补 0 次数
    pub nulls_filled: usize,
    /// 非有限值补 0 次数
    pub non_finite_replaced: usize,
}

// ==========================================
// SummaryEnricher - 汇总清洗器
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryEnricher;

impl SummaryEnricher {
    pub fn new() -> Self {
        Self
    }

    /// 清洗汇总行并计算派生指标
    ///
    /// # 参数
    /// - rows: 连接后的汇总行（顺序保持不变）
    ///
    /// # 返回
    /// - Ok((rows, report)): 清洗后的行与统计
    /// - Err(Coercion): 某个文本字段不是合法数值
    pub fn enrich(
        &self,
        rows: Vec<VendorSummaryRow>,
    ) -> EngineResult<(Vec<EnrichedSummaryRow>, EnrichReport)> {
        let mut report = EnrichReport::default();
        let mut enriched = Vec::with_capacity(rows.len());

        for (index, row) in rows.into_iter().enumerate() {
            let mut cleaner = RowCleaner {
                row: index,
                report: &mut report,
            };
            enriched.push(cleaner.clean(row)?);
        }
        report.rows = enriched.len();

        if report.non_finite_replaced > 0 {
            warn!(
                count = report.non_finite_replaced,
                "非有限数值已按 0 处理"
            );
        }
        info!(
            rows = report.rows,
            nulls_filled = report.nulls_filled,
            "汇总清洗完成"
        );

        Ok((enriched, report))
    }
}

/// 单行清洗上下文（携带行号用于错误定位）
struct RowCleaner<'a> {
    row: usize,
    report: &'a mut EnrichReport,
}

impl RowCleaner<'_> {
    fn clean(&mut self, raw: VendorSummaryRow) -> EngineResult<EnrichedSummaryRow> {
        let vendor_number = self.text_to_int("VendorNumber", raw.vendor_number.as_deref())?;
        let purchase_price = self.text_to_float("PurchasePrice", raw.purchase_price.as_deref())?;
        let actual_price = self.text_to_float("ActualPrice", raw.actual_price.as_deref())?;
        let volume = self.text_to_float("Volume", raw.volume.as_deref())?;

        let total_purchase_quantity = self.truncate(raw.total_purchase_quantity);
        let total_purchase_dollars = self.fill(raw.total_purchase_dollars);
        let total_sales_quantity = self.truncate(raw.total_sales_quantity);
        let total_sales_dollars = self.fill(raw.total_sales_dollars);
        let total_sales_price = self.fill(raw.total_sales_price);
        let total_excise_tax = self.fill(raw.total_excise_tax);
        let freight_cost = self.fill(raw.freight_cost);

        let gross_profit = self.finite(total_sales_dollars - total_purchase_dollars);
        let profit_margin = if total_sales_dollars != 0.0 {
            self.finite(gross_profit / total_sales_dollars * 100.0)
        } else {
            0.0
        };
        let stock_turnover = if total_purchase_quantity != 0 {
            self.finite(total_sales_quantity as f64 / total_purchase_quantity as f64)
        } else {
            0.0
        };
        let sales_to_purchase_ratio = if total_purchase_dollars != 0.0 {
            self.finite(total_sales_dollars / total_purchase_dollars)
        } else {
            0.0
        };

        Ok(EnrichedSummaryRow {
            vendor_number,
            vendor_name: trim_text(raw.vendor_name),
            brand: raw.brand,
            description: trim_text(raw.description),
            purchase_price,
            actual_price,
            volume,
            total_purchase_quantity,
            total_purchase_dollars,
            total_sales_quantity,
            total_sales_dollars,
            total_sales_price,
            total_excise_tax,
            freight_cost,
            gross_profit,
            profit_margin,
            stock_turnover,
            sales_to_purchase_ratio,
        })
    }

    /// 缺失 → 0；非有限 → 0
    fn fill(&mut self, value: Option<f64>) -> f64 {
        match value {
            Some(v) => self.finite(v),
            None => {
                self.report.nulls_filled += 1;
                0.0
            }
        }
    }

    fn finite(&mut self, value: f64) -> f64 {
        if value.is_finite() {
            value
        } else {
            self.report.non_finite_replaced += 1;
            0.0
        }
    }

    /// 浮点截断为整数（向零取整）
    fn truncate(&mut self, value: Option<f64>) -> i64 {
        self.fill(value).trunc() as i64
    }

    fn text_to_float(&mut self, field: &'static str, value: Option<&str>) -> EngineResult<f64> {
        let text = match value.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(self.fill(None)),
        };
        let parsed = text
            .parse::<f64>()
            .map_err(|_| self.coercion(field, text, "f64"))?;
        Ok(self.finite(parsed))
    }

    /// 整数文本直接解析；小数文本向零截断（"12.9" → 12）
    fn text_to_int(&mut self, field: &'static str, value: Option<&str>) -> EngineResult<i64> {
        let text = match value.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(self.truncate(None)),
        };
        if let Ok(v) = text.parse::<i64>() {
            return Ok(v);
        }
        let parsed = text
            .parse::<f64>()
            .map_err(|_| self.coercion(field, text, "i64"))?;
        Ok(self.truncate(Some(parsed)))
    }

    fn coercion(&self, field: &'static str, value: &str, target: &'static str) -> EngineError {
        EngineError::Coercion {
            row: self.row,
            field,
            value: value.to_string(),
            target,
        }
    }
}

fn trim_text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
