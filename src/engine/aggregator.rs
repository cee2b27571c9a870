// ==========================================
// 供应商绩效汇总 - 汇总连接引擎
// ==========================================
// 职责: 采购汇总 LEFT JOIN 销售汇总 (VendorNumber=VendorNo, Brand)
//       再 LEFT JOIN 运费汇总 (VendorNumber)，并给出确定性排序
// 红线: Engine 不拼 SQL，三个聚合子集由 RawDatasetRepository 提供
// ==========================================
// 排序: TotalPurchaseDollars 降序（缺失排最后），
//       同值依次按 VendorNumber, Brand, Description,
//       PurchasePrice, ActualPrice, Volume 升序
// ==========================================

use crate::domain::summary::{FreightAggregate, PurchaseAggregate, SalesAggregate, VendorSummaryRow};
use crate::engine::error::EngineResult;
use crate::repository::RawDatasetRepository;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{info, instrument};

// ==========================================
// VendorSummaryAggregator - 汇总连接引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct VendorSummaryAggregator;

impl VendorSummaryAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 从原始数据集计算汇总行
    ///
    /// # 返回
    /// - Ok(Vec<VendorSummaryRow>): 行数等于采购汇总行数，已排序
    /// - Err: 查询失败（缺表、连接错误），不产生部分结果
    #[instrument(skip(self, repo))]
    pub fn aggregate(&self, repo: &RawDatasetRepository) -> EngineResult<Vec<VendorSummaryRow>> {
        let freight = repo.freight_totals()?;
        let purchases = repo.purchase_totals()?;
        let sales = repo.sales_totals()?;

        info!(
            freight = freight.len(),
            purchases = purchases.len(),
            sales = sales.len(),
            "聚合子集就绪"
        );

        Ok(self.join_aggregates(purchases, sales, freight))
    }

    /// 左连接三个聚合子集并排序
    ///
    /// 右侧键由 GROUP BY 保证唯一，连接不会复制采购行；
    /// VendorNumber 为空的采购行不与任何销售/运费行匹配
    pub fn join_aggregates(
        &self,
        purchases: Vec<PurchaseAggregate>,
        sales: Vec<SalesAggregate>,
        freight: Vec<FreightAggregate>,
    ) -> Vec<VendorSummaryRow> {
        let sales_by_key: HashMap<(&str, &str), &SalesAggregate> = sales
            .iter()
            .map(|s| ((s.vendor_no.as_str(), s.brand.as_str()), s))
            .collect();
        let freight_by_vendor: HashMap<&str, Option<f64>> = freight
            .iter()
            .map(|f| (f.vendor_number.as_str(), f.freight_cost))
            .collect();

        let mut rows: Vec<VendorSummaryRow> = purchases
            .into_iter()
            .map(|purchase| {
                let mut row = VendorSummaryRow::from_purchase(purchase);
                if let Some(vendor) = row.vendor_number.as_deref() {
                    if let Some(s) = sales_by_key.get(&(vendor, row.brand.as_str())) {
                        row.total_sales_quantity = s.total_sales_quantity;
                        row.total_sales_dollars = s.total_sales_dollars;
                        row.total_sales_price = s.total_sales_price;
                        row.total_excise_tax = s.total_excise_tax;
                    }
                    if let Some(cost) = freight_by_vendor.get(vendor) {
                        row.freight_cost = *cost;
                    }
                }
                row
            })
            .collect();

        rows.sort_by(compare_rows);
        rows
    }
}

fn compare_rows(a: &VendorSummaryRow, b: &VendorSummaryRow) -> Ordering {
    compare_dollars_desc(a.total_purchase_dollars, b.total_purchase_dollars)
        .then_with(|| compare_text(a.vendor_number.as_deref(), b.vendor_number.as_deref()))
        .then_with(|| compare_text(Some(a.brand.as_str()), Some(b.brand.as_str())))
        .then_with(|| compare_text(a.description.as_deref(), b.description.as_deref()))
        .then_with(|| compare_text(a.purchase_price.as_deref(), b.purchase_price.as_deref()))
        .then_with(|| compare_text(a.actual_price.as_deref(), b.actual_price.as_deref()))
        .then_with(|| compare_text(a.volume.as_deref(), b.volume.as_deref()))
}

/// 降序，None / NaN 排最后
fn compare_dollars_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.filter(|v| !v.is_nan());
    let b = b.filter(|v| !v.is_nan());
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 升序，None 在前；可解析为数值的文本排在非数值文本之前
///
/// 数值之间按数值比较（"9" < "10"），同值再按原文比较；非数值之间按原文比较
fn compare_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => match (x.trim().parse::<f64>(), y.trim().parse::<f64>()) {
            (Ok(nx), Ok(ny)) => nx.total_cmp(&ny).then_with(|| x.cmp(y)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => x.cmp(y),
        },
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase(vendor: Option<&str>, brand: &str, dollars: Option<f64>) -> PurchaseAggregate {
        PurchaseAggregate {
            vendor_number: vendor.map(str::to_string),
            vendor_name: Some("ACME".to_string()),
            brand: brand.to_string(),
            description: Some("Gin".to_string()),
            purchase_price: Some("10.0".to_string()),
            actual_price: Some("12.99".to_string()),
            volume: Some("750".to_string()),
            total_purchase_quantity: Some(100.0),
            total_purchase_dollars: dollars,
        }
    }

    fn sales(vendor: &str, brand: &str, qty: f64, dollars: f64) -> SalesAggregate {
        SalesAggregate {
            vendor_no: vendor.to_string(),
            brand: brand.to_string(),
            total_sales_quantity: Some(qty),
            total_sales_dollars: Some(dollars),
            total_sales_price: Some(12.99),
            total_excise_tax: Some(2.0),
        }
    }

    fn freight(vendor: &str, cost: f64) -> FreightAggregate {
        FreightAggregate {
            vendor_number: vendor.to_string(),
            freight_cost: Some(cost),
        }
    }

    #[test]
    fn test_join_attaches_sales_and_freight() {
        let rows = VendorSummaryAggregator::new().join_aggregates(
            vec![purchase(Some("1"), "B1", Some(1000.0))],
            vec![sales("1", "B1", 80.0, 960.0), sales("1", "B2", 1.0, 1.0)],
            vec![freight("1", 50.0), freight("2", 7.0)],
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_sales_quantity, Some(80.0));
        assert_eq!(rows[0].total_sales_dollars, Some(960.0));
        assert_eq!(rows[0].total_excise_tax, Some(2.0));
        assert_eq!(rows[0].freight_cost, Some(50.0));
    }

    #[test]
    fn test_unmatched_purchase_rows_are_kept() {
        let rows = VendorSummaryAggregator::new().join_aggregates(
            vec![
                purchase(Some("1"), "B1", Some(10.0)),
                purchase(Some("3"), "B3", Some(20.0)),
                purchase(None, "B1", Some(5.0)),
            ],
            vec![sales("1", "B1", 1.0, 1.0)],
            vec![freight("1", 1.0)],
        );

        // 行数与采购汇总一致
        assert_eq!(rows.len(), 3);
        let unmatched = rows
            .iter()
            .find(|r| r.vendor_number.as_deref() == Some("3"))
            .unwrap();
        assert_eq!(unmatched.total_sales_dollars, None);
        assert_eq!(unmatched.freight_cost, None);

        let no_vendor = rows.iter().find(|r| r.vendor_number.is_none()).unwrap();
        assert_eq!(no_vendor.total_sales_quantity, None);
        assert_eq!(no_vendor.freight_cost, None);
    }

    #[test]
    fn test_order_by_purchase_dollars_desc_missing_last() {
        let rows = VendorSummaryAggregator::new().join_aggregates(
            vec![
                purchase(Some("1"), "B1", Some(10.0)),
                purchase(Some("2"), "B2", None),
                purchase(Some("3"), "B3", Some(30.0)),
            ],
            vec![],
            vec![],
        );

        let vendors: Vec<_> = rows.iter().map(|r| r.vendor_number.clone().unwrap()).collect();
        assert_eq!(vendors, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_ties_broken_by_vendor_then_brand() {
        let rows = VendorSummaryAggregator::new().join_aggregates(
            vec![
                purchase(Some("10"), "B1", Some(100.0)),
                purchase(Some("9"), "B2", Some(100.0)),
                purchase(Some("9"), "A1", Some(100.0)),
            ],
            vec![],
            vec![],
        );

        let keys: Vec<_> = rows
            .iter()
            .map(|r| (r.vendor_number.clone().unwrap(), r.brand.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("9".to_string(), "A1".to_string()),
                ("9".to_string(), "B2".to_string()),
                ("10".to_string(), "B1".to_string()),
            ]
        );
    }

    #[test]
    fn test_tie_order_independent_of_input_order() {
        let permutations: Vec<Vec<&str>> = vec![
            vec!["2", "10", "1a", "b", "1.5"],
            vec!["1a", "10", "2", "1.5", "b"],
            vec!["b", "1.5", "1a", "2", "10"],
            vec!["10", "b", "2", "1a", "1.5"],
        ];

        let outputs: Vec<Vec<String>> = permutations
            .iter()
            .map(|order| {
                let purchases = order
                    .iter()
                    .map(|v| purchase(Some(*v), "B1", Some(100.0)))
                    .collect();
                VendorSummaryAggregator::new()
                    .join_aggregates(purchases, vec![], vec![])
                    .into_iter()
                    .map(|r| r.vendor_number.unwrap())
                    .collect()
            })
            .collect();

        // 数值在前（按数值），非数值在后（按原文）
        assert_eq!(outputs[0], vec!["1.5", "2", "10", "1a", "b"]);
        for output in &outputs[1..] {
            assert_eq!(output, &outputs[0]);
        }
    }
}
