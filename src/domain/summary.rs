// ==========================================
// 供应商绩效汇总 - 汇总领域模型
// ==========================================
// 数据流: 三个聚合子集 → VendorSummaryRow（左连接结果）
//        → EnrichedSummaryRow（清洗 + 派生指标）
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// FreightAggregate - 运费汇总（每供应商一行）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreightAggregate {
    pub vendor_number: String,     // 供应商编号（原始文本）
    pub freight_cost: Option<f64>, // SUM(Freight)，全部为空时为 None
}

// ==========================================
// PurchaseAggregate - 采购汇总
// ==========================================
// 主键: (VendorNumber, VendorName, Brand, Description, PurchasePrice, ActualPrice, Volume)
// 过滤: PurchasePrice <= 0 的采购行不参与汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseAggregate {
    pub vendor_number: Option<String>, // 采购行允许供应商编号为空（清洗阶段补 0）
    pub vendor_name: Option<String>,
    pub brand: String,
    pub description: Option<String>,
    pub purchase_price: Option<String>, // 采购单价（原始文本，清洗阶段转浮点）
    pub actual_price: Option<String>,   // 价格参考表 Price
    pub volume: Option<String>,         // 价格参考表 Volume
    pub total_purchase_quantity: Option<f64>,
    pub total_purchase_dollars: Option<f64>,
}

// ==========================================
// SalesAggregate - 销售汇总（每 (VendorNo, Brand) 一行）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesAggregate {
    pub vendor_no: String,
    pub brand: String,
    pub total_sales_quantity: Option<f64>,
    pub total_sales_dollars: Option<f64>,
    pub total_sales_price: Option<f64>,
    pub total_excise_tax: Option<f64>,
}

// ==========================================
// VendorSummaryRow - 采购汇总左连接销售/运费后的原始汇总行
// ==========================================
// 红线: 行数与 PurchaseAggregate 一致，未匹配的销售/运费字段为 None
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSummaryRow {
    // ===== 采购侧（主表）=====
    pub vendor_number: Option<String>,
    pub vendor_name: Option<String>,
    pub brand: String,
    pub description: Option<String>,
    pub purchase_price: Option<String>,
    pub actual_price: Option<String>,
    pub volume: Option<String>,
    pub total_purchase_quantity: Option<f64>,
    pub total_purchase_dollars: Option<f64>,

    // ===== 销售侧（左连接）=====
    pub total_sales_quantity: Option<f64>,
    pub total_sales_dollars: Option<f64>,
    pub total_sales_price: Option<f64>,
    pub total_excise_tax: Option<f64>,

    // ===== 运费侧（左连接）=====
    pub freight_cost: Option<f64>,
}

impl VendorSummaryRow {
    /// 由采购汇总构建，销售/运费字段待连接填充
    pub fn from_purchase(purchase: PurchaseAggregate) -> Self {
        Self {
            vendor_number: purchase.vendor_number,
            vendor_name: purchase.vendor_name,
            brand: purchase.brand,
            description: purchase.description,
            purchase_price: purchase.purchase_price,
            actual_price: purchase.actual_price,
            volume: purchase.volume,
            total_purchase_quantity: purchase.total_purchase_quantity,
            total_purchase_dollars: purchase.total_purchase_dollars,
            total_sales_quantity: None,
            total_sales_dollars: None,
            total_sales_price: None,
            total_excise_tax: None,
            freight_cost: None,
        }
    }
}

// ==========================================
// EnrichedSummaryRow - 清洗 + 派生指标后的最终汇总行
// ==========================================
// 对齐: vendor_sales_summary 表（列顺序同 SUMMARY_COLUMNS）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSummaryRow {
    pub vendor_number: i64,
    pub vendor_name: String,
    pub brand: String,
    pub description: String,
    pub purchase_price: f64,
    pub actual_price: f64,
    pub volume: f64,
    pub total_purchase_quantity: i64,
    pub total_purchase_dollars: f64,
    pub total_sales_quantity: i64,
    pub total_sales_dollars: f64,
    pub total_sales_price: f64,
    pub total_excise_tax: f64,
    pub freight_cost: f64,

    // ===== 派生指标 =====
    pub gross_profit: f64,            // 毛利 = 销售额 - 采购额
    pub profit_margin: f64,           // 毛利率（%），销售额为 0 时为 0
    pub stock_turnover: f64,          // 库存周转 = 销量 / 采购量，采购量为 0 时为 0
    pub sales_to_purchase_ratio: f64, // 销采比 = 销售额 / 采购额，采购额为 0 时为 0
}

/// 汇总表列名（持久化顺序）
pub const SUMMARY_COLUMNS: [&str; 18] = [
    "VendorNumber",
    "VendorName",
    "Brand",
    "Description",
    "PurchasePrice",
    "ActualPrice",
    "Volume",
    "TotalPurchaseQuantity",
    "TotalPurchaseDollars",
    "TotalSalesQuantity",
    "TotalSalesDollars",
    "TotalSalesPrice",
    "TotalExciseTax",
    "FreightCost",
    "GrossProfit",
    "ProfitMargin",
    "StockTurnover",
    "SalesToPurchaseRatio",
];
