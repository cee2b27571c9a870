// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时目录/数据库、原始 CSV 文件生成、流水线配置
// ==========================================

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vendor_summary::config::PipelineConfig;

/// 测试环境: 临时目录（需要保持存活）+ 指向其中的配置
pub struct TestEnv {
    pub dir: TempDir,
    pub config: PipelineConfig,
}

impl TestEnv {
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn db_path(&self) -> &str {
        &self.config.db_path
    }
}

/// 创建临时测试环境
///
/// # 返回
/// - data/ 目录已创建、数据库位于临时目录、日志仅输出到 stdout
pub fn create_test_env() -> TestEnv {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let config = PipelineConfig {
        db_path: dir.path().join("inventory.db").to_string_lossy().to_string(),
        data_dir,
        log_file: None,
        ..PipelineConfig::default()
    };

    TestEnv { dir, config }
}

/// 写入一个原始文件
pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// 运费明细（供应商 1 共 50）
pub const VENDOR_INVOICE_CSV: &str = "\
VendorNumber,VendorName,InvoiceDate,PONumber,Quantity,Dollars,Freight
1,Acme,2024-01-01,100,60,600,20
1,Acme,2024-02-01,101,40,400,30
";

/// 采购明细
/// - BrandA: 两行合计 100 件 / 1000 元
/// - BrandB: 无销售、无运费
/// - BrandC: PurchasePrice = 0，被过滤
pub const PURCHASES_CSV: &str = "\
InventoryId,Store,Brand,Description,Size,VendorNumber,VendorName,PONumber,PurchasePrice,Quantity,Dollars
1_A_BrandA,1,BrandA,Gin ,750mL,1,Acme  ,100,10.0,60,600
1_A_BrandA,1,BrandA,Gin ,750mL,1,Acme  ,101,10.0,40,400
2_B_BrandB,1,BrandB,Rum,750mL,2,Beta,102,5.0,10,50
3_C_BrandC,1,BrandC,Free,750mL,3,Gamma,103,0,5,0
";

/// 品牌价格参考
pub const PURCHASE_PRICES_CSV: &str = "\
Brand,Description,Price,Size,Volume,Classification,PurchasePrice,VendorNumber,VendorName
BrandA,Gin,12.99,750mL,750,1,10.0,1,Acme
BrandB,Rum,7.49,750mL,750,1,5.0,2,Beta
BrandC,Free,1,750mL,750,1,0,3,Gamma
";

/// 销售明细（供应商 1 / BrandA 合计 80 件 / 960 元）
pub const SALES_CSV: &str = "\
InventoryId,Store,Brand,Description,SalesQuantity,SalesDollars,SalesPrice,SalesDate,Volume,Classification,ExciseTax,VendorNo,VendorName
1_A_BrandA,1,BrandA,Gin,50,600,12.99,2024-01-05,750,1,1.25,1,Acme
1_A_BrandA,1,BrandA,Gin,30,360,12.99,2024-01-06,750,1,0.75,1,Acme
";

/// 写入完整的四个原始文件
pub fn write_scenario_dataset(data_dir: &Path) {
    write_csv(data_dir, "vendor_invoice.csv", VENDOR_INVOICE_CSV);
    write_csv(data_dir, "purchases.csv", PURCHASES_CSV);
    write_csv(data_dir, "purchase_prices.csv", PURCHASE_PRICES_CSV);
    write_csv(data_dir, "sales.csv", SALES_CSV);
}
