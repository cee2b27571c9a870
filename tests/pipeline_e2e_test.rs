// ==========================================
// 流水线端到端测试
// ==========================================
// 测试目标: 原始文件 → 原始表 → 聚合 → 清洗 → 汇总表
// ==========================================

mod test_helpers;

use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_helpers::{create_test_env, write_csv, write_scenario_dataset, PURCHASES_CSV};
use vendor_summary::db::open_sqlite_connection;
use vendor_summary::engine::{PipelineError, PipelineOrchestrator};
use vendor_summary::logging;
use vendor_summary::repository::{RepositoryError, RunLock, SummaryRepository, PIPELINE_LOCK_NAME};

#[test]
fn test_full_pipeline_matches_expected_summary() {
    logging::init_test();
    let env = create_test_env();
    write_scenario_dataset(env.data_dir());

    let orch = PipelineOrchestrator::new(env.config.clone()).unwrap();
    let (load, summary) = orch.run_all().unwrap();
    assert_eq!(load.loaded_count(), 4);

    // BrandC (PurchasePrice = 0) 被过滤
    assert_eq!(summary.aggregated_rows, 2);
    assert_eq!(summary.sink.rows_written, 2);

    let rows = SummaryRepository::new(orch.connection())
        .load_all(&env.config.summary_table)
        .unwrap();
    assert_eq!(rows.len(), 2);

    // 按 TotalPurchaseDollars 降序
    let top = &rows[0];
    assert_eq!(top.vendor_number, 1);
    assert_eq!(top.vendor_name, "Acme");
    assert_eq!(top.brand, "BrandA");
    assert_eq!(top.description, "Gin");
    assert_eq!(top.purchase_price, 10.0);
    assert_eq!(top.actual_price, 12.99);
    assert_eq!(top.volume, 750.0);
    assert_eq!(top.total_purchase_quantity, 100);
    assert_eq!(top.total_purchase_dollars, 1000.0);
    assert_eq!(top.total_sales_quantity, 80);
    assert_eq!(top.total_sales_dollars, 960.0);
    assert_eq!(top.total_excise_tax, 2.0);
    assert_eq!(top.freight_cost, 50.0);
    assert_eq!(top.gross_profit, -40.0);
    assert!((top.profit_margin - (-4.1667)).abs() < 1e-4);
    assert_eq!(top.stock_turnover, 0.8);
    assert_eq!(top.sales_to_purchase_ratio, 0.96);

    // 无销售、无运费的采购行
    let unmatched = &rows[1];
    assert_eq!(unmatched.vendor_number, 2);
    assert_eq!(unmatched.total_sales_quantity, 0);
    assert_eq!(unmatched.total_sales_dollars, 0.0);
    assert_eq!(unmatched.freight_cost, 0.0);
    assert_eq!(unmatched.gross_profit, -50.0);
    assert_eq!(unmatched.profit_margin, 0.0);
    assert_eq!(unmatched.stock_turnover, 0.0);
    assert_eq!(unmatched.sales_to_purchase_ratio, 0.0);
}

#[test]
fn test_rerun_is_idempotent() {
    logging::init_test();
    let env = create_test_env();
    write_scenario_dataset(env.data_dir());

    let orch = PipelineOrchestrator::new(env.config.clone()).unwrap();
    let repo = SummaryRepository::new(orch.connection());

    orch.run_all().unwrap();
    let first = repo.load_all(&env.config.summary_table).unwrap();

    orch.run_all().unwrap();
    let second = repo.load_all(&env.config.summary_table).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_summary_reflects_changed_input() {
    logging::init_test();
    let env = create_test_env();
    write_scenario_dataset(env.data_dir());

    let orch = PipelineOrchestrator::new(env.config.clone()).unwrap();
    orch.run_all().unwrap();

    // 删掉 BrandB 采购行后重跑，旧汇总被整表替换
    let trimmed: String = PURCHASES_CSV
        .lines()
        .filter(|l| !l.contains("BrandB"))
        .map(|l| format!("{}\n", l))
        .collect();
    write_csv(env.data_dir(), "purchases.csv", &trimmed);
    orch.run_all().unwrap();

    let rows = SummaryRepository::new(orch.connection())
        .load_all(&env.config.summary_table)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].brand, "BrandA");
}

#[test]
fn test_summary_stage_without_raw_tables_fails() {
    logging::init_test();
    let env = create_test_env();
    write_csv(env.data_dir(), "sales.csv", test_helpers::SALES_CSV);

    let orch = PipelineOrchestrator::new(env.config.clone()).unwrap();
    orch.run_load_stage().unwrap();

    match orch.run_summary_stage() {
        Err(PipelineError::MissingRawTables(missing)) => {
            assert_eq!(missing, vec!["vendor_invoice", "purchases", "purchase_prices"]);
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.sink)),
    }
}

#[test]
fn test_non_numeric_purchase_price_aborts_before_write() {
    logging::init_test();
    let env = create_test_env();
    write_scenario_dataset(env.data_dir());

    let orch = PipelineOrchestrator::new(env.config.clone()).unwrap();
    orch.run_all().unwrap();

    // 价格参考表 Volume 出现非数值文本
    write_csv(
        env.data_dir(),
        "purchase_prices.csv",
        "Brand,Price,Volume\nBrandA,12.99,Liter\nBrandB,7.49,750\n",
    );
    orch.run_load_stage().unwrap();
    assert!(matches!(
        orch.run_summary_stage(),
        Err(PipelineError::Engine(_))
    ));

    // 上一次的汇总保持不变
    let rows = SummaryRepository::new(orch.connection())
        .load_all(&env.config.summary_table)
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_concurrent_run_is_rejected() {
    logging::init_test();
    let env = create_test_env();
    write_scenario_dataset(env.data_dir());

    // 另一个进程持有运行锁（独立连接）
    let other = Arc::new(Mutex::new(open_sqlite_connection(env.db_path()).unwrap()));
    let held = RunLock::acquire(other, PIPELINE_LOCK_NAME, Duration::from_secs(3600)).unwrap();

    let orch = PipelineOrchestrator::new(env.config.clone()).unwrap();
    assert!(matches!(
        orch.run_load_stage(),
        Err(PipelineError::Repository(RepositoryError::LockHeld { .. }))
    ));

    held.release().unwrap();
    assert!(orch.run_load_stage().is_ok());
}
