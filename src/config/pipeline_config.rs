// ==========================================
// 供应商绩效汇总 - 流水线配置
// ==========================================
// 来源优先级: 环境变量 > JSON 配置文件 > 默认值
// ==========================================

use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置文件路径环境变量
pub const ENV_CONFIG_PATH: &str = "VENDOR_SUMMARY_CONFIG";
/// 数据库路径覆写
pub const ENV_DB_PATH: &str = "VENDOR_SUMMARY_DB_PATH";
/// 原始文件目录覆写
pub const ENV_DATA_DIR: &str = "VENDOR_SUMMARY_DATA_DIR";
/// 未指定配置文件时，在工作目录查找的文件名
pub const DEFAULT_CONFIG_FILE: &str = "vendor_summary.json";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    Io { path: String, message: String },

    #[error("配置文件解析失败 ({path}): {message}")]
    Parse { path: String, message: String },

    #[error("配置项非法 (field: {field}): {message}")]
    Invalid { field: String, message: String },
}

/// 原始表写入模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawTableMode {
    /// 每次导入删表重建（重复运行结果一致）
    #[default]
    Replace,
    /// 表不存在时创建；已存在时要求表头一致，追加写入
    Append,
}

/// 汇总查询依赖的原始数据集表名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetTables {
    /// 运费明细（VendorNumber, Freight）
    pub invoices: String,
    /// 采购明细
    pub purchases: String,
    /// 品牌价格参考
    pub purchase_prices: String,
    /// 销售明细
    pub sales: String,
}

impl Default for DatasetTables {
    fn default() -> Self {
        Self {
            invoices: "vendor_invoice".to_string(),
            purchases: "purchases".to_string(),
            purchase_prices: "purchase_prices".to_string(),
            sales: "sales".to_string(),
        }
    }
}

impl DatasetTables {
    /// 全部表名（按汇总查询依赖顺序）
    pub fn all(&self) -> [&str; 4] {
        [
            self.invoices.as_str(),
            self.purchases.as_str(),
            self.purchase_prices.as_str(),
            self.sales.as_str(),
        ]
    }
}

// ==========================================
// PipelineConfig - 流水线配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// SQLite 数据库文件路径
    pub db_path: String,
    /// 原始文件目录
    pub data_dir: PathBuf,
    /// 原始文件扩展名（不区分大小写）
    pub file_extension: String,
    /// 字段分隔符（单字节 ASCII）
    pub delimiter: char,
    /// 表头推断后预读校验的数据行数
    pub schema_sample_rows: usize,
    /// 原始表写入模式
    pub raw_table_mode: RawTableMode,
    /// 多行 INSERT 每批行数
    pub insert_batch_size: usize,
    /// 汇总结果表名
    pub summary_table: String,
    /// 原始数据集表名
    pub tables: DatasetTables,
    /// 日志文件（None 表示仅输出到 stdout）
    pub log_file: Option<PathBuf>,
    /// 日志文件格式
    pub log_format: LogFormat,
    /// 运行锁超时接管阈值（秒）
    pub lock_stale_after_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            data_dir: PathBuf::from("data"),
            file_extension: "csv".to_string(),
            delimiter: ',',
            schema_sample_rows: 5,
            raw_table_mode: RawTableMode::Replace,
            insert_batch_size: 5_000,
            summary_table: "vendor_sales_summary".to_string(),
            tables: DatasetTables::default(),
            log_file: Some(PathBuf::from("logs/vendor_summary.log")),
            log_format: LogFormat::Text,
            lock_stale_after_secs: 6 * 60 * 60,
        }
    }
}

/// 默认数据库路径
///
/// 优先使用用户数据目录；拿不到时回退到工作目录
pub fn default_db_path() -> String {
    let mut path = PathBuf::from("./inventory.db");

    if let Some(data_dir) = dirs::data_dir() {
        path = data_dir.join("vendor-summary").join("inventory.db");
    }

    path.to_string_lossy().to_string()
}

impl PipelineConfig {
    /// 加载配置：配置文件 → 环境变量覆写 → 校验
    ///
    /// 配置文件查找顺序：
    /// 1. 环境变量 VENDOR_SUMMARY_CONFIG 指定的文件（不存在即报错）
    /// 2. 工作目录下的 vendor_summary.json（存在才读取）
    /// 3. 全部使用默认值
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::from_file(local)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件读取配置（缺省字段使用默认值）
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// 应用环境变量覆写（空值忽略）
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var(ENV_DB_PATH) {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                self.db_path = trimmed.to_string();
            }
        }
        if let Ok(v) = std::env::var(ENV_DATA_DIR) {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                self.data_dir = PathBuf::from(trimmed);
            }
        }
    }

    /// 校验配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.trim().is_empty() {
            return Err(invalid("db_path", "不能为空"));
        }
        if !self.delimiter.is_ascii() {
            return Err(invalid("delimiter", "必须是单字节 ASCII 字符"));
        }
        if self.schema_sample_rows == 0 {
            return Err(invalid("schema_sample_rows", "必须大于 0"));
        }
        if self.insert_batch_size == 0 {
            return Err(invalid("insert_batch_size", "必须大于 0"));
        }
        if self.file_extension.trim().is_empty() {
            return Err(invalid("file_extension", "不能为空"));
        }
        if self.summary_table.trim().is_empty() {
            return Err(invalid("summary_table", "不能为空"));
        }

        let tables = [
            ("tables.invoices", &self.tables.invoices),
            ("tables.purchases", &self.tables.purchases),
            ("tables.purchase_prices", &self.tables.purchase_prices),
            ("tables.sales", &self.tables.sales),
        ];
        for (field, name) in tables {
            if name.trim().is_empty() {
                return Err(invalid(field, "不能为空"));
            }
            if name.eq_ignore_ascii_case(&self.summary_table) {
                return Err(invalid(
                    "summary_table",
                    &format!("不能与原始表 {} 同名", name),
                ));
            }
        }
        Ok(())
    }

    /// 分隔符字节（validate 已保证为 ASCII）
    pub fn delimiter_byte(&self) -> u8 {
        let mut buf = [0u8; 4];
        self.delimiter.encode_utf8(&mut buf);
        buf[0]
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}
