// ==========================================
// 供应商绩效汇总 - 原始表批量导入器
// ==========================================
// 流程: 读表头 → 预读样本行 → 建表（全 TEXT 列）→ 分批 INSERT
// 红线: 单文件失败只记入报告，不中断批次
// 红线: 单文件的建表与写入在同一事务内，失败时表保持导入前状态
// ==========================================

use crate::config::{PipelineConfig, RawTableMode};
use crate::db::{build_multi_row_insert, effective_batch_rows, quote_ident, table_columns, table_exists};
use crate::domain::load_report::{FileLoadOutcome, LoadReport, LoadStatus};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvTable, CsvTableReader, RawRow};
use chrono::Utc;
use rusqlite::{params_from_iter, Connection, Transaction};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 单文件导入成功结果
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub table_name: String,
    pub columns: Vec<String>,
    pub rows: usize,
    pub table_created: bool,
}

// ==========================================
// RawTableLoader - 原始表导入器
// ==========================================
pub struct RawTableLoader {
    reader: CsvTableReader,
    data_dir: PathBuf,
    mode: RawTableMode,
    sample_rows: usize,
    batch_size: usize,
}

impl RawTableLoader {
    /// 按流水线配置创建导入器
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            reader: CsvTableReader::new(config.delimiter_byte(), &config.file_extension),
            data_dir: config.data_dir.clone(),
            mode: config.raw_table_mode,
            sample_rows: config.schema_sample_rows,
            batch_size: config.insert_batch_size,
        }
    }

    /// 文件名（去扩展名）即表名
    pub fn table_name_for(path: &Path) -> ImportResult<String> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if stem.is_empty() {
            return Err(ImportError::InvalidTableName(path.display().to_string()));
        }
        // sqlite_ 前缀为系统保留
        if stem.to_lowercase().starts_with("sqlite_") {
            return Err(ImportError::InvalidTableName(stem));
        }
        Ok(stem)
    }

    // ==========================================
    // 目录扫描
    // ==========================================

    /// 列出数据目录下的原始文件（按文件名排序）
    pub fn discover_files(&self) -> ImportResult<Vec<PathBuf>> {
        if !self.data_dir.is_dir() {
            return Err(ImportError::DataDirNotFound(
                self.data_dir.display().to_string(),
            ));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.is_file() && self.reader.accepts(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// 导入数据目录下的全部原始文件
    ///
    /// # 返回
    /// - Ok(LoadReport): 每个文件一条结果（含失败原因）
    /// - Err: 数据目录不存在/不可读
    #[instrument(skip(self, conn), fields(data_dir = %self.data_dir.display()))]
    pub fn load_directory(&self, conn: &mut Connection) -> ImportResult<LoadReport> {
        let files = self.discover_files()?;
        if files.is_empty() {
            warn!("数据目录中没有可导入的原始文件");
        }
        Ok(self.load_files(conn, &files))
    }

    /// 依次导入文件列表，单文件失败不影响后续文件
    pub fn load_files(&self, conn: &mut Connection, files: &[PathBuf]) -> LoadReport {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(run_id = %run_id, files = files.len(), "开始导入原始文件");

        let mut outcomes = Vec::with_capacity(files.len());
        for path in files {
            outcomes.push(self.load_file_outcome(conn, path));
        }

        let report = LoadReport {
            run_id,
            data_dir: self.data_dir.clone(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        info!(
            run_id = %report.run_id,
            loaded = report.loaded_count(),
            failed = report.failed_count(),
            total_rows = report.total_rows(),
            total_elapsed_ms = report.total_elapsed_ms(),
            "-------------- 原始文件导入完成 --------------"
        );
        report
    }

    /// 导入单个文件并转换为报告条目（错误不外抛）
    pub fn load_file_outcome(&self, conn: &mut Connection, path: &Path) -> FileLoadOutcome {
        let start = Instant::now();
        let named = Self::table_name_for(path);
        let table_name = named.as_ref().cloned().unwrap_or_default();
        let result = named.and_then(|table| self.load_file(conn, path, &table));
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let status = match result {
            Ok(loaded) => LoadStatus::Loaded {
                rows: loaded.rows,
                columns: loaded.columns,
                table_created: loaded.table_created,
            },
            Err(e) => {
                error!(file = %path.display(), error = %e, "原始文件导入失败，跳过");
                LoadStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        FileLoadOutcome {
            file_path: path.to_path_buf(),
            table_name,
            status,
            elapsed_ms,
        }
    }

    // ==========================================
    // 单文件导入
    // ==========================================

    /// 导入单个文件到指定表
    ///
    /// # 参数
    /// - conn: 数据库连接
    /// - path: 原始文件路径
    /// - table: 目标表名
    ///
    /// # 返回
    /// - Ok(LoadedTable): 列与写入行数
    /// - Err: 解析错误、表结构不一致、数据库错误
    pub fn load_file(
        &self,
        conn: &mut Connection,
        path: &Path,
        table: &str,
    ) -> ImportResult<LoadedTable> {
        let start = Instant::now();

        // === 步骤 1: 读取表头 ===
        let mut csv_table = self.reader.open(path)?;
        let columns = csv_table.columns().to_vec();

        // === 步骤 2: 预读样本行（建表前发现格式问题）===
        let sampled = csv_table.sample(self.sample_rows)?;
        debug!(table = %table, columns = columns.len(), sampled, "表头推断完成");

        info!(file = %path.display(), table = %table, "开始导入原始文件");

        // === 步骤 3: 建表 + 写入（同一事务）===
        let tx = conn.transaction()?;
        let table_created = self.prepare_table(&tx, table, &columns)?;
        let rows = self.insert_rows(&tx, table, &columns, &mut csv_table)?;
        tx.commit()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

        info!(
            table = %table,
            rows,
            table_created,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "原始表导入成功"
        );

        Ok(LoadedTable {
            table_name: table.to_string(),
            columns,
            rows,
            table_created,
        })
    }

    /// 按写入模式准备目标表，返回是否新建
    fn prepare_table(
        &self,
        tx: &Transaction,
        table: &str,
        columns: &[String],
    ) -> ImportResult<bool> {
        match self.mode {
            RawTableMode::Replace => {
                tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))?;
                create_text_table(tx, table, columns)?;
                Ok(true)
            }
            RawTableMode::Append => {
                if table_exists(tx, table)? {
                    let existing = table_columns(tx, table)?;
                    if existing != columns {
                        return Err(ImportError::SchemaMismatch {
                            table: table.to_string(),
                            expected: existing,
                            actual: columns.to_vec(),
                        });
                    }
                    Ok(false)
                } else {
                    create_text_table(tx, table, columns)?;
                    Ok(true)
                }
            }
        }
    }

    /// 分批写入全部数据行（文件顺序）
    fn insert_rows(
        &self,
        tx: &Transaction,
        table: &str,
        columns: &[String],
        csv_table: &mut CsvTable,
    ) -> ImportResult<usize> {
        let batch_rows = effective_batch_rows(self.batch_size, columns.len());
        let full_batch_sql = build_multi_row_insert(table, columns, batch_rows);

        let mut buffer: Vec<RawRow> = Vec::with_capacity(batch_rows);
        let mut total = 0usize;

        while let Some(row) = csv_table.next_row()? {
            buffer.push(row);
            if buffer.len() == batch_rows {
                let mut stmt = tx.prepare_cached(&full_batch_sql)?;
                stmt.execute(params_from_iter(buffer.iter().flatten()))?;
                total += buffer.len();
                buffer.clear();
            }
        }

        if !buffer.is_empty() {
            let sql = build_multi_row_insert(table, columns, buffer.len());
            tx.execute(&sql, params_from_iter(buffer.iter().flatten()))?;
            total += buffer.len();
        }

        Ok(total)
    }
}

/// 创建全 TEXT 列的原始表
fn create_text_table(conn: &Connection, table: &str, columns: &[String]) -> ImportResult<()> {
    let column_defs = columns
        .iter()
        .map(|c| format!("{} TEXT", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table),
        column_defs
    ))?;
    Ok(())
}
