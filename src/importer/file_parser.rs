// ==========================================
// 供应商绩效汇总 - 原始文件解析器
// ==========================================
// 格式: 分隔符可配置，双引号包裹，\n 换行（兼容 \r\n）
// 表头: 第一行，列名保持原样（大小写/顺序不变）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::{ReaderBuilder, StringRecord};
use std::collections::{HashSet, VecDeque};
use std::fs::File;
use std::path::Path;

/// 一行原始数据（缺失列为 None）
pub type RawRow = Vec<Option<String>>;

// ==========================================
// CsvTableReader - 按配置打开原始文件
// ==========================================
#[derive(Debug, Clone)]
pub struct CsvTableReader {
    delimiter: u8,
    extension: String,
}

impl CsvTableReader {
    pub fn new(delimiter: u8, extension: &str) -> Self {
        Self {
            delimiter,
            extension: extension.trim().trim_start_matches('.').to_lowercase(),
        }
    }

    /// 判断文件扩展名是否为原始文件
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    /// 打开文件并读取表头
    pub fn open(&self, path: &Path) -> ImportResult<CsvTable> {
        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if !self.accepts(path) {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default();
            return Err(ImportError::UnsupportedFormat(ext, self.extension.clone()));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .quote(b'"')
            .has_headers(true)
            .flexible(true) // 行长度校验由 CsvTable 负责
            .from_reader(file);

        let header = reader.headers()?.clone();
        let columns = validate_header(&header, path)?;

        Ok(CsvTable {
            columns,
            reader,
            buffered: VecDeque::new(),
        })
    }
}

/// 校验表头：非空、列名非空、列名不重复（SQLite 列名大小写不敏感）
fn validate_header(header: &StringRecord, path: &Path) -> ImportResult<Vec<String>> {
    if header.is_empty() || header.iter().all(|h| h.trim().is_empty()) {
        return Err(ImportError::EmptyHeader(path.display().to_string()));
    }

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(header.len());
    for (idx, raw) in header.iter().enumerate() {
        let name = if idx == 0 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };
        if name.trim().is_empty() {
            return Err(ImportError::InvalidHeader {
                column: idx + 1,
                message: "列名为空".to_string(),
            });
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(ImportError::InvalidHeader {
                column: idx + 1,
                message: format!("列名重复: {}", name),
            });
        }
        columns.push(name.to_string());
    }
    Ok(columns)
}

// ==========================================
// CsvTable - 已打开的原始文件（流式读取数据行）
// ==========================================
pub struct CsvTable {
    columns: Vec<String>,
    reader: csv::Reader<File>,
    buffered: VecDeque<RawRow>,
}

impl CsvTable {
    /// 表头列名
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 预读前 n 行用于表结构校验
    ///
    /// 预读的行会被缓存，后续 next_row 仍按文件顺序返回
    pub fn sample(&mut self, n: usize) -> ImportResult<usize> {
        while self.buffered.len() < n {
            match self.read_record()? {
                Some(row) => self.buffered.push_back(row),
                None => break,
            }
        }
        Ok(self.buffered.len())
    }

    /// 读取下一行数据（不含表头）
    pub fn next_row(&mut self) -> ImportResult<Option<RawRow>> {
        if let Some(row) = self.buffered.pop_front() {
            return Ok(Some(row));
        }
        self.read_record()
    }

    fn read_record(&mut self) -> ImportResult<Option<RawRow>> {
        let mut record = StringRecord::new();
        if !self.reader.read_record(&mut record)? {
            return Ok(None);
        }

        let expected = self.columns.len();
        if record.len() > expected {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(ImportError::MalformedRow {
                line,
                expected,
                actual: record.len(),
            });
        }

        // 短行补 NULL
        let mut row: RawRow = record.iter().map(|v| Some(v.to_string())).collect();
        row.resize(expected, None);
        Ok(Some(row))
    }
}
