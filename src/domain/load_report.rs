// ==========================================
// 供应商绩效汇总 - 原始文件导入报告
// ==========================================
// 每个文件一条结果（成功/失败 + 原因），汇总为批次报告
// 调用方可程序化检查，不依赖日志
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 单文件导入状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    Loaded {
        rows: usize,          // 写入行数（不含表头）
        columns: Vec<String>, // 表头推断出的列
        table_created: bool,  // 本次是否新建表
    },
    Failed {
        reason: String,
    },
}

/// 单文件导入结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLoadOutcome {
    pub file_path: PathBuf,
    pub table_name: String,
    pub status: LoadStatus,
    pub elapsed_ms: u64,
}

impl FileLoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded { .. })
    }

    /// 成功时返回写入行数
    pub fn rows(&self) -> Option<usize> {
        match &self.status {
            LoadStatus::Loaded { rows, .. } => Some(*rows),
            LoadStatus::Failed { .. } => None,
        }
    }
}

// ==========================================
// LoadReport - 批次导入报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub run_id: String,
    pub data_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<FileLoadOutcome>,
}

impl LoadReport {
    pub fn loaded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_loaded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.loaded_count()
    }

    /// 失败文件列表（文件路径, 原因）
    pub fn failures(&self) -> Vec<(&PathBuf, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                LoadStatus::Failed { reason } => Some((&o.file_path, reason.as_str())),
                LoadStatus::Loaded { .. } => None,
            })
            .collect()
    }

    pub fn total_rows(&self) -> usize {
        self.outcomes.iter().filter_map(|o| o.rows()).sum()
    }

    /// 按表名查找结果
    pub fn outcome_for(&self, table_name: &str) -> Option<&FileLoadOutcome> {
        self.outcomes.iter().find(|o| o.table_name == table_name)
    }

    pub fn total_elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(table: &str, status: LoadStatus) -> FileLoadOutcome {
        FileLoadOutcome {
            file_path: PathBuf::from(format!("data/{}.csv", table)),
            table_name: table.to_string(),
            status,
            elapsed_ms: 1,
        }
    }

    #[test]
    fn test_report_counts() {
        let now = Utc::now();
        let report = LoadReport {
            run_id: "r1".to_string(),
            data_dir: PathBuf::from("data"),
            started_at: now,
            finished_at: now,
            outcomes: vec![
                outcome(
                    "sales",
                    LoadStatus::Loaded {
                        rows: 10,
                        columns: vec!["Brand".to_string()],
                        table_created: true,
                    },
                ),
                outcome(
                    "broken",
                    LoadStatus::Failed {
                        reason: "CSV 解析失败".to_string(),
                    },
                ),
                outcome(
                    "purchases",
                    LoadStatus::Loaded {
                        rows: 5,
                        columns: vec![],
                        table_created: false,
                    },
                ),
            ],
        };

        assert_eq!(report.loaded_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.total_rows(), 15);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].1, "CSV 解析失败");
        assert_eq!(report.outcome_for("sales").and_then(|o| o.rows()), Some(10));
        assert!(report.outcome_for("missing").is_none());
    }

    #[test]
    fn test_status_serializes_with_tag() {
        let status = LoadStatus::Failed {
            reason: "x".to_string(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["reason"], "x");
    }
}
