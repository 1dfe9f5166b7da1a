//! 按项目、按小时统计 ERROR / CRITICAL 日志数

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Timelike, Utc};

use crate::model::record::{ErrorLevel, LogRecord};

/// 单个小时桶内的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCounts {
    pub error: u64,
    pub critical: u64,
}

impl ErrorCounts {
    fn increment(&mut self, level: ErrorLevel) {
        match level {
            ErrorLevel::Error => self.error += 1,
            ErrorLevel::Critical => self.critical += 1,
        }
    }
}

/// 单批次更新结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistogramUpdate {
    /// 计入直方图的记录数
    pub counted: usize,
    /// 级别符合但缺少 project / timestamp 而被跳过的记录数
    pub skipped: usize,
}

/// project -> 小时桶（"00".."23"）-> 计数
///
/// 计数只增不减；小时桶按挂钟时间划分，跨天的同一小时累加到同一个桶。
#[derive(Debug, Clone, Default)]
pub struct ErrorHistogram {
    projects: BTreeMap<String, BTreeMap<String, ErrorCounts>>,
}

impl ErrorHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并一批日志，小时桶按 `tz` 的挂钟时间划分
    pub fn update_in<Tz: TimeZone>(&mut self, batch: &[LogRecord], tz: &Tz) -> HistogramUpdate {
        let mut result = HistogramUpdate::default();

        for record in batch {
            let Some(level) = record.error_level() else {
                continue;
            };

            let project = record.project.as_deref();
            let hour = record.timestamp.and_then(|ts| hour_bucket(ts, tz));
            let (Some(project), Some(hour)) = (project, hour) else {
                tracing::warn!(
                    level = level.as_str(),
                    project = ?record.project,
                    timestamp = ?record.timestamp,
                    "日志记录缺少 project 或有效 timestamp，已跳过"
                );
                result.skipped += 1;
                continue;
            };

            self.record(project, &hour, level);
            result.counted += 1;
        }

        result
    }

    /// 计数加一，不存在的项目 / 小时桶会以零值创建
    pub fn record(&mut self, project: &str, hour: &str, level: ErrorLevel) {
        self.projects
            .entry(project.to_string())
            .or_default()
            .entry(hour.to_string())
            .or_default()
            .increment(level);
    }

    #[cfg(test)]
    pub fn get(&self, project: &str, hour: &str) -> Option<ErrorCounts> {
        self.projects.get(project)?.get(hour).copied()
    }

    /// 按项目名排序遍历，每个项目的小时桶同样有序
    pub fn projects(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, ErrorCounts>)> {
        self.projects.iter().map(|(name, hours)| (name.as_str(), hours))
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// 毫秒时间戳转为指定时区的两位小时字符串，超出范围时返回 None
pub fn hour_bucket<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> Option<String> {
    let utc = DateTime::<Utc>::from_timestamp_millis(timestamp_ms)?;
    Some(format!("{:02}", utc.with_timezone(tz).hour()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Local};

    fn utc_millis(hour: u32, minute: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, minute, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn event(project: &str, level: &str, timestamp: i64) -> LogRecord {
        LogRecord {
            project: Some(project.to_string()),
            level: Some(level.to_string()),
            timestamp: Some(timestamp),
            ..Default::default()
        }
    }

    #[test]
    fn test_hour_bucket_is_zero_padded() {
        assert_eq!(hour_bucket(utc_millis(9, 5), &Utc).as_deref(), Some("09"));
        assert_eq!(hour_bucket(utc_millis(0, 0), &Utc).as_deref(), Some("00"));
        assert_eq!(hour_bucket(utc_millis(23, 59), &Utc).as_deref(), Some("23"));
    }

    #[test]
    fn test_hour_bucket_uses_timezone() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(hour_bucket(utc_millis(22, 0), &tz).as_deref(), Some("01"));
    }

    #[test]
    fn test_hour_bucket_local_time() {
        let local = Local
            .with_ymd_and_hms(2024, 1, 15, 14, 30, 0)
            .single()
            .unwrap();

        assert_eq!(
            hour_bucket(local.timestamp_millis(), &Local).as_deref(),
            Some("14")
        );
    }

    #[test]
    fn test_hour_bucket_out_of_range() {
        assert!(hour_bucket(i64::MAX, &Utc).is_none());
    }

    #[test]
    fn test_counts_accumulate_across_batches() {
        let mut histogram = ErrorHistogram::new();
        histogram.update_in(&[event("core", "ERROR", utc_millis(9, 10))], &Utc);
        histogram.update_in(&[event("core", "ERROR", utc_millis(9, 45))], &Utc);

        assert_eq!(
            histogram.get("core", "09"),
            Some(ErrorCounts {
                error: 2,
                critical: 0
            })
        );
    }

    #[test]
    fn test_same_hour_on_different_days_shares_bucket() {
        let mut histogram = ErrorHistogram::new();
        let next_day = utc_millis(9, 0) + 24 * 3600 * 1000;
        histogram.update_in(
            &[
                event("core", "CRITICAL", utc_millis(9, 0)),
                event("core", "CRITICAL", next_day),
            ],
            &Utc,
        );

        assert_eq!(histogram.get("core", "09").unwrap().critical, 2);
    }

    #[test]
    fn test_ignores_non_error_levels() {
        let mut histogram = ErrorHistogram::new();
        let result = histogram.update_in(
            &[
                event("core", "INFO", utc_millis(9, 0)),
                event("core", "WARNING", utc_millis(9, 0)),
                event("core", "error", utc_millis(9, 0)),
            ],
            &Utc,
        );

        assert_eq!(result, HistogramUpdate::default());
        assert!(histogram.is_empty());
    }

    #[test]
    fn test_skips_records_missing_fields() {
        let mut histogram = ErrorHistogram::new();
        let no_project = LogRecord {
            level: Some("ERROR".to_string()),
            timestamp: Some(utc_millis(9, 0)),
            ..Default::default()
        };
        let no_timestamp = LogRecord {
            project: Some("core".to_string()),
            level: Some("CRITICAL".to_string()),
            ..Default::default()
        };

        let result = histogram.update_in(
            &[no_project, no_timestamp, event("api", "ERROR", utc_millis(10, 0))],
            &Utc,
        );

        assert_eq!(result.counted, 1);
        assert_eq!(result.skipped, 2);
        assert_eq!(histogram.projects().count(), 1);
    }

    #[test]
    fn test_projects_and_hours_are_sorted() {
        let mut histogram = ErrorHistogram::new();
        histogram.update_in(
            &[
                event("zeta", "ERROR", utc_millis(15, 0)),
                event("alpha", "ERROR", utc_millis(15, 0)),
                event("alpha", "CRITICAL", utc_millis(3, 0)),
            ],
            &Utc,
        );

        let names: Vec<&str> = histogram.projects().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);

        let (_, alpha_hours) = histogram.projects().next().unwrap();
        let hours: Vec<&str> = alpha_hours.keys().map(String::as_str).collect();
        assert_eq!(hours, vec!["03", "15"]);
    }
}
