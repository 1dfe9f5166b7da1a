//! 日志聚合
//!
//! 三个互相独立的累加器：错误直方图、最近异常堆栈窗口、请求耗时统计。
//! 状态在进程生命周期内累积，不做持久化。

pub mod histogram;
pub mod latency;
pub mod traceback;

use chrono::{Local, TimeZone};

use crate::model::record::LogRecord;

use histogram::ErrorHistogram;
use latency::LatencyStats;
use traceback::TracebackWindow;

pub use histogram::ErrorCounts;
pub use latency::LatencySummary;

/// 单轮聚合摘要（用于日志输出）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub records: usize,
    pub errors_counted: usize,
    pub skipped: usize,
    pub tracebacks_added: usize,
    pub latency_samples_added: usize,
}

/// 聚合器，持有全部累加器
#[derive(Debug, Clone)]
pub struct Aggregator {
    histogram: ErrorHistogram,
    tracebacks: TracebackWindow,
    latency: LatencyStats,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            histogram: ErrorHistogram::new(),
            tracebacks: TracebackWindow::new(),
            latency: LatencyStats::new(),
        }
    }

    /// 合并一批日志，小时桶使用本地时区
    pub fn ingest(&mut self, batch: &[LogRecord]) -> CycleSummary {
        self.ingest_in(batch, &Local)
    }

    pub fn ingest_in<Tz: TimeZone>(&mut self, batch: &[LogRecord], tz: &Tz) -> CycleSummary {
        let histogram = self.histogram.update_in(batch, tz);
        let tracebacks_added = self.tracebacks.update(batch);
        let latency_samples_added = self.latency.update(batch);

        CycleSummary {
            records: batch.len(),
            errors_counted: histogram.counted,
            skipped: histogram.skipped,
            tracebacks_added,
            latency_samples_added,
        }
    }

    pub fn histogram(&self) -> &ErrorHistogram {
        &self.histogram
    }

    pub fn tracebacks(&self) -> &TracebackWindow {
        &self.tracebacks
    }

    pub fn latency(&self) -> &LatencyStats {
        &self.latency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn millis(hour: u32, minute: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, minute, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_end_to_end_single_batch() {
        let batch: Vec<LogRecord> = serde_json::from_value(serde_json::json!([
            {
                "project": "core",
                "level": "CRITICAL",
                "timestamp": millis(10, 0),
                "message": "m",
                "traceback": "tb"
            },
            {
                "project": "core",
                "level": "INFO",
                "timestamp": millis(10, 1),
                "response_code": 200,
                "request_duration": 0.5
            }
        ]))
        .unwrap();

        let mut aggregator = Aggregator::new();
        let summary = aggregator.ingest_in(&batch, &Utc);

        assert_eq!(
            summary,
            CycleSummary {
                records: 2,
                errors_counted: 1,
                skipped: 0,
                tracebacks_added: 1,
                latency_samples_added: 1,
            }
        );

        let projects: Vec<_> = aggregator.histogram().projects().collect();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].0, "core");
        assert_eq!(projects[0].1.len(), 1);
        assert_eq!(
            aggregator.histogram().get("core", "10"),
            Some(ErrorCounts {
                error: 0,
                critical: 1
            })
        );

        let window: Vec<&LogRecord> = aggregator.tracebacks().iter().collect();
        assert_eq!(window, vec![&batch[0]]);

        assert_eq!(aggregator.latency().durations(), &[0.5]);
        let stats = aggregator.latency().summary().unwrap();
        assert_eq!(stats.mean, 0.5);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_empty_batch_changes_nothing() {
        let mut aggregator = Aggregator::new();
        let summary = aggregator.ingest(&[]);

        assert_eq!(summary, CycleSummary::default());
        assert!(aggregator.histogram().is_empty());
        assert!(aggregator.tracebacks().is_empty());
        assert!(aggregator.latency().summary().is_none());
    }
}
