//! 请求耗时统计（进程启动以来的全部样本）

use crate::model::record::LogRecord;

/// 耗时统计结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    pub count: usize,
    /// 算术平均值（秒）
    pub mean: f64,
    /// 总体标准差（除数为 N）
    pub std_dev: f64,
}

/// 累积的请求耗时样本，只增不减
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    durations: Vec<f64>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按出现顺序追加本批次所有耗时记录，返回追加的样本数
    pub fn update(&mut self, batch: &[LogRecord]) -> usize {
        let before = self.durations.len();
        self.durations
            .extend(batch.iter().filter_map(LogRecord::latency));
        self.durations.len() - before
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    #[cfg(test)]
    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    /// 没有任何样本时返回 None
    pub fn summary(&self) -> Option<LatencySummary> {
        if self.durations.is_empty() {
            return None;
        }

        let count = self.durations.len();
        let n = count as f64;
        let mean = self.durations.iter().sum::<f64>() / n;
        let variance = self
            .durations
            .iter()
            .map(|d| (d - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(LatencySummary {
            count,
            mean,
            std_dev: variance.sqrt(),
        })
    }
}
