//! 轮询循环
//!
//! 拉取 -> 聚合 -> 渲染 -> 休眠到下一个周期边界，循环往复。
//! 拉取失败直接向上返回错误，不做重试。

use std::io::Write;
use std::time::{Duration, Instant};

use chrono::Local;

use crate::aggregate::Aggregator;
use crate::fetch::LogFetcher;
use crate::report::render_report;

/// ANSI 清屏并将光标移到左上角
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

pub struct Poller {
    fetcher: LogFetcher,
    aggregator: Aggregator,
    interval: Duration,
    clear_screen: bool,
}

impl Poller {
    pub fn new(fetcher: LogFetcher, interval: Duration, clear_screen: bool) -> Self {
        Self {
            fetcher,
            aggregator: Aggregator::new(),
            interval,
            clear_screen,
        }
    }

    #[cfg(test)]
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// 执行一轮拉取与聚合，返回渲染好的报告
    pub async fn run_cycle(&mut self) -> anyhow::Result<String> {
        let batch = self.fetcher.fetch().await?;
        let summary = self.aggregator.ingest(&batch);

        tracing::info!(
            records = summary.records,
            errors = summary.errors_counted,
            skipped = summary.skipped,
            tracebacks = summary.tracebacks_added,
            latency_samples = summary.latency_samples_added,
            window = self.aggregator.tracebacks().len(),
            total_latency_samples = self.aggregator.latency().len(),
            "本轮聚合完成"
        );

        Ok(render_report(Local::now().naive_local(), &self.aggregator))
    }

    /// 持续轮询；`once` 为 true 时只执行一轮
    ///
    /// 只有拉取失败时返回 Err；Ctrl-C 在休眠期间到达时正常返回。
    pub async fn run(mut self, once: bool) -> anyhow::Result<()> {
        let started = Instant::now();
        tracing::info!(
            endpoint = %self.fetcher.endpoint(),
            interval_secs = self.interval.as_secs(),
            "开始轮询日志 API"
        );

        loop {
            let report = self.run_cycle().await?;
            self.print_report(&report);

            if once {
                return Ok(());
            }

            let wait = next_sleep(started.elapsed(), self.interval);
            tracing::debug!(wait_ms = wait.as_millis() as u64, "等待下一轮");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("收到 Ctrl-C，停止轮询");
                    return Ok(());
                }
            }
        }
    }

    fn print_report(&self, report: &str) {
        let mut out = std::io::stdout().lock();
        if self.clear_screen {
            let _ = write!(out, "{}", CLEAR_SCREEN);
        }
        let _ = writeln!(out, "{}", report);
        let _ = out.flush();
    }
}

/// 计算距离下一个周期边界的时长
///
/// 边界以进程启动时刻为基准，每轮耗时不会累积成漂移。
pub fn next_sleep(elapsed: Duration, interval: Duration) -> Duration {
    let interval_nanos = interval.as_nanos();
    if interval_nanos == 0 {
        return Duration::ZERO;
    }

    let remaining = interval_nanos - elapsed.as_nanos() % interval_nanos;
    Duration::from_nanos(remaining as u64)
}
