//! 控制台报告渲染
//!
//! 纯格式化，不产生输出；由轮询循环负责打印。

use chrono::NaiveDateTime;

use crate::aggregate::traceback::MAX_TRACEBACKS;
use crate::aggregate::{Aggregator, ErrorCounts, LatencySummary};

const RULE: &str =
    "--------------------------------------------------------------------------------";

/// 字段缺失时的占位文本
const MISSING: &str = "<未知>";

/// 渲染一次完整报告
pub fn render_report(now: NaiveDateTime, aggregator: &Aggregator) -> String {
    let mut lines = vec![
        RULE.to_string(),
        String::new(),
        now.format("%d-%m-%Y %H:%M:%S").to_string(),
        String::new(),
    ];

    render_errors(&mut lines, aggregator);
    render_tracebacks(&mut lines, aggregator);
    render_latency(&mut lines, aggregator.latency().summary());

    lines.push(RULE.to_string());
    lines.join("\n")
}

fn render_errors(lines: &mut Vec<String>, aggregator: &Aggregator) {
    lines.push("### 各项目 ERROR / CRITICAL 数量 ###".to_string());

    let histogram = aggregator.histogram();
    if histogram.is_empty() {
        lines.push("  暂无 ERROR / CRITICAL 记录".to_string());
    }

    for (project, hours) in histogram.projects() {
        lines.push("  项目:".to_string());
        lines.push(format!("    {}", project));
        for (hour, counts) in hours {
            lines.push(format_hour(hour, counts));
        }
    }

    lines.push(String::new());
}

fn format_hour(hour: &str, counts: &ErrorCounts) -> String {
    format!(
        "    ({}h) ERROR: {}, CRITICAL: {}",
        hour, counts.error, counts.critical
    )
}

fn render_tracebacks(lines: &mut Vec<String>, aggregator: &Aggregator) {
    lines.push(format!("### 最近 {} 条异常堆栈 ###", MAX_TRACEBACKS));

    let window = aggregator.tracebacks();
    if window.is_empty() {
        lines.push("   最近的请求中没有异常堆栈".to_string());
        lines.push(String::new());
    }

    for (i, record) in window.iter().enumerate() {
        lines.push(format!("({})", i + 1));
        lines.push("项目:".to_string());
        lines.push(format!("  {}", record.project.as_deref().unwrap_or(MISSING)));
        lines.push("消息:".to_string());
        lines.push(format!("  {}", record.message.as_deref().unwrap_or(MISSING)));
        lines.push(record.traceback.clone().unwrap_or_default());
        lines.push(String::new());
    }
}

fn render_latency(lines: &mut Vec<String>, summary: Option<LatencySummary>) {
    lines.push("### 请求耗时统计 ###".to_string());

    match summary {
        Some(s) => {
            lines.push(format!("  样本数:\n    {}", s.count));
            lines.push(format!("  平均值:\n    {:.4} s", s.mean));
            lines.push(format!("  标准差:\n    {:.4} s", s.std_dev));
        }
        None => {
            lines.push("  平均值:\n    无数据".to_string());
            lines.push("  标准差:\n    无数据".to_string());
        }
    }

    lines.push(String::new());
}
