//! 最近异常堆栈窗口

use std::collections::VecDeque;

use crate::model::record::LogRecord;

/// 窗口保留的最大堆栈条数
pub const MAX_TRACEBACKS: usize = 5;

/// 最近的异常堆栈记录，按新到旧排列（下标 0 为最新）
#[derive(Debug, Clone, Default)]
pub struct TracebackWindow {
    entries: VecDeque<LogRecord>,
}

impl TracebackWindow {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_TRACEBACKS),
        }
    }

    /// 合并一批日志，返回本批次新加入窗口的条数
    ///
    /// 批次按时间正序排列：从尾部向前扫描，最多取 MAX_TRACEBACKS 条，
    /// 整体放到已有窗口之前，超出部分从最旧的一端淘汰。
    pub fn update(&mut self, batch: &[LogRecord]) -> usize {
        let fresh: Vec<&LogRecord> = batch
            .iter()
            .rev()
            .filter(|record| record.has_traceback())
            .take(MAX_TRACEBACKS)
            .collect();

        // 逆序 push_front，保证 fresh[0] 最终位于窗口头部
        for record in fresh.iter().rev() {
            self.entries.push_front((*record).clone());
        }
        self.entries.truncate(MAX_TRACEBACKS);

        fresh.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> {
        self.entries.iter()
    }
}
