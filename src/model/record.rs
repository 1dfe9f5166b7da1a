//! 日志 API 返回的单条日志记录

use serde::{Deserialize, Deserializer, Serialize};

/// 单条日志记录
///
/// 上游 schema 不保证字段齐全，因此所有字段都是可选的，未知字段被忽略。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub project: Option<String>,
    /// 日志级别（INFO / WARNING / ERROR / CRITICAL ...）
    #[serde(default)]
    pub level: Option<String>,
    /// Unix 时间戳（毫秒），上游偶尔以浮点数返回
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    /// 异常堆栈，仅异常记录携带
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<i64>,
    /// 请求耗时（秒）
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_duration: Option<f64>,
}

impl LogRecord {
    /// 是否携带异常堆栈
    pub fn has_traceback(&self) -> bool {
        self.traceback.is_some()
    }

    /// 同时携带 response_code 和 request_duration 时返回请求耗时
    pub fn latency(&self) -> Option<f64> {
        match (self.response_code, self.request_duration) {
            (Some(_), Some(duration)) => Some(duration),
            _ => None,
        }
    }

    /// 解析错误级别，只有精确匹配 ERROR / CRITICAL 才返回
    pub fn error_level(&self) -> Option<ErrorLevel> {
        self.level.as_deref().and_then(ErrorLevel::parse)
    }
}

/// 毫秒时间戳同时接受整数与浮点数，浮点数向下取整
fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Int(i64),
        Float(f64),
    }

    match Option::<Millis>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Millis::Int(ms)) => Ok(Some(ms)),
        Some(Millis::Float(ms)) if ms.is_finite() && ms.abs() < i64::MAX as f64 => {
            Ok(Some(ms.floor() as i64))
        }
        Some(Millis::Float(ms)) => Err(serde::de::Error::custom(format!(
            "时间戳超出范围: {}",
            ms
        ))),
    }
}

/// 计入错误直方图的日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Error,
    Critical,
}

impl ErrorLevel {
    pub fn parse(level: &str) -> Option<Self> {
        match level {
            "ERROR" => Some(Self::Error),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}
