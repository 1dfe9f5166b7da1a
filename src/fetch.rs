//! 日志拉取
//!
//! 对日志 API 发起一次带凭据的 GET 请求，解析返回的 JSON 数组。
//! 任何传输错误、非 2xx 状态或不是 JSON 数组的响应体都作为错误返回，由调用方决定退出；
//! 数组中个别字段类型不符的记录只记录警告并跳过。

use anyhow::{Context, bail};
use reqwest::Client;
use reqwest::Url;
use reqwest::header::{HeaderName, HeaderValue};

use crate::http_client::build_client;
use crate::model::config::Config;
use crate::model::record::LogRecord;

/// 错误信息中保留的响应体最大字节数
const ERROR_BODY_PREVIEW_BYTES: usize = 512;

/// 日志 API 客户端
pub struct LogFetcher {
    client: Client,
    endpoint: Url,
    auth_header: HeaderName,
    auth_value: HeaderValue,
}

impl LogFetcher {
    pub fn new(
        client: Client,
        endpoint: Url,
        auth_header: &str,
        auth_value: &str,
    ) -> anyhow::Result<Self> {
        let auth_header = HeaderName::from_bytes(auth_header.as_bytes())
            .with_context(|| format!("无效的请求头名称: {}", auth_header))?;
        let mut auth_value = HeaderValue::from_str(auth_value).context("凭据包含非法字符")?;
        auth_value.set_sensitive(true);

        Ok(Self {
            client,
            endpoint,
            auth_header,
            auth_value,
        })
    }

    /// 根据已校验的配置构建
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let endpoint = config.validate()?;
        let client = build_client(
            config.proxy_url.as_deref(),
            config.request_timeout_secs,
            config.tls_backend,
        )?;
        let auth_value = config
            .auth_header_value()
            .ok_or_else(|| anyhow::anyhow!("未配置访问凭据"))?;

        Self::new(client, endpoint, &config.auth_header, &auth_value)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// 拉取一批日志记录，保持服务端返回顺序
    pub async fn fetch(&self) -> anyhow::Result<Vec<LogRecord>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(self.auth_header.clone(), self.auth_value.clone())
            .send()
            .await
            .with_context(|| format!("请求日志 API 失败: {}", self.endpoint))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("读取日志 API 响应失败: {}", self.endpoint))?;

        #[cfg(feature = "sensitive-logs")]
        tracing::debug!(status = %status, body = %body, "日志 API 响应");

        if !status.is_success() {
            bail!(
                "日志 API 返回 HTTP {}: {}",
                status,
                body_preview(&body, ERROR_BODY_PREVIEW_BYTES)
            );
        }

        let items: Vec<serde_json::Value> =
            serde_json::from_str(&body).context("日志 API 响应不是合法的 JSON 数组")?;

        Ok(decode_records(items))
    }
}

/// 逐条解析日志记录，无法解析的记录跳过
fn decode_records(items: Vec<serde_json::Value>) -> Vec<LogRecord> {
    let total = items.len();
    let records: Vec<LogRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<LogRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "日志记录格式不符，已跳过");
                None
            }
        })
        .collect();

    tracing::debug!(count = records.len(), skipped = total - records.len(), "已拉取日志记录");
    records
}

/// 截断错误响应体，确保不会在多字节字符中间截断
fn body_preview(body: &str, max_bytes: usize) -> String {
    if body.len() <= max_bytes {
        return body.to_string();
    }

    let mut end = max_bytes.saturating_sub(3);
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
