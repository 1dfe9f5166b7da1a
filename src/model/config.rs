use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TlsBackend {
    #[default]
    Rustls,
    NativeTls,
}

/// log-pulse 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// 日志 API 地址（必填，http/https）
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// 访问日志 API 的凭据（必填）
    #[serde(default)]
    pub auth_token: Option<String>,

    /// 携带凭据的请求头名称
    #[serde(default = "default_auth_header")]
    pub auth_header: String,

    /// 凭据前缀（可选，例如 "Bearer"），未配置时直接发送凭据原文
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_scheme: Option<String>,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// 请求超时（秒），未配置时使用 HTTP 客户端默认行为
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// HTTP 代理地址（可选）
    /// 支持格式: http://host:port, https://host:port, socks5://host:port
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,

    #[serde(default)]
    pub tls_backend: TlsBackend,

    /// 每次输出报告前清屏
    #[serde(default)]
    pub clear_screen: bool,

    /// 配置文件路径（运行时元数据，不写入 JSON）
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_auth_header() -> String {
    "authorization".to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            auth_token: None,
            auth_header: default_auth_header(),
            auth_scheme: None,
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: None,
            proxy_url: None,
            tls_backend: TlsBackend::default(),
            clear_screen: false,
            config_path: None,
        }
    }
}

/// 命令行 / 环境变量提供的覆盖项，优先级高于配置文件
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint_url: Option<String>,
    pub auth_token: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub clear_screen: bool,
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // 配置文件不存在，返回默认配置
            let mut config = Self::default();
            config.config_path = Some(path.to_path_buf());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// 获取配置文件路径（如果有）
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// 合并命令行 / 环境变量覆盖项
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.endpoint_url {
            self.endpoint_url = Some(url);
        }
        if let Some(token) = overrides.auth_token {
            self.auth_token = Some(token);
        }
        if let Some(secs) = overrides.poll_interval_secs {
            self.poll_interval_secs = secs;
        }
        if overrides.clear_screen {
            self.clear_screen = true;
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// 拼接最终发送的凭据请求头值
    pub fn auth_header_value(&self) -> Option<String> {
        let token = self.auth_token.as_deref()?;
        Some(match self.auth_scheme.as_deref() {
            Some(scheme) if !scheme.trim().is_empty() => format!("{} {}", scheme.trim(), token),
            _ => token.to_string(),
        })
    }

    /// 启动前校验配置，返回校验后的 endpoint
    pub fn validate(&self) -> anyhow::Result<reqwest::Url> {
        let Some(raw_url) = self.endpoint_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            bail!("未配置日志 API 地址（endpointUrl / --endpoint / LOG_PULSE_ENDPOINT）");
        };
        let url = reqwest::Url::parse(raw_url.trim())
            .with_context(|| format!("无效的日志 API 地址: {}", raw_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("日志 API 地址必须使用 http 或 https: {}", raw_url);
        }

        if self.auth_token.as_deref().is_none_or(|t| t.trim().is_empty()) {
            bail!("未配置访问凭据（authToken / --token / LOG_PULSE_TOKEN）");
        }

        reqwest::header::HeaderName::from_bytes(self.auth_header.as_bytes())
            .with_context(|| format!("无效的请求头名称: {}", self.auth_header))?;

        if self.poll_interval_secs == 0 {
            bail!("轮询间隔必须大于 0 秒");
        }

        Ok(url)
    }
}
