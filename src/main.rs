mod aggregate;
mod fetch;
mod http_client;
mod model;
mod poller;
mod report;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fetch::LogFetcher;
use model::config::{Config, ConfigOverrides};
use poller::Poller;

#[derive(Parser, Debug)]
#[command(
    name = "log-pulse",
    version,
    about = "轮询日志 API，汇总 ERROR/CRITICAL、最近异常堆栈与请求耗时"
)]
struct Args {
    /// 配置文件路径（默认 config.json，不存在时使用默认配置）
    #[arg(short, long)]
    config: Option<String>,

    /// 日志 API 地址
    #[arg(long, env = "LOG_PULSE_ENDPOINT")]
    endpoint: Option<String>,

    /// 访问凭据
    #[arg(long, env = "LOG_PULSE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// 轮询间隔（秒）
    #[arg(long, env = "LOG_PULSE_INTERVAL")]
    interval: Option<u64>,

    /// 只执行一轮后退出
    #[arg(long)]
    once: bool,

    /// 每次输出报告前清屏
    #[arg(long)]
    clear_screen: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // .env 需要在解析参数之前加载，clap 才能读到其中的环境变量
    dotenvy::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("{:#}", e);
        // 日志过滤可能屏蔽 error 级别，直接写 stderr 保证错误可见
        eprintln!("{}", fatal_message(&e));
        std::process::exit(1);
    }
}

/// 退出前输出的错误信息，包含完整的上下文链
fn fatal_message(e: &anyhow::Error) -> String {
    format!("log-pulse error: {:#}", e)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let mut config = Config::load(&config_path)?;
    config.apply_overrides(ConfigOverrides {
        endpoint_url: args.endpoint,
        auth_token: args.token,
        poll_interval_secs: args.interval,
        clear_screen: args.clear_screen,
    });

    if let Some(path) = config.config_path().filter(|p| p.exists()) {
        tracing::info!("已加载配置文件: {}", path.display());
    }

    let fetcher = LogFetcher::from_config(&config)?;
    let poller = Poller::new(fetcher, config.poll_interval(), config.clear_screen);

    poller.run(args.once).await
}
