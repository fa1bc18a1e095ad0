//! CLI entry point for the air-quality report tool.
//!
//! Resolves configuration, looks up every requested city and keyword
//! concurrently, and prints one report block per station.

use std::ffi::OsStr;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use aqi_report::{
    config::{DEFAULT_RC_FILE, FileConfig, OutputFormat, Overrides, Settings, expand_tilde},
    engine::Engine,
    fetch::{BasicClient, HttpClient, auth::UrlParam},
    output::{JsonPresenter, LineSink, Presenter, TerminalPresenter},
};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "aqi")]
#[command(about = "Real-time air quality for cities and stations", long_about = None)]
struct Cli {
    /// Comma-separated list of cities or numeric station ids
    #[arg(short, long = "city", value_delimiter = ',')]
    cities: Vec<String>,

    /// Comma-separated list of search keywords
    #[arg(short, long = "search", value_delimiter = ',')]
    search: Vec<String>,

    /// API token
    #[arg(short, long, env = "WAQI_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// 中文显示
    #[arg(short, long, default_value_t = false)]
    zhcn: bool,

    /// Print one JSON object per station instead of the report
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Config file
    #[arg(long, default_value = DEFAULT_RC_FILE)]
    config: String,

    /// Feed endpoint override
    #[arg(long, hide = true)]
    feed_url: Option<String>,

    /// Search endpoint override
    #[arg(long, hide = true)]
    search_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _file_guard = init_logging();

    let program = std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(OsStr::to_str)
        .unwrap_or("aqi")
        .to_string();

    let cli = Cli::parse();

    let config_path = expand_tilde(&cli.config);
    let file = match FileConfig::load(&config_path) {
        Ok(file) => file.unwrap_or_default(),
        Err(e) => {
            eprintln!("{program}: Fatal error config file: {e}");
            FileConfig::default()
        }
    };

    let settings = Settings::resolve(
        file,
        Overrides {
            token: cli.token,
            cities: cli.cities,
            keywords: cli.search,
            zhcn: cli.zhcn,
            json: cli.json,
            feed_url: cli.feed_url,
            search_url: cli.search_url,
        },
    )?;
    debug!(
        cities = ?settings.cities,
        keywords = ?settings.keywords,
        "Configuration resolved"
    );

    let http: Arc<dyn HttpClient> =
        Arc::new(UrlParam::token(BasicClient::new(), settings.token.clone()));
    let engine = Engine::new(http, settings.endpoints.clone());

    let mut presenter: Box<dyn Presenter> = match settings.format {
        OutputFormat::Report => {
            let color = std::io::stdout().is_terminal();
            Box::new(TerminalPresenter::new(
                std::io::stdout(),
                settings.locale,
                color,
            ))
        }
        OutputFormat::Json => Box::new(JsonPresenter::new(std::io::stdout())),
    };
    let mut errors = LineSink::new(program, std::io::stderr());

    let summary = engine
        .run(settings.requests(), presenter.as_mut(), &mut errors)
        .await;

    info!(
        submitted = summary.submitted,
        completed = summary.completed,
        records = summary.records,
        failures = summary.failures,
        "Run finished"
    );

    Ok(())
}

/// Colored stderr logging, plus a JSON rolling log file when `LOG_FILE_PATH`
/// is set. The returned guard must be held until exit.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")));

    let (json_layer, guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let path = Path::new(&log_file_path);
            let log_dir = path.parent().unwrap_or(Path::new("logs"));
            let log_file_name = path.file_name().unwrap_or(OsStr::new("aqi.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(
                    EnvFilter::try_from_env("RUST_LOG_JSON")
                        .unwrap_or_else(|_| EnvFilter::new("debug")),
                );
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}
