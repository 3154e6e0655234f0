use std::{sync::Arc, time::Duration};

use abion_dns_webhook::{
    AppState, SharedState,
    abion::client::{AbionClient, DEFAULT_BASE_URL},
    config::AppConfig,
    provider::AbionProvider,
    webhook,
};
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tokio::{net::TcpListener, signal};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, rename_all = "kebab-case")]
struct Cli {
    /// Abion API key
    #[arg(long, env = "ABION_API_KEY", value_name = "KEY", hide_env_values = true)]
    api_key: String,
    /// Abion API base URL
    #[arg(long, env = "ABION_API_URL", value_name = "URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,
    /// Timeout for each Abion API request, in seconds
    #[arg(long, env = "ABION_API_TIMEOUT", value_name = "SECS", default_value_t = 5)]
    api_timeout: u64,
    /// Enable debug logging
    #[arg(long, env = "ABION_DEBUG")]
    debug: bool,
    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    /// Compute changes without patching any zone
    #[arg(long, env = "DRY_RUN")]
    dry_run: bool,
    /// Domains reported to external-dns (comma separated)
    #[arg(long, env = "DOMAIN_FILTER", value_name = "DOMAIN", value_delimiter = ',')]
    domain_filter: Vec<String>,
    /// Host for the webhook server to listen on
    #[arg(long, env = "SERVER_HOST", value_name = "HOST", default_value = "localhost")]
    server_host: String,
    /// Port for the webhook server to listen on
    #[arg(long, env = "SERVER_PORT", value_name = "PORT", default_value_t = 8888)]
    server_port: u16,
    /// Per-request timeout of the webhook server in seconds (0 disables)
    #[arg(long, env = "SERVER_READ_TIMEOUT", value_name = "SECS", default_value_t = 0)]
    server_read_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.log_format);

    info!(
        "external-dns-webhook-abion version: {}",
        env!("CARGO_PKG_VERSION")
    );

    let config = build_app_config(&cli)?;
    let state = init_shared_state(&cli, config)?;

    let mut app = webhook::create_router(state).layer(TraceLayer::new_for_http());
    if cli.server_read_timeout > 0 {
        app = app.layer(TimeoutLayer::new(Duration::from_secs(cli.server_read_timeout)));
    }

    let listener = TcpListener::bind((cli.server_host.as_str(), cli.server_port))
        .await
        .with_context(|| format!("failed to bind to {}:{}", cli.server_host, cli.server_port))?;

    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;

    Ok(())
}

fn init_shared_state(cli: &Cli, config: AppConfig) -> Result<SharedState> {
    let client = AbionClient::new(&config.api_url, &cli.api_key, config.api_timeout)
        .context("failed to initialize Abion API client")?;
    let provider = AbionProvider::new(Arc::new(client), config.dry_run, config.domain_filter());

    if config.dry_run {
        warn!("dry run enabled, zones will not be modified");
    }

    Ok(Arc::new(AppState { config, provider }))
}

fn build_app_config(cli: &Cli) -> Result<AppConfig> {
    if cli.api_key.trim().is_empty() {
        bail!("ABION_API_KEY must be specified");
    }
    if cli.api_timeout == 0 {
        bail!("ABION_API_TIMEOUT must be at least one second");
    }

    Ok(AppConfig {
        api_url: cli.api_url.trim_end_matches('/').to_string(),
        api_timeout: Duration::from_secs(cli.api_timeout),
        dry_run: cli.dry_run,
        domain_filter: cli.domain_filter.clone(),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to install CTRL+C handler: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

fn init_tracing(debug: bool, format: LogFormat) {
    let level = if debug { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{level},tower_http={level}").into());
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
