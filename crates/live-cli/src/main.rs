mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, EnvFilter};

use live_core::{AggregateStatus, Aggregator, FetchOutcome, PlatformType, StreamerIdentity};

use crate::config::{AppConfig, CredentialOverrides};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const REVISION: &str = env!("LIVE_STATUS_REVISION");

    if REVISION.is_empty() {
        VERSION
    } else {
        // Called once by clap; lives for the program's lifetime.
        Box::leak(format!("{VERSION} ({REVISION})").into_boxed_str())
    }
}

/// Live status lookup across YouTube, Twitch and Niconico.
#[derive(Parser)]
#[command(name = "live-status", version = version_string(), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct CredentialArgs {
    /// YouTube Data API key.
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_api_key: Option<String>,

    /// Twitch app or user access token.
    #[arg(long, env = "TWITCH_AUTH_TOKEN", hide_env_values = true)]
    twitch_auth_token: Option<String>,

    /// Twitch application client ID.
    #[arg(long, env = "TWITCH_CLIENT_ID")]
    twitch_client_id: Option<String>,
}

impl CredentialArgs {
    fn to_overrides(&self) -> CredentialOverrides {
        CredentialOverrides {
            youtube_api_key: self.youtube_api_key.clone().filter(|v| !v.is_empty()),
            twitch_auth_token: self.twitch_auth_token.clone().filter(|v| !v.is_empty()),
            twitch_client_id: self.twitch_client_id.clone().filter(|v| !v.is_empty()),
        }
    }
}

/// Identifiers for a streamer that is not (or not fully) in the config file.
#[derive(Args, Clone)]
struct IdentityArgs {
    /// YouTube channel ID.
    #[arg(long)]
    youtube: Option<String>,

    /// Twitch user ID.
    #[arg(long)]
    twitch: Option<String>,

    /// Niconico channel ID.
    #[arg(long)]
    niconico: Option<String>,
}

impl IdentityArgs {
    fn apply(&self, mut identity: StreamerIdentity) -> StreamerIdentity {
        if let Some(ref id) = self.youtube {
            identity = identity.with_youtube(id.clone());
        }
        if let Some(ref id) = self.twitch {
            identity = identity.with_twitch(id.clone());
        }
        if let Some(ref id) = self.niconico {
            identity = identity.with_niconico(id.clone());
        }
        identity
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Listen address (e.g. 0.0.0.0:8080). Overrides config file.
        #[arg(short, long, env = "LIVE_STATUS_LISTEN")]
        listen: Option<SocketAddr>,

        /// Port to listen on all interfaces. Ignored when --listen is set.
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Path to TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// Look up a streamer once and print the result.
    Check {
        streamer_id: String,

        /// Path to TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        identity: IdentityArgs,

        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// Poll a streamer and print whenever a platform goes live or offline.
    Watch {
        streamer_id: String,

        /// Path to TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seconds between lookups.
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,

        #[command(flatten)]
        identity: IdentityArgs,

        #[command(flatten)]
        credentials: CredentialArgs,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            port,
            config,
            credentials,
        } => {
            let listen = listen.or(port.map(|p| SocketAddr::from(([0, 0, 0, 0], p))));
            run_serve(listen, config, credentials.to_overrides()).await;
        }
        Commands::Check {
            streamer_id,
            config,
            identity,
            credentials,
        } => {
            init_quiet_tracing();
            let aggregator = build_aggregator(
                config,
                &streamer_id,
                &identity,
                &credentials.to_overrides(),
            );
            run_check(aggregator, &streamer_id).await;
        }
        Commands::Watch {
            streamer_id,
            config,
            interval_secs,
            identity,
            credentials,
        } => {
            init_quiet_tracing();
            let aggregator = build_aggregator(
                config,
                &streamer_id,
                &identity,
                &credentials.to_overrides(),
            );
            let interval = Duration::from_secs(interval_secs.max(1));
            run_watch(aggregator, &streamer_id, interval).await;
        }
    }
}

fn load_config_or_exit(path: Option<&PathBuf>) -> AppConfig {
    let Some(path) = path else {
        return AppConfig::default();
    };
    match AppConfig::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn build_aggregator(
    config_path: Option<PathBuf>,
    streamer_id: &str,
    identity_args: &IdentityArgs,
    overrides: &CredentialOverrides,
) -> Aggregator {
    let app_config = load_config_or_exit(config_path.as_ref());

    let mut directory = app_config.to_directory();
    let known = directory.resolve(streamer_id).cloned().unwrap_or_default();
    let identity = identity_args.apply(known);
    directory.insert(streamer_id, identity);

    let live_config = app_config.to_live_config(overrides);
    match Aggregator::from_config(&live_config, directory) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run_serve(
    listen_override: Option<SocketAddr>,
    config_path: Option<PathBuf>,
    overrides: CredentialOverrides,
) {
    let app_config = if let Some(ref path) = config_path {
        match AppConfig::load(path) {
            Ok(c) => {
                init_tracing(&c.server.log_format);
                tracing::info!(path = %path.display(), "Loaded config file");
                c
            }
            Err(e) => {
                init_tracing("pretty");
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
    } else {
        init_tracing("pretty");
        AppConfig::default()
    };

    let listen = listen_override.unwrap_or(app_config.server.listen);
    let live_config = app_config.to_live_config(&overrides);
    let directory = app_config.to_directory();
    let streamer_count = directory.len();

    let aggregator = match Aggregator::from_config(&live_config, directory) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(error = %e, "Invalid platform configuration");
            std::process::exit(1);
        }
    };

    let platforms: Vec<&str> = aggregator
        .platforms()
        .into_iter()
        .map(PlatformType::as_str)
        .collect();
    tracing::info!(
        streamers = streamer_count,
        platforms = ?platforms,
        request_timeout_ms = live_config.request_timeout.as_millis() as u64,
        "Platform clients ready"
    );

    let state = live_api::state::AppState::new(Arc::new(aggregator));

    tracing::info!(%listen, "Starting live status API server");
    if let Err(e) = live_api::serve_with_state(listen, state, live_api::shutdown_signal()).await {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}

async fn run_check(aggregator: Aggregator, streamer_id: &str) {
    let spinner = ProgressBar::new_spinner().with_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Checking {}...", style(streamer_id).bold()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let status = aggregator.aggregate(streamer_id).await;
    spinner.finish_and_clear();

    println!(
        "{} {}",
        style(streamer_id).bold(),
        style(status.checked_at.format("%Y-%m-%d %H:%M:%S UTC")).dim()
    );
    for line in format_status(&status) {
        println!("{}", line);
    }
}

async fn run_watch(aggregator: Aggregator, streamer_id: &str, interval: Duration) {
    println!(
        "{} {}",
        style("live-status").bold(),
        style(env!("CARGO_PKG_VERSION")).dim()
    );
    println!("  {} {}", style("streamer:").dim(), style(streamer_id).bold());
    println!("  {} {}s", style("interval:").dim(), interval.as_secs());
    println!();
    println!("{}", style("Press Ctrl+C to stop").dim());
    println!();

    let shutdown = live_api::shutdown_signal();
    tokio::pin!(shutdown);

    let mut previous: Option<AggregateStatus> = None;
    loop {
        let status = tokio::select! {
            status = aggregator.aggregate(streamer_id) => status,
            _ = &mut shutdown => break,
        };

        match previous {
            None => {
                for line in format_status(&status) {
                    println!("{}", line);
                }
            }
            Some(ref prev) => {
                for line in format_transitions(prev, &status) {
                    println!("{}", line);
                }
            }
        }
        previous = Some(status);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => break,
        }
    }

    println!("\n{}", style("Watch stopped.").dim());
}

fn format_status(status: &AggregateStatus) -> Vec<String> {
    status
        .results
        .iter()
        .map(|r| {
            let state = match &r.outcome {
                FetchOutcome::Fetched if r.is_live() => style("LIVE".to_string()).green().bold(),
                FetchOutcome::Fetched => style("offline".to_string()).dim(),
                FetchOutcome::Untracked => style("untracked".to_string()).dim(),
                FetchOutcome::Degraded { reason } => {
                    style(format!("unknown ({})", reason)).yellow()
                }
            };
            let content = r
                .live
                .content_id
                .as_deref()
                .map(|id| format!("  {}", style(id).cyan()))
                .unwrap_or_default();
            format!("  {:<10} {}{}", r.platform.as_str(), state, content)
        })
        .collect()
}

fn format_transitions(previous: &AggregateStatus, current: &AggregateStatus) -> Vec<String> {
    let ts = current.checked_at.format("%H:%M:%S").to_string();
    current
        .results
        .iter()
        .filter_map(|r| {
            let was_live = previous.get(r.platform).is_some_and(|p| p.is_live());
            match (was_live, r.is_live()) {
                (false, true) => Some(format!(
                    "  {}  {:<10} {} {}",
                    style(&ts).dim(),
                    r.platform.as_str(),
                    style("went live").green().bold(),
                    r.live.content_id.as_deref().unwrap_or_default()
                )),
                (true, false) if r.is_degraded() => Some(format!(
                    "  {}  {:<10} {}",
                    style(&ts).dim(),
                    r.platform.as_str(),
                    style("lookup failed, status unknown").yellow()
                )),
                (true, false) => Some(format!(
                    "  {}  {:<10} {}",
                    style(&ts).dim(),
                    r.platform.as_str(),
                    style("went offline").red()
                )),
                _ => None,
            }
        })
        .collect()
}

fn init_tracing(log_format: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .init();
        }
    }
}

fn init_quiet_tracing() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .init();
}
