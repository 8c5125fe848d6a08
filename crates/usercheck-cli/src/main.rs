//! Usercheck - directory group-membership verification service
//!
//! Answers whether a user belongs to the configured security group, how many
//! members that group has, and whether the directory is reachable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use usercheck_api::UserCheckServer;
use usercheck_core::config::{LogFormat, UserCheckConfig};

/// Cleanup timeouts below this are risky outside development
const RECOMMENDED_MIN_TIMEOUT_SECS: u64 = 120;

#[derive(Parser, Debug)]
#[command(name = "usercheck")]
#[command(author = "Usercheck Team")]
#[command(version = usercheck_core::VERSION)]
#[command(about = "Directory group-membership verification service", long_about = None)]
struct Cli {
    /// Runs the server when no subcommand is given
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seconds to wait for in-flight requests on shutdown
    #[arg(short = 't', long = "timeout")]
    timeout: Option<u64>,

    /// Bind address
    #[arg(long)]
    bind: Option<String>,

    /// Port number
    #[arg(short, long)]
    port: Option<u16>,

    /// Development mode: debug logs and error details in responses
    #[arg(short = 'd', long = "devel")]
    devel: bool,

    /// Serve HTTPS using API_CERT_CRT_FILE / API_CERT_KEY_FILE
    #[arg(short = 'l', long = "tls")]
    tls: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "USERCHECK_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.command == Some(Commands::Version) {
        print_banner();
        return Ok(());
    }

    let config = build_config(&cli)?;
    init_logging(&config);
    install_panic_hook();

    run_server(config).await
}

/// Load the configuration and apply command-line overrides.
fn build_config(cli: &Cli) -> anyhow::Result<UserCheckConfig> {
    let mut config = if let Some(config_path) = &cli.config {
        let mut config = UserCheckConfig::from_file(config_path)?;
        // Deployment variables win over the file so secrets can stay out of it
        config.apply_env();
        config
    } else {
        UserCheckConfig::from_env()
    };

    // Override with CLI args
    if let Some(timeout) = cli.timeout {
        config.server.shutdown_timeout_secs = timeout;
    }
    if let Some(bind) = &cli.bind {
        config.server.bind_address = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.tls {
        config.tls.enabled = true;
    }
    if cli.devel {
        config.development = true;
    }

    if config.development {
        config.logging.format = LogFormat::Text;
        config.logging.level = "debug".to_string();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    Ok(config)
}

fn init_logging(config: &UserCheckConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).init(),
    }
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic| {
        error!("Panic: {}", panic);
    }));
}

fn print_banner() {
    println!(
        r#"
   usercheck - directory group-membership verification
   Version: {}
"#,
        usercheck_core::VERSION
    );
}

async fn run_server(config: UserCheckConfig) -> anyhow::Result<()> {
    info!("Starting Usercheck server...");
    info!("Directory: {}", config.directory.server_url);
    info!("Group: {}", config.directory.security_group_dn());

    if !config.development && config.server.shutdown_timeout_secs < RECOMMENDED_MIN_TIMEOUT_SECS {
        warn!(
            "Shutdown timeout of {}s is below the recommended {}s for production",
            config.server.shutdown_timeout_secs, RECOMMENDED_MIN_TIMEOUT_SECS
        );
    }

    UserCheckServer::new(config)
        .run_until(shutdown_signal())
        .await?;

    info!("Usercheck stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received interrupt"),
        _ = terminate => info!("Received terminate"),
    }
}
