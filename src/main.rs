//! Storefront web front end.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser                 ┌──────────────────────────────────────────────┐
//!     ───────────────────────▶│ request id → trace → timeout                 │
//!                             │ recover → access log → secure headers        │
//!                             │   ├── /ping, /static/*                       │
//!                             │   └── session → csrf → authenticate          │
//!                             │         ├── /about, /user/login              │
//!                             │         └── require auth                     │
//!                             │               ├── /, /product/{id}           │
//!                             │               └── /user/profile, /logout     │      Sales API
//!                             │                         backend client ──────┼────▶ /v1/...
//!     ◀───────────────────────│ views (minijinja)                            │
//!                             └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use storefront::config::{read_config, validate_config, AppConfig, ConfigError};
use storefront::http::HttpServer;
use storefront::lifecycle::{signals, Shutdown, ShutdownReason};
use storefront::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "storefront", version, about = "Server-rendered storefront for the sales API")]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show diagnostic traces in error pages.
    #[arg(long)]
    debug: bool,

    /// Base64 encoded 64 byte session key.
    #[arg(long, env = "STOREFRONT_SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => AppConfig::default(),
        };
        if self.debug {
            config.web.debug_mode = true;
        }
        if let Some(secret) = &self.session_secret {
            config.web.session_secret = secret.clone();
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init_logging(&config.observability, config.web.debug_mode);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "storefront starting");

    tracing::info!(
        host = %config.web.host,
        backend = %config.backend.base_url,
        tls = config.web.tls.is_some(),
        debug = config.web.debug_mode,
        request_timeout = ?config.web.request_timeout(),
        idle_timeout = ?config.web.idle_timeout(),
        session_lifetime = ?config.web.session_lifetime(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    let mut reasons = shutdown.subscribe();
    signals::forward_signals(shutdown.clone());

    let server = HttpServer::new(config, shutdown)?;
    server.run().await?;

    if let Ok(ShutdownReason::ServerError) = reasons.try_recv() {
        tracing::error!("Stopped after a server error");
        return Ok(ExitCode::FAILURE);
    }

    tracing::info!("Shutdown complete");
    Ok(ExitCode::SUCCESS)
}
