//! example-app - Contacts server binary
//!
//! Usage:
//!   example-app [config.toml]
//!
//! Without a config file the server listens on 127.0.0.1:18090 with no base
//! route and no blocked clients.

use std::net::SocketAddr;

use example_app::config::AppConfig;
use example_app::build_api;
use restree_api::HttpServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parsed command-line arguments
struct Args {
    /// Server config file (TOML)
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let mut result = Args { config_path: None };

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                result.config_path = Some(arg.to_owned());
            }
            _ => {
                tracing::warn!("Unknown argument: {}", arg);
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"example-app - Contacts server built on restree

Usage: example-app [OPTIONS] [config.toml]

Options:
  -h, --help    Print this help message

Examples:
  # Run with defaults (127.0.0.1:18090)
  example-app

  # Run with a config file
  example-app config.toml
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "example_app=info,restree_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args();
    let config = match args.config_path {
        Some(ref path) => {
            tracing::info!("Loading config from: {}", path);
            AppConfig::load(path)?
        }
        None => {
            tracing::info!("No config file provided, using defaults");
            AppConfig::default()
        }
    };

    let api = build_api(&config).map_err(|e| anyhow::anyhow!("{e}"))?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let mut server = HttpServer::new(api);
    let local_addr = server.start(addr).await?;
    tracing::info!("Serving contacts on http://{}{}", local_addr, config.base_route);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    server.stop().await;

    Ok(())
}
