use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use streamchat::config::Config;
use streamchat::transport;

#[derive(Parser)]
#[command(name = "streamchat")]
#[command(author, version, about = "Minimal streaming chat: server, terminal client and one-shot sender", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: <config dir>/streamchat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP chat server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Reply provider (echo, openai)
        #[arg(long)]
        provider: Option<String>,

        /// Turn off the per-client rate limit
        #[arg(long)]
        no_rate_limit: bool,
    },

    /// Interactive chat in the terminal
    Chat {
        /// Message route URL
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Send one message and print the streamed reply
    Send {
        /// Message text
        text: String,

        /// Message route URL
        #[arg(short, long)]
        endpoint: Option<String>,
    },
}

fn init_logging(verbose: bool, log_to_file: bool) -> Result<()> {
    let filter = if verbose {
        "streamchat=debug"
    } else {
        "streamchat=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if log_to_file {
        // The TUI owns the terminal, so logs go to a file instead of stderr
        let dir = Config::data_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join("streamchat.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, matches!(cli.command, Commands::Chat { .. }))?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Serve {
            port,
            host,
            provider,
            no_rate_limit,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(provider) = provider {
                config.llm.provider = provider;
            }
            if no_rate_limit {
                config.rate_limit.enabled = false;
            }
            tracing::info!(
                "Starting streamchat server v{}",
                transport::http::version()
            );
            transport::run_http_server(&config).await?;
        }
        Commands::Chat { endpoint } => {
            if let Some(endpoint) = endpoint {
                config.client.endpoint = endpoint;
            }
            transport::cli::run_tui_chat(&config.client).await?;
        }
        Commands::Send { text, endpoint } => {
            if let Some(endpoint) = endpoint {
                config.client.endpoint = endpoint;
            }
            transport::cli::run_send(&text, &config.client).await?;
        }
    }

    Ok(())
}
