use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ollama_chat::client::GatewayClient;
use ollama_chat::config::{Config, DEFAULT_MODEL};
use ollama_chat::inference::OllamaClient;
use ollama_chat::server::{AppState, build_app};
use ollama_chat::tui;

const DEFAULT_GATEWAY: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "ollama-chat", version)]
#[command(about = "Chat with a locally hosted Ollama server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway in front of the inference server
    Serve {
        /// Path to the YAML config file
        #[arg(short, long, default_value = "ollama-chat.yaml")]
        config: PathBuf,
        /// Override the listen host
        #[arg(long)]
        host: Option<String>,
        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Open the terminal chat client
    Chat {
        /// Gateway base URL
        #[arg(short, long, default_value = DEFAULT_GATEWAY)]
        gateway: String,
        /// Model to start with
        #[arg(short, long, default_value = DEFAULT_MODEL)]
        model: String,
        /// Write logs to this file (the terminal is taken by the UI)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Print the models installed on the inference server
    Models {
        /// Gateway base URL
        #[arg(short, long, default_value = DEFAULT_GATEWAY)]
        gateway: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, host, port } => {
            init_stderr_logging();
            serve(config, host, port).await
        }
        Commands::Chat {
            gateway,
            model,
            log_file,
        } => {
            if let Some(path) = log_file {
                init_file_logging(&path)?;
            }
            tui::run(GatewayClient::new(reqwest::Client::new(), &gateway), model).await
        }
        Commands::Models { gateway } => {
            init_stderr_logging();
            let client = GatewayClient::new(reqwest::Client::new(), &gateway);
            let models = client
                .list_models()
                .await
                .with_context(|| format!("failed to list models via {gateway}"))?;
            for model in models {
                println!("{model}");
            }
            Ok(())
        }
    }
}

async fn serve(config_path: PathBuf, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = Config::load(&config_path)
        .await
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    let inference = OllamaClient::new(reqwest::Client::new(), &config.inference);
    let state = AppState::new(Arc::new(inference), config.inference.default_model.clone());
    let app = build_app(state, &config.server);

    let bind_to = (config.server.host.as_str(), config.server.port);
    let listener = tokio::net::TcpListener::bind(bind_to)
        .await
        .with_context(|| format!("failed to bind {}:{}", bind_to.0, bind_to.1))?;
    let addr = listener.local_addr()?;

    info!(
        %addr,
        inference = %config.inference.base_url,
        default_model = %config.inference.default_model,
        "Gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "ollama_chat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn init_file_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to open {}", path.display()))?;
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "ollama_chat=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
