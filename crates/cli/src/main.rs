//! Hearth command-line entry point.

use std::io::Write;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hearth_config::AppConfig;
use hearth_gateway::AppState;
use hearth_gateway::session::TurnReply;
use hearth_providers::OllamaProvider;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hearth", version, about = "Local AI companion chat server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send one message and print the streamed reply
    Chat {
        /// The message to send
        message: String,
    },

    /// Check configuration and backend connectivity
    Doctor,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    match cli.command {
        Command::Serve { port } => serve(config, port).await,
        Command::Chat { message } => chat(config, message).await,
        Command::Doctor => doctor(config).await,
    }
}

async fn serve(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.gateway.port = port;
    }
    hearth_gateway::start(config)
        .await
        .context("gateway failed")?;
    Ok(())
}

async fn chat(config: AppConfig, message: String) -> anyhow::Result<()> {
    let state = AppState::new(config).context("failed to initialize")?;

    match state.session.submit(message).await? {
        TurnReply::Direct(answer) => println!("{answer}"),
        TurnReply::Streamed(mut rx) => {
            let mut stdout = std::io::stdout();
            while let Some(fragment) = rx.recv().await {
                let fragment = fragment.context("stream failed")?;
                stdout.write_all(&fragment)?;
                stdout.flush()?;
            }
            println!();
        }
    }
    Ok(())
}

async fn doctor(config: AppConfig) -> anyhow::Result<()> {
    println!("Config directory: {}", AppConfig::config_dir().display());
    println!("Model:            {}", config.model);
    println!("Backend:          {}", config.provider.base_url);
    println!(
        "Gateway:          {}:{}",
        config.gateway.host, config.gateway.port
    );

    match config.validate() {
        Ok(()) => println!("Config:           valid"),
        Err(e) => println!("Config:           INVALID ({e})"),
    }

    let provider = OllamaProvider::new(
        &config.provider.base_url,
        std::time::Duration::from_secs(5),
    );
    match provider.health_check().await {
        Ok(true) => {
            println!("Backend:          reachable");
            match provider.list_models().await {
                Ok(models) if models.contains(&config.model) => {
                    println!("Model '{}':     available", config.model);
                }
                Ok(models) => {
                    println!(
                        "Model '{}':     NOT FOUND (available: {})",
                        config.model,
                        models.join(", ")
                    );
                }
                Err(e) => println!("Model listing failed: {e}"),
            }
        }
        Ok(false) => println!("Backend:          responded with an error"),
        Err(e) => println!("Backend:          UNREACHABLE ({e})"),
    }

    println!("\nDefault config.toml:\n{}", AppConfig::default_toml());
    Ok(())
}
