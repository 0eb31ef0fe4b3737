//! Supper Club Agent - notification and offline cache agent
//!
//! Runs the agent behind its host bridge, or exercises the routing and
//! presentation tables from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use supperclub_agent::{
    bridge::{self, BridgeState},
    cache::CacheStore,
    config::AgentConfig,
    host::InMemoryHost,
    interaction::resolve_url,
    push::{NotificationData, PushHandler, PushPayload},
    Agent,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "supperclub-agent")]
#[command(author = "Supper Club Team")]
#[command(version)]
#[command(about = "Supper Club notification and offline cache agent")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SUPPERCLUB_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent behind the host bridge
    Run {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Skip install and activate at startup
        #[arg(long)]
        no_bootstrap: bool,
    },

    /// Resolve the URL a notification click navigates to
    Route {
        /// Chosen action button; omit for a click on the body
        #[arg(short, long)]
        action: Option<String>,

        /// Notification data as JSON
        #[arg(short, long, default_value = "{}")]
        data: String,
    },

    /// Show the notification a push payload would display
    Preview {
        /// Push payload as JSON
        #[arg(short, long)]
        payload: String,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("supperclub_agent={},tower_http=debug", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match cli.config {
        Some(path) => AgentConfig::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AgentConfig::default(),
    };

    match cli.command {
        Commands::Run {
            host,
            port,
            no_bootstrap,
        } => {
            run_agent(config, host, port, !no_bootstrap).await?;
        }
        Commands::Route { action, data } => {
            show_route(&config, action.as_deref(), &data)?;
        }
        Commands::Preview { payload } => {
            show_preview(&config, &payload)?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_agent(
    config: AgentConfig,
    host: Option<String>,
    port: Option<u16>,
    bootstrap: bool,
) -> Result<()> {
    tracing::info!("Starting Supper Club agent");

    let storage_dir = config
        .cache
        .storage_dir
        .clone()
        .unwrap_or_else(CacheStore::default_dir);
    let cache = Arc::new(CacheStore::open(storage_dir).await?);

    let addr: SocketAddr = format!(
        "{}:{}",
        host.as_deref().unwrap_or(&config.bridge.host),
        port.unwrap_or(config.bridge.port)
    )
    .parse()
    .context("invalid bridge address")?;

    let display = Arc::new(InMemoryHost::new());
    let agent = Arc::new(
        Agent::builder()
            .config(config)
            .cache(cache)
            .host(display.clone())
            .build()?,
    );

    if bootstrap {
        // A failed install leaves the agent installing; the host may retry it
        match agent.bootstrap().await {
            Ok(report) => tracing::info!(
                namespace = %report.namespace,
                removed = ?report.removed,
                "Agent active"
            ),
            Err(e) => tracing::error!(error = %e, "Bootstrap failed"),
        }
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutting down...");
    };

    bridge::serve(BridgeState::new(agent.clone(), display), addr, shutdown).await?;

    agent.drain().await;
    tracing::info!("All event handlers settled");
    Ok(())
}

fn show_route(config: &AgentConfig, action: Option<&str>, data: &str) -> Result<()> {
    let data: NotificationData =
        serde_json::from_str(data).context("notification data is not valid JSON")?;
    println!(
        "{}",
        resolve_url(action, &data, &config.notifications.map_search_url)
    );
    Ok(())
}

fn show_preview(config: &AgentConfig, payload: &str) -> Result<()> {
    let Some(payload) = PushPayload::decode(payload.as_bytes())? else {
        println!("(no payload; nothing would be displayed)");
        return Ok(());
    };

    let handler = PushHandler::new(
        Arc::new(InMemoryHost::new()),
        config.notifications.clone(),
    );
    let notification = handler.build_notification(payload);
    println!("{}", serde_json::to_string_pretty(&notification)?);
    Ok(())
}

fn show_config(config: Option<&AgentConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
