use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use svgsnap::models::AppConfig;
use svgsnap::server;

#[derive(Parser)]
#[command(name = "svgsnap")]
#[command(about = "SVG rendering service - raster images and PDFs via a remote headless browser")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Print the effective configuration and exit
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config) => run_config_command(),
        Some(Commands::Serve) | None => run_server().await,
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "svgsnap=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config() -> anyhow::Result<AppConfig> {
    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            tracing::error!(%problem, "Configuration problem");
        }
        anyhow::bail!("configuration validation failed ({} problems)", problems.len());
    }

    Ok(config)
}

fn run_config_command() -> anyhow::Result<()> {
    init_tracing();
    let config = load_config()?;

    println!("mode:            {}", if config.use_self_hosted { "self-hosted" } else { "cloud" });
    println!("default format:  {}", config.default_format);
    println!("max dimensions:  {}x{}", config.max_width, config.max_height);
    println!("max svg size:    {} bytes", config.max_svg_size);
    println!(
        "domain policy:   {} allowed, {} blocked",
        config.allowed_domains.len(),
        config.blocked_domains.len()
    );
    println!("storage:         {}", if config.storage_configured() { "configured" } else { "not configured" });
    println!("port:            {}", config.port);

    Ok(())
}

async fn run_server() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(load_config()?);
    config.log_summary();

    let state = server::create_app_state(config.clone());
    let router = server::build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting svgsnap server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
