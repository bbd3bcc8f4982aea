use clap::Parser;
use joecowin::{
    Registry, Site,
    animation::SkipPreference,
    config::Config,
    net::{http, telnet},
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "joecowin", version, about = "Terminal portfolio over HTTP and telnet")]
struct Args {
    /// TOML config file (defaults to the environment / .env)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the HTTP listen address (eg: "0.0.0.0:5001")
    #[arg(long)]
    http_addr: Option<String>,

    /// Override the telnet listen address (eg: "0.0.0.0:5023")
    #[arg(long)]
    telnet_addr: Option<String>,

    /// YAML content file to serve instead of the built-in pages
    #[arg(long)]
    content: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let mut cfg = match args.config.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    if let Some(addr) = args.http_addr {
        cfg.http_addr = addr;
    }
    if let Some(addr) = args.telnet_addr {
        cfg.telnet_addr = addr;
    }

    let content_path = args.content.or_else(|| cfg.content_path.as_ref().map(PathBuf::from));
    let site = match content_path.as_deref() {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading site content");
            Site::load(path)?
        }
        None => Site::embedded()?,
    };

    let registry = Arc::new(Registry::new(
        site,
        cfg.animation.to_config(),
        SkipPreference::new(cfg.skip_typing),
    ));

    // HTTP (pages + websocket) server
    let http_addr = cfg.http_socket_addr()?;
    let http_registry = registry.clone();
    let http_jh = tokio::spawn(async move {
        tracing::info!(%http_addr, "http listening");
        if let Err(e) = http::serve(http_addr, http_registry).await {
            tracing::error!(error=%e, "http server error");
        }
    });

    // Telnet server
    let telnet_addr = cfg.telnet_socket_addr()?;
    let telnet_registry = registry.clone();
    let telnet_jh = tokio::spawn(async move {
        tracing::info!(%telnet_addr, "telnet listening");
        if let Err(e) = telnet::serve(telnet_addr, telnet_registry).await {
            tracing::error!(error=%e, "telnet server error");
        }
    });

    // Wait for both (they only end on error)
    if let Err(e) = tokio::try_join!(http_jh, telnet_jh) {
        tracing::error!(error=%e, "server task failed");
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,joecowin=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .init();
}
