use anyhow::{Context, Result};
use clap::Parser;
use nabu_vault::{create_router, AppState, CaptureSource, Config, VaultService};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nabu-vault", about = "Quantum-keyed encrypted audio capture service")]
struct Args {
    /// Config file path (extension optional)
    #[arg(long, default_value = "config/nabu-vault")]
    config: String,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Capture source: `microphone` or `file:<path.wav>`
    #[arg(long, default_value = "microphone")]
    source: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    let source = CaptureSource::parse(&args.source)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Capture source: {:?}", source);
    info!(
        "Audio: {}Hz, {}s fixed recordings",
        cfg.audio.sample_rate, cfg.audio.record_duration_secs
    );
    info!(
        "Entropy: {} ({} attempts before local fallback)",
        cfg.entropy.endpoint, cfg.entropy.retries
    );

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let vault = VaultService::from_config(cfg, source)?;
    let app = create_router(AppState::new(vault));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
