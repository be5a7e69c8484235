//! Receiver entry point: CLI, configuration, logging, and the serve loop.

use anyhow::{Context, Result};
use clap::Parser;
use meteor_receiver::config::ReceiverConfig;
use meteor_receiver::ingest::{DetectTrigger, FileIngestor, NightNotifier, NoopNotifier};
use meteor_receiver::server::{create_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// HTTP receiver for meteor-camera detection events, FF binaries, and
/// timelapse stacks.
#[derive(Parser, Debug)]
#[command(name = "meteor-receiver", version)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ReceiverConfig::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;

    init_tracing(&config.log_level, &config.log_format);

    info!(
        service = "meteor-receiver",
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "starting receiver"
    );

    let captured_root = config.captured_root();
    let stack_root = config.stack_root();
    tokio::fs::create_dir_all(&captured_root)
        .await
        .with_context(|| format!("failed to create {}", captured_root.display()))?;
    tokio::fs::create_dir_all(&stack_root)
        .await
        .with_context(|| format!("failed to create {}", stack_root.display()))?;

    let ff_notifier: Arc<dyn NightNotifier> = if config.rms_run_on_receive {
        Arc::new(DetectTrigger::new(config.rms_detect_script.clone()))
    } else {
        Arc::new(NoopNotifier)
    };

    let state = AppState {
        ff: Arc::new(FileIngestor::new(captured_root, ff_notifier)),
        stacks: Arc::new(FileIngestor::new(stack_root, Arc::new(NoopNotifier))),
    };

    let router = create_router(state);
    let addr = config.listen_addr();

    info!(address = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("receiver stopped");

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, log_format: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if log_format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C signal");
        }
        _ = terminate => {
            info!("received SIGTERM signal");
        }
    }
}
