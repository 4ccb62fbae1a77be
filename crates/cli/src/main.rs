mod args;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movshift_core::{
    load_config, load_config_from_env, validate_config, BatchOrchestrator, Config,
    DirectoryHost, DownloadTrigger, EngineLifecycle, FfmpegEngine, IntakeFilter, RawFile,
};

use args::Args;

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "movshift.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(output_dir) = args.output_dir {
        config.download.output_dir = output_dir;
    }
    validate_config(&config).context("Configuration validation failed")?;

    info!("Engine binary: {:?}", config.engine.ffmpeg_path);
    info!("Output directory: {:?}", config.download.output_dir);

    let engine = Arc::new(EngineLifecycle::new(FfmpegEngine::new(config.engine.clone())));
    let host = Arc::new(DirectoryHost::new(config.download.output_dir.clone()));
    let downloads = DownloadTrigger::new(host.clone(), config.download.release_delay());

    let orchestrator = Arc::new(BatchOrchestrator::new(
        config.orchestrator.clone(),
        IntakeFilter::new(config.intake.clone()),
        config.profile.clone(),
        engine,
        downloads,
    ));

    let reporter = tokio::spawn(report::follow(
        Arc::downgrade(&orchestrator),
        orchestrator.subscribe(),
    ));

    let files: Vec<RawFile> = args.files.iter().map(RawFile::from_path).collect();
    let outcome = match orchestrator.submit(files).await {
        Ok(count) => {
            info!("Converting {} files", count);
            tokio::select! {
                result = orchestrator.run_batch() => result.map(|results| results.len()),
                _ = shutdown_signal() => {
                    warn!("Interrupted, waiting for saved files to finish writing");
                    host.flush().await;
                    bail!("interrupted");
                }
            }
        }
        Err(e) => Err(e),
    };

    // Let pending writes land before reporting; dropping the orchestrator
    // closes the event stream.
    host.flush().await;
    drop(orchestrator);
    if let Err(e) = reporter.await {
        warn!("Progress reporter stopped: {}", e);
    }

    let converted = outcome.context("Batch failed")?;
    info!("Done, {} files saved", converted);
    Ok(())
}

/// Picks the config source: an explicit path must exist, the default file is
/// optional, and without either only environment overrides apply.
fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                info!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                return load_config_from_env().context("Failed to load configuration");
            }
            default
        }
    };

    info!("Loading configuration from {:?}", path);
    load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
