mod console;
mod demo;
mod octoprint;
mod runner;

use runner::RunnerConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,printbuddy_core=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("PrintBuddy {} starting...", printbuddy_core::defaults::VERSION);

    let config = RunnerConfig::from_env()?;
    tracing::info!("   Data dir: {}", config.data_dir.display());
    tracing::info!("   Loop:     {} ms", config.loop_interval.as_millis());

    // The engine and its backends are single-threaded; they live entirely
    // on the blocking thread.
    let stop = Arc::new(AtomicBool::new(false));
    let loop_stop = stop.clone();
    let mut loop_handle = tokio::task::spawn_blocking(move || runner::run(config, &loop_stop));

    let finished = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
            false
        }
        res = &mut loop_handle => {
            tracing::warn!("Foreground loop stopped");
            res??;
            true
        }
    };

    if !finished {
        stop.store(true, Ordering::Relaxed);
        loop_handle.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
