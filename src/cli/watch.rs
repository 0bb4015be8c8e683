//! Watch command implementation

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::channel::ChannelManager;
use crate::cli::{output, WatchArgs};
use crate::config::VigilConfig;
use crate::engine::SyncEngine;
use crate::store::FleetStore;

/// Queue depth between the channel manager and the engine. The engine
/// drains one batch at a time; a small buffer absorbs bursts after a
/// reconnect without unbounded growth.
const BATCH_QUEUE_DEPTH: usize = 64;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &WatchArgs,
) -> Result<VigilConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        VigilConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        VigilConfig::default()
    };

    // Apply environment variable overrides
    config = config.with_env_overrides();

    // Apply CLI overrides (highest priority)
    if let Some(ref origin) = args.origin {
        config.connection.origin = origin.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

/// Wait for SIGINT/SIGTERM, then cancel all background tasks.
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Main watch command handler
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and merge configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing
    crate::logging::init_tracing(&config.logging)?;

    tracing::info!("Starting Vigil dashboard client");
    tracing::debug!(?config, "Loaded configuration");

    // 3. Build the sync pipeline: store <- engine <- queue <- channel
    let store = Arc::new(FleetStore::new());
    let engine = Arc::new(SyncEngine::new(store.clone()));
    let (batch_tx, batch_rx) = mpsc::channel(BATCH_QUEUE_DEPTH);

    let channel = ChannelManager::new(&config.connection, batch_tx)?
        .with_frame_logging(config.logging.log_frames);
    tracing::info!(endpoint = %channel.endpoint(), "Connecting to aggregator");

    let cancel_token = CancellationToken::new();
    let channel_handle = channel.start(cancel_token.clone());
    let engine_handle = engine.clone().start(batch_rx, cancel_token.clone());

    tokio::spawn(shutdown_signal(cancel_token.clone()));

    // 4. Render until shutdown
    let mut interval = tokio::time::interval(Duration::from_secs(args.refresh.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = interval.tick() => {
                let states = store.all();
                if args.json {
                    println!(
                        "{}",
                        output::format_fleet_json(&states, &engine.site_settings(), engine.readiness())
                    );
                } else {
                    println!(
                        "{}",
                        output::format_header(&engine.site_settings(), engine.readiness())
                    );
                    println!("{}", output::format_fleet_table(&states));
                }
            }
        }
    }

    // 5. Cleanup
    tracing::info!("Waiting for channel manager to stop");
    channel_handle.await?;
    tracing::info!("Waiting for sync engine to stop");
    engine_handle.await?;

    tracing::info!("Vigil stopped");
    Ok(())
}
