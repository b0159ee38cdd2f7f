//! meridiand — global controller daemon.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use meridian_core::config::MeridianConfig;
use meridian_services::registry::new_registry;

use meridiand::{dispatch, listener, status};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = MeridianConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = MeridianConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        MeridianConfig::default()
    });

    let bind = format!(
        "{}:{}",
        config.network.listen_addr, config.network.listen_port
    );
    let listener_socket = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(
        addr = %bind,
        max_agents = config.limits.max_agents,
        "meridiand listening"
    );

    let registry = new_registry(config.limits.max_agents);
    let coordinator = dispatch::Coordinator::new(
        registry,
        Duration::from_secs(config.limits.route_timeout_secs),
    );

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────
    let accept_task = tokio::spawn(
        listener::ControlListener::new(
            listener_socket,
            coordinator.clone(),
            config.limits.send_queue,
            shutdown_tx.subscribe(),
        )
        .run(),
    );

    let expiry_task = tokio::spawn(dispatch::expiry_loop(
        coordinator.clone(),
        shutdown_tx.subscribe(),
    ));

    let rebalance_task = tokio::spawn(status::rebalance_loop(shutdown_tx.subscribe()));

    let snapshot_task = tokio::spawn(status::snapshot_loop(
        coordinator.clone(),
        shutdown_tx.subscribe(),
    ));

    // ── Wait for exit ────────────────────────────────────────────────────────
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = accept_task    => tracing::error!("control listener exited: {:?}", r),
        r = expiry_task    => tracing::error!("route expiry loop exited: {:?}", r),
        r = rebalance_task => tracing::error!("rebalance loop exited: {:?}", r),
        r = snapshot_task  => tracing::error!("snapshot loop exited: {:?}", r),
    }

    Ok(())
}
