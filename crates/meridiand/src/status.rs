//! Periodic background loops: state snapshots and the role-assignment tick.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::dispatch::Coordinator;

/// Log a periodic snapshot of controller state.
pub async fn snapshot_loop(coordinator: Coordinator, mut shutdown: broadcast::Receiver<()>) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = shutdown.recv() => return,
            _ = interval.tick() => {
                let agents = coordinator.registry.lock().await.len();
                let links = coordinator.link_count().await;
                let pending = coordinator.pending_count().await;
                tracing::info!(agents, links, pending, "controller snapshot");
            }
        }
    }
}

/// Role-assignment tick, once per second. Computes nothing yet.
// TODO: derive per-domain load from agent reports and push role updates.
pub async fn rebalance_loop(mut shutdown: broadcast::Receiver<()>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = shutdown.recv() => return,
            _ = interval.tick() => {}
        }
    }
}
