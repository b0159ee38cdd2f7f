//! Dispatches decoded agent commands against the shared controller state.
//!
//! Every inbound session task calls into a clone of [`Coordinator`]. All
//! shared state lives behind its mutexes; no lock is ever held across an
//! outbound send, so a stalled agent stalls at most the operation that is
//! currently addressing it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, Mutex};

use meridian_core::protocol::{AgentId, Dpid, Endpoint, Message};
use meridian_services::registry::{self, SharedRegistry};
use meridian_services::{AgentGraph, CrossDomainLink, LinkEndpoint, LinkTable, RouteRequests};

/// Shared coordination state for the whole controller.
#[derive(Clone)]
pub struct Coordinator {
    pub registry: SharedRegistry,
    links: Arc<Mutex<LinkTable>>,
    pending: Arc<Mutex<RouteRequests>>,
    route_ttl: Duration,
}

impl Coordinator {
    pub fn new(registry: SharedRegistry, route_ttl: Duration) -> Self {
        Self {
            registry,
            links: Arc::new(Mutex::new(LinkTable::new())),
            pending: Arc::new(Mutex::new(RouteRequests::new())),
            route_ttl,
        }
    }

    /// Entry point for the inbound duty: one decoded message from `from`.
    pub async fn handle(&self, from: AgentId, msg: Message) {
        match msg {
            Message::AddCrossDomainLink { src, dst } => {
                self.add_cross_domain_link(from, src, dst).await;
            }
            Message::ResponseDpid { dpid } => self.claim_device(from, dpid).await,
            Message::GetRoute { dst } => self.request_route(from, dst).await,
            Message::ResponseHost { host } => self.claim_host(from, host).await,
            other => {
                tracing::warn!(agent_id = from, msg = ?other, "unexpected command from agent, dropping");
            }
        }
    }

    /// A new boundary cable was reported. The reporter always owns its own
    /// side; everyone is asked who owns the far device.
    async fn add_cross_domain_link(&self, from: AgentId, src: Endpoint, dst: Endpoint) {
        let inserted = self
            .links
            .lock()
            .await
            .add(LinkEndpoint::owned(src, from), LinkEndpoint::unowned(dst));
        if !inserted {
            tracing::debug!(
                agent_id = from,
                src_dpid = src.dpid,
                dst_dpid = dst.dpid,
                "duplicate cross-domain link, ignoring"
            );
            return;
        }
        tracing::info!(
            agent_id = from,
            src_dpid = src.dpid,
            src_port = src.port,
            dst_dpid = dst.dpid,
            dst_port = dst.port,
            "cross-domain link added"
        );
        registry::broadcast(&self.registry, Message::AskDpid { dpid: dst.dpid }).await;
    }

    /// An agent claims a boundary device: stamp every matching endpoint.
    /// The latest claim wins.
    async fn claim_device(&self, from: AgentId, dpid: Dpid) {
        let stamped = self.links.lock().await.claim_device(dpid, from);
        tracing::info!(agent_id = from, dpid, endpoints = stamped, "boundary device claimed");
    }

    /// An agent wants a route to `host`: remember who asked, then ask every
    /// domain whether it owns the host.
    async fn request_route(&self, from: AgentId, host: String) {
        self.pending.lock().await.push(&host, from, self.route_ttl);
        tracing::info!(agent_id = from, host = %host, "route requested");
        registry::broadcast(&self.registry, Message::AskHost { host }).await;
    }

    /// An agent owns `host`: answer every outstanding request for it that
    /// the current topology can reach.
    async fn claim_host(&self, owner: AgentId, host: String) {
        let matched = self.pending.lock().await.take_matching(&host);
        if matched.is_empty() {
            tracing::debug!(agent_id = owner, host = %host, "host claim with no outstanding request");
            return;
        }

        for request in matched {
            let egress = {
                let links = self.links.lock().await;
                let graph = AgentGraph::from_links(&links);
                graph
                    .shortest_path(request.requester, owner)
                    .filter(|path| path.len() >= 2)
                    .and_then(|path| links.egress(path[0], path[1]))
            };

            match egress {
                Some((dpid, port)) => {
                    tracing::info!(
                        requester = request.requester,
                        owner,
                        host = %host,
                        dpid,
                        port,
                        "route resolved"
                    );
                    let handle = self.registry.lock().await.get(request.requester);
                    if let Some(handle) = handle {
                        let _ = handle
                            .send(Message::RouteResult {
                                dpid,
                                port,
                                host: host.clone(),
                            })
                            .await;
                    }
                }
                None => {
                    // Not reachable yet; the entry stays until more links
                    // resolve or the deadline expires.
                    tracing::debug!(
                        requester = request.requester,
                        owner,
                        host = %host,
                        "host claimed but no inter-domain path"
                    );
                    self.pending.lock().await.restore(request);
                }
            }
        }
    }

    /// Expire overdue route requests and tell the requesters.
    pub async fn expire_routes(&self) {
        let expired = self.pending.lock().await.take_expired(Instant::now());
        for request in expired {
            tracing::info!(
                agent_id = request.requester,
                host = %request.host,
                "route request expired"
            );
            let handle = self.registry.lock().await.get(request.requester);
            if let Some(handle) = handle {
                let _ = handle
                    .send(Message::RouteError {
                        host: request.host.clone(),
                        reason: "no route resolved before deadline".to_string(),
                    })
                    .await;
            }
        }
    }

    /// Directed link records, for snapshots and inspection.
    pub async fn links(&self) -> Vec<CrossDomainLink> {
        self.links.lock().await.records().to_vec()
    }

    pub async fn link_count(&self) -> usize {
        self.links.lock().await.len()
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// Sweep overdue route requests once per second.
pub async fn expiry_loop(coordinator: Coordinator, mut shutdown: broadcast::Receiver<()>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("route expiry loop shutting down");
                return;
            }
            _ = interval.tick() => coordinator.expire_routes().await,
        }
    }
}
