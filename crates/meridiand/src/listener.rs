//! Accepts agent connections and starts their session duties.

use std::net::SocketAddr;

use anyhow::Result;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};

use meridian_core::protocol::Message;

use crate::dispatch::Coordinator;
use crate::session::AgentSession;

pub struct ControlListener {
    listener: TcpListener,
    coordinator: Coordinator,
    send_queue: usize,
    shutdown: broadcast::Receiver<()>,
}

impl ControlListener {
    pub fn new(
        listener: TcpListener,
        coordinator: Coordinator,
        send_queue: usize,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            listener,
            coordinator,
            send_queue,
            shutdown,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("control listener shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.start_session(stream, addr).await,
                        Err(e) => tracing::warn!(error = %e, "accept failed"),
                    }
                }
            }
        }
    }

    async fn start_session(&self, stream: TcpStream, addr: SocketAddr) {
        let (tx, rx) = mpsc::channel(self.send_queue);
        let handle = match self.coordinator.registry.lock().await.allocate(addr, tx) {
            Ok(handle) => handle,
            Err(e) => {
                // Fatal to this connection only; the stream drops closed.
                tracing::warn!(addr = %addr, error = %e, "refusing connection");
                return;
            }
        };
        tracing::info!(agent_id = handle.id, addr = %addr, "agent connected");

        // Queued before the duties start, so it is the first line the agent
        // receives.
        if handle
            .send(Message::SetAgentId { agent_id: handle.id })
            .await
            .is_err()
        {
            self.coordinator.registry.lock().await.release(handle.id);
            return;
        }

        let session = AgentSession::new(
            handle,
            stream,
            rx,
            self.coordinator.clone(),
            self.shutdown.resubscribe(),
        );
        tokio::spawn(session.run());
    }
}
