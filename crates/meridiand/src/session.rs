//! One accepted agent connection: inbound dispatch and outbound delivery.
//!
//! The two duties start together and end together. The inbound duty owns
//! the session's lifetime: when it stops (peer disconnect, read error, or
//! server shutdown) the agent id is released and the outbound duty is told
//! to stop, with anything still queued discarded rather than delivered.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};

use meridian_core::protocol::{AgentId, Message};
use meridian_services::AgentHandle;

use crate::dispatch::Coordinator;

pub struct AgentSession {
    handle: AgentHandle,
    stream: TcpStream,
    outbound: mpsc::Receiver<Message>,
    coordinator: Coordinator,
    shutdown: broadcast::Receiver<()>,
}

impl AgentSession {
    pub fn new(
        handle: AgentHandle,
        stream: TcpStream,
        outbound: mpsc::Receiver<Message>,
        coordinator: Coordinator,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            handle,
            stream,
            outbound,
            coordinator,
            shutdown,
        }
    }

    /// Run both duties until the connection ends.
    pub async fn run(self) {
        let AgentSession {
            handle,
            stream,
            outbound,
            coordinator,
            mut shutdown,
        } = self;
        let (read_half, write_half) = stream.into_split();

        let (closed_tx, closed_rx) = broadcast::channel::<()>(1);
        let writer = tokio::spawn(send_loop(handle.id, write_half, outbound, closed_rx));

        recv_loop(handle.id, read_half, &coordinator, &mut shutdown).await;

        // Free the id the moment the serving lifetime ends, then stop the
        // outbound side.
        coordinator.registry.lock().await.release(handle.id);
        let _ = closed_tx.send(());
        let _ = writer.await;

        tracing::info!(agent_id = handle.id, addr = %handle.addr, "agent disconnected");
    }
}

/// Inbound duty: read one line, decode, dispatch. An undecodable line is
/// dropped; a read failure, EOF, or server shutdown ends the session.
async fn recv_loop(
    id: AgentId,
    read_half: OwnedReadHalf,
    coordinator: &Coordinator,
    shutdown: &mut broadcast::Receiver<()>,
) {
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    loop {
        line.clear();
        let read = tokio::select! {
            _ = shutdown.recv() => {
                tracing::debug!(agent_id = id, "closing session for shutdown");
                return;
            }
            read = reader.read_line(&mut line) => read,
        };
        match read {
            Ok(0) => {
                tracing::debug!(agent_id = id, "agent closed the connection");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(agent_id = id, error = %e, "read failed");
                return;
            }
        }
        if line.trim().is_empty() {
            continue;
        }
        match Message::decode(&line) {
            Ok(msg) => coordinator.handle(id, msg).await,
            Err(e) => {
                tracing::warn!(agent_id = id, error = %e, "dropping undecodable message");
            }
        }
    }
}

/// Outbound duty: drain the queue onto the socket, one line per message.
/// On write failure or close, remaining queued messages are discarded.
async fn send_loop(
    id: AgentId,
    mut write_half: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<Message>,
    mut closed: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = closed.recv() => break,
            msg = outbound.recv() => {
                let Some(msg) = msg else { break };
                let mut line = msg.encode();
                line.push('\n');
                if let Err(e) = write_half.write_all(line.as_bytes()).await {
                    tracing::debug!(agent_id = id, error = %e, "write failed");
                    break;
                }
            }
        }
    }
    while outbound.try_recv().is_ok() {}
}
