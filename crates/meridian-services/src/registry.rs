//! Agent registry — assigns session identifiers and tracks connected agents.
//!
//! The registry is the single serialization point for session membership:
//! every allocate/release/lookup goes through the shared mutex. Broadcast
//! snapshots the handle list under the lock and sends without holding it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::Mutex;

use meridian_core::protocol::{AgentId, Message};

/// Handle to one connected agent's outbound queue.
///
/// Cloning is cheap; all clones feed the same bounded queue, so delivery
/// order matches the order `send` was called.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    pub id: AgentId,
    pub addr: SocketAddr,
    tx: mpsc::Sender<Message>,
}

impl AgentHandle {
    pub fn new(id: AgentId, addr: SocketAddr, tx: mpsc::Sender<Message>) -> Self {
        Self { id, addr, tx }
    }

    /// Enqueue one message. Suspends the caller while the agent's queue is
    /// full; fails only once the agent's outbound duty has stopped.
    pub async fn send(&self, msg: Message) -> Result<(), mpsc::error::SendError<Message>> {
        self.tx.send(msg).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("agent id space exhausted ({0} ids in use)")]
    Exhausted(usize),
}

/// Maps agent ids to live session handles, bounded to a fixed id space.
#[derive(Debug)]
pub struct AgentRegistry {
    max_agents: usize,
    agents: HashMap<AgentId, AgentHandle>,
}

impl AgentRegistry {
    pub fn new(max_agents: usize) -> Self {
        Self {
            max_agents,
            agents: HashMap::new(),
        }
    }

    /// Assign the next free id, scanning from the current registry size and
    /// wrapping modulo the id space.
    pub fn allocate(
        &mut self,
        addr: SocketAddr,
        tx: mpsc::Sender<Message>,
    ) -> Result<AgentHandle, RegistryError> {
        if self.agents.len() >= self.max_agents {
            return Err(RegistryError::Exhausted(self.agents.len()));
        }
        let mut id = (self.agents.len() % self.max_agents) as AgentId;
        while self.agents.contains_key(&id) {
            id = ((id as usize + 1) % self.max_agents) as AgentId;
        }
        let handle = AgentHandle::new(id, addr, tx);
        self.agents.insert(id, handle.clone());
        Ok(handle)
    }

    /// Free an id for reuse. Dropping the returned handle closes the last
    /// registry-held reference to the agent's queue.
    pub fn release(&mut self, id: AgentId) -> Option<AgentHandle> {
        self.agents.remove(&id)
    }

    pub fn get(&self, id: AgentId) -> Option<AgentHandle> {
        self.agents.get(&id).cloned()
    }

    /// Handles of every registered agent in ascending id order.
    pub fn handles(&self) -> Vec<AgentHandle> {
        let mut handles: Vec<AgentHandle> = self.agents.values().cloned().collect();
        handles.sort_by_key(|h| h.id);
        handles
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// The registry as shared between the listener and all session tasks.
pub type SharedRegistry = Arc<Mutex<AgentRegistry>>;

pub fn new_registry(max_agents: usize) -> SharedRegistry {
    Arc::new(Mutex::new(AgentRegistry::new(max_agents)))
}

/// Send to every registered agent in id order. An agent that disconnects
/// mid-broadcast is skipped by later sends, not retried.
pub async fn broadcast(registry: &SharedRegistry, msg: Message) {
    let handles = registry.lock().await.handles();
    for handle in handles {
        if handle.send(msg.clone()).await.is_err() {
            tracing::debug!(agent_id = handle.id, "agent gone during broadcast, skipping");
        }
    }
}
