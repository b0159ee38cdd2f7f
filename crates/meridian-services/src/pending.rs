//! Route requests awaiting a host-ownership claim.
//!
//! Entries live until a claim resolves them or their deadline passes; the
//! expiry sweep turns leaked entries into explicit failure notifications
//! instead of leaving requesters waiting forever.

use std::time::{Duration, Instant};

use meridian_core::protocol::AgentId;

/// One outstanding `get_route`.
#[derive(Debug, Clone)]
pub struct PendingRoute {
    pub host: String,
    pub requester: AgentId,
    pub deadline: Instant,
}

#[derive(Debug, Default)]
pub struct RouteRequests {
    entries: Vec<PendingRoute>,
}

impl RouteRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, host: &str, requester: AgentId, ttl: Duration) {
        self.entries.push(PendingRoute {
            host: host.to_string(),
            requester,
            deadline: Instant::now() + ttl,
        });
    }

    /// Remove and return every entry for `host`. All concurrent requesters
    /// of the same host are answered by a single claim.
    pub fn take_matching(&mut self, host: &str) -> Vec<PendingRoute> {
        let mut matched = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].host == host {
                matched.push(self.entries.remove(i));
            } else {
                i += 1;
            }
        }
        matched
    }

    /// Put back an entry that matched but could not be answered yet. Keeps
    /// its original deadline.
    pub fn restore(&mut self, entry: PendingRoute) {
        self.entries.push(entry);
    }

    /// Remove and return every entry whose deadline has passed.
    pub fn take_expired(&mut self, now: Instant) -> Vec<PendingRoute> {
        let mut expired = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].deadline <= now {
                expired.push(self.entries.remove(i));
            } else {
                i += 1;
            }
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
