//! Control-channel wire protocol.
//!
//! One JSON object per line, newline-terminated, tagged by `cmd`. Agents
//! (domain controllers) speak this protocol to the global controller over a
//! single long-lived TCP stream.

use serde::{Deserialize, Serialize};

/// Session identifier for a connected domain controller. Unique while the
/// agent is connected, reused after it disconnects.
pub type AgentId = u16;

/// Boundary device identifier (OpenFlow datapath id).
pub type Dpid = u64;

/// Port number on a boundary device.
pub type PortNo = u32;

/// One side of a cross-domain link as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub dpid: Dpid,
    pub port: PortNo,
}

/// Every message exchanged on the control channel.
///
/// Direction is implied by the command: agents report links, claim
/// ownership, and request routes; the controller assigns ids, broadcasts
/// ownership queries, and delivers route results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Message {
    /// First message on every connection: the id the controller assigned.
    SetAgentId { agent_id: AgentId },

    /// An agent reports a boundary link. `src` is the reporting agent's
    /// own side; the owner of `dst` is learned via `ask_dpid`.
    AddCrossDomainLink { src: Endpoint, dst: Endpoint },

    /// Broadcast: which agent owns this boundary device?
    AskDpid { dpid: Dpid },

    /// An agent claims ownership of a boundary device.
    ResponseDpid { dpid: Dpid },

    /// An agent asks for a route to a host outside its domain.
    GetRoute { dst: String },

    /// Broadcast: which agent owns this host?
    AskHost { host: String },

    /// An agent claims ownership of a host.
    ResponseHost { host: String },

    /// Egress point resolved for an earlier `get_route`.
    RouteResult {
        dpid: Dpid,
        port: PortNo,
        host: String,
    },

    /// A `get_route` that could not be resolved before its deadline.
    RouteError { host: String, reason: String },
}

impl Message {
    /// Serialize to one wire line (without the trailing newline).
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("message serialization failed")
    }

    /// Decode one wire line.
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }
}
