//! meridian-core — shared types, wire protocol, and configuration.
//! All other Meridian crates depend on this one.

pub mod config;
pub mod protocol;

pub use protocol::{AgentId, Dpid, Endpoint, Message, PortNo};
