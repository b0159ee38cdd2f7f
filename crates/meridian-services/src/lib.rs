//! meridian-services — shared controller state: the agent registry, the
//! cross-domain link table, the topology view built from it, and the list
//! of route requests awaiting a host-ownership claim.

pub mod links;
pub mod pending;
pub mod registry;
pub mod topology;

pub use links::{CrossDomainLink, LinkEndpoint, LinkTable};
pub use pending::{PendingRoute, RouteRequests};
pub use registry::{new_registry, AgentHandle, AgentRegistry, RegistryError, SharedRegistry};
pub use topology::AgentGraph;
