//! Cross-domain link table.
//!
//! Each physical boundary cable is stored as two directed records (forward
//! and reverse) so either direction can be looked up with a plain scan.
//! Records are never removed; endpoint owners are stamped in place as the
//! discovery protocol resolves them.

use meridian_core::protocol::{AgentId, Dpid, Endpoint, PortNo};

/// One side of a stored cross-domain link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkEndpoint {
    pub dpid: Dpid,
    pub port: PortNo,
    /// Which agent owns this boundary device. `None` until some agent
    /// claims the dpid.
    pub owner: Option<AgentId>,
}

impl LinkEndpoint {
    pub fn owned(ep: Endpoint, owner: AgentId) -> Self {
        Self {
            dpid: ep.dpid,
            port: ep.port,
            owner: Some(owner),
        }
    }

    pub fn unowned(ep: Endpoint) -> Self {
        Self {
            dpid: ep.dpid,
            port: ep.port,
            owner: None,
        }
    }

    fn same_device_port(&self, other: &LinkEndpoint) -> bool {
        self.dpid == other.dpid && self.port == other.port
    }
}

/// A directed record of one boundary cable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossDomainLink {
    pub src: LinkEndpoint,
    pub dst: LinkEndpoint,
}

#[derive(Debug, Default)]
pub struct LinkTable {
    links: Vec<CrossDomainLink>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert forward and reverse records for a reported cable.
    ///
    /// Returns `false` (and stores nothing) when the undirected endpoint
    /// pair is already present, regardless of which side reported it first
    /// or what owners have been resolved since.
    pub fn add(&mut self, src: LinkEndpoint, dst: LinkEndpoint) -> bool {
        let duplicate = self
            .links
            .iter()
            .any(|l| l.src.same_device_port(&src) && l.dst.same_device_port(&dst));
        if duplicate {
            return false;
        }
        self.links.push(CrossDomainLink { src, dst });
        self.links.push(CrossDomainLink { src: dst, dst: src });
        true
    }

    /// Stamp every endpoint (either side of any record) whose device id
    /// matches. Later claims overwrite earlier ones; repeating a claim is a
    /// no-op. Returns how many endpoints were stamped.
    pub fn claim_device(&mut self, dpid: Dpid, owner: AgentId) -> usize {
        let mut stamped = 0;
        for link in &mut self.links {
            if link.src.dpid == dpid {
                link.src.owner = Some(owner);
                stamped += 1;
            }
            if link.dst.dpid == dpid {
                link.dst.owner = Some(owner);
                stamped += 1;
            }
        }
        stamped
    }

    /// Directed records whose both ends have known owners, in insertion
    /// order.
    pub fn resolved(&self) -> impl Iterator<Item = &CrossDomainLink> {
        self.links
            .iter()
            .filter(|l| l.src.owner.is_some() && l.dst.owner.is_some())
    }

    /// Egress point for the first stored record owned `from → to`: the
    /// source side's device and port.
    pub fn egress(&self, from: AgentId, to: AgentId) -> Option<(Dpid, PortNo)> {
        self.links
            .iter()
            .find(|l| l.src.owner == Some(from) && l.dst.owner == Some(to))
            .map(|l| (l.src.dpid, l.src.port))
    }

    /// All directed records, for state snapshots.
    pub fn records(&self) -> &[CrossDomainLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
