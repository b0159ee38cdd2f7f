//! Query-time view of the inter-domain topology.
//!
//! Rebuilt from the link table on every route resolution; nothing here is
//! persisted. Adjacency lists follow link insertion order, so shortest-path
//! results are stable across rebuilds of the same table.

use std::collections::{HashMap, VecDeque};

use meridian_core::protocol::AgentId;

use crate::links::LinkTable;

/// Undirected graph over agent ids, built from fully-resolved links.
#[derive(Debug, Default)]
pub struct AgentGraph {
    adj: HashMap<AgentId, Vec<AgentId>>,
}

impl AgentGraph {
    /// Build from every directed record whose both owners are known. The
    /// table stores both directions of each cable, which is exactly what an
    /// undirected adjacency needs.
    pub fn from_links(table: &LinkTable) -> Self {
        let mut graph = Self::default();
        for link in table.resolved() {
            if let (Some(a), Some(b)) = (link.src.owner, link.dst.owner) {
                graph.adj.entry(a).or_default().push(b);
            }
        }
        graph
    }

    /// Unweighted shortest path by breadth-first search. Ties are broken by
    /// link insertion order. `None` when the nodes are disconnected.
    pub fn shortest_path(&self, from: AgentId, to: AgentId) -> Option<Vec<AgentId>> {
        if from == to {
            return Some(vec![from]);
        }
        if !self.adj.contains_key(&from) {
            return None;
        }

        let mut prev: HashMap<AgentId, AgentId> = HashMap::new();
        let mut queue = VecDeque::new();
        prev.insert(from, from);
        queue.push_back(from);

        while let Some(node) = queue.pop_front() {
            for &next in self.adj.get(&node).into_iter().flatten() {
                if prev.contains_key(&next) {
                    continue;
                }
                prev.insert(next, node);
                if next == to {
                    let mut path = vec![to];
                    let mut cur = to;
                    while let Some(&p) = prev.get(&cur) {
                        if p == cur {
                            break;
                        }
                        path.push(p);
                        cur = p;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }
}
