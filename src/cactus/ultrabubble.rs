//! Nested ultrabubble decomposition (spec §4.7).

use crate::cactus::graph::CactusGraph;
use crate::cactus::ids::{EdgeEndId, NodeId};

/// A pair of edge-ends whose removal disconnects the cactus. Non-leaf
/// ultrabubbles nest a list of chains, one per branch hanging off the
/// node between `edge_end_1` and `edge_end_2`.
#[derive(Debug, Clone)]
pub struct Ultrabubble {
    pub edge_end_1: EdgeEndId,
    pub edge_end_2: EdgeEndId,
    pub nested: Vec<Vec<Ultrabubble>>,
}

impl<N, E> CactusGraph<N, E> {
    /// Every chain of ultrabubbles incident to `start_node`. Top-level
    /// chains come from `start_node`'s own cactus chains (bridge-delimited
    /// at the boundary, per spec §4.7); nested bubbles are always
    /// chain-delimited since they are built from `link` pairs exclusively.
    pub fn ultrabubbles(&self, start_node: NodeId) -> Vec<Vec<Ultrabubble>> {
        self.chains_at(start_node)
    }

    fn chains_at(&self, node: NodeId) -> Vec<Vec<Ultrabubble>> {
        let mut chains = Vec::new();
        for root in self.root_chain_ends(node) {
            let mut chain = Vec::new();
            let mut current_out = self.edge_end_link(root).expect("chain end has a link");
            loop {
                let in_next = self.edge_end_partner(current_out);
                if in_next == root {
                    break;
                }
                let next_node = self.edge_end_node(in_next);
                let out_next = self.edge_end_link(in_next).expect("chain end has a link");
                let nested = self.chains_at(next_node);
                chain.push(Ultrabubble {
                    edge_end_1: in_next,
                    edge_end_2: out_next,
                    nested,
                });
                current_out = out_next;
            }
            chains.push(chain);
        }
        chains
    }
}
