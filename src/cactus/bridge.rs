//! Bridge graph decomposition (spec §4.7).

use ahash::{AHashMap, AHashSet};

use crate::cactus::graph::CactusGraph;
use crate::cactus::ids::{EdgeEndId, NodeId};

/// A maximal link-connected ("bridgeless") blob of cactus nodes, plus the
/// bridge edge-ends incident on it.
#[derive(Debug, Clone)]
pub struct BridgeNode {
    pub cactus_nodes: Vec<NodeId>,
    pub bridge_ends: Vec<EdgeEndId>,
}

/// The bridge graph rooted at a particular cactus component: one
/// [`BridgeNode`] per bridgeless blob, connected by an edge iff joined by
/// a bridge edge in the cactus.
#[derive(Debug, Clone)]
pub struct BridgeGraph {
    pub nodes: Vec<BridgeNode>,
    /// `(i, j)` pairs of indices into `nodes`, one per bridge edge.
    pub edges: Vec<(usize, usize)>,
}

impl<N, E> CactusGraph<N, E> {
    /// Builds the bridge graph for the component containing `start_node`.
    pub fn bridge_graph(&self, start_node: NodeId) -> BridgeGraph {
        let mut parent: AHashMap<NodeId, NodeId> = AHashMap::new();
        fn find(parent: &mut AHashMap<NodeId, NodeId>, x: NodeId) -> NodeId {
            let p = *parent.entry(x).or_insert(x);
            if p == x {
                x
            } else {
                let root = find(parent, p);
                parent.insert(x, root);
                root
            }
        }
        fn union(parent: &mut AHashMap<NodeId, NodeId>, a: NodeId, b: NodeId) {
            let (ra, rb) = (find(parent, a), find(parent, b));
            if ra != rb {
                parent.insert(ra, rb);
            }
        }

        let component = self.reachable_from(start_node);
        for &n in &component {
            parent.entry(n).or_insert(n);
        }
        for &n in &component {
            for ee in self.node_edge_ends(n) {
                if self.edge_end_is_bridge(ee) {
                    continue;
                }
                let neighbor = self.edge_end_node(self.edge_end_partner(ee));
                union(&mut parent, n, neighbor);
            }
        }

        let mut groups: AHashMap<NodeId, Vec<NodeId>> = AHashMap::new();
        for &n in &component {
            let root = find(&mut parent, n);
            groups.entry(root).or_default().push(n);
        }

        let mut blob_of: AHashMap<NodeId, usize> = AHashMap::new();
        let mut nodes: Vec<BridgeNode> = Vec::with_capacity(groups.len());
        for (i, (_, members)) in groups.into_iter().enumerate() {
            for &m in &members {
                blob_of.insert(m, i);
            }
            nodes.push(BridgeNode {
                cactus_nodes: members,
                bridge_ends: Vec::new(),
            });
        }

        let mut edges = Vec::new();
        let mut seen_edge: AHashSet<EdgeEndId> = AHashSet::new();
        for &n in &component {
            let blob_idx = blob_of[&n];
            for ee in self.node_edge_ends(n) {
                if !self.edge_end_is_bridge(ee) {
                    continue;
                }
                nodes[blob_idx].bridge_ends.push(ee);
                let partner = self.edge_end_partner(ee);
                if seen_edge.contains(&partner) {
                    continue;
                }
                seen_edge.insert(ee);
                let other_blob = blob_of[&self.edge_end_node(partner)];
                edges.push((blob_idx.min(other_blob), blob_idx.max(other_blob)));
            }
        }

        BridgeGraph { nodes, edges }
    }

    fn reachable_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut visited: AHashSet<NodeId> = AHashSet::new();
        let mut stack = vec![start];
        visited.insert(start);
        while let Some(n) = stack.pop() {
            for ee in self.node_edge_ends(n) {
                let neighbor = self.edge_end_node(self.edge_end_partner(ee));
                if visited.insert(neighbor) {
                    stack.push(neighbor);
                }
            }
        }
        visited.into_iter().collect()
    }
}
