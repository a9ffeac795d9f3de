//! Cactus graph core: nodes, paired edge-ends, and the cycle-mark
//! protocol (spec §4.5).

use ahash::{AHashMap, AHashSet};

use crate::arena::Arena;
use crate::cactus::ids::{EdgeEndId, NodeId};
use crate::tecc::ThreeEdgeConnected;

#[derive(Debug)]
pub(crate) struct EdgeEndData<E> {
    node: NodeId,
    partner: EdgeEndId,
    next_in_node: Option<EdgeEndId>,
    user: E,
    link: Option<EdgeEndId>,
    link_orientation: bool,
    is_chain_end: bool,
}

#[derive(Debug)]
pub(crate) struct NodeData<N> {
    // `Option` only to allow `merge_nodes` to move the payload out
    // through `merge_fn` without requiring `N: Default`; always `Some`
    // except mid-merge.
    user: Option<N>,
    head: Option<EdgeEndId>,
    tail: Option<EdgeEndId>,
}

/// Owns every node and edge-end of one cactus graph (spec §3's `G`).
///
/// `N` is the opaque per-node user payload, `E` the opaque per-edge-end
/// payload (design notes §9: "replace opaque user object with a type
/// parameter").
#[derive(Debug)]
pub struct CactusGraph<N, E> {
    nodes: Arena<NodeData<N>>,
    edge_ends: Arena<EdgeEndData<E>>,
}

impl<N, E> Default for CactusGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> CactusGraph<N, E> {
    pub fn new() -> Self {
        CactusGraph {
            nodes: Arena::new(),
            edge_ends: Arena::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|(i, _)| NodeId(i))
    }

    pub fn add_node(&mut self, user: N) -> NodeId {
        NodeId(self.nodes.insert(NodeData {
            user: Some(user),
            head: None,
            tail: None,
        }))
    }

    pub fn node_user(&self, node: NodeId) -> &N {
        self.nodes.get(node.0).expect("unknown node id").user.as_ref().unwrap()
    }

    pub fn node_user_mut(&mut self, node: NodeId) -> &mut N {
        self.nodes.get_mut(node.0).expect("unknown node id").user.as_mut().unwrap()
    }

    /// Every edge-end owned by `node`, in insertion order.
    pub fn node_edge_ends(&self, node: NodeId) -> Vec<EdgeEndId> {
        let mut out = Vec::new();
        let mut cur = self.nodes.get(node.0).expect("unknown node id").head;
        while let Some(id) = cur {
            out.push(id);
            cur = self.edge_ends.get(id.0).unwrap().next_in_node;
        }
        out
    }

    pub fn edge_end_node(&self, ee: EdgeEndId) -> NodeId {
        self.edge_ends.get(ee.0).expect("unknown edge-end id").node
    }

    pub fn edge_end_partner(&self, ee: EdgeEndId) -> EdgeEndId {
        self.edge_ends.get(ee.0).expect("unknown edge-end id").partner
    }

    pub fn edge_end_user(&self, ee: EdgeEndId) -> &E {
        &self.edge_ends.get(ee.0).expect("unknown edge-end id").user
    }

    pub fn edge_end_user_mut(&mut self, ee: EdgeEndId) -> &mut E {
        &mut self.edge_ends.get_mut(ee.0).expect("unknown edge-end id").user
    }

    pub fn edge_end_link(&self, ee: EdgeEndId) -> Option<EdgeEndId> {
        self.edge_ends.get(ee.0).expect("unknown edge-end id").link
    }

    pub fn edge_end_link_orientation(&self, ee: EdgeEndId) -> bool {
        self.edge_ends.get(ee.0).expect("unknown edge-end id").link_orientation
    }

    pub fn edge_end_is_chain_end(&self, ee: EdgeEndId) -> bool {
        self.edge_ends.get(ee.0).expect("unknown edge-end id").is_chain_end
    }

    pub fn edge_end_is_bridge(&self, ee: EdgeEndId) -> bool {
        self.edge_end_link(ee).is_none()
    }

    /// Materializes an edge as two partnered edge-ends, one appended to
    /// each node's list, each carrying its own opaque payload.
    pub fn add_edge(&mut self, node1: NodeId, node2: NodeId, user1: E, user2: E) -> (EdgeEndId, EdgeEndId) {
        let id1 = EdgeEndId(self.edge_ends.insert(EdgeEndData {
            node: node1,
            partner: EdgeEndId(0), // patched below
            next_in_node: None,
            user: user1,
            link: None,
            link_orientation: false,
            is_chain_end: false,
        }));
        let id2 = EdgeEndId(self.edge_ends.insert(EdgeEndData {
            node: node2,
            partner: id1,
            next_in_node: None,
            user: user2,
            link: None,
            link_orientation: false,
            is_chain_end: false,
        }));
        self.edge_ends.get_mut(id1.0).unwrap().partner = id2;

        self.append_edge_end(node1, id1);
        self.append_edge_end(node2, id2);
        (id1, id2)
    }

    fn append_edge_end(&mut self, node: NodeId, ee: EdgeEndId) {
        let n = self.nodes.get_mut(node.0).expect("unknown node id");
        match n.tail {
            Some(tail) => {
                self.edge_ends.get_mut(tail.0).unwrap().next_in_node = Some(ee);
            }
            None => {
                n.head = Some(ee);
            }
        }
        self.nodes.get_mut(node.0).unwrap().tail = Some(ee);
    }

    /// Merges `other` into `keep`: every edge-end owned by `other`
    /// transfers to `keep`, `other`'s user object is discarded in favor
    /// of `merge_fn`'s result, and `other` is destroyed.
    pub(crate) fn merge_nodes(&mut self, keep: NodeId, other: NodeId, merge_fn: &mut impl FnMut(N, N) -> N) {
        if keep == other {
            return;
        }
        let other_head = self.nodes.get(other.0).unwrap().head;
        let mut cur = other_head;
        while let Some(ee) = cur {
            self.edge_ends.get_mut(ee.0).unwrap().node = keep;
            cur = self.edge_ends.get(ee.0).unwrap().next_in_node;
        }
        if let Some(other_head) = other_head {
            let keep_tail = self.nodes.get(keep.0).unwrap().tail;
            match keep_tail {
                Some(tail) => self.edge_ends.get_mut(tail.0).unwrap().next_in_node = Some(other_head),
                None => self.nodes.get_mut(keep.0).unwrap().head = Some(other_head),
            }
            let other_tail = self.nodes.get(other.0).unwrap().tail;
            self.nodes.get_mut(keep.0).unwrap().tail = other_tail;
        }

        let removed = self.nodes.remove(other.0).unwrap();
        let keep_user = self.nodes.get_mut(keep.0).unwrap().user.take().unwrap();
        let merged = merge_fn(keep_user, removed.user.unwrap());
        self.nodes.get_mut(keep.0).unwrap().user = Some(merged);
    }

    /// Clears every `link`/`link_orientation`/`is_chain_end` bit. Required
    /// before any structural rework that should preserve only the
    /// underlying multigraph (spec §4.5).
    pub fn unmark_cycles(&mut self) {
        for (_, ee) in self.edge_ends.iter_mut() {
            ee.link = None;
            ee.link_orientation = false;
            ee.is_chain_end = false;
        }
    }

    /// Builds an adjacency list keyed by dense node index, invokes the
    /// injected 3-edge-connectivity collaborator, merges every
    /// multi-element component it returns, then marks cycles from
    /// `start`. The start node survives every merge it participates in.
    pub fn collapse_to_cactus(
        &mut self,
        start: NodeId,
        tecc: &impl ThreeEdgeConnected,
        mut merge_fn: impl FnMut(N, N) -> N,
    ) {
        let dense: Vec<NodeId> = self.nodes().collect();
        let index_of: AHashMap<NodeId, usize> = dense.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let adjacency: Vec<Vec<usize>> = dense
            .iter()
            .map(|&n| {
                self.node_edge_ends(n)
                    .into_iter()
                    .map(|ee| index_of[&self.edge_end_node(self.edge_end_partner(ee))])
                    .collect()
            })
            .collect();

        let components = tecc.components(&adjacency);
        for component in components {
            if component.len() < 2 {
                continue;
            }
            let nodes: Vec<NodeId> = component.iter().map(|&i| dense[i]).collect();
            let survivor = nodes.iter().copied().find(|&n| n == start).unwrap_or(nodes[0]);
            for &n in &nodes {
                if n != survivor {
                    self.merge_nodes(survivor, n, &mut merge_fn);
                }
            }
        }

        self.mark_cycles(start);
    }

    /// Identifies chains via iterative (stack-driven) DFS from `start`;
    /// see spec §4.5. Assumes `unmark_cycles` state (no stale links).
    pub fn mark_cycles(&mut self, start: NodeId) {
        self.unmark_cycles();

        let mut visited: AHashSet<NodeId> = AHashSet::new();
        // Explicit DFS stack: (node, incoming edge-end, next child index).
        let mut stack: Vec<(NodeId, Option<EdgeEndId>, usize)> = Vec::new();
        let mut stack_pos: AHashMap<NodeId, usize> = AHashMap::new();

        visited.insert(start);
        stack_pos.insert(start, 0);
        stack.push((start, None, 0));

        while let Some(&(node, incoming, child_idx)) = stack.last() {
            let ends = self.node_edge_ends(node);
            if child_idx >= ends.len() {
                stack.pop();
                stack_pos.remove(&node);
                continue;
            }
            let last = stack.len() - 1;
            stack[last].2 += 1;
            let ee = ends[child_idx];
            if Some(ee) == incoming {
                continue;
            }
            let partner = self.edge_end_partner(ee);
            let neighbor = self.edge_end_node(partner);
            if !visited.contains(&neighbor) {
                visited.insert(neighbor);
                stack_pos.insert(neighbor, stack.len());
                stack.push((neighbor, Some(partner), 0));
            } else if let Some(&anc_idx) = stack_pos.get(&neighbor) {
                self.close_cycle(&stack, anc_idx, ee);
            }
        }
    }

    fn close_cycle(&mut self, stack: &[(NodeId, Option<EdgeEndId>, usize)], anc_idx: usize, ee: EdgeEndId) {
        let top_idx = stack.len() - 1;
        let mut pairs = Vec::with_capacity(top_idx - anc_idx + 1);
        for idx in anc_idx..=top_idx {
            let in_end = if idx == anc_idx {
                self.edge_end_partner(ee)
            } else {
                stack[idx].1.expect("non-root cycle node always has an incoming edge-end")
            };
            let out_end = if idx == top_idx {
                ee
            } else {
                let next_incoming = stack[idx + 1].1.expect("next cycle node always has an incoming edge-end");
                self.edge_end_partner(next_incoming)
            };
            pairs.push((in_end, out_end));
        }
        for (i, &(in_end, out_end)) in pairs.iter().enumerate() {
            self.link_mutual(in_end, out_end);
            if i == 0 {
                self.edge_ends.get_mut(in_end.0).unwrap().is_chain_end = true;
                self.edge_ends.get_mut(out_end.0).unwrap().is_chain_end = true;
            }
        }
    }

    fn link_mutual(&mut self, a: EdgeEndId, b: EdgeEndId) {
        self.edge_ends.get_mut(a.0).unwrap().link = Some(b);
        self.edge_ends.get_mut(a.0).unwrap().link_orientation = false;
        self.edge_ends.get_mut(b.0).unwrap().link = Some(a);
        self.edge_ends.get_mut(b.0).unwrap().link_orientation = true;
    }

    /// Number of cactus edges in the chain containing `end`, by walking
    /// `link`/`partner` pairs until returning to `end`. Zero for a bridge
    /// end.
    pub fn chain_length(&self, end: EdgeEndId) -> usize {
        if self.edge_end_is_bridge(end) {
            return 0;
        }
        let mut count = 0usize;
        let mut cur = end;
        loop {
            count += 1;
            let linked = self.edge_end_link(cur).expect("chain end has a link");
            let next = self.edge_end_partner(linked);
            if next == end {
                break;
            }
            cur = next;
        }
        count
    }

    /// Sum of chain lengths for every chain rooted at `node` (one chain
    /// end per chain is visited, skipping the other orientation so each
    /// chain counts once).
    pub fn total_flower_length(&self, node: NodeId) -> usize {
        self.root_chain_ends(node)
            .into_iter()
            .map(|end| self.chain_length(end))
            .sum()
    }

    /// The number of distinct chains incident to `node`.
    pub fn chain_number(&self, node: NodeId) -> usize {
        self.root_chain_ends(node).len()
    }

    /// The chain-end edge-ends owned by `node` that are each a canonical
    /// representative (orientation `false`) of their chain, so chains
    /// with both ends at `node` (self-loops) are not double-counted.
    pub(crate) fn root_chain_ends(&self, node: NodeId) -> Vec<EdgeEndId> {
        self.node_edge_ends(node)
            .into_iter()
            .filter(|&ee| self.edge_end_is_chain_end(ee) && !self.edge_end_link_orientation(ee))
            .collect()
    }

    pub(crate) fn node_head(&self, node: NodeId) -> Option<EdgeEndId> {
        self.nodes.get(node.0).expect("unknown node id").head
    }
}
