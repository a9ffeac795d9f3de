//! Adjacency analysis over a pinch graph (spec §4.3).

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};

use crate::pinch::ids::{BlockEnd, BlockId, SegmentId, ThreadId};
use crate::pinch::thread::ThreadStore;

/// Direction to step from `seg` to satisfy `end_orientation` on the block
/// `seg` belongs to: `true` means "towards the successor segment".
pub(crate) fn direction_from(store: &ThreadStore, seg: SegmentId, end_orientation: bool) -> bool {
    let o_s = store.segment_orientation(seg).expect("segment has no block");
    end_orientation ^ o_s
}

/// Walks from `seg` in the direction `end_orientation` implies, skipping
/// over unaligned segments, until either a block member or a thread
/// terminator is reached. Returns the block-end reached plus the total
/// length of unaligned segments traversed along the way.
pub(crate) fn walk_to_next_block_end(store: &ThreadStore, seg: SegmentId, end_orientation: bool) -> Option<(BlockEnd, i64)> {
    let go_successor = direction_from(store, seg, end_orientation);
    let mut current = seg;
    let mut gap = 0i64;
    loop {
        let next = if go_successor {
            store.segment_next(current)
        } else {
            store.segment_prev(current)
        };
        let next = next?;
        if store.segment_is_terminator(next) {
            return None;
        }
        match store.segment_block(next) {
            Some(block) => {
                let o_n = store.segment_orientation(next).unwrap();
                // Arriving via `next`'s predecessor link means we entered
                // on its thread-left side.
                let entered_left = go_successor;
                let orientation = if entered_left { o_n } else { !o_n };
                return Some((BlockEnd::new(block, orientation), gap));
            }
            None => {
                gap += store.segment_length(next);
                current = next;
            }
        }
    }
}

/// Partitions every block-end reachable from a thread in `thread_set` so
/// two ends share a component iff a thread path connects them without
/// crossing a block interior. Returns the partition and a block-end to
/// component-index map.
pub fn adjacency_components(
    store: &ThreadStore,
    thread_set: &[ThreadId],
) -> (Vec<Vec<BlockEnd>>, AHashMap<BlockEnd, usize>) {
    let scope: AHashSet<ThreadId> = thread_set.iter().copied().collect();

    let mut candidate_ends = Vec::new();
    for block in store.blocks() {
        let members = store.block_members(block);
        if members.iter().any(|m| scope.contains(&store.segment_thread(*m))) {
            candidate_ends.push(BlockEnd::new(block, false));
            candidate_ends.push(BlockEnd::new(block, true));
        }
    }

    let mut visited: AHashSet<BlockEnd> = AHashSet::new();
    let mut components: Vec<Vec<BlockEnd>> = Vec::new();
    let mut index: AHashMap<BlockEnd, usize> = AHashMap::new();

    for start in candidate_ends {
        if visited.contains(&start) {
            continue;
        }
        let comp_idx = components.len();
        let mut comp = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        visited.insert(start);
        while let Some(end) = queue.pop_front() {
            index.insert(end, comp_idx);
            comp.push(end);
            for member in store.block_members(end.block) {
                if let Some((reached, _gap)) = walk_to_next_block_end(store, member, end.orientation) {
                    if visited.insert(reached) {
                        queue.push_back(reached);
                    }
                }
            }
        }
        components.push(comp);
    }
    (components, index)
}

/// Partitions `thread_set` by the transitive "shares a block with"
/// relation, via union-find over block membership.
pub fn thread_components(store: &ThreadStore, thread_set: &[ThreadId]) -> Vec<Vec<ThreadId>> {
    let mut parent: AHashMap<ThreadId, ThreadId> = thread_set.iter().map(|&t| (t, t)).collect();

    fn find(parent: &mut AHashMap<ThreadId, ThreadId>, t: ThreadId) -> ThreadId {
        let p = parent[&t];
        if p == t {
            t
        } else {
            let root = find(parent, p);
            parent.insert(t, root);
            root
        }
    }

    let scope: AHashSet<ThreadId> = thread_set.iter().copied().collect();
    for block in store.blocks() {
        let members = store.block_members(block);
        let threads: Vec<ThreadId> = members
            .iter()
            .map(|m| store.segment_thread(*m))
            .filter(|t| scope.contains(t))
            .collect();
        for pair in threads.windows(2) {
            let a = find(&mut parent, pair[0]);
            let b = find(&mut parent, pair[1]);
            if a != b {
                parent.insert(a, b);
            }
        }
    }

    let mut groups: AHashMap<ThreadId, Vec<ThreadId>> = AHashMap::new();
    for &t in thread_set {
        let root = find(&mut parent, t);
        groups.entry(root).or_default().push(t);
    }
    groups.into_values().collect()
}

/// Holds iff every member of `end.block` has, in `end`'s direction, an
/// immediate neighbour segment in one common block of equal degree and
/// equal support, with a consistent per-member orientation delta (i.e.
/// the two blocks could be folded into one uniformly).
pub fn end_is_trivial_boundary(store: &ThreadStore, end: BlockEnd) -> bool {
    let members = store.block_members(end.block);
    if members.is_empty() {
        return false;
    }
    let mut other_block: Option<BlockId> = None;
    let mut orientation_delta: Option<bool> = None;

    for m in &members {
        let go_successor = direction_from(store, *m, end.orientation);
        let neighbor = if go_successor {
            store.segment_next(*m)
        } else {
            store.segment_prev(*m)
        };
        let Some(neighbor) = neighbor else { return false };
        if store.segment_is_terminator(neighbor) {
            return false;
        }
        let Some(nb) = store.segment_block(neighbor) else { return false };
        match other_block {
            None => other_block = Some(nb),
            Some(ob) if ob == nb => {}
            Some(_) => return false,
        }
        let o_m = store.segment_orientation(*m).unwrap();
        let o_n = store.segment_orientation(neighbor).unwrap();
        let delta = o_m ^ o_n;
        match orientation_delta {
            None => orientation_delta = Some(delta),
            Some(d) if d == delta => {}
            Some(_) => return false,
        }
    }

    let Some(ob) = other_block else { return false };
    if ob == end.block {
        return false;
    }
    store.block_degree(ob) == store.block_degree(end.block)
        && store.block_support(ob) == store.block_support(end.block)
}

/// True iff, walking from some member of `end.block` in `end`'s
/// direction, another segment of `end.block` is encountered before any
/// segment of `other_block` — i.e. two copies of `end.block` are
/// thread-adjacent with nothing of `other_block` between them.
pub fn end_has_self_loop_wrt(store: &ThreadStore, end: BlockEnd, other_block: BlockId) -> bool {
    for m in store.block_members(end.block) {
        let go_successor = direction_from(store, m, end.orientation);
        let mut current = m;
        loop {
            let next = if go_successor {
                store.segment_next(current)
            } else {
                store.segment_prev(current)
            };
            let Some(next) = next else { break };
            if store.segment_is_terminator(next) {
                break;
            }
            match store.segment_block(next) {
                Some(b) if b == end.block => return true,
                Some(b) if b == other_block => break,
                Some(_) => break,
                None => current = next,
            }
        }
    }
    false
}

/// The gap lengths between consecutive segment pairs `(s in end, s in
/// other_end)` along any thread connecting the two ends, respecting
/// orientation. Reports each physical gap exactly once, even when
/// `end.block == other_end.block`.
pub fn subsequence_lengths_connecting(store: &ThreadStore, end: BlockEnd, other_end: BlockEnd) -> Vec<i64> {
    let mut out = Vec::new();
    for m in store.block_members(end.block) {
        if let Some((reached, gap)) = walk_to_next_block_end(store, m, end.orientation) {
            if reached == other_end {
                out.push(gap);
            }
        }
    }
    out
}
