//! Thread store and segment chain (spec §4.1).
//!
//! A [`ThreadStore`] owns every [`Thread`] and every [`Segment`] in one pair
//! of arenas (see [`crate::arena`]); a thread's segment chain is a doubly
//! linked run of arena indices terminated by a zero-length sentinel. A
//! thread also keeps a `start -> SegmentId` index so [`ThreadStore::get_segment`]
//! runs in `O(log k)` rather than walking the chain.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::error::{Error, Result};
use crate::pinch::ids::{BlockEnd, BlockId, SegmentId, ThreadId};

/// A segment's block membership: which block it belongs to, its
/// orientation relative to that block's canonical frame, and the next
/// segment in the block's intrusive singly-linked member list.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockMembership {
    pub block: BlockId,
    pub orientation: bool,
    pub next_in_block: Option<SegmentId>,
}

#[derive(Debug)]
pub(crate) struct SegmentData {
    pub thread: ThreadId,
    pub start: i64,
    pub prev: Option<SegmentId>,
    pub next: Option<SegmentId>,
    pub is_terminator: bool,
    pub block: Option<BlockMembership>,
}

#[derive(Debug)]
pub(crate) struct ThreadData {
    pub name: i64,
    pub start: i64,
    pub length: i64,
    pub head: SegmentId,
    /// `start -> SegmentId`, kept in sync with the linked list on every
    /// split so coordinate lookups are `O(log k)`.
    pub index: BTreeMap<i64, SegmentId>,
}

#[derive(Debug)]
pub(crate) struct BlockData {
    pub degree: u64,
    pub support: u64,
    pub head: SegmentId,
    pub tail: SegmentId,
}

/// Owns every thread, segment and block in one pinch graph.
#[derive(Debug)]
pub struct ThreadStore {
    pub(crate) threads: crate::arena::Arena<ThreadData>,
    pub(crate) segments: crate::arena::Arena<SegmentData>,
    pub(crate) blocks: crate::arena::Arena<BlockData>,
    name_index: AHashMap<i64, ThreadId>,
}

impl Default for ThreadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadStore {
    pub fn new() -> Self {
        ThreadStore {
            threads: crate::arena::Arena::new(),
            segments: crate::arena::Arena::new(),
            blocks: crate::arena::Arena::new(),
            name_index: AHashMap::new(),
        }
    }

    /// Number of threads currently in the store.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Number of live blocks in the store.
    pub fn total_block_number(&self) -> usize {
        self.blocks.len()
    }

    pub fn threads(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.threads.iter().map(|(i, _)| ThreadId(i))
    }

    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.iter().map(|(i, _)| BlockId(i))
    }

    /// Adds a thread covering `[start, start+length)`, tiled by one
    /// segment plus a zero-length terminator.
    pub fn add_thread(&mut self, name: i64, start: i64, length: i64) -> Result<ThreadId> {
        if self.name_index.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }
        let thread_id = ThreadId(self.threads.len());
        let body = self.segments.insert(SegmentData {
            thread: thread_id,
            start,
            prev: None,
            next: None,
            is_terminator: false,
            block: None,
        });
        let body_id = SegmentId(body);
        let term = self.segments.insert(SegmentData {
            thread: thread_id,
            start: start + length,
            prev: Some(body_id),
            next: None,
            is_terminator: true,
            block: None,
        });
        let term_id = SegmentId(term);
        self.segments.get_mut(body_id.0).unwrap().next = Some(term_id);

        let mut index = BTreeMap::new();
        index.insert(start, body_id);
        index.insert(start + length, term_id);

        let idx = self.threads.insert(ThreadData {
            name,
            start,
            length,
            head: body_id,
            index,
        });
        debug_assert_eq!(idx, thread_id.0);
        self.name_index.insert(name, thread_id);
        Ok(thread_id)
    }

    pub fn get_thread(&self, name: i64) -> Option<ThreadId> {
        self.name_index.get(&name).copied()
    }

    pub fn thread_name(&self, id: ThreadId) -> i64 {
        self.threads.get(id.0).expect("unknown thread id").name
    }

    pub fn thread_start(&self, id: ThreadId) -> i64 {
        self.threads.get(id.0).expect("unknown thread id").start
    }

    pub fn thread_length(&self, id: ThreadId) -> i64 {
        self.threads.get(id.0).expect("unknown thread id").length
    }

    /// The segment whose half-open interval contains `coord`, or `None`
    /// if `coord` is out of range. Runs in `O(log k)` via the thread's
    /// `start` index (testable requirement in spec §4.1).
    pub fn get_segment(&self, name: i64, coord: i64) -> Option<SegmentId> {
        let thread_id = self.get_thread(name)?;
        let thread = self.threads.get(thread_id.0)?;
        if coord < thread.start || coord >= thread.start + thread.length {
            return None;
        }
        let (_, &seg_id) = thread.index.range(..=coord).next_back()?;
        Some(seg_id)
    }

    pub fn segment_thread(&self, id: SegmentId) -> ThreadId {
        self.segments.get(id.0).expect("unknown segment id").thread
    }

    pub fn segment_start(&self, id: SegmentId) -> i64 {
        self.segments.get(id.0).expect("unknown segment id").start
    }

    pub fn segment_is_terminator(&self, id: SegmentId) -> bool {
        self.segments.get(id.0).expect("unknown segment id").is_terminator
    }

    pub fn segment_next(&self, id: SegmentId) -> Option<SegmentId> {
        self.segments.get(id.0).expect("unknown segment id").next
    }

    pub fn segment_prev(&self, id: SegmentId) -> Option<SegmentId> {
        self.segments.get(id.0).expect("unknown segment id").prev
    }

    /// Derived length: distance to the successor segment. Undefined
    /// (returns 0) for the terminator.
    pub fn segment_length(&self, id: SegmentId) -> i64 {
        let seg = self.segments.get(id.0).expect("unknown segment id");
        match seg.next {
            Some(next) => self.segments.get(next.0).unwrap().start - seg.start,
            None => 0,
        }
    }

    pub fn segment_block(&self, id: SegmentId) -> Option<BlockId> {
        self.segments
            .get(id.0)
            .expect("unknown segment id")
            .block
            .map(|m| m.block)
    }

    pub fn segment_orientation(&self, id: SegmentId) -> Option<bool> {
        self.segments
            .get(id.0)
            .expect("unknown segment id")
            .block
            .map(|m| m.orientation)
    }

    pub fn segment_end(&self, id: SegmentId) -> Option<BlockEnd> {
        self.segments.get(id.0).unwrap().block.map(|m| BlockEnd::new(m.block, m.orientation))
    }

    /// First (tiling-order) segment of a thread, i.e. the one covering
    /// `thread.start`. Does not include the terminator.
    pub fn thread_head(&self, id: ThreadId) -> SegmentId {
        self.threads.get(id.0).expect("unknown thread id").head
    }

    /// All non-terminator segments of a thread, in tiling order.
    pub fn thread_segments(&self, id: ThreadId) -> Vec<SegmentId> {
        let mut out = Vec::new();
        let mut cur = Some(self.thread_head(id));
        while let Some(seg_id) = cur {
            let seg = self.segments.get(seg_id.0).unwrap();
            if seg.is_terminator {
                break;
            }
            out.push(seg_id);
            cur = seg.next;
        }
        out
    }

    pub fn block_degree(&self, id: BlockId) -> u64 {
        self.blocks.get(id.0).expect("unknown block id").degree
    }

    pub fn block_support(&self, id: BlockId) -> u64 {
        self.blocks.get(id.0).expect("unknown block id").support
    }

    /// Length of a block: the (shared) length of every member segment.
    pub fn block_length(&self, id: BlockId) -> i64 {
        let head = self.blocks.get(id.0).expect("unknown block id").head;
        self.segment_length(head)
    }

    /// Every member segment of a block, in intrusive-list order.
    pub fn block_members(&self, id: BlockId) -> Vec<SegmentId> {
        let mut out = Vec::new();
        let head = self.blocks.get(id.0).expect("unknown block id").head;
        let mut cur = Some(head);
        while let Some(seg_id) = cur {
            out.push(seg_id);
            cur = self.segments.get(seg_id.0).unwrap().block.and_then(|m| m.next_in_block);
        }
        out
    }

    /// Splits `segment` so that `left_end_inclusive` becomes the last
    /// position of the (possibly new) left fragment. No-op if
    /// `left_end_inclusive` is already the segment's last position.
    /// Returns the id of the new right-hand fragment containing the
    /// original segment's old successor data, if a split happened.
    pub fn split(&mut self, segment: SegmentId, left_end_inclusive: i64) -> Result<Option<SegmentId>> {
        let seg = self.segments.get(segment.0).ok_or_else(|| {
            Error::InvariantViolation(format!("unknown segment id in split: {:?}", segment))
        })?;
        if seg.is_terminator {
            return Err(Error::InvariantViolation("cannot split the terminator".into()));
        }
        let seg_start = seg.start;
        let seg_len = self.segment_length(segment);
        let seg_last = seg_start + seg_len - 1;
        if left_end_inclusive >= seg_last {
            return Ok(None);
        }
        if left_end_inclusive < seg_start {
            return Err(Error::InvariantViolation(
                "split position precedes segment start".into(),
            ));
        }

        let membership = self.segments.get(segment.0).unwrap().block;
        match membership {
            None => {
                let new_id = self.splice_after(segment, left_end_inclusive + 1);
                Ok(Some(new_id))
            }
            Some(bm) => {
                let block_len = self.block_length(bm.block);
                // `o` = length (in bases) of the *left* fragment as measured
                // in the split segment's own orientation frame (spec §4.1:
                // "mirrored offset ... o for positive, length(B) - o for
                // negative").
                let kept = left_end_inclusive - seg_start + 1;
                let o = if bm.orientation { block_len - kept } else { kept };

                let members = self.block_members(bm.block);
                let support = self.blocks.get(bm.block.0).unwrap().support;
                let new_block_id = BlockId(self.blocks.insert(BlockData {
                    degree: 0,
                    support,
                    head: segment, // placeholder, fixed below
                    tail: segment,
                }));

                let mut new_block_members = Vec::with_capacity(members.len());
                for member in members {
                    let m_bm = self.segments.get(member.0).unwrap().block.unwrap();
                    let member_kept = if m_bm.orientation { block_len - o } else { o };
                    let member_start = self.segments.get(member.0).unwrap().start;
                    let member_left_end_inclusive = member_start + member_kept - 1;
                    let new_member = self.splice_after(member, member_left_end_inclusive + 1);
                    // The continuation fragment inherits this member's
                    // orientation and joins the new block.
                    new_block_members.push((new_member, m_bm.orientation));
                }

                // Rebuild the new block's intrusive list in visitation
                // order and fix the old block's degree/head/tail (the old
                // block keeps its original members, now shortened).
                self.link_block_members(new_block_id, &new_block_members);

                let new_degree = new_block_members.len() as u64;
                {
                    let nb = self.blocks.get_mut(new_block_id.0).unwrap();
                    nb.degree = new_degree;
                }

                let returned = new_block_members
                    .iter()
                    .find(|(m, _)| self.segments.get(m.0).unwrap().prev == Some(segment))
                    .map(|(m, _)| *m);
                Ok(returned.or_else(|| new_block_members.first().map(|(m, _)| *m)))
            }
        }
    }

    /// Wires up a freshly created block's intrusive member list and
    /// assigns each member's `BlockMembership`.
    fn link_block_members(&mut self, block: BlockId, members: &[(SegmentId, bool)]) {
        for (i, (seg_id, orientation)) in members.iter().enumerate() {
            let next_in_block = members.get(i + 1).map(|(s, _)| *s);
            self.segments.get_mut(seg_id.0).unwrap().block = Some(BlockMembership {
                block,
                orientation: *orientation,
                next_in_block,
            });
        }
        if let Some((head, _)) = members.first() {
            let tail = members.last().unwrap().0;
            let b = self.blocks.get_mut(block.0).unwrap();
            b.head = *head;
            b.tail = tail;
        }
    }

    /// Inserts a fresh segment directly after `after`, starting at
    /// `new_start`, carrying `after`'s old successor linkage. Returns the
    /// new segment's id. Does not touch block membership.
    fn splice_after(&mut self, after: SegmentId, new_start: i64) -> SegmentId {
        let (thread, old_next) = {
            let s = self.segments.get(after.0).unwrap();
            (s.thread, s.next)
        };
        let new_id = SegmentId(self.segments.insert(SegmentData {
            thread,
            start: new_start,
            prev: Some(after),
            next: old_next,
            is_terminator: false,
            block: None,
        }));
        if let Some(next) = old_next {
            self.segments.get_mut(next.0).unwrap().prev = Some(new_id);
        }
        self.segments.get_mut(after.0).unwrap().next = Some(new_id);
        self.threads
            .get_mut(thread.0)
            .unwrap()
            .index
            .insert(new_start, new_id);
        new_id
    }

    /// Merges two adjacent segments into one, removing `right`. Used by
    /// `join_trivial_boundaries` and by block/segment garbage collection.
    /// The merged segment keeps `left`'s identity and block membership.
    pub(crate) fn merge_adjacent(&mut self, left: SegmentId, right: SegmentId) {
        let (thread, new_next) = {
            let r = self.segments.get(right.0).unwrap();
            (r.thread, r.next)
        };
        if let Some(next) = new_next {
            self.segments.get_mut(next.0).unwrap().prev = Some(left);
        }
        self.segments.get_mut(left.0).unwrap().next = new_next;
        let right_start = self.segments.get(right.0).unwrap().start;
        self.threads.get_mut(thread.0).unwrap().index.remove(&right_start);
        self.segments.remove(right.0);
    }

    /// Removes a block entirely, detaching all of its member segments
    /// back to unaligned. Used when a degree-1 block is garbage
    /// collected after undo.
    pub(crate) fn dissolve_block(&mut self, block: BlockId) {
        let members = self.block_members(block);
        for m in members {
            self.segments.get_mut(m.0).unwrap().block = None;
        }
        self.blocks.remove(block.0);
    }

    /// Returns `segment`'s block, bootstrapping a fresh degree-1 block
    /// (orientation `false`) if it is currently unaligned.
    pub(crate) fn ensure_block(&mut self, segment: SegmentId) -> BlockId {
        if let Some(bm) = self.segments.get(segment.0).unwrap().block {
            return bm.block;
        }
        let block = BlockId(self.blocks.insert(BlockData {
            degree: 1,
            support: 0,
            head: segment,
            tail: segment,
        }));
        self.segments.get_mut(segment.0).unwrap().block = Some(BlockMembership {
            block,
            orientation: false,
            next_in_block: None,
        });
        block
    }

    /// Merges `other`'s members into `keep`, XOR-ing each member's
    /// orientation bit by `translate`, and sets `keep`'s support to
    /// `new_support`. `other` is destroyed.
    pub(crate) fn merge_blocks(&mut self, keep: BlockId, other: BlockId, translate: bool, new_support: u64) {
        if keep == other {
            self.blocks.get_mut(keep.0).unwrap().support = new_support;
            return;
        }
        let other_members = self.block_members(other);
        let keep_tail = self.blocks.get(keep.0).unwrap().tail;
        self.segments.get_mut(keep_tail.0).unwrap().block.as_mut().unwrap().next_in_block =
            Some(other_members[0]);

        for (i, seg_id) in other_members.iter().enumerate() {
            let old_orientation = self.segments.get(seg_id.0).unwrap().block.unwrap().orientation;
            let next_in_block = if i + 1 < other_members.len() {
                Some(other_members[i + 1])
            } else {
                None
            };
            self.segments.get_mut(seg_id.0).unwrap().block = Some(BlockMembership {
                block: keep,
                orientation: old_orientation ^ translate,
                next_in_block,
            });
        }

        let other_degree = self.blocks.get(other.0).unwrap().degree;
        let other_tail = self.blocks.get(other.0).unwrap().tail;
        let keep_block = self.blocks.get_mut(keep.0).unwrap();
        keep_block.degree += other_degree;
        keep_block.tail = other_tail;
        keep_block.support = new_support;

        self.blocks.remove(other.0);
    }

    /// Removes a block record whose every member segment has already been
    /// merged away by [`merge_adjacent`]. Used by `join_pair` once it has
    /// folded a whole block's members into another block one segment at
    /// a time, leaving the original block id pointing at nothing.
    pub(crate) fn remove_empty_block(&mut self, block: BlockId) {
        self.blocks.remove(block.0);
    }

    pub fn set_block_support(&mut self, block: BlockId, support: u64) {
        self.blocks.get_mut(block.0).expect("unknown block id").support = support;
    }

    /// `(thread name, start, end)` of a segment, used by pinch-undo
    /// snapshots to name a segment independent of its arena index.
    pub fn segment_reference(&self, id: SegmentId) -> (i64, i64, i64) {
        let seg = self.segments.get(id.0).expect("unknown segment id");
        let name = self.thread_name(seg.thread);
        let len = self.segment_length(id);
        (name, seg.start, seg.start + len)
    }

    /// Pulls a contiguous (in intrusive-list order) run of `degree`
    /// members out of `current`, starting at `start`, into a fresh block
    /// with support `extracted_support`. The remaining members of
    /// `current` keep their block id with `support` reduced by
    /// `extracted_support + 1` (or the block is removed entirely if
    /// nothing remains). Used by pinch-undo to peel a pre-pinch block back
    /// out of a block it was later merged into.
    pub(crate) fn extract_sub_block(
        &mut self,
        current: BlockId,
        start: SegmentId,
        degree: u64,
        extracted_support: u64,
    ) -> Result<BlockId> {
        let members = self.block_members(current);
        let idx = members
            .iter()
            .position(|&s| s == start)
            .ok_or_else(|| Error::InvariantViolation("undo reference segment not found in block".into()))?;
        let degree = degree as usize;
        if idx + degree > members.len() {
            return Err(Error::InvariantViolation(
                "undo snapshot degree exceeds current block size".into(),
            ));
        }
        let extracted: Vec<SegmentId> = members[idx..idx + degree].to_vec();
        let mut remainder: Vec<SegmentId> = Vec::with_capacity(members.len() - degree);
        remainder.extend_from_slice(&members[..idx]);
        remainder.extend_from_slice(&members[idx + degree..]);

        let current_support = self.block_support(current);
        let new_block = BlockId(self.blocks.insert(BlockData {
            degree: degree as u64,
            support: extracted_support,
            head: extracted[0],
            tail: *extracted.last().unwrap(),
        }));
        let extracted_with_orient: Vec<(SegmentId, bool)> = extracted
            .iter()
            .map(|&s| (s, self.segment_orientation(s).unwrap()))
            .collect();
        self.link_block_members(new_block, &extracted_with_orient);

        if remainder.is_empty() {
            self.blocks.remove(current.0);
        } else {
            let remainder_with_orient: Vec<(SegmentId, bool)> = remainder
                .iter()
                .map(|&s| (s, self.segment_orientation(s).unwrap()))
                .collect();
            self.link_block_members(current, &remainder_with_orient);
            let b = self.blocks.get_mut(current.0).unwrap();
            b.degree = remainder.len() as u64;
            b.support = current_support.saturating_sub(extracted_support + 1);
        }
        Ok(new_block)
    }
}
