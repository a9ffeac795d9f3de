//! Read-only feature extraction over a pinch graph (spec §6), grounded in
//! `stPinchPhylogeny.h`/`.c`'s contextual-block machinery. Nothing in this
//! module mutates a [`ThreadStore`]; phylogeny inference itself stays
//! external (spec §1).

use ahash::AHashSet;

use crate::pinch::adjacency::walk_to_next_block_end;
use crate::pinch::{BlockEnd, BlockId, ThreadStore};

/// Limits on how far context gathering reaches from a reference block.
#[derive(Debug, Clone, Copy)]
pub struct FeatureParams {
    pub max_base_distance: i64,
    pub max_block_distance: usize,
}

/// Independent limits for the two sides of a breakpoint window.
#[derive(Debug, Clone, Copy)]
pub struct BreakpointParams {
    pub left: FeatureParams,
    pub right: FeatureParams,
}

/// One thread's passage through a [`FeatureBlock`]'s reference block.
#[derive(Debug, Clone)]
pub struct FeatureSegment {
    pub thread_name: i64,
    pub start: i64,
    pub length: i64,
    pub reverse_complement: bool,
    pub left_end: Option<BlockEnd>,
    pub right_end: Option<BlockEnd>,
    pub distance_from_midpoint: i64,
    pub reference_index: usize,
}

/// One base offset across every [`FeatureSegment`] of a [`FeatureBlock`].
#[derive(Debug, Clone)]
pub struct FeatureColumn {
    bases: Vec<Option<char>>,
}

impl FeatureColumn {
    /// `true` if any segment is missing a base at this column (boundary
    /// overrun or a non-ACGT symbol).
    pub fn is_wildcard(&self) -> bool {
        self.bases.iter().any(Option::is_none)
    }

    /// `Some(base)` iff every non-wildcard segment agrees on this column's
    /// base; `None` on disagreement or if every segment is a wildcard.
    pub fn identity(&self) -> Option<char> {
        let mut present = self.bases.iter().flatten();
        let first = *present.next()?;
        present.all(|&b| b == first).then_some(first)
    }

    pub fn bases(&self) -> &[Option<char>] {
        &self.bases
    }
}

/// A window of blocks within a base- and block-distance limit of a
/// reference block (spec §6). `segments`/`columns` describe only the
/// reference block itself; `context_blocks` lists the nearby blocks
/// gathered within `FeatureParams`, for callers that want to recurse into
/// them with a further extraction call.
#[derive(Debug, Clone)]
pub struct FeatureBlock {
    pub reference: BlockId,
    pub segments: Vec<FeatureSegment>,
    pub columns: Vec<FeatureColumn>,
    pub context_blocks: Vec<BlockId>,
}

fn is_acgt(b: char) -> bool {
    matches!(b.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T')
}

fn complement(b: char) -> char {
    match b.to_ascii_uppercase() {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        other => other,
    }
}

fn base_at(store: &ThreadStore, seq_map: &dyn Fn(i64) -> Option<&str>, thread_name: i64, coord: i64) -> Option<char> {
    let thread = store.get_thread(thread_name)?;
    let seq = seq_map(thread_name)?;
    let offset = (coord - store.thread_start(thread)) as usize;
    seq.as_bytes().get(offset).map(|&b| b as char)
}

/// SNP context around one reference block: one [`FeatureSegment`] per
/// member segment, one [`FeatureColumn`] per base of the block.
pub fn substitution_features(
    store: &ThreadStore,
    reference: BlockId,
    params: &FeatureParams,
    seq_map: &dyn Fn(i64) -> Option<&str>,
) -> FeatureBlock {
    let members = store.block_members(reference);
    let block_len = store.block_length(reference);

    let mut segments = Vec::with_capacity(members.len());
    for (i, &seg) in members.iter().enumerate() {
        let thread = store.segment_thread(seg);
        let orientation = store.segment_orientation(seg).unwrap_or(false);
        segments.push(FeatureSegment {
            thread_name: store.thread_name(thread),
            start: store.segment_start(seg),
            length: store.segment_length(seg),
            reverse_complement: orientation,
            left_end: walk_to_next_block_end(store, seg, false).map(|(e, _)| e),
            right_end: walk_to_next_block_end(store, seg, true).map(|(e, _)| e),
            distance_from_midpoint: 0,
            reference_index: i,
        });
    }

    let mut columns = Vec::with_capacity(block_len.max(0) as usize);
    for offset in 0..block_len {
        let mut bases = Vec::with_capacity(segments.len());
        for (seg_feat, &seg_id) in segments.iter().zip(members.iter()) {
            let seg_offset = if seg_feat.reverse_complement { block_len - 1 - offset } else { offset };
            let coord = store.segment_start(seg_id) + seg_offset;
            let base = base_at(store, seq_map, seg_feat.thread_name, coord)
                .map(|b| if seg_feat.reverse_complement { complement(b) } else { b })
                .filter(|&b| is_acgt(b));
            bases.push(base);
        }
        columns.push(FeatureColumn { bases });
    }

    FeatureBlock {
        reference,
        segments,
        columns,
        context_blocks: gather_context_blocks(store, reference, params),
    }
}

/// Breakpoint context around each block of an adjacency chain: one
/// [`FeatureBlock`] per block, with asymmetric context gathered to the
/// left and right per `params`.
pub fn breakpoint_features(
    store: &ThreadStore,
    chain: &[BlockId],
    params: &BreakpointParams,
    seq_map: &dyn Fn(i64) -> Option<&str>,
) -> Vec<FeatureBlock> {
    chain
        .iter()
        .map(|&block| {
            let mut fb = substitution_features(store, block, &params.left, seq_map);
            let mut right = gather_context_blocks(store, block, &params.right);
            fb.context_blocks.append(&mut right);
            fb
        })
        .collect()
}

fn gather_context_blocks(store: &ThreadStore, reference: BlockId, params: &FeatureParams) -> Vec<BlockId> {
    use std::collections::VecDeque;

    let mut seen: AHashSet<BlockId> = AHashSet::new();
    seen.insert(reference);
    let mut out = Vec::new();
    let mut frontier: VecDeque<(BlockId, usize, i64)> = VecDeque::new();
    frontier.push_back((reference, 0, 0));

    while let Some((block, hops, dist)) = frontier.pop_front() {
        if hops >= params.max_block_distance {
            continue;
        }
        for end_orientation in [false, true] {
            for member in store.block_members(block) {
                if let Some((end, gap)) = walk_to_next_block_end(store, member, end_orientation) {
                    let new_dist = dist + gap + store.block_length(block);
                    if new_dist > params.max_base_distance {
                        continue;
                    }
                    if seen.insert(end.block) {
                        out.push(end.block);
                        frontier.push_back((end.block, hops + 1, new_dist));
                    }
                }
            }
        }
    }
    out
}
