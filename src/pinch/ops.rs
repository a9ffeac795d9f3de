//! Pinch operations: split, pinch, pinch_range, filter_pinch,
//! join_trivial_boundaries (spec §4.1, §4.2).

use tracing::debug;

use crate::error::{Error, Result};
use crate::pinch::ids::SegmentId;
use crate::pinch::thread::ThreadStore;

/// Asserts that `seg1` and `seg2` are homologous, aligned according to
/// `orientation` (`true` = same strand, `false` = reverse). Fails if the
/// two segments have different lengths.
pub fn pinch(store: &mut ThreadStore, seg1: SegmentId, seg2: SegmentId, orientation: bool) -> Result<()> {
    pinch_with_count(store, seg1, seg2, orientation, 1)
}

/// Same as [`pinch`], but the homology being asserted stands in for
/// `count` individual base-pair homologies (used by [`filter_pinch`] when a
/// whole aligned run collapses into a single equal-length segment pair), so
/// support grows by `count` rather than by a flat one.
fn pinch_with_count(
    store: &mut ThreadStore,
    seg1: SegmentId,
    seg2: SegmentId,
    orientation: bool,
    count: u64,
) -> Result<()> {
    let len1 = store.segment_length(seg1);
    let len2 = store.segment_length(seg2);
    if len1 != len2 {
        return Err(Error::LengthMismatch { len1, len2 });
    }

    let b1 = store.ensure_block(seg1);
    let b2 = store.ensure_block(seg2);

    if b1 == b2 {
        let support = store.block_support(b1);
        store.merge_blocks(b1, b1, false, support + count);
        return Ok(());
    }

    let o1 = store.segment_orientation(seg1).unwrap();
    let o2 = store.segment_orientation(seg2).unwrap();
    let translate = orientation ^ o1 ^ o2;

    let (keep, other) = if store.block_degree(b1) >= store.block_degree(b2) {
        (b1, b2)
    } else {
        (b2, b1)
    };
    let new_support = store.block_support(b1) + store.block_support(b2) + count;
    debug!(?keep, ?other, new_support, "merging pinch blocks");
    store.merge_blocks(keep, other, translate, new_support);
    Ok(())
}

/// Splits both thread regions into aligned, equal-length, non-overlapping
/// segment runs and pinches each corresponding pair. `length == 0` is a
/// no-op. Fails with `OutOfRange` if either region falls outside its
/// thread.
pub fn pinch_range(
    store: &mut ThreadStore,
    name1: i64,
    name2: i64,
    start1: i64,
    start2: i64,
    length: i64,
    strand: bool,
) -> Result<()> {
    filter_pinch(store, name1, name2, start1, start2, length, strand, |_, _| false)
}

/// Same as [`pinch_range`] but skips any segment pair for which
/// `filter(seg1, seg2)` returns `true`. The segmentation boundaries are
/// produced regardless, so the result is always a strict refinement of
/// the unfiltered segmentation.
pub fn filter_pinch(
    store: &mut ThreadStore,
    name1: i64,
    name2: i64,
    start1: i64,
    start2: i64,
    length: i64,
    strand: bool,
    mut filter: impl FnMut(SegmentId, SegmentId) -> bool,
) -> Result<()> {
    if length == 0 {
        return Ok(());
    }
    check_range(store, name1, start1, length)?;
    check_range(store, name2, start2, length)?;

    // Walk both regions in lock-step, splitting at every boundary either
    // side requires so both sides produce aligned equal-length runs. By
    // induction, at the top of each iteration `seg1` already starts at
    // `pos1` and (for strand) `seg2` already starts at `pos2`; the only
    // place that invariant needs establishing by hand is the very first
    // iteration and the reverse-strand left boundary.
    let mut offset = 0i64;
    while offset < length {
        let pos1 = start1 + offset;
        let pos2 = if strand {
            start2 + offset
        } else {
            start2 + length - 1 - offset
        };

        let seg1 = store.get_segment(name1, pos1).unwrap();
        let seg2 = store.get_segment(name2, pos2).unwrap();

        let remaining = length - offset;
        let avail1 = store.segment_start(seg1) + store.segment_length(seg1) - pos1;
        let avail2 = if strand {
            store.segment_start(seg2) + store.segment_length(seg2) - pos2
        } else {
            pos2 - store.segment_start(seg2) + 1
        };
        let run = remaining.min(avail1).min(avail2);

        store.split(seg1, pos1 + run - 1)?;
        let a = seg1;

        let b = if strand {
            store.split(seg2, pos2 + run - 1)?;
            seg2
        } else {
            // Cap the right edge at pos2, then carve the left boundary at
            // pos2 - run, which yields exactly [pos2-run+1, pos2].
            store.split(seg2, pos2)?;
            store.split(seg2, pos2 - run)?.unwrap_or(seg2)
        };

        if !filter(a, b) {
            let self_pinch = store.segment_block(a).is_some()
                && store.segment_block(a) == store.segment_block(b);
            if self_pinch {
                if let Some((ba, bb)) = bisect_self_overlap(store, a, b, pos2, strand)? {
                    pinch_with_count(store, ba, bb, strand, 1)?;
                    offset += 1;
                    continue;
                }
            }
            pinch_with_count(store, a, b, strand, run as u64)?;
        }

        offset += run;
    }
    Ok(())
}

/// When a pinch would merge a block with itself in conflicting
/// orientation (the two halves of a self-overlapping region land in the
/// same block), bisect down to the single base pair at `pos1`/`pos2` (`a`
/// already starts at `pos1`; `b` spans `[pos2-run+1, pos2]` under reverse
/// orientation, so its last base is the one that pairs with `a`'s first)
/// and return that pair so the caller pinches only it, leaving the rest
/// of the run for the next loop iteration to re-examine from scratch
/// (spec §4.2). Returns `None` if there is no conflict, so the caller
/// proceeds with the full `run`-length pair as usual.
fn bisect_self_overlap(
    store: &mut ThreadStore,
    a: SegmentId,
    b: SegmentId,
    pos2: i64,
    strand: bool,
) -> Result<Option<(SegmentId, SegmentId)>> {
    if strand {
        return Ok(None);
    }
    let oa = store.segment_orientation(a);
    let ob = store.segment_orientation(b);
    if oa.is_none() || oa != ob {
        return Ok(None);
    }
    let len_a = store.segment_length(a);
    let len_b = store.segment_length(b);
    if len_a == 1 && len_b == 1 {
        return Ok(None);
    }
    if len_a > 1 {
        let start = store.segment_start(a);
        store.split(a, start)?;
    }
    let b = if len_b > 1 { store.split(b, pos2 - 1)?.unwrap_or(b) } else { b };
    Ok(Some((a, b)))
}

fn check_range(store: &ThreadStore, name: i64, start: i64, length: i64) -> Result<()> {
    let thread = store.get_thread(name).ok_or(Error::UnknownThread(name))?;
    let t_start = store.thread_start(thread);
    let t_len = store.thread_length(thread);
    if start < t_start || start + length > t_start + t_len {
        return Err(Error::OutOfRange {
            name,
            coord: start,
            start: t_start,
            end: t_start + t_len,
        });
    }
    Ok(())
}

/// Collapses neighbouring segments whose block states permit it: two
/// adjacent unaligned segments always merge; two adjacent aligned
/// segments merge only if [`crate::pinch::adjacency::end_is_trivial_boundary`]
/// holds for the shared boundary. Always terminates (each merge strictly
/// reduces the segment count).
pub fn join_trivial_boundaries(store: &mut ThreadStore) {
    let mut changed = true;
    while changed {
        changed = false;
        for thread in store.threads().collect::<Vec<_>>() {
            let segs = store.thread_segments(thread);
            for window in segs.windows(2) {
                let (left, right) = (window[0], window[1]);
                if store.segment_prev(right) != Some(left) {
                    continue; // already merged away this round
                }
                let can_join = match (store.segment_block(left), store.segment_block(right)) {
                    (None, None) => true,
                    (Some(_), Some(_)) => {
                        let end = store.segment_end(left).unwrap();
                        crate::pinch::adjacency::end_is_trivial_boundary(store, end)
                    }
                    _ => false,
                };
                if can_join {
                    join_pair(store, left, right);
                    changed = true;
                }
            }
        }
    }
}

/// Merges `right` into `left`, dissolving `right`'s block (if any) into
/// `left`'s and splicing the segment lists together.
fn join_pair(store: &mut ThreadStore, left: SegmentId, right: SegmentId) {
    match (store.segment_block(left), store.segment_block(right)) {
        (None, None) => {
            store.merge_adjacent(left, right);
        }
        (Some(bl), Some(br)) if bl == br => {
            store.merge_adjacent(left, right);
        }
        (Some(bl), Some(br)) => {
            // Equal-degree, equal-support blocks with a consistent member
            // mapping (guaranteed by `end_is_trivial_boundary`): every
            // member of `br` is thread-adjacent to exactly one member of
            // `bl`, so merging each such pair collapses `br` into `bl`
            // one segment at a time; the last merge removes `br` itself.
            let left_members = store.block_members(bl);
            let right_members = store.block_members(br);
            for (l, r) in left_members.iter().zip(right_members.iter()) {
                let (a, b) = thread_order(store, *l, *r);
                store.merge_adjacent(a, b);
            }
            store.remove_empty_block(br);
        }
        _ => unreachable!("join_pair called on a non-joinable pair"),
    }
}

fn thread_order(store: &ThreadStore, a: SegmentId, b: SegmentId) -> (SegmentId, SegmentId) {
    if store.segment_next(a) == Some(b) {
        (a, b)
    } else {
        (b, a)
    }
}
