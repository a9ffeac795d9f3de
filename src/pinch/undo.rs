//! Pinch undo: snapshot/restore of block state over a pinch region (spec
//! §4.4).
//!
//! Undos must be applied in LIFO order against their originating pinch,
//! with no intervening mutation overlapping the snapshotted region — a
//! violation is undefined behaviour by contract (spec §7); this module
//! detects the cases it reasonably can (a missing reference segment, a
//! block smaller than its own snapshot) and reports `UndoInvalidated`
//! rather than silently corrupting state, but cannot catch every case.

use ahash::AHashSet;

use crate::error::{Error, Result};
use crate::pinch::thread::ThreadStore;

/// One pre-pinch segment's state, keyed by its own `(thread, start, end)`
/// interval so a later restore can locate whichever current segment
/// (possibly narrower, if the pinch or a partial undo split it further)
/// falls inside that interval.
#[derive(Debug, Clone)]
struct SegmentSnapshot {
    ref_name: i64,
    ref_start: i64,
    ref_end: i64,
    degree: u64,
    support: u64,
}

/// A snapshot taken by [`prepare_undo`] before applying a pinch over a
/// region, sufficient to restore that region's block structure, in full
/// or over any sub-range.
#[derive(Debug, Clone)]
pub struct PinchUndo {
    name1: i64,
    name2: i64,
    start1: i64,
    start2: i64,
    length: i64,
    strand: bool,
    snapshots: Vec<SegmentSnapshot>,
}

/// Snapshots, for every segment currently overlapping
/// `[start1, start1+length)` on `name1` and `[start2, start2+length)` on
/// `name2`, its degree/support so a later [`undo`] can restore it.
pub fn prepare_undo(
    store: &ThreadStore,
    name1: i64,
    name2: i64,
    start1: i64,
    start2: i64,
    length: i64,
    strand: bool,
) -> Result<PinchUndo> {
    let mut snapshots = Vec::new();
    let mut seen: AHashSet<(i64, i64)> = AHashSet::new();
    for (name, start) in [(name1, start1), (name2, start2)] {
        let end = start + length;
        let mut pos = start;
        while pos < end {
            let seg = store
                .get_segment(name, pos)
                .ok_or(Error::OutOfRange { name, coord: pos, start, end })?;
            let (ref_name, ref_start, ref_end) = store.segment_reference(seg);
            if seen.insert((ref_name, ref_start)) {
                let (degree, support) = match store.segment_block(seg) {
                    Some(b) => (store.block_degree(b), store.block_support(b)),
                    None => (0, 0),
                };
                snapshots.push(SegmentSnapshot {
                    ref_name,
                    ref_start,
                    ref_end,
                    degree,
                    support,
                });
            }
            pos = ref_end;
        }
    }
    snapshots.sort_by_key(|s| (s.ref_name, s.ref_start));
    Ok(PinchUndo { name1, name2, start1, start2, length, strand, snapshots })
}

/// Restores the block structure snapshotted by `prepare_undo` across its
/// whole region. May leave extra trivial boundaries; callers can follow up
/// with [`crate::pinch::ops::join_trivial_boundaries`].
pub fn undo(store: &mut ThreadStore, u: &PinchUndo) -> Result<()> {
    restore_range(store, u, u.name1, u.start1, u.start1 + u.length)?;
    restore_range(store, u, u.name2, u.start2, u.start2 + u.length)?;
    Ok(())
}

/// Restores only the sub-range `[offset, offset+len)` of the original
/// pinch region (in thread1 base coordinates relative to `start1`), per
/// spec §4.4's partial-undo contract: "remove the new pinch in this
/// range", not a masked re-pinch. The corresponding window on thread2 is
/// derived from `strand`.
pub fn undo_partial(store: &mut ThreadStore, u: &PinchUndo, offset: usize, len: usize) -> Result<()> {
    let offset = offset as i64;
    let len = len as i64;
    if offset < 0 || len < 0 || offset + len > u.length {
        return Err(Error::UndoInvalidated("partial undo window exceeds the original pinch region".into()));
    }
    restore_range(store, u, u.name1, u.start1 + offset, u.start1 + offset + len)?;
    let (w2_start, w2_end) = if u.strand {
        (u.start2 + offset, u.start2 + offset + len)
    } else {
        (u.start2 + u.length - offset - len, u.start2 + u.length - offset)
    };
    restore_range(store, u, u.name2, w2_start, w2_end)?;
    Ok(())
}

/// Scans `u`'s snapshots for the first entry covering `block`'s members
/// whose current block degree differs from its snapshot degree; returns
/// the `(offset, length)` window (thread1-relative) bracketing that
/// entry, suitable for [`undo_partial`].
pub fn find_offset_for_block(
    store: &ThreadStore,
    u: &PinchUndo,
    block: crate::pinch::ids::BlockId,
) -> Option<(usize, usize)> {
    let members: AHashSet<_> = store.block_members(block).into_iter().collect();
    for s in &u.snapshots {
        if s.ref_name != u.name1 {
            continue;
        }
        if let Some(seg) = store.get_segment(s.ref_name, s.ref_start) {
            if members.contains(&seg) {
                if let Some(b) = store.segment_block(seg) {
                    if store.block_degree(b) != s.degree {
                        let offset = (s.ref_start - u.start1).max(0) as usize;
                        let len = (s.ref_end - s.ref_start) as usize;
                        return Some((offset, len));
                    }
                }
            }
        }
    }
    None
}

/// Restores every segment tiling `[start, end)` on thread `name`,
/// splitting at the window boundaries first so the window is an exact run
/// of segments, then restoring each against whichever snapshot entry's
/// reference interval contains it.
fn restore_range(store: &mut ThreadStore, u: &PinchUndo, name: i64, start: i64, end: i64) -> Result<()> {
    if start >= end {
        return Ok(());
    }

    let first = store
        .get_segment(name, start)
        .ok_or_else(|| Error::UndoInvalidated(format!("no segment at ({name}, {start}) to restore")))?;
    if store.segment_start(first) != start {
        store.split(first, start - 1)?;
    }

    let last = store
        .get_segment(name, end - 1)
        .ok_or_else(|| Error::UndoInvalidated(format!("no segment at ({name}, {}) to restore", end - 1)))?;
    store.split(last, end - 1)?;

    let mut pos = start;
    while pos < end {
        let seg = store
            .get_segment(name, pos)
            .ok_or_else(|| Error::UndoInvalidated(format!("no segment at ({name}, {pos}) to restore")))?;
        let seg_len = store.segment_length(seg);
        let entry = u
            .snapshots
            .iter()
            .find(|s| s.ref_name == name && s.ref_start <= pos && pos < s.ref_end)
            .ok_or_else(|| Error::UndoInvalidated(format!("no snapshot entry covers ({name}, {pos})")))?;
        restore_one(store, seg, entry.degree, entry.support)?;
        pos += seg_len;
    }
    Ok(())
}

fn restore_one(store: &mut ThreadStore, seg: crate::pinch::ids::SegmentId, degree: u64, support: u64) -> Result<()> {
    match store.segment_block(seg) {
        None => {
            if degree != 0 {
                return Err(Error::UndoInvalidated(
                    "snapshot expected an aligned segment but found none".into(),
                ));
            }
            Ok(())
        }
        Some(current_block) => {
            let current_degree = store.block_degree(current_block);
            use std::cmp::Ordering;
            match current_degree.cmp(&degree) {
                Ordering::Equal => {
                    store.set_block_support(current_block, support);
                    Ok(())
                }
                Ordering::Greater if degree == 0 => {
                    // The snapshot predates any block at all: peel `seg`
                    // back out on its own (a degree-1 extraction) and
                    // dissolve that singleton, restoring it to unaligned.
                    let singleton = store.extract_sub_block(current_block, seg, 1, 0)?;
                    store.dissolve_block(singleton);
                    Ok(())
                }
                Ordering::Greater => {
                    store.extract_sub_block(current_block, seg, degree, support)?;
                    Ok(())
                }
                Ordering::Less => {
                    let thread = store.segment_thread(seg);
                    Err(Error::UndoInvalidated(format!(
                        "block containing ({}, {}) shrank below its snapshot degree",
                        store.thread_name(thread),
                        store.segment_start(seg),
                    )))
                }
            }
        }
    }
}
