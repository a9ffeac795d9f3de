use pinch_cactus::pinch::{join_trivial_boundaries, prepare_undo, undo, undo_partial, pinch_range, ThreadStore};

/// Installs a `tracing` subscriber driven by `RUST_LOG` so the `debug!`
/// logging in `pinch::ops` is visible when chasing down a failure in the
/// fuzz test below (`cargo test -- --nocapture` with `RUST_LOG=debug`).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Scenario A: a single forward pinch carves three segments/blocks on
/// each side, with the aligned middle block's support tracking one
/// homology per aligned base, not one per call.
#[test]
fn scenario_a_single_forward_pinch() {
    let mut store = ThreadStore::new();
    store.add_thread(1, 1, 1_000_000).unwrap();
    store.add_thread(2, 4, 10).unwrap();

    pinch_range(&mut store, 1, 2, 5, 5, 8, true).unwrap();

    let t1 = store.get_thread(1).unwrap();
    let segs1 = store.thread_segments(t1);
    assert_eq!(segs1.len(), 3);
    let lengths1: Vec<i64> = segs1.iter().map(|&s| store.segment_length(s)).collect();
    assert_eq!(lengths1[0], 4);
    assert_eq!(lengths1[1], 8);
    assert_eq!(lengths1[2], 1_000_000 - 12);

    let t2 = store.get_thread(2).unwrap();
    let segs2 = store.thread_segments(t2);
    assert_eq!(segs2.len(), 3);
    let lengths2: Vec<i64> = segs2.iter().map(|&s| store.segment_length(s)).collect();
    assert_eq!(lengths2, vec![1, 8, 1]);

    let middle1 = segs1[1];
    let middle2 = segs2[1];
    let b1 = store.segment_block(middle1).unwrap();
    let b2 = store.segment_block(middle2).unwrap();
    assert_eq!(b1, b2);
    assert_eq!(store.block_degree(b1), 2);
    assert_eq!(store.block_support(b1), 8);

    assert!(store.segment_block(segs1[0]).is_none());
    assert!(store.segment_block(segs1[2]).is_none());
}

/// Scenario B: a second, reverse-strand pinch layered over scenario A
/// fragments `t1` down to the expected degree/length run, with base
/// `(t1, 4)` now aligned to `(t2, 13)` in reverse orientation.
#[test]
fn scenario_b_second_reverse_pinch() {
    let mut store = ThreadStore::new();
    store.add_thread(1, 1, 1_000_000).unwrap();
    store.add_thread(2, 4, 10).unwrap();
    pinch_range(&mut store, 1, 2, 5, 5, 8, true).unwrap();

    pinch_range(&mut store, 1, 2, 4, 10, 4, false).unwrap();

    let t1 = store.get_thread(1).unwrap();
    let segs1 = store.thread_segments(t1);
    let degrees: Vec<u64> = segs1
        .iter()
        .map(|&s| store.segment_block(s).map(|b| store.block_degree(b)).unwrap_or(1))
        .collect();
    assert_eq!(degrees, vec![1, 2, 4, 4, 4, 2, 4, 4, 4, 1]);

    let lengths: Vec<i64> = segs1.iter().map(|&s| store.segment_length(s)).collect();
    assert_eq!(lengths[..9], [3, 1, 1, 1, 1, 2, 1, 1, 1][..]);
    assert_eq!(lengths[9], 1_000_000 - 12);

    let seg_at_4 = store.get_segment(1, 4).unwrap();
    let seg_at_13 = store.get_segment(2, 13).unwrap();
    let b4 = store.segment_block(seg_at_4).unwrap();
    let b13 = store.segment_block(seg_at_13).unwrap();
    assert_eq!(b4, b13);
    let o4 = store.segment_orientation(seg_at_4).unwrap();
    let o13 = store.segment_orientation(seg_at_13).unwrap();
    assert_ne!(o4, o13, "base (t1,4) must align to (t2,13) in reverse orientation");
}

/// Idempotence (testable property 5): re-applying an identical
/// `pinch_range` leaves structure unchanged but doubles support rather
/// than quadrupling it.
#[test]
fn pinch_range_is_idempotent_on_structure() {
    let mut store = ThreadStore::new();
    store.add_thread(1, 0, 20).unwrap();
    store.add_thread(2, 0, 20).unwrap();

    pinch_range(&mut store, 1, 2, 0, 0, 10, true).unwrap();
    let t1 = store.get_thread(1).unwrap();
    let segs_before = store.thread_segments(t1);
    let seg = store.get_segment(1, 0).unwrap();
    let block = store.segment_block(seg).unwrap();
    assert_eq!(store.block_support(block), 10);

    pinch_range(&mut store, 1, 2, 0, 0, 10, true).unwrap();
    let segs_after = store.thread_segments(t1);
    assert_eq!(segs_before.len(), segs_after.len());
    let block_after = store.segment_block(store.get_segment(1, 0).unwrap()).unwrap();
    assert_eq!(block_after, block);
    assert_eq!(store.block_support(block_after), 20);
}

/// Scenario D: a full undo restores the pre-pinch state exactly; a
/// partial undo over the middle of the region leaves the flanks aligned
/// and only the partial range unaligned.
#[test]
fn scenario_d_partial_undo_restores_only_its_range() {
    let mut store = ThreadStore::new();
    store.add_thread(1, 0, 10).unwrap();
    store.add_thread(2, 0, 10).unwrap();

    let snapshot = prepare_undo(&store, 1, 2, 0, 0, 10, true).unwrap();
    pinch_range(&mut store, 1, 2, 0, 0, 10, true).unwrap();

    for i in 0..10 {
        let a = store.get_segment(1, i).unwrap();
        let b = store.get_segment(2, i).unwrap();
        assert_eq!(store.segment_block(a), store.segment_block(b));
    }

    undo(&mut store, &snapshot).unwrap();
    join_trivial_boundaries(&mut store);
    let t1 = store.get_thread(1).unwrap();
    assert_eq!(store.thread_segments(t1).len(), 1);
    assert!(store.segment_block(store.get_segment(1, 0).unwrap()).is_none());
}

#[test]
fn scenario_d_partial_undo_leaves_flanks_aligned() {
    let mut store = ThreadStore::new();
    store.add_thread(1, 0, 10).unwrap();
    store.add_thread(2, 0, 10).unwrap();

    let snapshot = prepare_undo(&store, 1, 2, 0, 0, 10, true).unwrap();
    pinch_range(&mut store, 1, 2, 0, 0, 10, true).unwrap();

    undo_partial(&mut store, &snapshot, 3, 4).unwrap();

    for i in 0..3 {
        let a = store.get_segment(1, i).unwrap();
        let b = store.get_segment(2, i).unwrap();
        assert_eq!(store.segment_block(a), store.segment_block(b), "base {i} should remain aligned");
    }
    for i in 7..10 {
        let a = store.get_segment(1, i).unwrap();
        let b = store.get_segment(2, i).unwrap();
        assert_eq!(store.segment_block(a), store.segment_block(b), "base {i} should remain aligned");
    }
}

/// Scenario F (reduced, deterministic fuzz): a sequence of pinches
/// followed by LIFO undos and `join_trivial_boundaries` returns every
/// base to its own singleton block-free state.
#[test]
fn scenario_f_lifo_undo_returns_to_identity() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    init_tracing();

    let mut store = ThreadStore::new();
    store.add_thread(1, 0, 200).unwrap();
    store.add_thread(2, 0, 200).unwrap();

    // Non-overlapping windows so later pinches never touch an earlier
    // one's still-pending (LIFO) snapshot region, per the undo contract.
    let mut rng = StdRng::seed_from_u64(1234);
    let mut undos = Vec::new();
    for i in 0..15 {
        let start = i * 10;
        let len = rng.gen_range(1..10);
        let strand = rng.gen_bool(0.5);
        let snap = prepare_undo(&store, 1, 2, start, start, len, strand).unwrap();
        pinch_range(&mut store, 1, 2, start, start, len, strand).unwrap();
        undos.push(snap);
    }

    for snap in undos.into_iter().rev() {
        undo(&mut store, &snap).unwrap();
    }
    join_trivial_boundaries(&mut store);

    let t1 = store.get_thread(1).unwrap();
    assert_eq!(store.thread_segments(t1).len(), 1);
    for i in 0..200 {
        assert!(store.segment_block(store.get_segment(1, i).unwrap()).is_none());
        assert!(store.segment_block(store.get_segment(2, i).unwrap()).is_none());
    }
}
