use std::collections::HashMap;

use pinch_cactus::feature::{breakpoint_features, substitution_features, BreakpointParams, FeatureParams};
use pinch_cactus::pinch::{pinch_range, ThreadStore};

fn seq_lookup<'a>(seqs: &'a HashMap<i64, &'a str>) -> impl Fn(i64) -> Option<&'a str> + 'a {
    move |name| seqs.get(&name).copied()
}

/// A block whose members disagree at every column (one thread's bases are
/// all non-ACGT) is reported as wildcard everywhere, even though each
/// column still has exactly one real base and so still has an `identity`.
/// This exercises `substitution_features` without depending on which
/// member segment the merge machinery happens to canonicalize as the
/// block's reverse-complement side (spec §6 leaves that an internal
/// bookkeeping detail, not an observable one).
#[test]
fn substitution_features_reports_wildcards_for_missing_bases() {
    let mut store = ThreadStore::new();
    store.add_thread(1, 0, 5).unwrap();
    store.add_thread(2, 0, 5).unwrap();
    pinch_range(&mut store, 1, 2, 0, 0, 5, true).unwrap();

    let reference = store.segment_block(store.get_segment(1, 0).unwrap()).unwrap();

    let mut seqs: HashMap<i64, &str> = HashMap::new();
    seqs.insert(1, "AAAAA");
    seqs.insert(2, "NNNNN");
    let lookup = seq_lookup(&seqs);

    let params = FeatureParams { max_base_distance: 100, max_block_distance: 4 };
    let block = substitution_features(&store, reference, &params, &lookup);

    assert_eq!(block.reference, reference);
    assert_eq!(block.segments.len(), 2);
    assert_eq!(block.columns.len(), 5);
    for (i, column) in block.columns.iter().enumerate() {
        assert!(column.is_wildcard(), "column {i} should be wildcard: thread 2 has no ACGT base there");
        assert!(column.identity().is_some(), "column {i} still has exactly one real base to agree with itself");
    }
}

/// Two disjoint blocks on the same thread pair each get their own
/// `FeatureBlock` keyed by the block passed in, in chain order.
#[test]
fn breakpoint_features_returns_one_block_per_chain_entry() {
    let mut store = ThreadStore::new();
    store.add_thread(1, 0, 20).unwrap();
    store.add_thread(2, 0, 20).unwrap();
    pinch_range(&mut store, 1, 2, 0, 0, 5, true).unwrap();
    pinch_range(&mut store, 1, 2, 10, 10, 5, true).unwrap();

    let first = store.segment_block(store.get_segment(1, 0).unwrap()).unwrap();
    let second = store.segment_block(store.get_segment(1, 10).unwrap()).unwrap();
    let chain = vec![first, second];

    let seqs: HashMap<i64, &str> = HashMap::new();
    let lookup = seq_lookup(&seqs);
    let side = FeatureParams { max_base_distance: 50, max_block_distance: 4 };
    let params = BreakpointParams { left: side, right: side };

    let blocks = breakpoint_features(&store, &chain, &params, &lookup);

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].reference, first);
    assert_eq!(blocks[1].reference, second);
    assert_eq!(blocks[0].segments.len(), 2);
    assert_eq!(blocks[1].segments.len(), 2);
}
