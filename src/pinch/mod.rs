//! Pinch graphs: threads partitioned into segments grouped into blocks
//! (spec §4).

pub mod adjacency;
pub mod ids;
pub mod ops;
pub mod thread;
pub mod undo;

pub use ids::{BlockEnd, BlockId, SegmentId, ThreadId};
pub use ops::{filter_pinch, pinch, pinch_range, join_trivial_boundaries};
pub use thread::ThreadStore;
pub use undo::{find_offset_for_block, prepare_undo, undo, undo_partial, PinchUndo};
