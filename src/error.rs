//! Crate-wide error type.
//!
//! Every fallible public operation returns `Result<T, Error>`; the core
//! never retries or recovers internally (see module docs at the crate
//! root).

use thiserror::Error;

/// A single tagged error kind for every precondition and invariant
/// violation the pinch and cactus engines can surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("a thread named {0} already exists")]
    DuplicateName(i64),

    #[error("no thread named {0}")]
    UnknownThread(i64),

    #[error("coordinate {coord} is out of range for thread {name} ([{start}, {end}))")]
    OutOfRange {
        name: i64,
        coord: i64,
        start: i64,
        end: i64,
    },

    #[error("cannot pinch segments of length {len1} and {len2}")]
    LengthMismatch { len1: i64, len2: i64 },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("undo applied after the snapshotted region was mutated: {0}")]
    UndoInvalidated(String),
}

pub type Result<T> = std::result::Result<T, Error>;
