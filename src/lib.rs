//! Pinch and cactus graph engine for whole-genome multiple-alignment
//! pipelines.
//!
//! A [`pinch::ThreadStore`] holds a multi-sequence alignment as named
//! threads partitioned into segments grouped into blocks of mutually
//! aligned, equal-length segments. A [`cactus::CactusGraph`] derives a
//! cactus multigraph from an arbitrary adjacency structure (typically a
//! pinch graph's block adjacency) via 3-edge-connected-component
//! collapse, exposing chains, bridges, and their nested ultrabubble
//! decomposition.

pub mod arena;
pub mod cactus;
pub mod error;
pub mod feature;
pub mod pinch;
pub mod tecc;

pub use error::{Error, Result};
