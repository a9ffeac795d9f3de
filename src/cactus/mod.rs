//! Cactus graphs: a multigraph whose 2-edge-connected components are
//! simple cycles ("chains"), derived from a pinch graph's block-adjacency
//! structure (spec §4.5–§4.7).

pub mod bridge;
pub mod graph;
pub mod ids;
pub mod transforms;
pub mod ultrabubble;

pub use bridge::{BridgeGraph, BridgeNode};
pub use graph::CactusGraph;
pub use ids::{EdgeEndId, NodeId};
pub use ultrabubble::Ultrabubble;
