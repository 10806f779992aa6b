//! Spatial indexing
pub mod kdtree;

pub use self::kdtree::{KdTree, NodeId};
