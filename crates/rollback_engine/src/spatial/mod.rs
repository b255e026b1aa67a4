//! Spatial partitioning data structures
//!
//! Provides the quadtree broad phase that turns every collider bounding box
//! into a short list of candidate pairs for the narrow phase.

mod quadtree;

pub use quadtree::{QuadEntry, QuadNode, QuadTree};
