//! Collision geometry
//!
//! # Module Organization
//!
//! - [`primitives`] - Circles, rectangles, polygons, bounding boxes and the
//!   pairwise intersection predicates
//! - [`shape`] - Body-local collider shapes and their world-space form
//!
//! Shapes are stored relative to their body and moved to world space only
//! while a test runs, so moving a body never touches its collider.

pub mod primitives;
pub mod shape;

// Re-export commonly used types
pub use primitives::{Aabb, Circle, Polygon, Rect};
pub use shape::{ColliderShape, ShapeType, WorldSpaceShape};
