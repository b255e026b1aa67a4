//! Physics module for collision detection and response
//!
//! A deterministic 2D rigid-body world: point-mass bodies, circle and
//! rectangle colliders, a quadtree broad phase and enter/exit contact
//! notifications. Bodies and colliders are addressed by generational handles.

pub mod body;
pub mod collider;
pub mod collision;
pub mod collision_system;
pub mod contact;
pub mod error;
pub mod listener;
pub mod world;

pub use body::{Body, BodyHandle, BodyType};
pub use collider::{Collider, ColliderHandle, ColliderPair};
pub use collision::{ColliderShape, ShapeType};
pub use collision_system::{OverlapEdge, OverlapTracker};
pub use contact::Contact;
pub use error::PhysicsError;
pub use listener::{ContactListener, NoListener};
pub use world::{World, WorldSnapshot};
