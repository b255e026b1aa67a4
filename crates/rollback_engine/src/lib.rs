//! # Rollback Engine
//!
//! A deterministic 2D rigid-body physics engine with a frame-indexed rollback
//! layer for two-peer networked games.
//!
//! ## Features
//!
//! - **Generational Handles**: Bodies and colliders live in slot arrays and
//!   are addressed by handles that go stale when their slot is reused
//! - **Quadtree Broad Phase**: Rebuilt every tick from a preallocated pool
//! - **Impulse Contact Response**: Circles and axis-aligned rectangles with
//!   restitution and positional correction
//! - **Contact Events**: Exactly one enter and one exit notification per
//!   overlap episode, for solid contacts and triggers alike
//! - **Rollback**: Input prediction, full replay on misprediction and
//!   per-frame checksums of confirmed state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rollback_engine::prelude::*;
//!
//! fn main() -> Result<(), PhysicsError> {
//!     let mut world: World<NoListener> = World::new(PhysicsConfig::default())?;
//!     world.set_contact_listener(NoListener);
//!
//!     let floor = world.create_body_with(Body::new().with_type(BodyType::Static))?;
//!     world.create_collider(floor, ColliderShape::rectangle(Vec2::new(20.0, 1.0)))?;
//!
//!     let ball = world.create_body_with(Body::new().with_position(Vec2::new(0.0, 5.0)))?;
//!     world.create_collider(ball, ColliderShape::circle(0.5))?;
//!
//!     for _ in 0..60 {
//!         world.add_force(ball, Vec2::new(0.0, -9.8))?;
//!         world.update(1.0 / 60.0);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]
#![forbid(unsafe_code)]

// Core engine modules
pub mod core;
pub mod config;

pub mod foundation;
pub mod physics;
pub mod rollback;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{EngineConfig, LoggingConfig, PhysicsConfig, RollbackConfig},
        config::{Config, ConfigError},
        foundation::{
            math::{Vec2, Vec2Ext, UP},
            time::Stopwatch,
        },
        physics::{
            Body, BodyHandle, BodyType, Collider, ColliderHandle, ColliderShape, ContactListener,
            NoListener, PhysicsError, World,
        },
        rollback::{
            Checksum, Frame, FrameInput, GameSimulation, InputFlags, NetworkEvent, PlayerId,
            RollbackError, RollbackManager, StateHasher,
        },
    };
}
