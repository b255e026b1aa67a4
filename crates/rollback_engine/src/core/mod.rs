//! # Core Engine Module
//!
//! Shared abstractions used by the physics and rollback subsystems.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration system for all engine subsystems
//! - **Foundation**: Low-level utilities (math, collections, memory, etc.)

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;

// Re-export commonly used config types
pub use config::{
    Config,
    ConfigError,
    EngineConfig,
    LoggingConfig,
    PhysicsConfig,
    RollbackConfig,
};
