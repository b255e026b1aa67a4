//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and fallible vector operations
//! - Byte-budget allocators
//! - Generational slot arena and typed handles
//! - Time measurement
//! - Logging utilities

pub mod math;
pub mod memory;
pub mod collections;
pub mod time;
pub mod logging;
