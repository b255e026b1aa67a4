//! # Unified Configuration System
//!
//! Settings for every engine subsystem in one place. All types are
//! serializable so a game can keep them in a TOML or RON file next to its own
//! settings.
//!
//! ## Configuration Categories
//!
//! - **Physics Config**: Entity store sizing, quadtree depth and occupancy
//! - **Rollback Config**: Player count and input-history length
//! - **Logging Config**: Default log filter

use serde::{Deserialize, Serialize};

// Re-export from the config module for compatibility
pub use crate::config::{Config, ConfigError};

/// Largest input history the 16-bit wire frame number can address
///
/// One short of the full `i16` range so `frame_to_confirm` can still step
/// past the last frame.
pub const MAX_HISTORY_FRAMES: usize = i16::MAX as usize;

/// # Physics Configuration
///
/// Sizing of the entity store and the broad-phase quadtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Deepest quadtree level a node may be subdivided to
    pub max_depth: u32,
    /// Colliders a node may hold before it is subdivided
    pub max_colliders_in_node: usize,
    /// Extent used as the empty-root sentinel before each insertion pass
    pub world_extent: f32,
    /// Initial body and collider slot count
    pub initial_capacity: usize,
    /// Byte budget the quadtree reserves its node pool against
    pub memory_budget_bytes: usize,
}

impl PhysicsConfig {
    /// Create a physics configuration with default values
    pub fn new() -> Self {
        Self {
            max_depth: 5,
            max_colliders_in_node: 4,
            world_extent: f32::MAX,
            initial_capacity: 32,
            memory_budget_bytes: 4 * 1024 * 1024,
        }
    }

    /// Set the maximum quadtree depth
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the per-node collider threshold
    pub fn with_max_colliders_in_node(mut self, count: usize) -> Self {
        self.max_colliders_in_node = count;
        self
    }

    /// Set the initial slot capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the quadtree memory budget
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = bytes;
        self
    }

    /// Number of nodes in a full quadtree of `max_depth` levels below the root
    pub fn quadtree_node_count(&self) -> usize {
        (0..=self.max_depth).map(|depth| 4usize.pow(depth)).sum()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_colliders_in_node == 0 {
            return Err(ConfigError::Invalid(
                "max_colliders_in_node must be at least 1".to_string(),
            ));
        }
        if self.max_depth > 10 {
            return Err(ConfigError::Invalid(format!(
                "max_depth {} would need {} quadtree nodes",
                self.max_depth,
                self.quadtree_node_count()
            )));
        }
        if !(self.world_extent > 0.0) {
            return Err(ConfigError::Invalid("world_extent must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Rollback Configuration
///
/// Bounds of a rollback session. The history length caps the playable session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    /// Number of players with an input history
    pub max_players: usize,
    /// Frames of input history kept per player
    pub max_frames: usize,
}

impl RollbackConfig {
    /// Create a rollback configuration with default values
    pub fn new() -> Self {
        Self {
            max_players: 2,
            max_frames: 30_000,
        }
    }

    /// Set the player count
    pub fn with_max_players(mut self, players: usize) -> Self {
        self.max_players = players;
        self
    }

    /// Set the history length
    pub fn with_max_frames(mut self, frames: usize) -> Self {
        self.max_frames = frames;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_players == 0 || self.max_players > usize::from(u8::MAX) {
            return Err(ConfigError::Invalid(format!(
                "max_players must be in 1..=255, got {}",
                self.max_players
            )));
        }
        if self.max_frames == 0 || self.max_frames > MAX_HISTORY_FRAMES {
            return Err(ConfigError::Invalid(format!(
                "max_frames must be in 1..={}, got {}",
                MAX_HISTORY_FRAMES, self.max_frames
            )));
        }
        Ok(())
    }
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Physics settings
    pub physics: PhysicsConfig,
    /// Rollback settings
    pub rollback: RollbackConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        self.rollback.validate()?;
        Ok(())
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadtree_node_count_is_geometric_sum() {
        let config = PhysicsConfig::new().with_max_depth(2);
        assert_eq!(config.quadtree_node_count(), 1 + 4 + 16);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_history_longer_than_wire_frames_is_rejected() {
        let config = RollbackConfig::new().with_max_frames(MAX_HISTORY_FRAMES + 1);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_round_trip_through_toml_file() {
        let path = std::env::temp_dir().join(format!("engine_config_{}.toml", std::process::id()));
        let mut config = EngineConfig::default();
        config.physics.max_depth = 3;
        config.rollback.max_frames = 600;

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EngineConfig::load_from_file("settings.json");
        assert!(result.is_err());
    }
}
