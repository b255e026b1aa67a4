//! Duel configuration
//!
//! One file holds the engine settings next to the game and session settings.
//! Every section falls back to its defaults, so a file only needs the values
//! it changes:
//!
//! ```toml
//! [session]
//! frames = 1200
//! max_delay_frames = 6
//! ```

use serde::{Deserialize, Serialize};

use rollback_engine::core::config::{Config, ConfigError, EngineConfig};

/// Gameplay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Seconds simulated per frame
    pub time_step: f32,
    /// Downward acceleration
    pub gravity: f32,
    /// Horizontal force while LEFT or RIGHT is held
    pub move_force: f32,
    /// Upward speed set by a grounded jump
    pub jump_speed: f32,
    /// Player circle radius
    pub player_radius: f32,
    /// Player mass
    pub player_mass: f32,
    /// Player bounciness
    pub player_restitution: f32,
    /// Width of the floor
    pub arena_width: f32,
    /// Height of the side walls
    pub arena_height: f32,
    /// Radius of the scoring zone
    pub zone_radius: f32,
    /// Players falling below this height respawn
    pub kill_plane: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            gravity: 20.0,
            move_force: 30.0,
            jump_speed: 9.0,
            player_radius: 0.5,
            player_mass: 1.0,
            player_restitution: 0.2,
            arena_width: 16.0,
            arena_height: 9.0,
            zone_radius: 1.5,
            kill_plane: -10.0,
        }
    }
}

/// Loopback session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Frames each peer plays
    pub frames: usize,
    /// Seed for the scripted inputs and the link delays
    pub seed: u64,
    /// Largest delivery delay of a packet, in frames
    pub max_delay_frames: u32,
    /// Longest run of frames a scripted player holds the same buttons
    pub max_hold_frames: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            seed: 0x5EED,
            max_delay_frames: 4,
            max_hold_frames: 8,
        }
    }
}

/// Complete duel configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Physics, rollback and logging settings
    pub engine: EngineConfig,
    /// Game rules
    pub gameplay: GameplayConfig,
    /// Loopback link and scripted players
    pub session: SessionConfig,
}

impl DuelConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.engine.rollback.max_players != 2 {
            return Err(ConfigError::Invalid(format!(
                "a duel needs exactly 2 players, got {}",
                self.engine.rollback.max_players
            )));
        }
        if self.session.frames == 0 || self.session.frames > self.engine.rollback.max_frames {
            return Err(ConfigError::Invalid(format!(
                "session frames must be in 1..={}, got {}",
                self.engine.rollback.max_frames, self.session.frames
            )));
        }
        if self.session.max_hold_frames == 0 {
            return Err(ConfigError::Invalid("max_hold_frames must be at least 1".to_string()));
        }
        let gameplay = &self.gameplay;
        if !(gameplay.time_step > 0.0 && gameplay.player_mass > 0.0 && gameplay.player_radius > 0.0) {
            return Err(ConfigError::Invalid(
                "time_step, player_mass and player_radius must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config for DuelConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DuelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_session_longer_than_history_is_rejected() {
        let mut config = DuelConfig::default();
        config.engine.rollback.max_frames = 100;
        config.session.frames = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_ron_file_keeps_defaults() {
        let path = std::env::temp_dir().join(format!("duel_config_{}.ron", std::process::id()));
        std::fs::write(&path, "(session: (frames: 120))").unwrap();
        let loaded = DuelConfig::load_from_file(&path);
        std::fs::remove_file(&path).ok();

        let loaded = loaded.unwrap();
        assert_eq!(loaded.session.frames, 120);
        assert_eq!(loaded.session.seed, SessionConfig::default().seed);
        assert_eq!(loaded.gameplay, GameplayConfig::default());
    }
}
