//! Rollback errors

use thiserror::Error;

use crate::config::ConfigError;
use super::input::Frame;
use super::manager::PlayerId;

/// Errors from the rollback manager
#[derive(Error, Debug)]
pub enum RollbackError {
    /// The player index is not below `max_players`
    #[error("Unknown player {player} (session has {max_players})")]
    UnknownPlayer {
        /// Offending player
        player: PlayerId,
        /// Configured player count
        max_players: usize,
    },

    /// The frame falls outside the input history
    #[error("Frame {frame} is outside the input history of {max_frames} frames")]
    FrameOutOfRange {
        /// Offending frame
        frame: i32,
        /// Configured history length
        max_frames: usize,
    },

    /// The frame to confirm is past the newest local frame
    #[error("Frame {frame} cannot be confirmed before local frame {current_frame} reaches it")]
    FrameNotReached {
        /// Frame waiting for confirmation
        frame: Frame,
        /// Newest frame with local input
        current_frame: Frame,
    },

    /// A remote batch carried no inputs
    #[error("Empty remote input batch for player {0}")]
    EmptyInputBatch(PlayerId),

    /// The rollback configuration was rejected
    #[error("Invalid rollback configuration: {0}")]
    Config(#[from] ConfigError),
}

impl RollbackError {
    pub(crate) fn frame_out_of_range(frame: impl Into<i32>, max_frames: usize) -> Self {
        Self::FrameOutOfRange {
            frame: frame.into(),
            max_frames,
        }
    }
}

/// Convenience alias for rollback results
pub type RollbackResult<T> = Result<T, RollbackError>;

