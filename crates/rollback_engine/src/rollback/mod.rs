//! Frame-indexed rollback
//!
//! # Module Organization
//!
//! - [`input`] - Per-frame button state and its byte encoding
//! - [`manager`] - Input history, prediction, replay and confirmation
//! - [`checksum`] - Hashing confirmed state for desync detection
//! - [`protocol`] - Wire format of input and confirmation events
//! - [`error`] - Rollback errors
//!
//! A session has one authority peer that confirms frames and sends the
//! checksum of each; the other peer confirms the same frames itself and
//! compares.

pub mod checksum;
pub mod error;
pub mod input;
pub mod manager;
pub mod protocol;

pub use checksum::{Checksum, StateHasher};
pub use error::{RollbackError, RollbackResult};
pub use input::{Frame, FrameInput, InputFlags, NO_FRAME};
pub use manager::{GameSimulation, PlayerId, RollbackManager};
pub use protocol::{decode_batch, encode_batch, CodecError, NetworkEvent};
