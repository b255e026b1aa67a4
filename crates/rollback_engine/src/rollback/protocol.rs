//! Wire format for rollback events
//!
//! Every event starts with a kind byte and the player number:
//!
//! | kind | payload |
//! |------|---------|
//! | `1` input | frame (`i16` LE), buttons (`u8`) |
//! | `2` confirm | frame (`i16` LE), checksum (`u32` LE) |
//!
//! Events can be concatenated into one datagram; [`decode_batch`] splits them
//! again.

use thiserror::Error;

use super::checksum::Checksum;
use super::input::{Frame, FrameInput, FRAME_INPUT_SIZE};
use super::manager::PlayerId;

const KIND_INPUT: u8 = 1;
const KIND_CONFIRM: u8 = 2;
const HEADER_SIZE: usize = 2;

/// Errors that can occur during decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The data ends inside an event
    #[error("unexpected end of data: needed {needed} bytes, had {available}")]
    UnexpectedEof {
        /// Bytes the event needs
        needed: usize,
        /// Bytes left
        available: usize,
    },

    /// The kind byte names no event
    #[error("unknown event kind {0}")]
    UnknownEventKind(u8),

    /// A single-event decode had data left over
    #[error("{0} trailing bytes after event")]
    TrailingBytes(usize),
}

/// Event exchanged between peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A player's input for one frame
    Input {
        /// Sender
        player: PlayerId,
        /// The input
        input: FrameInput,
    },
    /// The authority's checksum of a confirmed frame
    Confirm {
        /// Sender
        player: PlayerId,
        /// Confirmed frame
        frame: Frame,
        /// Checksum of the confirmed state after `frame`
        checksum: Checksum,
    },
}

impl NetworkEvent {
    /// Player the event came from
    pub fn player(&self) -> PlayerId {
        match self {
            Self::Input { player, .. } | Self::Confirm { player, .. } => *player,
        }
    }

    /// Number of bytes [`encode_into`](Self::encode_into) writes
    pub fn encoded_size(&self) -> usize {
        match self {
            Self::Input { .. } => HEADER_SIZE + FRAME_INPUT_SIZE,
            Self::Confirm { .. } => HEADER_SIZE + 2 + 4,
        }
    }

    /// Append the encoded event to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::Input { player, input } => {
                out.extend_from_slice(&[KIND_INPUT, *player]);
                out.extend_from_slice(&input.to_bytes());
            }
            Self::Confirm {
                player,
                frame,
                checksum,
            } => {
                out.extend_from_slice(&[KIND_CONFIRM, *player]);
                out.extend_from_slice(&frame.to_le_bytes());
                out.extend_from_slice(&checksum.to_le_bytes());
            }
        }
    }

    /// Encode a single event
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_size());
        self.encode_into(&mut out);
        out
    }

    /// Decode the event at the start of `data`, returning it with its size
    pub fn decode_prefix(data: &[u8]) -> Result<(Self, usize), CodecError> {
        let header = take(data, 0, HEADER_SIZE)?;
        let (kind, player) = (header[0], header[1]);
        match kind {
            KIND_INPUT => {
                let payload = take(data, HEADER_SIZE, FRAME_INPUT_SIZE)?;
                let input = FrameInput::from_bytes([payload[0], payload[1], payload[2]]);
                Ok((Self::Input { player, input }, HEADER_SIZE + FRAME_INPUT_SIZE))
            }
            KIND_CONFIRM => {
                let payload = take(data, HEADER_SIZE, 6)?;
                let frame = Frame::from_le_bytes([payload[0], payload[1]]);
                let checksum = Checksum::from_le_bytes([payload[2], payload[3], payload[4], payload[5]]);
                Ok((
                    Self::Confirm {
                        player,
                        frame,
                        checksum,
                    },
                    HEADER_SIZE + 6,
                ))
            }
            other => Err(CodecError::UnknownEventKind(other)),
        }
    }

    /// Decode exactly one event
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let (event, used) = Self::decode_prefix(data)?;
        if used != data.len() {
            return Err(CodecError::TrailingBytes(data.len() - used));
        }
        Ok(event)
    }
}

fn take(data: &[u8], offset: usize, len: usize) -> Result<&[u8], CodecError> {
    data.get(offset..offset + len).ok_or(CodecError::UnexpectedEof {
        needed: offset + len,
        available: data.len(),
    })
}

/// Encode several events back to back
pub fn encode_batch(events: &[NetworkEvent]) -> Vec<u8> {
    let mut out = Vec::with_capacity(events.iter().map(NetworkEvent::encoded_size).sum());
    for event in events {
        event.encode_into(&mut out);
    }
    out
}

/// Decode events written by [`encode_batch`]
pub fn decode_batch(mut data: &[u8]) -> Result<Vec<NetworkEvent>, CodecError> {
    let mut events = Vec::new();
    while !data.is_empty() {
        let (event, used) = NetworkEvent::decode_prefix(data)?;
        events.push(event);
        data = &data[used..];
    }
    Ok(events)
}
