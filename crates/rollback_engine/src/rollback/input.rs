//! Per-frame player input

use bitflags::bitflags;

/// Frame number on the wire; `-1` means "no frame yet"
pub type Frame = i16;

/// Frame value used before any frame exists
pub const NO_FRAME: Frame = -1;

/// Size of an encoded [`FrameInput`]
pub const FRAME_INPUT_SIZE: usize = 3;

bitflags! {
    /// Buttons held during one frame
    ///
    /// Bits outside the named flags survive encoding untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputFlags: u8 {
        /// Jump
        const JUMP = 1 << 0;
        /// Move right
        const RIGHT = 1 << 1;
        /// Move left
        const LEFT = 1 << 2;
        /// Attack
        const ATTACK = 1 << 3;
    }
}

/// Input of one player for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameInput {
    /// Frame the input belongs to
    pub frame: Frame,
    /// Buttons held
    pub input: InputFlags,
}

impl FrameInput {
    /// Input for `frame`
    pub const fn new(frame: Frame, input: InputFlags) -> Self {
        Self { frame, input }
    }

    /// Encode as the frame number (little-endian) followed by the button byte
    pub fn to_bytes(&self) -> [u8; FRAME_INPUT_SIZE] {
        let frame = self.frame.to_le_bytes();
        [frame[0], frame[1], self.input.bits()]
    }

    /// Decode the layout written by [`to_bytes`](Self::to_bytes)
    pub fn from_bytes(bytes: [u8; FRAME_INPUT_SIZE]) -> Self {
        Self {
            frame: Frame::from_le_bytes([bytes[0], bytes[1]]),
            input: InputFlags::from_bits_retain(bytes[2]),
        }
    }

    /// Same buttons carried to another frame, as used for prediction
    pub fn repeated_at(&self, frame: Frame) -> Self {
        Self::new(frame, self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_layout() {
        let input = FrameInput::new(0x0102, InputFlags::JUMP | InputFlags::LEFT);
        assert_eq!(input.to_bytes(), [0x02, 0x01, 0b0000_0101]);
    }

    #[test]
    fn test_frame_boundaries_survive_encoding() {
        for frame in [0, 1, -1, Frame::MAX, Frame::MIN] {
            let input = FrameInput::new(frame, InputFlags::RIGHT);
            assert_eq!(FrameInput::from_bytes(input.to_bytes()), input);
        }
    }

    #[test]
    fn test_empty_and_unnamed_bits_survive_encoding() {
        let empty = FrameInput::new(7, InputFlags::empty());
        assert_eq!(FrameInput::from_bytes(empty.to_bytes()), empty);

        let decoded = FrameInput::from_bytes([0, 0, 0xF0]);
        assert_eq!(decoded.input.bits(), 0xF0);
        assert_eq!(decoded.to_bytes(), [0, 0, 0xF0]);
    }
}
