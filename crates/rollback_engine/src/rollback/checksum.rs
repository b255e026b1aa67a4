//! State checksums for desync detection
//!
//! Peers hash their confirmed state after every confirmed frame and compare
//! the results. Floats are hashed by bit pattern, so two states only match if
//! they are bit-identical.

use crate::foundation::math::Vec2;

/// Checksum of a confirmed state
pub type Checksum = u32;

/// Order-sensitive rolling hash
///
/// Each word is rotated by a position-dependent amount, xored in and mixed
/// with a 64-bit finalizer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHasher {
    state: u64,
    words: u32,
}

impl StateHasher {
    /// Fresh hasher
    pub fn new() -> Self {
        Self {
            state: 0x9E37_79B9_7F4A_7C15,
            words: 0,
        }
    }

    /// Mix in one 64-bit word
    pub fn write_u64(&mut self, value: u64) {
        let rotation = (self.words * 7 + 5) % 64;
        let mut h = self.state ^ value.rotate_left(rotation);
        h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        self.state = h ^ (h >> 31);
        self.words = self.words.wrapping_add(1);
    }

    /// Mix in a 32-bit word
    pub fn write_u32(&mut self, value: u32) {
        self.write_u64(u64::from(value));
    }

    /// Mix in a float by its bit pattern
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Mix in both components of a vector
    pub fn write_vec2(&mut self, value: Vec2) {
        self.write_f32(value.x);
        self.write_f32(value.y);
    }

    /// Mix in a flag
    pub fn write_bool(&mut self, value: bool) {
        self.write_u64(u64::from(value));
    }

    /// Fold the state down to a [`Checksum`]
    pub fn finish(&self) -> Checksum {
        (self.state ^ (self.state >> 32)) as u32
    }
}

impl Default for StateHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checksum(values: &[f32]) -> Checksum {
        let mut hasher = StateHasher::new();
        for &value in values {
            hasher.write_f32(value);
        }
        hasher.finish()
    }

    #[test]
    fn test_same_input_same_checksum() {
        assert_eq!(checksum(&[1.0, 2.5, -3.0]), checksum(&[1.0, 2.5, -3.0]));
    }

    #[test]
    fn test_order_and_bits_matter() {
        assert_ne!(checksum(&[1.0, 2.0]), checksum(&[2.0, 1.0]));
        assert_ne!(checksum(&[0.0]), checksum(&[-0.0]));
        assert_ne!(checksum(&[1.0]), checksum(&[1.0 + f32::EPSILON]));
    }
}
