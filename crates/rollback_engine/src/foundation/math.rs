//! Math utilities and types
//!
//! Provides the 2D vector type used by the physics core, plus fallible
//! helpers for the operations that can degenerate (zero-length vectors,
//! division by zero, out-of-range component access, NaN results).

pub use nalgebra::Vector2;

use thiserror::Error;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Degenerate numeric cases reported by the fallible vector helpers
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    /// Division by a zero scalar, length or magnitude
    #[error("division by zero")]
    DivisionByZero,

    /// Component index outside the vector's dimension
    #[error("component index {index} out of range for a {len}-component vector")]
    IndexOutOfRange {
        /// Requested component
        index: usize,
        /// Number of components
        len: usize,
    },

    /// An operation produced NaN
    #[error("operation produced NaN")]
    NotANumber,
}

/// Unit vector pointing up (+Y), the fallback normal for coincident contacts
pub const UP: Vec2 = Vec2::new(0.0, 1.0);

/// Extension trait for `Vec2` with explicit error reporting
///
/// nalgebra's own `normalize` silently yields NaN on a zero vector; callers in
/// the simulation core go through these helpers instead so the degenerate case
/// is visible at the call site.
pub trait Vec2Ext {
    /// Length of the vector, failing if it is NaN
    fn checked_length(&self) -> Result<f32, MathError>;

    /// Unit vector in the same direction
    fn checked_normalize(&self) -> Result<Vec2, MathError>;

    /// Component-wise division by a scalar
    fn checked_div(&self, scalar: f32) -> Result<Vec2, MathError>;

    /// Component by index (0 = x, 1 = y)
    fn checked_component(&self, index: usize) -> Result<f32, MathError>;

    /// Z component of the 2D cross product
    fn perp_dot(&self, other: &Vec2) -> f32;
}

impl Vec2Ext for Vec2 {
    fn checked_length(&self) -> Result<f32, MathError> {
        let length = self.magnitude();
        if length.is_nan() {
            return Err(MathError::NotANumber);
        }
        Ok(length)
    }

    fn checked_normalize(&self) -> Result<Vec2, MathError> {
        let length = self.checked_length()?;
        if length == 0.0 {
            return Err(MathError::DivisionByZero);
        }
        self.checked_div(length)
    }

    fn checked_div(&self, scalar: f32) -> Result<Vec2, MathError> {
        if scalar == 0.0 {
            return Err(MathError::DivisionByZero);
        }
        let result = self / scalar;
        if result.x.is_nan() || result.y.is_nan() {
            return Err(MathError::NotANumber);
        }
        Ok(result)
    }

    fn checked_component(&self, index: usize) -> Result<f32, MathError> {
        match index {
            0 => Ok(self.x),
            1 => Ok(self.y),
            _ => Err(MathError::IndexOutOfRange { index, len: 2 }),
        }
    }

    fn perp_dot(&self, other: &Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_zero_vector_is_division_by_zero() {
        assert_eq!(Vec2::zeros().checked_normalize(), Err(MathError::DivisionByZero));
    }

    #[test]
    fn test_normalize_unit_length() {
        let n = Vec2::new(3.0, 4.0).checked_normalize().unwrap();
        assert_relative_eq!(n.magnitude(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(n.x, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_component_out_of_range() {
        let v = Vec2::new(1.0, 2.0);
        assert_eq!(v.checked_component(1), Ok(2.0));
        assert_eq!(
            v.checked_component(2),
            Err(MathError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_nan_is_reported() {
        let v = Vec2::new(f32::NAN, 0.0);
        assert_eq!(v.checked_length(), Err(MathError::NotANumber));
        assert_eq!(Vec2::new(1.0, 1.0).checked_div(0.0), Err(MathError::DivisionByZero));
    }
}
