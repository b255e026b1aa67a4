//! Rigid bodies
//!
//! Point-mass bodies integrated with semi-implicit Euler. No rotation.

use crate::foundation::collections::{Handle, Slot};
use crate::foundation::math::Vec2;

/// Handle to a body stored in a [`World`](super::World)
pub type BodyHandle = Handle<Body>;

/// How a body takes part in contact response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BodyType {
    /// Moved by forces and by contact response
    #[default]
    Dynamic,
    /// Never moved by contact response
    Static,
    /// Ignored by contact response
    None,
}

/// A rigid body
///
/// Valid iff `mass > 0`. The default value (mass 0) marks a free slot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Body {
    /// Mass; zero means the slot is unused
    pub mass: f32,
    /// Linear velocity
    pub velocity: Vec2,
    /// Position
    pub position: Vec2,
    /// Force accumulated for the current tick, cleared after integration
    pub force: Vec2,
    /// Contact response behaviour
    pub body_type: BodyType,
}

impl Body {
    /// A dynamic unit-mass body at the origin
    pub fn new() -> Self {
        Self {
            mass: 1.0,
            ..Self::default()
        }
    }

    /// Builder: set the mass
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Builder: set the position
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Builder: set the body type
    pub fn with_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    /// Whether the body is in use
    pub fn is_valid(&self) -> bool {
        self.mass > 0.0
    }

    /// `1 / mass`, or zero for an invalid body
    pub fn inverse_mass(&self) -> f32 {
        if self.is_valid() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Whether contact response may change this body
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Accumulate a force for this tick
    pub fn add_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Overwrite the velocity
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Overwrite the position
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Advance one step: `v += F/m * dt`, `p += v * dt`, then clear the force
    pub fn integrate(&mut self, delta_time: f32) {
        if !self.is_valid() {
            return;
        }
        let acceleration = self.force / self.mass;
        self.velocity += acceleration * delta_time;
        self.position += self.velocity * delta_time;
        self.force = Vec2::zeros();
    }
}

impl Slot for Body {
    fn is_valid(&self) -> bool {
        Body::is_valid(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_mass_body_is_invalid_and_never_integrates() {
        let mut body = Body::default().with_position(Vec2::new(1.0, 1.0));
        body.set_velocity(Vec2::new(5.0, 0.0));
        body.add_force(Vec2::new(10.0, 0.0));
        assert!(!body.is_valid());

        body.integrate(1.0);
        assert_eq!(body.position, Vec2::new(1.0, 1.0));
        assert_eq!(body.inverse_mass(), 0.0);
    }

    #[test]
    fn test_semi_implicit_euler() {
        let mut body = Body::new().with_mass(2.0);
        body.add_force(Vec2::new(4.0, 0.0));
        body.integrate(0.5);

        // a = 2, v = 1, p = v * dt using the updated velocity
        assert_relative_eq!(body.velocity.x, 1.0);
        assert_relative_eq!(body.position.x, 0.5);
        assert_eq!(body.force, Vec2::zeros());
    }
}
