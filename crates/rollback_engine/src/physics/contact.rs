//! Contact generation and resolution
//!
//! A [`Contact`] describes how two touching colliders overlap: the unit
//! normal pointing from B towards A and the penetration depth along it.
//! Resolution applies a restitution impulse and then pushes the bodies apart
//! in proportion to their inverse masses. Static bodies are never changed.
//!
//! Friction is stored on colliders but not applied here.

use crate::foundation::math::{Vec2, Vec2Ext, UP};
use super::body::{Body, BodyType};
use super::collider::Collider;
use super::collision::primitives::closest_point_on_rect;
use super::collision::{Circle, Rect, WorldSpaceShape};

/// Contact between two colliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from B towards A
    pub normal: Vec2,
    /// Overlap depth along the normal
    pub penetration: f32,
    /// Mass-weighted restitution of the pair
    pub restitution: f32,
}

impl Contact {
    /// Build the contact between `a` (owned by `body_a`) and `b` (owned by `body_b`)
    ///
    /// Returns `None` for shape combinations without a contact routine
    /// (anything involving a polygon or an empty shape).
    pub fn between(a: &Collider, body_a: &Body, b: &Collider, body_b: &Body) -> Option<Self> {
        let shape_a = a.shape.to_world_space(body_a.position);
        let shape_b = b.shape.to_world_space(body_b.position);
        let (normal, penetration) = match (shape_a, shape_b) {
            (WorldSpaceShape::Circle(ca), WorldSpaceShape::Circle(cb)) => circle_circle(&ca, &cb),
            (WorldSpaceShape::Circle(circle), WorldSpaceShape::Rectangle(rect)) => {
                circle_rect(&circle, &rect)
            }
            (WorldSpaceShape::Rectangle(_), WorldSpaceShape::Circle(_)) => {
                return Self::between(b, body_b, a, body_a).map(Self::flipped);
            }
            (WorldSpaceShape::Rectangle(ra), WorldSpaceShape::Rectangle(rb)) => rect_rect(&ra, &rb),
            _ => return None,
        };

        let restitution = (a.restitution * body_a.mass + b.restitution * body_b.mass)
            / (body_a.mass + body_b.mass);

        Some(Self {
            normal,
            penetration,
            restitution,
        })
    }

    /// The same contact seen from the other body
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }

    /// Speed at which the bodies move apart along the normal
    pub fn separating_velocity(&self, body_a: &Body, body_b: &Body) -> f32 {
        (body_a.velocity - body_b.velocity).dot(&self.normal)
    }

    /// Apply the restitution impulse and the positional correction
    pub fn resolve(&self, body_a: &mut Body, body_b: &mut Body) {
        self.resolve_velocity(body_a, body_b);
        self.resolve_interpenetration(body_a, body_b);
    }

    fn resolve_velocity(&self, body_a: &mut Body, body_b: &mut Body) {
        let separating = self.separating_velocity(body_a, body_b);
        if separating >= 0.0 {
            return;
        }

        let total_inverse_mass = body_a.inverse_mass() + body_b.inverse_mass();
        if total_inverse_mass <= 0.0 {
            return;
        }

        let new_separating = -separating * self.restitution;
        let impulse = (new_separating - separating) / total_inverse_mass;
        let impulse_per_inverse_mass = self.normal * impulse;

        // Against a static body the dynamic one takes the whole change
        if body_a.is_dynamic() {
            let mut share = body_a.inverse_mass();
            if body_b.body_type == BodyType::Static {
                share += body_b.inverse_mass();
            }
            body_a.velocity += impulse_per_inverse_mass * share;
        }
        if body_b.is_dynamic() {
            let mut share = body_b.inverse_mass();
            if body_a.body_type == BodyType::Static {
                share += body_a.inverse_mass();
            }
            body_b.velocity -= impulse_per_inverse_mass * share;
        }
    }

    fn resolve_interpenetration(&self, body_a: &mut Body, body_b: &mut Body) {
        if self.penetration <= 0.0 {
            return;
        }

        let total_inverse_mass = body_a.inverse_mass() + body_b.inverse_mass();
        if total_inverse_mass <= 0.0 {
            return;
        }

        let move_per_inverse_mass = self.normal * (self.penetration / total_inverse_mass);
        if body_a.is_dynamic() {
            body_a.position += move_per_inverse_mass * body_a.inverse_mass();
        }
        if body_b.is_dynamic() {
            body_b.position -= move_per_inverse_mass * body_b.inverse_mass();
        }
    }
}

fn circle_circle(a: &Circle, b: &Circle) -> (Vec2, f32) {
    let delta = a.center - b.center;
    let distance = delta.magnitude();
    let normal = delta.checked_normalize().unwrap_or(UP);
    (normal, a.radius + b.radius - distance)
}

fn circle_rect(circle: &Circle, rect: &Rect) -> (Vec2, f32) {
    let closest = closest_point_on_rect(rect, circle.center);
    let delta = circle.center - closest;
    let distance = delta.magnitude();
    let normal = delta.checked_normalize().unwrap_or(UP);
    (normal, circle.radius - distance)
}

fn rect_rect(a: &Rect, b: &Rect) -> (Vec2, f32) {
    let delta = a.center - b.center;
    let overlap_x = a.half_size.x + b.half_size.x - delta.x.abs();
    let overlap_y = a.half_size.y + b.half_size.y - delta.y.abs();
    let sign = |value: f32| if value < 0.0 { -1.0 } else { 1.0 };

    if overlap_x < overlap_y {
        (Vec2::new(sign(delta.x), 0.0), overlap_x)
    } else {
        (Vec2::new(0.0, sign(delta.y)), overlap_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::{ColliderShape, Polygon};
    use approx::assert_relative_eq;

    fn collider(shape: ColliderShape, restitution: f32) -> Collider {
        Collider {
            shape,
            restitution,
            ..Collider::default()
        }
    }

    #[test]
    fn test_dynamic_circle_bounces_off_static_rect() {
        let circle = collider(ColliderShape::circle(1.0), 1.0);
        let floor = collider(ColliderShape::rectangle(Vec2::new(10.0, 2.0)), 1.0);
        let mut ball = Body::new().with_position(Vec2::new(0.0, 1.5));
        ball.set_velocity(Vec2::new(0.0, -4.0));
        let mut ground = Body::new().with_type(BodyType::Static);

        let contact = Contact::between(&circle, &ball, &floor, &ground).unwrap();
        assert_relative_eq!(contact.normal, UP);
        assert_relative_eq!(contact.penetration, 0.5);

        contact.resolve(&mut ball, &mut ground);
        assert_relative_eq!(ball.velocity.y, 4.0);
        // Equal inverse masses: the ball moves half the penetration
        assert_relative_eq!(ball.position.y, 1.75);
        assert_eq!(ground.position, Vec2::zeros());
        assert_eq!(ground.velocity, Vec2::zeros());
    }

    #[test]
    fn test_rect_circle_matches_circle_rect() {
        let circle = collider(ColliderShape::circle(1.0), 0.5);
        let rect = collider(ColliderShape::rectangle(Vec2::new(2.0, 2.0)), 0.5);
        let circle_body = Body::new().with_position(Vec2::new(1.5, 0.0));
        let rect_body = Body::new();

        let forward = Contact::between(&circle, &circle_body, &rect, &rect_body).unwrap();
        let swapped = Contact::between(&rect, &rect_body, &circle, &circle_body).unwrap();
        assert_relative_eq!(forward.normal, Vec2::new(1.0, 0.0));
        assert_relative_eq!(swapped.normal, -forward.normal);
        assert_relative_eq!(swapped.penetration, forward.penetration);
    }

    #[test]
    fn test_circle_inside_rect_uses_up_normal() {
        let circle = collider(ColliderShape::circle(0.5), 0.0);
        let rect = collider(ColliderShape::rectangle(Vec2::new(4.0, 4.0)), 0.0);
        let body = Body::new();

        let contact = Contact::between(&circle, &body, &rect, &body).unwrap();
        assert_eq!(contact.normal, UP);
        assert_relative_eq!(contact.penetration, 0.5);
    }

    #[test]
    fn test_rect_rect_picks_smaller_overlap_axis() {
        let a = collider(ColliderShape::rectangle(Vec2::new(2.0, 2.0)), 0.0);
        let b = collider(ColliderShape::rectangle(Vec2::new(2.0, 2.0)), 0.0);
        let body_a = Body::new().with_position(Vec2::new(-1.5, 0.2));
        let body_b = Body::new();

        let contact = Contact::between(&a, &body_a, &b, &body_b).unwrap();
        assert_relative_eq!(contact.normal, Vec2::new(-1.0, 0.0));
        assert_relative_eq!(contact.penetration, 0.5);
    }

    #[test]
    fn test_separating_bodies_keep_their_velocity() {
        let a = collider(ColliderShape::circle(1.0), 1.0);
        let mut body_a = Body::new().with_position(Vec2::new(1.5, 0.0));
        body_a.set_velocity(Vec2::new(2.0, 0.0));
        let mut body_b = Body::new();

        let contact = Contact::between(&a, &body_a, &a, &body_b).unwrap();
        contact.resolve(&mut body_a, &mut body_b);
        assert_relative_eq!(body_a.velocity, Vec2::new(2.0, 0.0));
        assert_relative_eq!(body_b.velocity, Vec2::zeros());
    }

    #[test]
    fn test_polygon_has_no_contact() {
        let polygon = collider(
            ColliderShape::Polygon(Polygon::new(vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 1.0),
            ])),
            0.0,
        );
        let circle = collider(ColliderShape::circle(1.0), 0.0);
        let body = Body::new();
        assert!(Contact::between(&polygon, &body, &circle, &body).is_none());
    }
}
