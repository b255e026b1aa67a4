//! Collider shape abstractions
//!
//! Shapes are stored relative to their owning body and moved to world space
//! on demand during collision tests.

use crate::foundation::math::Vec2;
use super::primitives::{Aabb, Circle, Polygon, Rect};

/// Shape tag of a collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    /// Circle shape
    Circle,
    /// Axis-aligned rectangle
    Rectangle,
    /// Convex polygon (broad phase only)
    Polygon,
    /// No shape; the collider slot is unused
    None,
}

/// Collision shape in body-local coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ColliderShape {
    /// A circle offset from the body position
    Circle(Circle),
    /// A rectangle offset from the body position
    Rectangle(Rect),
    /// A polygon with vertices relative to the body position
    Polygon(Polygon),
    /// No shape
    #[default]
    None,
}

impl ColliderShape {
    /// Circle of `radius` centered on the body
    pub fn circle(radius: f32) -> Self {
        Self::Circle(Circle::new(Vec2::zeros(), radius))
    }

    /// Rectangle of `size` centered on the body
    pub fn rectangle(size: Vec2) -> Self {
        Self::Rectangle(Rect::new(Vec2::zeros(), size))
    }

    /// The shape tag
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Circle(_) => ShapeType::Circle,
            Self::Rectangle(_) => ShapeType::Rectangle,
            Self::Polygon(_) => ShapeType::Polygon,
            Self::None => ShapeType::None,
        }
    }

    /// Move this shape to world space at the body's `position`
    pub fn to_world_space(&self, position: Vec2) -> WorldSpaceShape {
        match self {
            Self::Circle(circle) => WorldSpaceShape::Circle(circle.translated(position)),
            Self::Rectangle(rect) => WorldSpaceShape::Rectangle(rect.translated(position)),
            Self::Polygon(polygon) => WorldSpaceShape::Bounds(polygon.aabb(position)),
            Self::None => WorldSpaceShape::Empty,
        }
    }

    /// World-space bounding box at the body's `position`
    pub fn world_aabb(&self, position: Vec2) -> Option<Aabb> {
        match self {
            Self::Circle(circle) => Some(circle.translated(position).aabb()),
            Self::Rectangle(rect) => Some(rect.translated(position).aabb()),
            Self::Polygon(polygon) => Some(polygon.aabb(position)),
            Self::None => None,
        }
    }
}

/// Temporary world-space shape used during a single collision test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldSpaceShape {
    /// Circle in world space
    Circle(Circle),
    /// Rectangle in world space
    Rectangle(Rect),
    /// Only the bounds are known (polygons)
    Bounds(Aabb),
    /// Nothing to test
    Empty,
}
