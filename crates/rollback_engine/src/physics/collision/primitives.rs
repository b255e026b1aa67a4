//! Primitive collision shapes and intersection predicates
//!
//! Axis-aligned 2D primitives. Every predicate is boundary-inclusive: shapes
//! that merely touch count as intersecting.

use crate::foundation::math::{Vec2, Vec2Ext};

/// A circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Center position
    pub center: Vec2,
    /// Radius
    pub radius: f32,
}

impl Circle {
    /// Creates a new circle with the given center and radius
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Copy of this circle moved by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.center + offset, self.radius)
    }

    /// Bounding box of the circle
    pub fn aabb(&self) -> Aabb {
        let extent = Vec2::new(self.radius, self.radius);
        Aabb::new(self.center - extent, self.center + extent)
    }
}

/// An axis-aligned rectangle described by center and half-size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Center position
    pub center: Vec2,
    /// Half of the width and height
    pub half_size: Vec2,
}

impl Rect {
    /// Creates a rectangle from its center and full size
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half_size: size * 0.5,
        }
    }

    /// Copy of this rectangle moved by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            center: self.center + offset,
            half_size: self.half_size,
        }
    }

    /// Bounding box of the rectangle
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.center - self.half_size, self.center + self.half_size)
    }
}

/// A convex polygon given by its vertices in counter-clockwise order
///
/// Contributes a bounding box to the broad phase but has no narrow-phase
/// contact routine.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Vertices relative to the owning body
    pub points: Vec<Vec2>,
}

impl Polygon {
    /// Creates a polygon from its vertices
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Signed area (positive for counter-clockwise winding)
    pub fn signed_area(&self) -> f32 {
        let n = self.points.len();
        (0..n)
            .map(|i| self.points[i].perp_dot(&self.points[(i + 1) % n]))
            .sum::<f32>()
            * 0.5
    }

    /// Bounding box of the polygon moved by `offset`
    pub fn aabb(&self, offset: Vec2) -> Aabb {
        let mut points = self.points.iter().map(|p| p + offset);
        let Some(first) = points.next() else {
            return Aabb::new(offset, offset);
        };
        points.fold(Aabb::new(first, first), |acc, p| acc.union(&Aabb::new(p, p)))
    }
}

/// Axis-aligned bounding box by min/max corners
///
/// Unlike [`Rect`] this may be inverted (`min > max`), which the quadtree uses
/// as its "nothing inserted yet" root bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lower-left corner
    pub min: Vec2,
    /// Upper-right corner
    pub max: Vec2,
}

impl Aabb {
    /// Creates a box from its corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Center of the box
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether the two boxes overlap or touch
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Whether `other` lies entirely inside this box
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    /// Smallest box covering both
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// One of the four equal quadrants
    ///
    /// Quadrant layout:
    /// 0: -X, -Y (bottom-left)
    /// 1: +X, -Y (bottom-right)
    /// 2: -X, +Y (top-left)
    /// 3: +X, +Y (top-right)
    pub fn quadrant(&self, index: usize) -> Aabb {
        let center = self.center();
        let (min_x, max_x) = if index & 1 == 0 {
            (self.min.x, center.x)
        } else {
            (center.x, self.max.x)
        };
        let (min_y, max_y) = if index & 2 == 0 {
            (self.min.y, center.y)
        } else {
            (center.y, self.max.y)
        };
        Aabb::new(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
    }
}

/// Circle-circle overlap test
pub fn circle_circle(a: &Circle, b: &Circle) -> bool {
    let radius_sum = a.radius + b.radius;
    (a.center - b.center).magnitude_squared() <= radius_sum * radius_sum
}

/// Point on (or in) the rectangle closest to `point`
pub fn closest_point_on_rect(rect: &Rect, point: Vec2) -> Vec2 {
    let local = point - rect.center;
    let clamped = Vec2::new(
        local.x.clamp(-rect.half_size.x, rect.half_size.x),
        local.y.clamp(-rect.half_size.y, rect.half_size.y),
    );
    rect.center + clamped
}

/// Circle-rectangle overlap test
pub fn circle_rect(circle: &Circle, rect: &Rect) -> bool {
    let closest = closest_point_on_rect(rect, circle.center);
    (circle.center - closest).magnitude_squared() <= circle.radius * circle.radius
}

/// Rectangle-rectangle overlap test
pub fn rect_rect(a: &Rect, b: &Rect) -> bool {
    let delta = a.center - b.center;
    delta.x.abs() <= a.half_size.x + b.half_size.x && delta.y.abs() <= a.half_size.y + b.half_size.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_circles_intersect() {
        let a = Circle::new(Vec2::new(0.0, 0.0), 1.0);
        let b = Circle::new(Vec2::new(2.0, 0.0), 1.0);
        assert!(circle_circle(&a, &b));

        let c = Circle::new(Vec2::new(2.01, 0.0), 1.0);
        assert!(!circle_circle(&a, &c));
    }

    #[test]
    fn test_circle_rect_corner() {
        let rect = Rect::new(Vec2::zeros(), Vec2::new(2.0, 2.0));
        // Corner at (1, 1); circle center at distance sqrt(2) * 0.5 from it
        let near = Circle::new(Vec2::new(1.5, 1.5), 0.75);
        let far = Circle::new(Vec2::new(1.5, 1.5), 0.7);
        assert!(circle_rect(&near, &rect));
        assert!(!circle_rect(&far, &rect));
    }

    #[test]
    fn test_rect_rect_edges_touch() {
        let a = Rect::new(Vec2::zeros(), Vec2::new(2.0, 2.0));
        let b = Rect::new(Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0));
        let c = Rect::new(Vec2::new(2.5, 0.0), Vec2::new(2.0, 2.0));
        assert!(rect_rect(&a, &b));
        assert!(!rect_rect(&a, &c));
    }

    #[test]
    fn test_quadrants_tile_the_box() {
        let aabb = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0));
        assert_eq!(aabb.quadrant(0), Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0)));
        assert_eq!(aabb.quadrant(3), Aabb::new(Vec2::new(2.0, 2.0), Vec2::new(4.0, 4.0)));
        let union = (1..4).fold(aabb.quadrant(0), |acc, i| acc.union(&aabb.quadrant(i)));
        assert_eq!(union, aabb);
    }

    #[test]
    fn test_polygon_area_and_bounds() {
        let square = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ]);
        assert_eq!(square.signed_area(), 4.0);
        let bounds = square.aabb(Vec2::new(1.0, 1.0));
        assert_eq!(bounds, Aabb::new(Vec2::new(1.0, 1.0), Vec2::new(3.0, 3.0)));
    }
}
