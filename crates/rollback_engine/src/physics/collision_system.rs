//! Narrow-phase overlap tests and contact edge tracking
//!
//! The broad phase hands over candidate [`ColliderPair`]s. For each one the
//! narrow phase asks [`is_contact`] whether the shapes touch right now, and
//! [`OverlapTracker`] turns that into enter/exit edges by remembering which
//! pairs were touching after the previous update.

use std::collections::HashSet;

use crate::foundation::math::Vec2;
use super::collider::{Collider, ColliderHandle, ColliderPair};
use super::collision::primitives;
use super::collision::WorldSpaceShape;

/// Boundary-inclusive shape overlap test in world space
///
/// Polygon and empty shapes never touch anything.
pub fn is_contact(a: &Collider, position_a: Vec2, b: &Collider, position_b: Vec2) -> bool {
    match (a.shape.to_world_space(position_a), b.shape.to_world_space(position_b)) {
        (WorldSpaceShape::Circle(ca), WorldSpaceShape::Circle(cb)) => primitives::circle_circle(&ca, &cb),
        (WorldSpaceShape::Circle(circle), WorldSpaceShape::Rectangle(rect))
        | (WorldSpaceShape::Rectangle(rect), WorldSpaceShape::Circle(circle)) => {
            primitives::circle_rect(&circle, &rect)
        }
        (WorldSpaceShape::Rectangle(ra), WorldSpaceShape::Rectangle(rb)) => primitives::rect_rect(&ra, &rb),
        _ => false,
    }
}

/// Change in a pair's touching state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapEdge {
    /// The pair started touching
    Enter,
    /// The pair stopped touching
    Exit,
}

/// Set of pairs currently touching
///
/// Only membership is queried, so the set's iteration order never influences
/// the simulation.
#[derive(Debug, Clone, Default)]
pub struct OverlapTracker {
    touching: HashSet<ColliderPair>,
}

impl OverlapTracker {
    /// Empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pair's state for this update and report an edge if it changed
    pub fn update(&mut self, pair: ColliderPair, touching_now: bool) -> Option<OverlapEdge> {
        let was_touching = self.touching.contains(&pair);
        match (was_touching, touching_now) {
            (true, false) => {
                self.touching.remove(&pair);
                Some(OverlapEdge::Exit)
            }
            (false, true) => {
                self.touching.insert(pair);
                Some(OverlapEdge::Enter)
            }
            _ => None,
        }
    }

    /// Whether the pair is currently touching
    pub fn contains(&self, pair: &ColliderPair) -> bool {
        self.touching.contains(pair)
    }

    /// Drop every pair that involves `handle`, without reporting an exit
    pub fn forget(&mut self, handle: ColliderHandle) {
        self.touching.retain(|pair| !pair.involves(handle));
    }

    /// Number of touching pairs
    pub fn len(&self) -> usize {
        self.touching.len()
    }

    /// Whether nothing is touching
    pub fn is_empty(&self) -> bool {
        self.touching.is_empty()
    }

    /// Forget all pairs
    pub fn clear(&mut self) {
        self.touching.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::ColliderShape;

    #[test]
    fn test_edges_fire_once_per_episode() {
        let mut tracker = OverlapTracker::new();
        let pair = ColliderPair::new(ColliderHandle::new(0, 0), ColliderHandle::new(1, 0));
        let reversed = ColliderPair::new(pair.b, pair.a);

        assert_eq!(tracker.update(pair, true), Some(OverlapEdge::Enter));
        assert_eq!(tracker.update(reversed, true), None);
        assert_eq!(tracker.update(pair, true), None);
        assert_eq!(tracker.update(reversed, false), Some(OverlapEdge::Exit));
        assert_eq!(tracker.update(pair, false), None);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_forget_drops_pairs_of_destroyed_collider() {
        let mut tracker = OverlapTracker::new();
        let a = ColliderHandle::new(0, 0);
        let b = ColliderHandle::new(1, 0);
        let c = ColliderHandle::new(2, 0);
        tracker.update(ColliderPair::new(a, b), true);
        tracker.update(ColliderPair::new(b, c), true);

        tracker.forget(a);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.contains(&ColliderPair::new(c, b)));
    }

    #[test]
    fn test_is_contact_is_symmetric_for_mixed_shapes() {
        let circle = Collider {
            shape: ColliderShape::circle(1.0),
            ..Collider::default()
        };
        let rect = Collider {
            shape: ColliderShape::rectangle(Vec2::new(2.0, 2.0)),
            ..Collider::default()
        };
        let touching = Vec2::new(2.0, 0.0);
        let apart = Vec2::new(2.5, 0.0);

        assert!(is_contact(&circle, touching, &rect, Vec2::zeros()));
        assert!(is_contact(&rect, Vec2::zeros(), &circle, touching));
        assert!(!is_contact(&circle, apart, &rect, Vec2::zeros()));
        assert!(!is_contact(&Collider::default(), Vec2::zeros(), &circle, Vec2::zeros()));
    }
}
