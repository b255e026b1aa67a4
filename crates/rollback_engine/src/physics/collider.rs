//! Colliders attached to bodies

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::foundation::collections::{Handle, Slot};
use super::body::BodyHandle;
use super::collision::{ColliderShape, ShapeType};

/// Handle to a collider stored in a [`World`](super::World)
pub type ColliderHandle = Handle<Collider>;

/// A collision shape owned by a body
///
/// Valid iff its shape is not [`ColliderShape::None`]. Two colliders compare
/// equal when their IDs match, whatever their contents.
#[derive(Debug, Clone)]
pub struct Collider {
    /// Shape relative to the owning body
    pub shape: ColliderShape,
    /// Bounciness in `[0, 1]`
    pub restitution: f32,
    /// Stored for game code; contact resolution does not apply friction
    pub friction: f32,
    /// Identifier unique within a world
    pub id: u32,
    /// Owning body
    pub body: BodyHandle,
    /// Triggers report overlaps but get no physical response
    pub is_trigger: bool,
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            shape: ColliderShape::None,
            restitution: 0.0,
            friction: 0.0,
            id: 0,
            body: BodyHandle::new(u32::MAX, u32::MAX),
            is_trigger: false,
        }
    }
}

impl Collider {
    /// The shape tag
    pub fn shape_type(&self) -> ShapeType {
        self.shape.shape_type()
    }

    /// Whether the collider is in use
    pub fn is_valid(&self) -> bool {
        self.shape_type() != ShapeType::None
    }
}

impl PartialEq for Collider {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Collider {}

impl Slot for Collider {
    fn is_valid(&self) -> bool {
        Collider::is_valid(self)
    }
}

/// Unordered pair of colliders
///
/// `ColliderPair::new(a, b)` and `ColliderPair::new(b, a)` are equal and hash
/// identically. The hash is the wrapping sum of the two handles' hashes; each
/// sub-hash comes from a fixed-key hasher so it is the same on every peer.
#[derive(Debug, Clone, Copy)]
pub struct ColliderPair {
    /// First collider as given
    pub a: ColliderHandle,
    /// Second collider as given
    pub b: ColliderHandle,
}

impl ColliderPair {
    /// Create a pair
    pub fn new(a: ColliderHandle, b: ColliderHandle) -> Self {
        Self { a, b }
    }

    /// Whether `handle` is one side of the pair
    pub fn involves(&self, handle: ColliderHandle) -> bool {
        self.a == handle || self.b == handle
    }

    fn handle_hash(handle: ColliderHandle) -> u64 {
        let mut hasher = DefaultHasher::new();
        handle.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for ColliderPair {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

impl Eq for ColliderPair {}

impl Hash for ColliderPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let combined = Self::handle_hash(self.a).wrapping_add(Self::handle_hash(self.b));
        state.write_u64(combined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pair_is_symmetric() {
        let a = ColliderHandle::new(1, 0);
        let b = ColliderHandle::new(4, 2);

        let mut set = HashSet::new();
        set.insert(ColliderPair::new(a, b));
        assert!(set.contains(&ColliderPair::new(b, a)));
        assert!(!set.insert(ColliderPair::new(b, a)));
        assert!(ColliderPair::new(a, b).involves(b));
    }

    #[test]
    fn test_pair_with_stale_generation_differs() {
        let a = ColliderHandle::new(1, 0);
        let b = ColliderHandle::new(2, 0);
        let b_reused = ColliderHandle::new(2, 1);
        assert_ne!(ColliderPair::new(a, b), ColliderPair::new(a, b_reused));
    }

    #[test]
    fn test_collider_equality_is_by_id() {
        let first = Collider {
            shape: ColliderShape::circle(1.0),
            id: 3,
            ..Collider::default()
        };
        let second = Collider {
            shape: ColliderShape::circle(5.0),
            restitution: 0.5,
            id: 3,
            ..Collider::default()
        };
        assert_eq!(first, second);
        assert!(!Collider::default().is_valid());
    }
}
