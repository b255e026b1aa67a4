//! Contact notifications

use super::collider::Collider;

/// Receives overlap edges from [`World::update`](super::World::update)
///
/// Each overlap episode of a pair produces exactly one enter call and, once
/// the pair separates, exactly one exit call. Trigger pairs (either side
/// flagged `is_trigger`) use the trigger callbacks and get no response.
/// Collision callbacks run after the contact has been resolved.
pub trait ContactListener {
    /// A trigger pair started overlapping
    fn on_trigger_enter(&mut self, a: &Collider, b: &Collider);

    /// A trigger pair stopped overlapping
    fn on_trigger_exit(&mut self, a: &Collider, b: &Collider);

    /// A solid pair started touching
    fn on_collision_enter(&mut self, a: &Collider, b: &Collider);

    /// A solid pair stopped touching
    fn on_collision_exit(&mut self, a: &Collider, b: &Collider);
}

/// Listener that ignores every event
///
/// Default listener type of [`World`](super::World). A world only runs its
/// collision phases once a listener is registered, so register this one to
/// get contact response without notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoListener;

impl ContactListener for NoListener {
    fn on_trigger_enter(&mut self, _a: &Collider, _b: &Collider) {}
    fn on_trigger_exit(&mut self, _a: &Collider, _b: &Collider) {}
    fn on_collision_enter(&mut self, _a: &Collider, _b: &Collider) {}
    fn on_collision_exit(&mut self, _a: &Collider, _b: &Collider) {}
}
