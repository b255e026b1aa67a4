//! Physics world
//!
//! Owns the body and collider stores, the broad-phase quadtree and the set of
//! touching pairs. [`World::update`] integrates every valid body and, once a
//! contact listener is registered, runs the collision phases:
//!
//! 1. Broad phase: rebuild the quadtree from the colliders whose body is valid
//!    and collect candidate pairs.
//! 2. Narrow phase: test each candidate, resolve new or ended solid contacts
//!    and report enter/exit edges to the listener.
//!
//! Everything iterates in slot order, so two worlds fed the same calls end up
//! bit-identical.
//!
//! Edges are only evaluated for broad-phase candidates. A touching pair whose
//! colliders end up in sibling quadrants is no longer a candidate, so its exit
//! is not reported until the pair becomes a candidate again. Setting a body's
//! mass to zero frees its slot the same way destroying it does.

use std::ops::{Index, IndexMut};

use crate::core::config::PhysicsConfig;
use crate::foundation::collections::GenArena;
use crate::foundation::math::Vec2;
use crate::foundation::memory::LinearAllocator;
use crate::spatial::QuadTree;
use super::body::{Body, BodyHandle};
use super::collider::{Collider, ColliderHandle, ColliderPair};
use super::collision::ColliderShape;
use super::collision_system::{is_contact, OverlapEdge, OverlapTracker};
use super::contact::Contact;
use super::error::PhysicsError;
use super::listener::{ContactListener, NoListener};

/// Saved simulation state of a [`World`]
///
/// Holds bodies, colliders and the touching-pair set. The registered listener
/// and the broad-phase scratch space are not part of it.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    bodies: GenArena<Body>,
    colliders: GenArena<Collider>,
    overlaps: OverlapTracker,
    next_collider_id: u32,
}

/// The physics world
///
/// Generic over the listener type so the listener is stored inline and a
/// cloned world carries its own listener along.
#[derive(Debug, Clone)]
pub struct World<L = NoListener> {
    config: PhysicsConfig,
    bodies: GenArena<Body>,
    colliders: GenArena<Collider>,
    overlaps: OverlapTracker,
    quadtree: QuadTree,
    listener: Option<L>,
    next_collider_id: u32,
}

impl<L: ContactListener> World<L> {
    /// Create an empty world
    ///
    /// Reserves the quadtree node pool against `config.memory_budget_bytes`.
    pub fn new(config: PhysicsConfig) -> Result<Self, PhysicsError> {
        config
            .validate()
            .map_err(|e| PhysicsError::InvalidConfig(e.to_string()))?;

        let mut allocator = LinearAllocator::new(config.memory_budget_bytes);
        let quadtree = QuadTree::init(&config, &mut allocator)?;
        log::info!(
            "Physics world created: {} slots, quadtree depth {}",
            config.initial_capacity,
            config.max_depth
        );

        Ok(Self {
            bodies: GenArena::with_capacity(config.initial_capacity),
            colliders: GenArena::with_capacity(config.initial_capacity),
            overlaps: OverlapTracker::new(),
            quadtree,
            listener: None,
            next_collider_id: 0,
            config,
        })
    }

    /// The configuration the world was built with
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Claim the first free body slot and fill it with a dynamic unit-mass body
    pub fn create_body(&mut self) -> BodyHandle {
        let handle = self.bodies.claim();
        if let Some(slot) = self.bodies.get_mut(handle) {
            *slot = Body::new();
        }
        handle
    }

    /// Claim the first free body slot and store `body` in it
    ///
    /// A body without positive mass would leave the slot free and its handle
    /// would alias the next one handed out, so it is rejected.
    pub fn create_body_with(&mut self, body: Body) -> Result<BodyHandle, PhysicsError> {
        if !body.is_valid() {
            return Err(PhysicsError::InvalidBody { mass: body.mass });
        }
        let handle = self.bodies.claim();
        if let Some(slot) = self.bodies.get_mut(handle) {
            *slot = body;
        }
        Ok(handle)
    }

    /// Free a body slot; outstanding handles to it go stale
    ///
    /// Colliders attached to the body stay in place but are skipped by the
    /// broad phase until destroyed or re-attached.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<Body, PhysicsError> {
        self.bodies
            .release(handle)
            .ok_or(PhysicsError::StaleBodyHandle(handle))
    }

    /// Claim the first free collider slot and attach `shape` to `body`
    pub fn create_collider(
        &mut self,
        body: BodyHandle,
        shape: ColliderShape,
    ) -> Result<ColliderHandle, PhysicsError> {
        if !self.bodies.contains(body) {
            return Err(PhysicsError::StaleBodyHandle(body));
        }
        let id = self.next_collider_id;
        self.next_collider_id = self.next_collider_id.wrapping_add(1);

        let handle = self.colliders.claim();
        if let Some(slot) = self.colliders.get_mut(handle) {
            *slot = Collider {
                shape,
                id,
                body,
                ..Collider::default()
            };
        }
        Ok(handle)
    }

    /// Free a collider slot and forget its touching pairs without reporting exits
    pub fn destroy_collider(&mut self, handle: ColliderHandle) -> Result<Collider, PhysicsError> {
        let collider = self
            .colliders
            .release(handle)
            .ok_or(PhysicsError::StaleColliderHandle(handle))?;
        self.overlaps.forget(handle);
        Ok(collider)
    }

    /// Body behind `handle`
    pub fn body(&self, handle: BodyHandle) -> Result<&Body, PhysicsError> {
        self.bodies.get(handle).ok_or(PhysicsError::StaleBodyHandle(handle))
    }

    /// Mutable body behind `handle`
    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body, PhysicsError> {
        self.bodies
            .get_mut(handle)
            .ok_or(PhysicsError::StaleBodyHandle(handle))
    }

    /// Collider behind `handle`
    pub fn collider(&self, handle: ColliderHandle) -> Result<&Collider, PhysicsError> {
        self.colliders
            .get(handle)
            .ok_or(PhysicsError::StaleColliderHandle(handle))
    }

    /// Mutable collider behind `handle`
    pub fn collider_mut(&mut self, handle: ColliderHandle) -> Result<&mut Collider, PhysicsError> {
        self.colliders
            .get_mut(handle)
            .ok_or(PhysicsError::StaleColliderHandle(handle))
    }

    /// Accumulate a force on a body for the next update
    pub fn add_force(&mut self, handle: BodyHandle, force: Vec2) -> Result<(), PhysicsError> {
        self.body_mut(handle)?.add_force(force);
        Ok(())
    }

    /// Valid bodies with their handles, in slot order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter()
    }

    /// Valid colliders with their handles, in slot order
    pub fn colliders(&self) -> impl Iterator<Item = (ColliderHandle, &Collider)> {
        self.colliders.iter()
    }

    /// Register the listener; this also enables the collision phases
    pub fn set_contact_listener(&mut self, listener: L) {
        self.listener = Some(listener);
    }

    /// Remove the listener, disabling the collision phases
    pub fn take_contact_listener(&mut self) -> Option<L> {
        self.listener.take()
    }

    /// The registered listener
    pub fn contact_listener(&self) -> Option<&L> {
        self.listener.as_ref()
    }

    /// The registered listener, mutably
    pub fn contact_listener_mut(&mut self) -> Option<&mut L> {
        self.listener.as_mut()
    }

    /// Whether the pair is currently recorded as touching
    pub fn is_touching(&self, a: ColliderHandle, b: ColliderHandle) -> bool {
        self.overlaps.contains(&ColliderPair::new(a, b))
    }

    /// Candidate pairs from the most recent broad phase
    pub fn possible_pairs(&self) -> &[ColliderPair] {
        self.quadtree.possible_pairs()
    }

    /// Advance the simulation by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        for body in self.bodies.iter_mut() {
            body.integrate(delta_time);
        }

        if self.listener.is_none() {
            return;
        }
        self.broad_phase();
        self.narrow_phase();
    }

    fn broad_phase(&mut self) {
        self.quadtree.clear();
        for (handle, collider) in self.colliders.iter() {
            let Some(body) = self.bodies.get(collider.body).filter(|body| body.is_valid()) else {
                continue;
            };
            if let Some(aabb) = collider.shape.world_aabb(body.position) {
                self.quadtree.insert_in_root_node(handle, aabb);
            }
        }
        let pair_count = self.quadtree.build_pairs().len();
        log::trace!("Broad phase produced {} candidate pairs", pair_count);
    }

    fn narrow_phase(&mut self) {
        for index in 0..self.quadtree.possible_pairs().len() {
            let pair = self.quadtree.possible_pairs()[index];
            self.process_pair(pair);
        }
    }

    fn process_pair(&mut self, pair: ColliderPair) {
        let (Some(a), Some(b)) = (self.colliders.get(pair.a), self.colliders.get(pair.b)) else {
            return;
        };
        let (Some(body_a), Some(body_b)) = (self.bodies.get(a.body), self.bodies.get(b.body)) else {
            return;
        };

        let touching = is_contact(a, body_a.position, b, body_b.position);
        let Some(edge) = self.overlaps.update(pair, touching) else {
            return;
        };

        let is_trigger = a.is_trigger || b.is_trigger;
        log::trace!("{:?} edge between colliders {} and {}", edge, a.id, b.id);
        if !is_trigger {
            resolve_contact(&mut self.bodies, a, b);
        }

        let Some(listener) = self.listener.as_mut() else {
            return;
        };
        match (edge, is_trigger) {
            (OverlapEdge::Enter, true) => listener.on_trigger_enter(a, b),
            (OverlapEdge::Exit, true) => listener.on_trigger_exit(a, b),
            (OverlapEdge::Enter, false) => listener.on_collision_enter(a, b),
            (OverlapEdge::Exit, false) => listener.on_collision_exit(a, b),
        }
    }

    /// Capture bodies, colliders and touching pairs
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            bodies: self.bodies.clone(),
            colliders: self.colliders.clone(),
            overlaps: self.overlaps.clone(),
            next_collider_id: self.next_collider_id,
        }
    }

    /// Return to a captured state, keeping the registered listener
    pub fn restore(&mut self, snapshot: &WorldSnapshot) {
        self.bodies.clone_from(&snapshot.bodies);
        self.colliders.clone_from(&snapshot.colliders);
        self.overlaps.clone_from(&snapshot.overlaps);
        self.next_collider_id = snapshot.next_collider_id;
        self.quadtree.clear();
    }
}

fn resolve_contact(bodies: &mut GenArena<Body>, a: &Collider, b: &Collider) {
    let Some((body_a, body_b)) = bodies.get2_mut(a.body, b.body) else {
        return;
    };
    if let Some(contact) = Contact::between(a, body_a, b, body_b) {
        contact.resolve(body_a, body_b);
    }
}

impl<L: ContactListener> Index<BodyHandle> for World<L> {
    type Output = Body;

    /// Panics on a stale handle; use [`World::body`] to handle that case
    fn index(&self, handle: BodyHandle) -> &Body {
        match self.body(handle) {
            Ok(body) => body,
            Err(e) => {
                log::error!("{}", e);
                panic!("{}", e)
            }
        }
    }
}

impl<L: ContactListener> IndexMut<BodyHandle> for World<L> {
    fn index_mut(&mut self, handle: BodyHandle) -> &mut Body {
        match self.body_mut(handle) {
            Ok(body) => body,
            Err(e) => {
                log::error!("{}", e);
                panic!("{}", e)
            }
        }
    }
}

impl<L: ContactListener> Index<ColliderHandle> for World<L> {
    type Output = Collider;

    /// Panics on a stale handle; use [`World::collider`] to handle that case
    fn index(&self, handle: ColliderHandle) -> &Collider {
        match self.collider(handle) {
            Ok(collider) => collider,
            Err(e) => {
                log::error!("{}", e);
                panic!("{}", e)
            }
        }
    }
}

impl<L: ContactListener> IndexMut<ColliderHandle> for World<L> {
    fn index_mut(&mut self, handle: ColliderHandle) -> &mut Collider {
        match self.collider_mut(handle) {
            Ok(collider) => collider,
            Err(e) => {
                log::error!("{}", e);
                panic!("{}", e)
            }
        }
    }
}
