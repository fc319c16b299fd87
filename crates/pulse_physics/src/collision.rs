//! Contact bookkeeping for the physics world.
//!
//! Rapier reports collider begin/end contact events during a step;
//! this module turns them into a queryable map keyed by unordered body
//! pair. The map is the only mutable surface — callers query or clear
//! it, they never hold references into rapier state.

use std::collections::HashMap;
use std::sync::Mutex;

use rapier3d::geometry::{ColliderSet, ContactPair};
use rapier3d::pipeline::EventHandler;
use rapier3d::prelude::{CollisionEvent, RigidBodyHandle, RigidBodySet};

/// Unordered body pair: `PairKey::new(a, b) == PairKey::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey(RigidBodyHandle, RigidBodyHandle);

impl PairKey {
    pub fn new(a: RigidBodyHandle, b: RigidBodyHandle) -> Self {
        if a.into_raw_parts() <= b.into_raw_parts() {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// Active contact between two bodies.
#[derive(Debug, Clone, Copy)]
pub struct ContactRecord {
    pub body_a: RigidBodyHandle,
    pub body_b: RigidBodyHandle,
    /// Relative speed along the contact normal at begin-contact.
    pub impact_speed: f32,
}

/// Begin/end contact state machine over unordered body pairs.
///
/// At most one record exists per pair at any time: a begin-contact
/// event inserts it, the matching end-contact removes it.
#[derive(Debug, Default)]
pub struct CollisionHandler {
    records: HashMap<PairKey, ContactRecord>,
}

impl CollisionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of contact between `a` and `b`.
    pub fn begin_contact(&mut self, a: RigidBodyHandle, b: RigidBodyHandle, impact_speed: f32) {
        self.records.insert(
            PairKey::new(a, b),
            ContactRecord {
                body_a: a,
                body_b: b,
                impact_speed,
            },
        );
    }

    /// Remove the record for `(a, b)`, in either order.
    pub fn end_contact(&mut self, a: RigidBodyHandle, b: RigidBodyHandle) {
        self.records.remove(&PairKey::new(a, b));
    }

    /// Invoke `callback` with the record for `(a, b)` if one exists.
    /// No record is ever created by a query.
    pub fn handle_collision<F>(&self, a: RigidBodyHandle, b: RigidBodyHandle, callback: F)
    where
        F: FnOnce(&ContactRecord),
    {
        if let Some(record) = self.records.get(&PairKey::new(a, b)) {
            callback(record);
        }
    }

    /// Current record for `(a, b)`, if the pair is touching.
    pub fn get(&self, a: RigidBodyHandle, b: RigidBodyHandle) -> Option<&ContactRecord> {
        self.records.get(&PairKey::new(a, b))
    }

    /// Drop every record involving `handle` (body removed outside of
    /// a step, so no end-contact event will arrive for it).
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.records
            .retain(|_, record| record.body_a != handle && record.body_b != handle);
    }

    /// Drop every record (full scene reset).
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A contact transition observed during a physics step, resolved from
/// collider handles to their parent bodies.
#[derive(Debug, Clone, Copy)]
pub enum ContactEvent {
    Started {
        a: RigidBodyHandle,
        b: RigidBodyHandle,
        impact_speed: f32,
    },
    Stopped {
        a: RigidBodyHandle,
        b: RigidBodyHandle,
    },
}

/// Collects rapier collision events during `PhysicsPipeline::step`.
///
/// Rapier calls the handler from inside the step, so the queue is
/// mutex-guarded; the world drains it synchronously right after the
/// step returns.
#[derive(Default)]
pub struct ContactEventQueue {
    events: Mutex<Vec<ContactEvent>>,
}

impl ContactEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all events collected since the last drain.
    pub fn drain(&self) -> Vec<ContactEvent> {
        match self.events.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    }

    fn push(&self, event: ContactEvent) {
        if let Ok(mut queue) = self.events.lock() {
            queue.push(event);
        }
    }
}

fn parent_bodies(
    colliders: &ColliderSet,
    c1: rapier3d::geometry::ColliderHandle,
    c2: rapier3d::geometry::ColliderHandle,
) -> Option<(RigidBodyHandle, RigidBodyHandle)> {
    let a = colliders.get(c1)?.parent()?;
    let b = colliders.get(c2)?.parent()?;
    Some((a, b))
}

impl EventHandler for ContactEventQueue {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        match event {
            CollisionEvent::Started(c1, c2, _) => {
                let Some((a, b)) = parent_bodies(colliders, c1, c2) else {
                    return;
                };
                let relative_velocity = match (bodies.get(a), bodies.get(b)) {
                    (Some(body_a), Some(body_b)) => body_a.linvel() - body_b.linvel(),
                    _ => return,
                };
                // Project onto the contact normal when a manifold is
                // available, otherwise fall back to relative speed.
                let impact_speed = contact_pair
                    .and_then(|pair| pair.manifolds.first())
                    .map(|manifold| relative_velocity.dot(&manifold.data.normal).abs())
                    .unwrap_or_else(|| relative_velocity.norm());
                self.push(ContactEvent::Started { a, b, impact_speed });
            }
            CollisionEvent::Stopped(c1, c2, _) => {
                if let Some((a, b)) = parent_bodies(colliders, c1, c2) {
                    self.push(ContactEvent::Stopped { a, b });
                }
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
        // Contact force events are not subscribed.
    }
}
