//! Rapier-backed physics world for the particle simulation.
//!
//! Owns the complete rapier set bundle and drives it with a fixed
//! timestep. Before each step, enabled environmental forces and all
//! registered force fields are applied to every dynamic body; after
//! the step, collision events are drained into the
//! [`CollisionHandler`] and force accumulators are cleared.

use std::num::NonZeroUsize;

use bevy::math::{Quat, Vec3};
use rapier3d::na::Vector3;
use rapier3d::prelude as rapier;
use rapier3d::prelude::RigidBodyHandle;

use crate::collision::{CollisionHandler, ContactEvent, ContactEventQueue};
use crate::forces::{
    air_resistance_force, fluid_drag_force, force_field_force, pressure_buoyancy_force,
    thermal_velocity_scale, viscous_drag_force, ForceField,
};
use crate::params::PhysicsParameters;

fn to_na(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

fn to_vec3(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// A rigid body world configured from [`PhysicsParameters`].
///
/// Created when the parameters become active and torn down (or
/// [`reset`](Self::reset)) when they change — parameter changes are a
/// full rebuild, never an incremental patch.
pub struct PhysicsWorld {
    params: PhysicsParameters,
    gravity: Vector3<f32>,
    integration_parameters: rapier::IntegrationParameters,
    physics_pipeline: rapier::PhysicsPipeline,
    island_manager: rapier::IslandManager,
    broad_phase: rapier::DefaultBroadPhase,
    narrow_phase: rapier::NarrowPhase,
    rigid_body_set: rapier::RigidBodySet,
    collider_set: rapier::ColliderSet,
    impulse_joint_set: rapier::ImpulseJointSet,
    multibody_joint_set: rapier::MultibodyJointSet,
    ccd_solver: rapier::CCDSolver,
    force_fields: Vec<ForceField>,
    event_queue: ContactEventQueue,
    collisions: CollisionHandler,
}

impl PhysicsWorld {
    pub fn new(params: PhysicsParameters) -> Self {
        let mut integration_parameters = rapier::IntegrationParameters::default();
        integration_parameters.dt = params.timestep;
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(params.solver_iterations).unwrap_or(NonZeroUsize::MIN);

        Self {
            gravity: to_na(params.gravity),
            integration_parameters,
            physics_pipeline: rapier::PhysicsPipeline::new(),
            island_manager: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            rigid_body_set: rapier::RigidBodySet::new(),
            collider_set: rapier::ColliderSet::new(),
            impulse_joint_set: rapier::ImpulseJointSet::new(),
            multibody_joint_set: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            force_fields: Vec::new(),
            event_queue: ContactEventQueue::new(),
            collisions: CollisionHandler::new(),
            params,
        }
    }

    pub fn params(&self) -> &PhysicsParameters {
        &self.params
    }

    /// Spawn a spherical particle body. `mass == 0` produces a fixed
    /// (immovable) body; any positive mass produces a dynamic one.
    pub fn spawn_particle(
        &mut self,
        position: Vec3,
        velocity: Vec3,
        radius: f32,
        mass: f32,
    ) -> RigidBodyHandle {
        let builder = if mass <= 0.0 {
            rapier::RigidBodyBuilder::fixed()
        } else {
            rapier::RigidBodyBuilder::dynamic().linvel(to_na(velocity))
        };
        let body = builder.translation(to_na(position));
        let handle = self.rigid_body_set.insert(body);

        let collider = rapier::ColliderBuilder::ball(radius)
            .friction(self.params.friction)
            .restitution(self.params.restitution)
            .mass(mass.max(0.0))
            .active_events(rapier::ActiveEvents::COLLISION_EVENTS);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Remove a body and its colliders, dropping any contact records
    /// that referenced it.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        // Removal never produces resolvable end-contact events, so
        // scrub stale records directly.
        self.collisions.remove_body(handle);
    }

    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle)
            .map(|body| to_vec3(body.translation()))
    }

    pub fn body_rotation(&self, handle: RigidBodyHandle) -> Option<Quat> {
        self.rigid_body_set.get(handle).map(|body| {
            let rot = body.rotation();
            Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w)
        })
    }

    pub fn body_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle)
            .map(|body| to_vec3(body.linvel()))
    }

    /// Accumulate a force on a body for the next step. The buffer is
    /// cleared after every step.
    pub fn apply_force(&mut self, handle: RigidBodyHandle, force: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_dynamic() {
                body.add_force(to_na(force), true);
            }
        }
    }

    /// Register a force field.
    ///
    /// Fields are append-only: there is no per-field removal, only
    /// [`reset`](Self::reset) clears the list.
    pub fn add_force_field(&mut self, position: Vec3, radius: f32, strength: f32) {
        self.force_fields.push(ForceField {
            position,
            radius,
            strength,
        });
    }

    pub fn force_field_count(&self) -> usize {
        self.force_fields.len()
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn collisions(&self) -> &CollisionHandler {
        &self.collisions
    }

    /// Reset all contact bookkeeping (used on full scene reset).
    pub fn clear_collisions(&mut self) {
        self.collisions.clear();
    }

    /// Advance the world by one configured timestep.
    pub fn step(&mut self) {
        self.apply_environmental_forces();
        self.apply_force_fields();

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &self.event_queue,
        );

        for event in self.event_queue.drain() {
            match event {
                ContactEvent::Started { a, b, impact_speed } => {
                    self.collisions.begin_contact(a, b, impact_speed);
                }
                ContactEvent::Stopped { a, b } => {
                    self.collisions.end_contact(a, b);
                }
            }
        }

        // The force buffer only holds one frame's worth of input.
        for (_, body) in self.rigid_body_set.iter_mut() {
            body.reset_forces(false);
        }
    }

    /// Tear the simulation back to an empty world, keeping parameters.
    pub fn reset(&mut self) {
        *self = Self::new(self.params.clone());
    }

    fn apply_environmental_forces(&mut self) {
        // Disabled categories must cost nothing, hence the early out
        // before touching any body.
        if !self.params.any_environmental() {
            return;
        }
        let air = self.params.air_resistance;
        let fluid = self.params.fluid;
        let thermal = self.params.thermal;
        let pressure = self.params.pressure;

        let collider_set = &self.collider_set;
        for (_, body) in self.rigid_body_set.iter_mut() {
            if !body.is_dynamic() {
                continue;
            }
            let velocity = to_vec3(body.linvel());
            let radius = body
                .colliders()
                .first()
                .and_then(|c| collider_set.get(*c))
                .and_then(|c| c.shape().as_ball())
                .map(|ball| ball.radius)
                .unwrap_or(0.5);

            let mut force = Vec3::ZERO;
            if air.enabled {
                force += air_resistance_force(velocity, air.coefficient);
            }
            if fluid.enabled {
                force += fluid_drag_force(velocity, fluid.density, fluid.drag_coefficient, radius);
                force += viscous_drag_force(velocity, fluid.viscosity, radius);
            }
            if pressure.enabled {
                // Buoyancy is an acceleration; scale by mass so heavy
                // and light bodies rise at the same rate.
                force += pressure_buoyancy_force(pressure.pressure) * body.mass();
            }
            if force != Vec3::ZERO {
                body.add_force(to_na(force), true);
            }
            if thermal.enabled {
                let scaled = velocity * thermal_velocity_scale(thermal.temperature);
                body.set_linvel(to_na(scaled), true);
            }
        }
    }

    fn apply_force_fields(&mut self) {
        if self.force_fields.is_empty() {
            return;
        }
        let fields = &self.force_fields;
        for (_, body) in self.rigid_body_set.iter_mut() {
            if !body.is_dynamic() {
                continue;
            }
            let position = to_vec3(body.translation());
            let mut force = Vec3::ZERO;
            for field in fields {
                force += force_field_force(position, field);
            }
            if force != Vec3::ZERO {
                body.add_force(to_na(force), true);
            }
        }
    }
}
