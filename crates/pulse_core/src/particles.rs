//! Audio-driven particle system.
//!
//! Each particle pairs a visual state (scale, emissive intensity,
//! transform) with a rapier rigid body owned by the shared
//! [`PhysicsWorld`]. Per tick the system maps one frequency bin onto
//! each particle, perturbs the body with a jittered force scaled by
//! that bin, and copies the simulated transform back onto the visual.
//! The plugin layer mirrors the visual state into bevy entities.

use bevy::math::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rapier3d::prelude::RigidBodyHandle;

use pulse_physics::forces::radial_pull;
use pulse_physics::PhysicsWorld;

use crate::audio::AudioFrame;

/// Construction parameters for a [`ParticleSystem`].
#[derive(Debug, Clone)]
pub struct ParticleSystemConfig {
    /// Number of particles to spawn.
    pub count: usize,
    /// Half-extent of the spawn cube around the origin.
    pub spawn_extent: f32,
    /// Maximum magnitude of the randomized initial velocity per axis.
    pub max_initial_speed: f32,
    /// Collider radius per particle.
    pub particle_radius: f32,
    /// Body mass per particle (must be > 0 for a dynamic particle).
    pub particle_mass: f32,
    /// Magnitude of the per-particle jitter force at full bin level.
    pub jitter_strength: f32,
    /// Strength of the global bass attractor toward the origin.
    pub bass_pull_strength: f32,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for ParticleSystemConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            spawn_extent: 10.0,
            max_initial_speed: 1.0,
            particle_radius: 0.15,
            particle_mass: 1.0,
            jitter_strength: 2.0,
            bass_pull_strength: 30.0,
            seed: None,
        }
    }
}

/// Render-facing state of one particle, mirrored into the scene graph
/// by the plugin layer.
#[derive(Debug, Clone, Copy)]
pub struct ParticleVisual {
    pub position: Vec3,
    pub rotation: Quat,
    /// Uniform scale factor, 1.0 at silence up to 3.0 at full level.
    pub scale: f32,
    /// Emissive intensity in [0, 1].
    pub emissive: f32,
}

struct Particle {
    body: RigidBodyHandle,
    visual: ParticleVisual,
}

/// Owns the paired (visual, physics) particle entities.
///
/// Bodies live in the shared [`PhysicsWorld`]; the system is the only
/// mutator of its particles. [`dispose`](Self::dispose) removes every
/// body and is idempotent.
pub struct ParticleSystem {
    particles: Vec<Particle>,
    config: ParticleSystemConfig,
    rng: StdRng,
    disposed: bool,
}

impl ParticleSystem {
    /// Spawn `config.count` particles at randomized positions inside
    /// the spawn cube with randomized initial velocities.
    pub fn initialize(config: ParticleSystemConfig, world: &mut PhysicsWorld) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut particles = Vec::with_capacity(config.count);
        for _ in 0..config.count {
            let extent = config.spawn_extent;
            let position = Vec3::new(
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
            );
            let speed = config.max_initial_speed;
            let velocity = if speed > 0.0 {
                Vec3::new(
                    rng.gen_range(-speed..=speed),
                    rng.gen_range(-speed..=speed),
                    rng.gen_range(-speed..=speed),
                )
            } else {
                Vec3::ZERO
            };
            let body = world.spawn_particle(
                position,
                velocity,
                config.particle_radius,
                config.particle_mass,
            );
            particles.push(Particle {
                body,
                visual: ParticleVisual {
                    position,
                    rotation: Quat::IDENTITY,
                    scale: 1.0,
                    emissive: 0.0,
                },
            });
        }

        Self {
            particles,
            config,
            rng,
            disposed: false,
        }
    }

    /// Per-tick update: map frequency bins onto visuals, apply the
    /// jitter forces, sync transforms back, then apply the global
    /// bass attractor.
    pub fn update(&mut self, frame: &AudioFrame, world: &mut PhysicsWorld) {
        if self.disposed {
            return;
        }
        let count = self.particles.len();
        if count == 0 {
            return;
        }
        let bin_count = frame.frequencies.len();

        for (i, particle) in self.particles.iter_mut().enumerate() {
            let bin_index = (i * bin_count) / count;
            let bin = frame
                .frequencies
                .get(bin_index)
                .copied()
                .unwrap_or(0.0);
            let level = bin / 255.0;

            particle.visual.scale = 1.0 + level * 2.0;
            particle.visual.emissive = level;

            if level > 0.0 && self.config.jitter_strength > 0.0 {
                let jitter = Vec3::new(
                    self.rng.gen_range(-1.0..=1.0),
                    self.rng.gen_range(-1.0..=1.0),
                    self.rng.gen_range(-1.0..=1.0),
                );
                world.apply_force(particle.body, jitter * level * self.config.jitter_strength);
            }

            if let Some(position) = world.body_position(particle.body) {
                particle.visual.position = position;
            }
            if let Some(rotation) = world.body_rotation(particle.body) {
                particle.visual.rotation = rotation;
            }
        }

        // Global radial pull toward the origin, driven by the average
        // of the four lowest frequency bins.
        let bass = frame.bass_bin_average();
        if bass > 0.0 && self.config.bass_pull_strength > 0.0 {
            let strength = self.config.bass_pull_strength * bass;
            for particle in &self.particles {
                let force = radial_pull(particle.visual.position, Vec3::ZERO, strength);
                world.apply_force(particle.body, force);
            }
        }
    }

    /// Register an additional force field on the world.
    ///
    /// Fields are append-only; only a full [`reset`](Self::reset)
    /// (or world reset) clears them.
    pub fn add_force_field(
        &mut self,
        world: &mut PhysicsWorld,
        position: Vec3,
        radius: f32,
        strength: f32,
    ) {
        world.add_force_field(position, radius, strength);
    }

    /// Remove every body from the world and drop visual state.
    /// Safe to call more than once.
    pub fn dispose(&mut self, world: &mut PhysicsWorld) {
        if self.disposed {
            return;
        }
        for particle in self.particles.drain(..) {
            world.remove_body(particle.body);
        }
        self.disposed = true;
    }

    /// Dispose and respawn with the same configuration.
    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        let config = self.config.clone();
        self.dispose(world);
        *self = Self::initialize(config, world);
    }

    pub fn config(&self) -> &ParticleSystemConfig {
        &self.config
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn visuals(&self) -> impl Iterator<Item = &ParticleVisual> {
        self.particles.iter().map(|p| &p.visual)
    }

    pub fn visual(&self, index: usize) -> Option<&ParticleVisual> {
        self.particles.get(index).map(|p| &p.visual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_physics::PhysicsParameters;

    fn test_config(count: usize) -> ParticleSystemConfig {
        ParticleSystemConfig {
            count,
            spawn_extent: 5.0,
            max_initial_speed: 0.0,
            jitter_strength: 0.0,
            bass_pull_strength: 10.0,
            seed: Some(42),
            ..ParticleSystemConfig::default()
        }
    }

    fn zero_gravity_world() -> PhysicsWorld {
        PhysicsWorld::new(PhysicsParameters {
            gravity: Vec3::ZERO,
            ..PhysicsParameters::default()
        })
    }

    #[test]
    fn test_initialize_spawns_inside_cube() {
        let mut world = zero_gravity_world();
        let system = ParticleSystem::initialize(test_config(50), &mut world);
        assert_eq!(system.particle_count(), 50);
        assert_eq!(world.body_count(), 50);
        for visual in system.visuals() {
            assert!(visual.position.abs().max_element() <= 5.0);
            assert_eq!(visual.scale, 1.0);
        }
    }

    #[test]
    fn test_full_spectrum_scales_to_three() {
        let mut world = zero_gravity_world();
        let mut system = ParticleSystem::initialize(test_config(20), &mut world);
        system.update(&AudioFrame::uniform(255.0), &mut world);
        for visual in system.visuals() {
            assert!(
                (visual.scale - 3.0).abs() < 1e-6,
                "scale should be 3.0 at full level, got {}",
                visual.scale
            );
            assert!((visual.emissive - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_silent_frame_leaves_positions_unchanged() {
        let mut world = zero_gravity_world();
        let mut system = ParticleSystem::initialize(test_config(30), &mut world);
        let before: Vec<Vec3> = system.visuals().map(|v| v.position).collect();

        system.update(&AudioFrame::silent(), &mut world);
        world.step();
        system.update(&AudioFrame::silent(), &mut world);

        for (visual, start) in system.visuals().zip(before.iter()) {
            assert!(
                (visual.position - *start).length() < 1e-4,
                "no audio, no gravity: particle should not move"
            );
            assert_eq!(visual.scale, 1.0);
        }
    }

    #[test]
    fn test_bass_pull_draws_particles_inward() {
        let mut world = zero_gravity_world();
        let mut system = ParticleSystem::initialize(test_config(1), &mut world);
        let start = system.visual(0).expect("one particle").position;
        assert!(start.length() > 0.1, "seeded spawn should be off-center");

        let frame = AudioFrame::uniform(255.0);
        assert!((frame.bass_bin_average() - 1.0).abs() < 1e-6);

        for _ in 0..30 {
            system.update(&frame, &mut world);
            world.step();
        }
        let end = system.visual(0).expect("one particle").position;
        assert!(
            end.length() < start.length(),
            "bass pull should draw the particle inward: {} -> {}",
            start.length(),
            end.length()
        );
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut world = zero_gravity_world();
        let mut system = ParticleSystem::initialize(test_config(10), &mut world);
        assert_eq!(world.body_count(), 10);

        system.dispose(&mut world);
        assert_eq!(world.body_count(), 0);
        assert_eq!(system.particle_count(), 0);
        assert!(system.is_disposed());

        // Second dispose must not panic or double-free.
        system.dispose(&mut world);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_update_after_dispose_is_noop() {
        let mut world = zero_gravity_world();
        let mut system = ParticleSystem::initialize(test_config(5), &mut world);
        system.dispose(&mut world);
        system.update(&AudioFrame::uniform(255.0), &mut world);
        assert_eq!(system.particle_count(), 0);
    }
}
