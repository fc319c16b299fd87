//! Top-level visualizer lifecycle and per-tick orchestration.
//!
//! [`VisualizerContext`] owns every subsystem and enforces the update
//! order: controls, audio sampling, particle and effect updates,
//! physics step, frame bookkeeping. Teardown is idempotent and a tick
//! after teardown is a no-op, so a late timer callback can never touch
//! freed state.

use bevy::log::info;
use bevy::math::Vec3;

use pulse_physics::{PhysicsParameters, PhysicsWorld};

use crate::audio::{AudioAnalyzer, AudioFrame, SampleSource};
use crate::effects::{EffectConfig, EffectManager};
use crate::particles::{ParticleSystem, ParticleSystemConfig};
use crate::renderer::SceneRenderer;

/// Everything needed to build a [`VisualizerContext`].
pub struct VisualizerConfig {
    pub physics: PhysicsParameters,
    pub particles: ParticleSystemConfig,
    pub effects: Vec<EffectConfig>,
    pub surface_width: u32,
    pub surface_height: u32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsParameters::default(),
            particles: ParticleSystemConfig::default(),
            effects: Vec::new(),
            surface_width: 1280,
            surface_height: 720,
        }
    }
}

pub struct VisualizerContext {
    analyzer: AudioAnalyzer,
    physics: PhysicsWorld,
    particles: ParticleSystem,
    effects: EffectManager,
    renderer: SceneRenderer,
    particle_config: ParticleSystemConfig,
    last_frame: AudioFrame,
    active: bool,
}

impl VisualizerContext {
    /// Build and start every subsystem.
    pub fn init(config: VisualizerConfig, source: Box<dyn SampleSource>) -> Self {
        let analyzer = AudioAnalyzer::new(source);
        let mut physics = PhysicsWorld::new(config.physics);
        let particles = ParticleSystem::initialize(config.particles.clone(), &mut physics);
        let mut effects = EffectManager::new();
        effects.configure(&config.effects);
        let renderer = SceneRenderer::new(config.surface_width, config.surface_height);
        info!(
            "visualizer up: {} particles, {} effects",
            particles.particle_count(),
            effects.active_count()
        );
        Self {
            analyzer,
            physics,
            particles,
            effects,
            renderer,
            particle_config: config.particles,
            last_frame: AudioFrame::silent(),
            active: true,
        }
    }

    /// One simulation tick. No-op once torn down.
    pub fn tick(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        let energy = self.last_frame.bands.energy();
        self.renderer.update_controls(dt, energy);

        let frame = self.analyzer.sample();
        self.particles.update(&frame, &mut self.physics);
        self.effects.update_all(&frame);
        self.physics.step();

        self.renderer.mark_frame();
        self.last_frame = frame;
    }

    /// Replace the physics parameters. The world and every body in it
    /// are rebuilt; particles respawn at fresh positions.
    pub fn set_physics_params(&mut self, params: PhysicsParameters) {
        if !self.active {
            return;
        }
        self.particles.dispose(&mut self.physics);
        self.physics = PhysicsWorld::new(params);
        self.particles =
            ParticleSystem::initialize(self.particle_config.clone(), &mut self.physics);
    }

    /// Replace the active effect set.
    pub fn set_effect_configs(&mut self, configs: &[EffectConfig]) {
        if !self.active {
            return;
        }
        self.effects.configure(configs);
    }

    /// Add a persistent attractor or repulsor to the physics world.
    pub fn add_force_field(&mut self, position: Vec3, radius: f32, strength: f32) {
        if !self.active {
            return;
        }
        self.particles
            .add_force_field(&mut self.physics, position, radius, strength);
    }

    /// Respawn the particle field and clear accumulated world state.
    pub fn reset(&mut self) {
        if !self.active {
            return;
        }
        self.physics.reset();
        self.particles.reset(&mut self.physics);
        self.last_frame = AudioFrame::silent();
    }

    /// Release every subsystem. Idempotent; later ticks do nothing.
    pub fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.effects.dispose_all();
        self.particles.dispose(&mut self.physics);
        self.renderer.dispose();
        self.active = false;
        info!("visualizer torn down");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frame_count(&self) -> u64 {
        self.renderer.frame_count()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.particle_count()
    }

    pub fn last_frame(&self) -> &AudioFrame {
        &self.last_frame
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn effects(&self) -> &EffectManager {
        &self.effects
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut SceneRenderer {
        &mut self.renderer
    }
}
