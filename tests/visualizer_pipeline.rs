//! End-to-end checks of the headless visualizer pipeline: audio frame
//! in, particle and effect state out, lifecycle guarantees throughout.

use bevy::math::Vec3;
use pulse_core::{
    AudioFrame, EffectConfig, EffectKind, OscillatorSource, ParticleSystem, ParticleSystemConfig,
    VisualizerConfig, VisualizerContext,
};
use pulse_physics::{PhysicsParameters, PhysicsWorld};

fn zero_gravity_params() -> PhysicsParameters {
    let mut params = PhysicsParameters::default();
    params.gravity = Vec3::ZERO;
    params
}

fn particle_config(count: usize) -> ParticleSystemConfig {
    let mut config = ParticleSystemConfig::default();
    config.count = count;
    config.seed = Some(99);
    config.max_initial_speed = 0.0;
    config
}

#[test]
fn test_silent_audio_with_no_forces_leaves_particles_still() {
    let mut world = PhysicsWorld::new(zero_gravity_params());
    let mut system = ParticleSystem::initialize(particle_config(200), &mut world);
    let before: Vec<Vec3> = system.visuals().map(|v| v.position).collect();

    let silent = AudioFrame::silent();
    for _ in 0..20 {
        system.update(&silent, &mut world);
        world.step();
    }

    let after: Vec<Vec3> = system.visuals().map(|v| v.position).collect();
    for (a, b) in before.iter().zip(&after) {
        assert!(
            (*a - *b).length() < 1e-4,
            "particle drifted from {:?} to {:?} with no audio and no forces",
            a,
            b
        );
    }
}

#[test]
fn test_full_spectrum_scales_every_particle_to_three() {
    let mut world = PhysicsWorld::new(zero_gravity_params());
    let mut system = ParticleSystem::initialize(particle_config(300), &mut world);

    system.update(&AudioFrame::uniform(255.0), &mut world);

    for visual in system.visuals() {
        assert!(
            (visual.scale - 3.0).abs() < 1e-5,
            "expected scale 3.0 at full magnitude, got {}",
            visual.scale
        );
        assert!((visual.emissive - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_particle_scales_follow_spectrum_shape() {
    let mut world = PhysicsWorld::new(zero_gravity_params());
    let mut system = ParticleSystem::initialize(particle_config(256), &mut world);

    // Loud low bins, silent high bins.
    let mut frame = AudioFrame::silent();
    for bin in frame.frequencies.iter_mut().take(64) {
        *bin = 255.0;
    }
    system.update(&frame, &mut world);

    let first = system.visual(0).expect("particle 0").scale;
    let last = system.visual(255).expect("particle 255").scale;
    assert!((first - 3.0).abs() < 1e-5, "bass-mapped particle should be full size");
    assert!((last - 1.0).abs() < 1e-5, "silent-bin particle should stay base size");
}

#[test]
fn test_context_runs_a_thousand_particle_session() {
    let config = VisualizerConfig {
        physics: PhysicsParameters::default(),
        particles: particle_config(1000),
        effects: vec![
            EffectConfig::new("spectrum", EffectKind::Spectrum),
            EffectConfig::new("wave", EffectKind::Waveform),
        ],
        surface_width: 1280,
        surface_height: 720,
    };
    let mut ctx = VisualizerContext::init(config, Box::new(OscillatorSource::new(330.0)));

    assert_eq!(ctx.particle_count(), 1000);
    assert_eq!(ctx.physics().body_count(), 1000);
    assert_eq!(ctx.effects().active_count(), 2);

    for _ in 0..30 {
        ctx.tick(1.0 / 60.0);
    }
    assert_eq!(ctx.frame_count(), 30);

    // Gravity has been pulling the field down the whole session.
    let mean_y: f32 =
        ctx.particles().visuals().map(|v| v.position.y).sum::<f32>() / 1000.0;
    assert!(mean_y < 0.0, "mean height should drop under gravity, got {}", mean_y);

    ctx.teardown();
    assert_eq!(ctx.physics().body_count(), 0);
}

#[test]
fn test_tick_after_teardown_touches_nothing() {
    let config = VisualizerConfig {
        particles: particle_config(16),
        ..Default::default()
    };
    let mut ctx = VisualizerContext::init(config, Box::new(OscillatorSource::new(440.0)));
    ctx.tick(1.0 / 60.0);
    ctx.teardown();

    let frames = ctx.frame_count();
    for _ in 0..10 {
        ctx.tick(1.0 / 60.0);
    }
    assert_eq!(ctx.frame_count(), frames);
    assert!(!ctx.is_active());
}

#[test]
fn test_physics_reconfigure_preserves_particle_count() {
    let config = VisualizerConfig {
        particles: particle_config(64),
        ..Default::default()
    };
    let mut ctx = VisualizerContext::init(config, Box::new(OscillatorSource::new(440.0)));
    for _ in 0..5 {
        ctx.tick(1.0 / 60.0);
    }

    let mut params = zero_gravity_params();
    params.air_resistance.enabled = true;
    params.air_resistance.coefficient = 0.5;
    ctx.set_physics_params(params);

    assert_eq!(ctx.particle_count(), 64);
    assert_eq!(ctx.physics().body_count(), 64);
    assert!(ctx.physics().params().air_resistance.enabled);

    // The rebuilt world still ticks.
    for _ in 0..5 {
        ctx.tick(1.0 / 60.0);
    }
}

#[test]
fn test_force_field_pulls_field_toward_center() {
    let config = VisualizerConfig {
        physics: zero_gravity_params(),
        particles: particle_config(50),
        ..Default::default()
    };
    let mut ctx = VisualizerContext::init(config, Box::new(OscillatorSource::new(440.0)));
    let start: f32 = ctx
        .particles()
        .visuals()
        .map(|v| v.position.length())
        .sum::<f32>()
        / 50.0;

    ctx.add_force_field(Vec3::ZERO, 50.0, 400.0);
    for _ in 0..120 {
        ctx.tick(1.0 / 60.0);
    }

    let end: f32 = ctx
        .particles()
        .visuals()
        .map(|v| v.position.length())
        .sum::<f32>()
        / 50.0;
    assert!(
        end < start,
        "mean distance should shrink under an attractor: {} -> {}",
        start,
        end
    );
}
