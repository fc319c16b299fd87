//! Bevy integration: window, camera, and per-particle entities.
//!
//! The headless [`VisualizerContext`] does all simulation; this module
//! only mirrors its state into the ECS. The app inserts a
//! [`Visualizer`] resource before adding [`VisualizerPlugin`].

use bevy::app::AppExit;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::post_process::bloom::{Bloom, BloomCompositeMode, BloomPrefilter};
use bevy::prelude::*;
use bevy::render::view::Hdr;
use bevy::window::WindowResized;

use crate::context::VisualizerContext;

/// Base particle color before emissive scaling.
const PARTICLE_COLOR: Color = Color::srgb(0.4, 0.7, 1.0);
/// Emissive multiplier so loud particles push past 1.0 and bloom.
const EMISSIVE_BOOST: f32 = 6.0;

/// ECS handle to the simulation context.
#[derive(Resource)]
pub struct Visualizer(pub VisualizerContext);

/// Links an entity to one slot of the particle system.
#[derive(Component)]
pub struct ParticleIndex(pub usize);

pub struct VisualizerPlugin;

impl Plugin for VisualizerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_scene).add_systems(
            Update,
            (
                advance_visualizer,
                sync_particle_visuals,
                sync_camera,
                handle_resize,
                teardown_on_exit,
            )
                .chain(),
        );
    }
}

fn setup_scene(
    mut commands: Commands,
    visualizer: Res<Visualizer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let context = &visualizer.0;
    let orbit = context.renderer().orbit();
    let post = context.renderer().post();

    // HDR camera with bloom so emissive particles glow.
    commands.spawn((
        Camera3d::default(),
        Hdr,
        Tonemapping::TonyMcMapface,
        Transform::from_translation(orbit.position()).looking_at(orbit.target, Vec3::Y),
        Bloom {
            intensity: post.bloom_intensity,
            low_frequency_boost: 0.7,
            low_frequency_boost_curvature: 0.95,
            high_pass_frequency: 1.0,
            prefilter: BloomPrefilter {
                threshold: 1.0,
                threshold_softness: 0.5,
            },
            composite_mode: BloomCompositeMode::Additive,
            ..default()
        },
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(8.0, 16.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // One shared sphere mesh; per-particle materials so each can carry
    // its own emissive level.
    let radius = context.particles().config().particle_radius;
    let sphere = meshes.add(Sphere::new(radius));
    for (index, visual) in context.particles().visuals().enumerate() {
        let material = materials.add(StandardMaterial {
            base_color: PARTICLE_COLOR,
            emissive: LinearRgba::BLACK,
            perceptual_roughness: 0.4,
            ..default()
        });
        commands.spawn((
            Mesh3d(sphere.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(visual.position),
            ParticleIndex(index),
        ));
    }
}

fn advance_visualizer(time: Res<Time>, mut visualizer: ResMut<Visualizer>) {
    visualizer.0.tick(time.delta_secs());
}

fn sync_particle_visuals(
    visualizer: Res<Visualizer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut query: Query<(
        &ParticleIndex,
        &mut Transform,
        &MeshMaterial3d<StandardMaterial>,
    )>,
) {
    let particles = visualizer.0.particles();
    let glow = PARTICLE_COLOR.to_linear();
    for (index, mut transform, material_handle) in query.iter_mut() {
        let Some(visual) = particles.visual(index.0) else {
            continue;
        };
        transform.translation = visual.position;
        transform.rotation = visual.rotation;
        transform.scale = Vec3::splat(visual.scale);
        if let Some(material) = materials.get_mut(&material_handle.0) {
            material.emissive = LinearRgba::rgb(
                glow.red * visual.emissive * EMISSIVE_BOOST,
                glow.green * visual.emissive * EMISSIVE_BOOST,
                glow.blue * visual.emissive * EMISSIVE_BOOST,
            );
        }
    }
}

fn sync_camera(
    visualizer: Res<Visualizer>,
    mut query: Query<(&mut Transform, &mut Bloom), With<Camera3d>>,
) {
    let orbit = visualizer.0.renderer().orbit();
    let post = visualizer.0.renderer().post();
    for (mut transform, mut bloom) in query.iter_mut() {
        transform.translation = orbit.position();
        transform.look_at(orbit.target, Vec3::Y);
        bloom.intensity = if post.bloom_enabled {
            post.bloom_intensity
        } else {
            0.0
        };
    }
}

fn handle_resize(
    mut events: EventReader<WindowResized>,
    mut visualizer: ResMut<Visualizer>,
) {
    for event in events.read() {
        visualizer
            .0
            .renderer_mut()
            .resize(event.width as u32, event.height as u32);
    }
}

fn teardown_on_exit(mut events: EventReader<AppExit>, mut visualizer: ResMut<Visualizer>) {
    if events.read().next().is_some() {
        visualizer.0.teardown();
    }
}
