use bevy::prelude::*;
use pulse_core::{
    EffectConfig, EffectKind, OscillatorSource, Visualizer, VisualizerConfig, VisualizerContext,
    VisualizerPlugin,
};
use pulse_physics::PhysicsParameters;

fn main() {
    let mut config = VisualizerConfig {
        physics: PhysicsParameters::default(),
        ..Default::default()
    };
    config.particles.count = 1000;

    let mut spectrum = EffectConfig::new("spectrum-main", EffectKind::Spectrum);
    spectrum.params.color_source = Some("neon".into());
    let mut kaleidoscope = EffectConfig::new("kaleidoscope-main", EffectKind::Kaleidoscope);
    kaleidoscope.params.color_source = Some("violet".into());
    config.effects = vec![spectrum, kaleidoscope];

    // Synthetic tone until a capture source is wired in.
    let source = Box::new(OscillatorSource::new(220.0));
    let context = VisualizerContext::init(config, source);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                resolution: (1280, 720).into(),
                title: "Pulse 3D Studio".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(VisualizerPlugin)
        // Dark background so emissive particles read clearly
        .insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.05)))
        .insert_resource(Visualizer(context))
        .run();
}
