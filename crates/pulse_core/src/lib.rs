//! Core simulation and visuals for Pulse 3D Studio.
//!
//! This crate provides:
//! - FFT audio analysis with banded smoothing
//! - The physics-backed audio-reactive particle system
//! - Declarative visual effects (waveform, spectrum, particles, kaleidoscope)
//! - Scene renderer state (orbit camera, viewport, bloom)
//! - The visualizer lifecycle context and its Bevy plugin

pub mod audio;
pub mod context;
pub mod effects;
pub mod particles;
pub mod plugin;
pub mod renderer;

pub use audio::{
    AudioAnalyzer, AudioError, AudioFrame, BandLevels, OscillatorSource, SampleSource, BAND_NAMES,
    FFT_SIZE, NUM_BANDS,
};
pub use context::{VisualizerConfig, VisualizerContext};
pub use effects::{
    AudioSlice, Effect, EffectConfig, EffectError, EffectKind, EffectManager, EffectParams,
    KaleidoscopeEffect, ParticleFieldEffect, SpectrumEffect, WaveformEffect,
};
pub use particles::{ParticleSystem, ParticleSystemConfig, ParticleVisual};
pub use plugin::{ParticleIndex, Visualizer, VisualizerPlugin};
pub use renderer::{OrbitController, PostSettings, SceneRenderer};
