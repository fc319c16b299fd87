//! Audio-reactive visual effects.
//!
//! Effects are declared by [`EffectConfig`] values and instantiated by
//! the [`EffectManager`]. Dispatch is by the [`EffectKind`] enum,
//! resolved when the config is parsed — never by runtime name lookup.
//! Each effect owns its visual buffers outright and must release them
//! in `dispose`; the manager disposes the whole active set on every
//! reconfiguration so stale geometry can never accumulate.

use bevy::log::warn;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioFrame, BandLevels};

pub mod kaleidoscope;
pub mod particles;
pub mod spectrum;
pub mod waveform;

pub use kaleidoscope::KaleidoscopeEffect;
pub use particles::ParticleFieldEffect;
pub use spectrum::SpectrumEffect;
pub use waveform::WaveformEffect;

/// The audio data an effect receives each tick, selected by the
/// manager from the effect's kind: waveform effects get time-domain
/// samples, spectrum effects get per-bin magnitudes, the rest get the
/// aggregated band levels.
#[derive(Debug, Clone, Copy)]
pub enum AudioSlice<'a> {
    Waveform(&'a [f32]),
    Spectrum(&'a [f32]),
    Bands(&'a BandLevels),
}

/// Effect variants. Serialized in lowercase to match the declarative
/// configuration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Waveform,
    Spectrum,
    Particles,
    Kaleidoscope,
}

/// Typed parameter bag for all effect variants. Every field has a
/// usable default so configs only name what they change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParams {
    /// Literal RGB color, used when `color_source` is absent or
    /// unknown.
    pub color: [f32; 3],
    /// Named palette entry, resolved over the literal `color`.
    pub color_source: Option<String>,
    /// Waveform/kaleidoscope segment count.
    pub segments: usize,
    /// Waveform height multiplier.
    pub amplitude: f32,
    /// Spectrum bar count.
    pub bars: usize,
    /// Spectrum bar height at full magnitude.
    pub height: f32,
    /// Particle-field particle count (fixed at construction).
    pub count: usize,
    /// Base particle/point size.
    pub size: f32,
    /// Kaleidoscope time advance per update.
    pub speed: f32,
    /// Particle-field boundary half-extent.
    pub spread: f32,
    /// Particle-field band sensitivity.
    pub sensitivity: f32,
    /// Kaleidoscope outer radius.
    pub radius: f32,
    /// Fixed RNG seed for deterministic layouts.
    pub seed: Option<u64>,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            color_source: None,
            segments: 128,
            amplitude: 2.0,
            bars: 32,
            height: 5.0,
            count: 200,
            size: 0.1,
            speed: 0.02,
            spread: 5.0,
            sensitivity: 1.0,
            radius: 4.0,
            seed: None,
        }
    }
}

/// Declarative description of one effect instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub params: EffectParams,
}

fn enabled_default() -> bool {
    true
}

impl EffectConfig {
    pub fn new(id: impl Into<String>, kind: EffectKind) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: true,
            params: EffectParams::default(),
        }
    }
}

/// Effect construction failure. Caught per-effect by the manager;
/// never fatal to the rest of the set.
#[derive(Debug)]
pub enum EffectError {
    /// A parameter value makes the variant unconstructable.
    InvalidParameter { id: String, message: String },
}

impl std::fmt::Display for EffectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectError::InvalidParameter { id, message } => {
                write!(f, "invalid parameters for effect '{}': {}", id, message)
            }
        }
    }
}

impl std::error::Error for EffectError {}

/// Named color palette for `color_source` lookups.
pub fn palette_color(name: &str) -> Option<[f32; 3]> {
    match name {
        "ember" => Some([1.0, 0.35, 0.1]),
        "neon" => Some([0.2, 1.0, 0.6]),
        "ice" => Some([0.5, 0.8, 1.0]),
        "violet" => Some([0.6, 0.2, 1.0]),
        "gold" => Some([1.0, 0.85, 0.3]),
        "magma" => Some([0.9, 0.1, 0.2]),
        _ => None,
    }
}

/// Resolve the effective color: palette entry first, literal fallback.
pub fn resolve_color(params: &EffectParams) -> [f32; 3] {
    params
        .color_source
        .as_deref()
        .and_then(palette_color)
        .unwrap_or(params.color)
}

/// A self-contained audio-reactive visual element.
///
/// `update` mutates only state the effect owns; `dispose` releases it
/// and must be idempotent.
pub trait Effect: Send + Sync {
    fn id(&self) -> &str;
    fn kind(&self) -> EffectKind;
    fn update(&mut self, slice: AudioSlice<'_>);
    fn dispose(&mut self);
    fn is_disposed(&self) -> bool;
}

fn build_effect(config: &EffectConfig) -> Result<Box<dyn Effect>, EffectError> {
    match config.kind {
        EffectKind::Waveform => WaveformEffect::from_config(config).map(|e| Box::new(e) as _),
        EffectKind::Spectrum => SpectrumEffect::from_config(config).map(|e| Box::new(e) as _),
        EffectKind::Particles => {
            ParticleFieldEffect::from_config(config).map(|e| Box::new(e) as _)
        }
        EffectKind::Kaleidoscope => {
            KaleidoscopeEffect::from_config(config).map(|e| Box::new(e) as _)
        }
    }
}

/// Creates and destroys the active effect set from configuration and
/// routes each effect its audio slice every tick.
#[derive(Default)]
pub struct EffectManager {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the active set: one instance per enabled config entry.
    ///
    /// The previous set is disposed first — reconfiguration is
    /// teardown-and-recreate. A config whose effect fails to construct
    /// is logged and skipped; the rest of the set still initializes.
    pub fn configure(&mut self, configs: &[EffectConfig]) {
        self.dispose_all();
        for config in configs {
            if !config.enabled {
                continue;
            }
            match build_effect(config) {
                Ok(effect) => self.effects.push(effect),
                Err(err) => warn!("skipping effect: {}", err),
            }
        }
    }

    /// Feed this tick's frame to every active effect, slicing by kind.
    pub fn update_all(&mut self, frame: &AudioFrame) {
        for effect in &mut self.effects {
            let slice = match effect.kind() {
                EffectKind::Waveform => AudioSlice::Waveform(&frame.waveform),
                EffectKind::Spectrum => AudioSlice::Spectrum(&frame.frequencies),
                EffectKind::Particles | EffectKind::Kaleidoscope => {
                    AudioSlice::Bands(&frame.bands)
                }
            };
            effect.update(slice);
        }
    }

    /// Dispose and drop every active effect. Idempotent.
    pub fn dispose_all(&mut self) {
        for effect in &mut self.effects {
            effect.dispose();
        }
        self.effects.clear();
    }

    pub fn active_count(&self) -> usize {
        self.effects.len()
    }

    pub fn effects(&self) -> impl Iterator<Item = &dyn Effect> {
        self.effects.iter().map(|e| e.as_ref())
    }
}
