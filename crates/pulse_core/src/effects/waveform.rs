//! Time-domain waveform ribbon.

use super::{resolve_color, AudioSlice, Effect, EffectConfig, EffectError, EffectKind};

/// A line of evenly spaced segments whose heights trace the current
/// waveform, scaled by the configured amplitude.
pub struct WaveformEffect {
    id: String,
    color: [f32; 3],
    amplitude: f32,
    heights: Vec<f32>,
    disposed: bool,
}

impl WaveformEffect {
    pub fn from_config(config: &EffectConfig) -> Result<Self, EffectError> {
        if config.params.segments < 2 {
            return Err(EffectError::InvalidParameter {
                id: config.id.clone(),
                message: format!("segments must be >= 2, got {}", config.params.segments),
            });
        }
        Ok(Self {
            id: config.id.clone(),
            color: resolve_color(&config.params),
            amplitude: config.params.amplitude,
            heights: vec![0.0; config.params.segments],
            disposed: false,
        })
    }

    /// Per-segment heights, one per configured segment.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }
}

impl Effect for WaveformEffect {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> EffectKind {
        EffectKind::Waveform
    }

    fn update(&mut self, slice: AudioSlice<'_>) {
        if self.disposed {
            return;
        }
        let AudioSlice::Waveform(samples) = slice else {
            return;
        };
        if samples.is_empty() {
            self.heights.fill(0.0);
            return;
        }
        // Uniform resample across the buffer with linear interpolation
        // between neighboring samples.
        let segments = self.heights.len();
        for (i, height) in self.heights.iter_mut().enumerate() {
            let t = i as f32 / (segments - 1) as f32;
            let pos = t * (samples.len() - 1) as f32;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(samples.len() - 1);
            let frac = pos - lo as f32;
            let sample = samples[lo] * (1.0 - frac) + samples[hi] * frac;
            *height = sample * self.amplitude;
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.heights.clear();
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
