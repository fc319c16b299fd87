//! Frequency-spectrum bar field.

use super::{resolve_color, AudioSlice, Effect, EffectConfig, EffectError, EffectKind};

/// Fraction of the configured height every bar keeps even in silence,
/// so the field never collapses to nothing.
pub const MIN_BAR_FRACTION: f32 = 0.1;

/// A row of bars, each driven by one region of the frequency spectrum.
pub struct SpectrumEffect {
    id: String,
    color: [f32; 3],
    height: f32,
    levels: Vec<f32>,
    disposed: bool,
}

impl SpectrumEffect {
    pub fn from_config(config: &EffectConfig) -> Result<Self, EffectError> {
        if config.params.bars == 0 {
            return Err(EffectError::InvalidParameter {
                id: config.id.clone(),
                message: "bars must be >= 1".into(),
            });
        }
        Ok(Self {
            id: config.id.clone(),
            color: resolve_color(&config.params),
            height: config.params.height,
            levels: vec![config.params.height * MIN_BAR_FRACTION; config.params.bars],
            disposed: false,
        })
    }

    /// Current bar heights.
    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }
}

impl Effect for SpectrumEffect {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> EffectKind {
        EffectKind::Spectrum
    }

    fn update(&mut self, slice: AudioSlice<'_>) {
        if self.disposed {
            return;
        }
        let AudioSlice::Spectrum(frequencies) = slice else {
            return;
        };
        if frequencies.is_empty() {
            return;
        }
        let bars = self.levels.len();
        for (i, level) in self.levels.iter_mut().enumerate() {
            let bin = (i * frequencies.len()) / bars;
            let magnitude = frequencies[bin] / 255.0;
            *level = self.height * magnitude.max(MIN_BAR_FRACTION);
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.levels.clear();
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
