//! Rotating kaleidoscope of mirrored radial points.
//!
//! Points are laid out in polar space and folded into one angular
//! wedge, so the pattern mirrors identically across every segment.
//! Internal time advances by `speed` each update and the mid band
//! drives the pattern intensity.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{resolve_color, AudioSlice, Effect, EffectConfig, EffectError, EffectKind};

/// Smoothing factor for the intensity follower.
const INTENSITY_SMOOTHING: f32 = 0.8;
/// Baseline alpha so the pattern stays faintly visible in silence.
const BASE_ALPHA: f32 = 0.3;

/// Number of points folded into the wedge.
const POINT_COUNT: usize = 96;

/// One rendered point of the folded pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KaleidoVertex {
    /// Angle after folding, in `[0, segment_angle / 2]`.
    pub angle: f32,
    /// Distance from center.
    pub radius: f32,
    /// Opacity, fading toward the rim.
    pub alpha: f32,
}

struct SeedPoint {
    base_angle: f32,
    /// Radius as a fraction of the configured outer radius.
    radius_frac: f32,
}

pub struct KaleidoscopeEffect {
    id: String,
    color: [f32; 3],
    segments: usize,
    speed: f32,
    radius: f32,
    time: f32,
    intensity: f32,
    seeds: Vec<SeedPoint>,
    vertices: Vec<KaleidoVertex>,
    disposed: bool,
}

impl KaleidoscopeEffect {
    pub fn from_config(config: &EffectConfig) -> Result<Self, EffectError> {
        if config.params.segments < 2 {
            return Err(EffectError::InvalidParameter {
                id: config.id.clone(),
                message: format!("segments must be >= 2, got {}", config.params.segments),
            });
        }
        if !config.params.speed.is_finite() {
            return Err(EffectError::InvalidParameter {
                id: config.id.clone(),
                message: "speed must be finite".into(),
            });
        }
        let mut rng = match config.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let seeds = (0..POINT_COUNT)
            .map(|_| SeedPoint {
                base_angle: rng.gen_range(0.0..TAU),
                radius_frac: rng.gen_range(0.05..=1.0),
            })
            .collect();
        Ok(Self {
            id: config.id.clone(),
            color: resolve_color(&config.params),
            segments: config.params.segments,
            speed: config.params.speed,
            radius: config.params.radius,
            time: 0.0,
            intensity: 0.0,
            seeds,
            vertices: Vec::with_capacity(POINT_COUNT),
            disposed: false,
        })
    }

    /// Fold an angle into the mirror wedge `[0, segment_angle / 2]`.
    pub fn fold_angle(angle: f32, segment_angle: f32) -> f32 {
        let half = segment_angle / 2.0;
        let within = angle.rem_euclid(segment_angle);
        if within > half {
            segment_angle - within
        } else {
            within
        }
    }

    pub fn vertices(&self) -> &[KaleidoVertex] {
        &self.vertices
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }
}

impl Effect for KaleidoscopeEffect {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> EffectKind {
        EffectKind::Kaleidoscope
    }

    fn update(&mut self, slice: AudioSlice<'_>) {
        if self.disposed {
            return;
        }
        let AudioSlice::Bands(bands) = slice else {
            return;
        };
        self.time += self.speed;
        self.intensity = self.intensity * INTENSITY_SMOOTHING
            + bands.mid() * (1.0 - INTENSITY_SMOOTHING);
        let segment_angle = TAU / self.segments as f32;
        self.vertices.clear();
        for seed in &self.seeds {
            let folded = Self::fold_angle(seed.base_angle + self.time, segment_angle);
            let alpha =
                (1.0 - seed.radius_frac).clamp(0.0, 1.0) * (BASE_ALPHA + self.intensity * 0.7);
            self.vertices.push(KaleidoVertex {
                angle: folded,
                radius: seed.radius_frac * self.radius,
                alpha,
            });
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.seeds.clear();
        self.vertices.clear();
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
