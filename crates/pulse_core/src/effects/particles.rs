//! Free-floating band-driven particle field.
//!
//! Unlike the physics-backed particle system, these points never touch
//! the physics world: each axis drifts with a fixed random velocity
//! scaled by one frequency band, and reflects off the boundary box.

use bevy::math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{resolve_color, AudioSlice, Effect, EffectConfig, EffectError, EffectKind};

/// Velocity damping applied on boundary reflection.
const REFLECT_DAMPING: f32 = 0.9;

pub struct ParticleFieldEffect {
    id: String,
    color: [f32; 3],
    size: f32,
    spread: f32,
    sensitivity: f32,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    disposed: bool,
}

impl ParticleFieldEffect {
    pub fn from_config(config: &EffectConfig) -> Result<Self, EffectError> {
        if config.params.count == 0 {
            return Err(EffectError::InvalidParameter {
                id: config.id.clone(),
                message: "count must be >= 1".into(),
            });
        }
        if config.params.spread <= 0.0 {
            return Err(EffectError::InvalidParameter {
                id: config.id.clone(),
                message: format!("spread must be positive, got {}", config.params.spread),
            });
        }
        let mut rng = match config.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let spread = config.params.spread;
        let count = config.params.count;
        let mut positions = Vec::with_capacity(count);
        let mut velocities = Vec::with_capacity(count);
        for _ in 0..count {
            positions.push(Vec3::new(
                rng.gen_range(-spread..=spread),
                rng.gen_range(-spread..=spread),
                rng.gen_range(-spread..=spread),
            ));
            velocities.push(Vec3::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            ));
        }
        Ok(Self {
            id: config.id.clone(),
            color: resolve_color(&config.params),
            size: config.params.size,
            spread,
            sensitivity: config.params.sensitivity,
            positions,
            velocities,
            disposed: false,
        })
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    fn reflect_axis(position: &mut f32, velocity: &mut f32, spread: f32) {
        if position.abs() > spread {
            *position *= -REFLECT_DAMPING;
            *velocity = -*velocity;
        }
    }
}

impl Effect for ParticleFieldEffect {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> EffectKind {
        EffectKind::Particles
    }

    fn update(&mut self, slice: AudioSlice<'_>) {
        if self.disposed {
            return;
        }
        let AudioSlice::Bands(bands) = slice else {
            return;
        };
        // X drifts with bass, Y with mid, Z with presence.
        let drive = Vec3::new(bands.bass(), bands.mid(), bands.presence()) * self.sensitivity;
        for (position, velocity) in self.positions.iter_mut().zip(&mut self.velocities) {
            *position += *velocity * drive;
            Self::reflect_axis(&mut position.x, &mut velocity.x, self.spread);
            Self::reflect_axis(&mut position.y, &mut velocity.y, self.spread);
            Self::reflect_axis(&mut position.z, &mut velocity.z, self.spread);
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.positions.clear();
        self.velocities.clear();
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BandLevels;

    fn config(count: usize, spread: f32) -> EffectConfig {
        let mut config = EffectConfig::new("field", EffectKind::Particles);
        config.params.count = count;
        config.params.spread = spread;
        config.params.seed = Some(42);
        config
    }

    fn loud_bands() -> BandLevels {
        BandLevels::from_levels([1.0; 8])
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(ParticleFieldEffect::from_config(&config(0, 5.0)).is_err());
        assert!(ParticleFieldEffect::from_config(&config(10, 0.0)).is_err());
    }

    #[test]
    fn test_spawns_within_spread() {
        let effect = ParticleFieldEffect::from_config(&config(50, 3.0)).expect("valid config");
        for position in effect.positions() {
            assert!(position.x.abs() <= 3.0);
            assert!(position.y.abs() <= 3.0);
            assert!(position.z.abs() <= 3.0);
        }
    }

    #[test]
    fn test_silence_freezes_the_field() {
        let mut effect = ParticleFieldEffect::from_config(&config(20, 3.0)).expect("valid config");
        let before = effect.positions().to_vec();
        let silent = BandLevels::from_levels([0.0; 8]);
        effect.update(AudioSlice::Bands(&silent));
        assert_eq!(effect.positions(), before.as_slice());
    }

    #[test]
    fn test_band_energy_moves_particles() {
        let mut effect = ParticleFieldEffect::from_config(&config(20, 3.0)).expect("valid config");
        let before = effect.positions().to_vec();
        let bands = loud_bands();
        effect.update(AudioSlice::Bands(&bands));
        let moved = effect
            .positions()
            .iter()
            .zip(&before)
            .filter(|(after, before)| *after != *before)
            .count();
        assert_eq!(moved, 20, "every particle should drift under full-band audio");
    }

    #[test]
    fn test_boundary_reflection_damps_and_inverts() {
        let mut effect = ParticleFieldEffect::from_config(&config(1, 2.0)).expect("valid config");
        effect.positions[0] = Vec3::new(2.5, 0.0, 0.0);
        effect.velocities[0] = Vec3::new(1.0, 0.0, 0.0);
        let bands = loud_bands();
        effect.update(AudioSlice::Bands(&bands));
        // Crossed the +x boundary: position folds back damped, velocity flips.
        assert!(
            (effect.positions[0].x - (-0.9 * 3.5)).abs() < 1e-5,
            "expected damped fold-back, got {}",
            effect.positions[0].x
        );
        assert!((effect.velocities[0].x - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_particles_stay_bounded_over_many_updates() {
        let mut effect = ParticleFieldEffect::from_config(&config(30, 2.0)).expect("valid config");
        let bands = loud_bands();
        for _ in 0..500 {
            effect.update(AudioSlice::Bands(&bands));
        }
        // The fold-back can overshoot by one step at most.
        for position in effect.positions() {
            assert!(position.x.abs() < 2.0 * 2.0);
            assert!(position.y.abs() < 2.0 * 2.0);
            assert!(position.z.abs() < 2.0 * 2.0);
        }
    }

    #[test]
    fn test_dispose_releases_buffers() {
        let mut effect = ParticleFieldEffect::from_config(&config(10, 2.0)).expect("valid config");
        effect.dispose();
        effect.dispose();
        assert!(effect.is_disposed());
        assert!(effect.positions().is_empty());
        let bands = loud_bands();
        effect.update(AudioSlice::Bands(&bands));
        assert!(effect.positions().is_empty());
    }
}
