//! Pure force math for the environmental simulation.
//!
//! No ECS, no rapier — plain `Vec3` in, `Vec3` out, so every formula
//! can be unit tested in isolation. [`crate::world::PhysicsWorld`]
//! converts the results into rapier forces before stepping.

use bevy::math::Vec3;

use crate::params::{REFERENCE_PRESSURE, REFERENCE_TEMPERATURE, STANDARD_GRAVITY};

/// Softening floor for inverse-square distances. Keeps field forces
/// finite as a body passes through the field center.
pub const MIN_FIELD_DISTANCE: f32 = 0.1;

/// A point source exerting inverse-square force on nearby bodies.
///
/// Positive `strength` attracts toward `position`, negative repels.
/// Fields are append-only on the world; only a full reset removes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceField {
    pub position: Vec3,
    /// Influence radius; bodies farther than this feel nothing.
    pub radius: f32,
    pub strength: f32,
}

/// Linear air drag: `-velocity * coefficient`.
pub fn air_resistance_force(velocity: Vec3, coefficient: f32) -> Vec3 {
    -velocity * coefficient
}

/// Quadratic fluid drag for a sphere of radius `radius`:
/// `-0.5 * density * cd * area * |v| * v`.
pub fn fluid_drag_force(velocity: Vec3, density: f32, drag_coefficient: f32, radius: f32) -> Vec3 {
    let area = std::f32::consts::PI * radius * radius;
    let speed = velocity.length();
    -0.5 * density * drag_coefficient * area * speed * velocity
}

/// Stokes drag, the linear viscous term: `-6π * viscosity * radius * v`.
pub fn viscous_drag_force(velocity: Vec3, viscosity: f32, radius: f32) -> Vec3 {
    -6.0 * std::f32::consts::PI * viscosity * radius * velocity
}

/// Velocity scale factor for thermal agitation.
///
/// `1 + (T - 293.15)/293.15 * 0.1`: warmer than the 20 °C reference
/// speeds bodies up, colder slows them down.
pub fn thermal_velocity_scale(temperature: f32) -> f32 {
    1.0 + (temperature - REFERENCE_TEMPERATURE) / REFERENCE_TEMPERATURE * 0.1
}

/// Vertical buoyancy acceleration from ambient pressure deviation:
/// `(p - 101.325)/101.325 * 9.81` on Y.
pub fn pressure_buoyancy_force(pressure: f32) -> Vec3 {
    let magnitude = (pressure - REFERENCE_PRESSURE) / REFERENCE_PRESSURE * STANDARD_GRAVITY;
    Vec3::new(0.0, magnitude, 0.0)
}

/// Inverse-square force from `field` on a body at `body_position`.
///
/// Magnitude is `strength / d²` with the distance softened to
/// [`MIN_FIELD_DISTANCE`], so the result is finite for any input.
/// Returns zero outside the field radius.
pub fn force_field_force(body_position: Vec3, field: &ForceField) -> Vec3 {
    let offset = field.position - body_position;
    let distance = offset.length();
    if distance > field.radius {
        return Vec3::ZERO;
    }
    radial_pull(body_position, field.position, field.strength)
}

/// Unbounded inverse-square pull toward `center` (used for the global
/// bass attractor, which has no radius cutoff).
pub fn radial_pull(body_position: Vec3, center: Vec3, strength: f32) -> Vec3 {
    let offset = center - body_position;
    let distance = offset.length().max(MIN_FIELD_DISTANCE);
    let direction = offset / distance;
    direction * (strength / (distance * distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_resistance_opposes_velocity() {
        let vel = Vec3::new(3.0, -2.0, 1.0);
        let force = air_resistance_force(vel, 0.5);
        assert_eq!(force, Vec3::new(-1.5, 1.0, -0.5));
    }

    #[test]
    fn test_air_resistance_zero_at_rest() {
        assert_eq!(air_resistance_force(Vec3::ZERO, 10.0), Vec3::ZERO);
    }

    #[test]
    fn test_fluid_drag_is_quadratic_in_speed() {
        let slow = fluid_drag_force(Vec3::new(1.0, 0.0, 0.0), 1000.0, 0.47, 0.1);
        let fast = fluid_drag_force(Vec3::new(2.0, 0.0, 0.0), 1000.0, 0.47, 0.1);
        // Doubling speed quadruples the drag magnitude.
        assert!(
            (fast.length() / slow.length() - 4.0).abs() < 1e-3,
            "expected 4x drag, got {}x",
            fast.length() / slow.length()
        );
    }

    #[test]
    fn test_viscous_drag_is_linear_in_speed() {
        let slow = viscous_drag_force(Vec3::new(1.0, 0.0, 0.0), 0.001, 0.1);
        let fast = viscous_drag_force(Vec3::new(2.0, 0.0, 0.0), 0.001, 0.1);
        assert!((fast.length() / slow.length() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_thermal_scale_identity_at_reference() {
        assert!((thermal_velocity_scale(REFERENCE_TEMPERATURE) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_thermal_scale_warmer_is_faster() {
        assert!(thermal_velocity_scale(350.0) > 1.0);
        assert!(thermal_velocity_scale(250.0) < 1.0);
    }

    #[test]
    fn test_buoyancy_zero_at_reference_pressure() {
        assert_eq!(pressure_buoyancy_force(REFERENCE_PRESSURE), Vec3::ZERO);
    }

    #[test]
    fn test_buoyancy_high_pressure_pushes_up() {
        let force = pressure_buoyancy_force(REFERENCE_PRESSURE * 2.0);
        assert!((force.y - STANDARD_GRAVITY).abs() < 1e-4);
        assert_eq!(force.x, 0.0);
        assert_eq!(force.z, 0.0);
    }

    #[test]
    fn test_field_inverse_square_falloff() {
        let field = ForceField {
            position: Vec3::ZERO,
            radius: 100.0,
            strength: 10.0,
        };
        let near = force_field_force(Vec3::new(2.0, 0.0, 0.0), &field);
        let far = force_field_force(Vec3::new(4.0, 0.0, 0.0), &field);
        // Doubling distance quarters the magnitude.
        assert!(
            (near.length() / far.length() - 4.0).abs() < 1e-3,
            "expected 1/4 falloff, got ratio {}",
            near.length() / far.length()
        );
    }

    #[test]
    fn test_field_force_finite_at_center() {
        let field = ForceField {
            position: Vec3::ZERO,
            radius: 10.0,
            strength: 50.0,
        };
        let force = force_field_force(Vec3::ZERO, &field);
        assert!(force.is_finite(), "force at center must not be NaN/inf");
        let near_center = force_field_force(Vec3::new(1e-6, 0.0, 0.0), &field);
        assert!(near_center.is_finite());
    }

    #[test]
    fn test_field_force_zero_outside_radius() {
        let field = ForceField {
            position: Vec3::ZERO,
            radius: 1.0,
            strength: 50.0,
        };
        assert_eq!(force_field_force(Vec3::new(5.0, 0.0, 0.0), &field), Vec3::ZERO);
    }

    #[test]
    fn test_field_attracts_toward_center() {
        let field = ForceField {
            position: Vec3::ZERO,
            radius: 10.0,
            strength: 1.0,
        };
        let force = force_field_force(Vec3::new(3.0, 0.0, 0.0), &field);
        assert!(force.x < 0.0, "positive strength should pull inward");
    }

    #[test]
    fn test_negative_strength_repels() {
        let field = ForceField {
            position: Vec3::ZERO,
            radius: 10.0,
            strength: -1.0,
        };
        let force = force_field_force(Vec3::new(3.0, 0.0, 0.0), &field);
        assert!(force.x > 0.0, "negative strength should push outward");
    }
}
