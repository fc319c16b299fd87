//! Declarative physics configuration.
//!
//! A [`PhysicsParameters`] value fully describes a physics world:
//! integration settings plus a set of independently toggleable
//! environmental force categories. The visualizer treats parameter
//! changes as a full world rebuild, so these structs are plain data
//! with no handles into a live simulation.

use bevy::math::Vec3;

/// Reference temperature for thermal scaling (20 °C in Kelvin).
pub const REFERENCE_TEMPERATURE: f32 = 293.15;

/// Reference atmospheric pressure in kPa.
pub const REFERENCE_PRESSURE: f32 = 101.325;

/// Standard gravitational acceleration in m/s².
pub const STANDARD_GRAVITY: f32 = 9.81;

/// Linear drag proportional to velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirResistance {
    pub enabled: bool,
    /// Drag coefficient; force = -velocity * coefficient.
    pub coefficient: f32,
}

impl Default for AirResistance {
    fn default() -> Self {
        Self {
            enabled: false,
            coefficient: 0.5,
        }
    }
}

/// Quadratic fluid drag plus linear viscous drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidEnvironment {
    pub enabled: bool,
    /// Fluid density in kg/m³ (water ≈ 1000, air ≈ 1.2).
    pub density: f32,
    /// Dynamic viscosity in Pa·s.
    pub viscosity: f32,
    /// Drag coefficient for the quadratic term (sphere ≈ 0.47).
    pub drag_coefficient: f32,
}

impl Default for FluidEnvironment {
    fn default() -> Self {
        Self {
            enabled: false,
            density: 1.2,
            viscosity: 0.001,
            drag_coefficient: 0.47,
        }
    }
}

/// Simplified thermal agitation: velocities are scaled each step by a
/// factor derived from the deviation from [`REFERENCE_TEMPERATURE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalEnvironment {
    pub enabled: bool,
    /// Ambient temperature in Kelvin.
    pub temperature: f32,
}

impl Default for ThermalEnvironment {
    fn default() -> Self {
        Self {
            enabled: false,
            temperature: REFERENCE_TEMPERATURE,
        }
    }
}

/// Simplified pressure-driven buoyancy on the Y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureEnvironment {
    pub enabled: bool,
    /// Ambient pressure in kPa.
    pub pressure: f32,
}

impl Default for PressureEnvironment {
    fn default() -> Self {
        Self {
            enabled: false,
            pressure: REFERENCE_PRESSURE,
        }
    }
}

/// Complete configuration for a [`crate::PhysicsWorld`].
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsParameters {
    /// Gravity vector applied by the integrator.
    pub gravity: Vec3,
    /// Fixed timestep per `step()` call.
    pub timestep: f32,
    /// Solver iteration count for the constraint solver.
    pub solver_iterations: usize,
    /// Collider friction coefficient.
    pub friction: f32,
    /// Collider restitution coefficient.
    pub restitution: f32,
    pub air_resistance: AirResistance,
    pub fluid: FluidEnvironment,
    pub thermal: ThermalEnvironment,
    pub pressure: PressureEnvironment,
}

impl Default for PhysicsParameters {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -STANDARD_GRAVITY, 0.0),
            timestep: 1.0 / 60.0,
            solver_iterations: 4,
            friction: 0.5,
            restitution: 0.3,
            air_resistance: AirResistance::default(),
            fluid: FluidEnvironment::default(),
            thermal: ThermalEnvironment::default(),
            pressure: PressureEnvironment::default(),
        }
    }
}

impl PhysicsParameters {
    /// True if any environmental force category is enabled.
    pub fn any_environmental(&self) -> bool {
        self.air_resistance.enabled
            || self.fluid.enabled
            || self.thermal.enabled
            || self.pressure.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_disable_all_environmental_forces() {
        let params = PhysicsParameters::default();
        assert!(!params.any_environmental());
    }

    #[test]
    fn test_default_gravity_is_standard() {
        let params = PhysicsParameters::default();
        assert_eq!(params.gravity, Vec3::new(0.0, -9.81, 0.0));
    }

    #[test]
    fn test_enabling_one_category_flags_environmental() {
        let mut params = PhysicsParameters::default();
        params.thermal.enabled = true;
        assert!(params.any_environmental());
    }
}
