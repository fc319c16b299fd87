//! Physics backbone for the audio-reactive particle visualizer.
//!
//! This crate provides:
//! - A rapier-backed [`PhysicsWorld`] with declarative [`PhysicsParameters`]
//! - Toggleable environmental forces (air drag, fluid drag/viscosity,
//!   thermal agitation, pressure buoyancy) as pure math in [`forces`]
//! - Inverse-square [`ForceField`] sources (append-only; cleared by reset)
//! - Contact bookkeeping keyed by unordered body pair in [`collision`]

pub mod collision;
pub mod forces;
pub mod params;
pub mod world;

pub use collision::{CollisionHandler, ContactEvent, ContactEventQueue, ContactRecord, PairKey};
pub use forces::{ForceField, MIN_FIELD_DISTANCE};
pub use params::{
    AirResistance, FluidEnvironment, PhysicsParameters, PressureEnvironment, ThermalEnvironment,
    REFERENCE_PRESSURE, REFERENCE_TEMPERATURE, STANDARD_GRAVITY,
};
pub use world::PhysicsWorld;
