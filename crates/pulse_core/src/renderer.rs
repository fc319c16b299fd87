//! Scene rendering state: camera orbit, viewport, post-processing.
//!
//! Holds everything the window-facing layer needs to place the camera
//! and configure bloom each frame, independent of any GPU handle so it
//! can drive tests without a window.

use bevy::math::Vec3;

/// Elevation clamp, just short of the poles to avoid gimbal lock.
const ELEVATION_LIMIT: f32 = 1.4;
const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 100.0;

/// Orbit camera state: spherical coordinates around a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitController {
    pub target: Vec3,
    pub distance: f32,
    /// Horizontal angle (radians).
    pub azimuth: f32,
    /// Vertical angle (radians), clamped to avoid gimbal lock.
    pub elevation: f32,
    /// Idle spin rate (radians per second) scaled by audio energy.
    pub auto_orbit_speed: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 24.0,
            azimuth: 0.0,
            elevation: 0.5,
            auto_orbit_speed: 0.15,
        }
    }
}

impl OrbitController {
    /// Camera position for the current orbit parameters.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn rotate(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.azimuth -= delta_azimuth;
        self.elevation =
            (self.elevation + delta_elevation).clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

/// Post-processing settings consumed by the camera layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostSettings {
    pub bloom_enabled: bool,
    pub bloom_intensity: f32,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            bloom_enabled: true,
            bloom_intensity: 0.3,
        }
    }
}

/// Viewport and camera state for the visualizer scene.
///
/// `update_controls` advances the idle orbit; explicit input goes
/// through the [`OrbitController`] directly. Disposal is terminal and
/// idempotent.
pub struct SceneRenderer {
    width: u32,
    height: u32,
    orbit: OrbitController,
    post: PostSettings,
    frame_count: u64,
    disposed: bool,
}

impl SceneRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            orbit: OrbitController::default(),
            post: PostSettings::default(),
            frame_count: 0,
            disposed: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut OrbitController {
        &mut self.orbit
    }

    pub fn post(&self) -> PostSettings {
        self.post
    }

    pub fn set_bloom(&mut self, enabled: bool, intensity: f32) {
        self.post.bloom_enabled = enabled;
        self.post.bloom_intensity = intensity.max(0.0);
    }

    /// Advance the idle orbit. Audio energy speeds the spin up so the
    /// camera drifts with the music.
    pub fn update_controls(&mut self, dt: f32, audio_energy: f32) {
        if self.disposed {
            return;
        }
        self.orbit.azimuth += self.orbit.auto_orbit_speed * (1.0 + audio_energy) * dt;
    }

    /// Record a presented frame.
    pub fn mark_frame(&mut self) {
        if self.disposed {
            return;
        }
        self.frame_count += 1;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Adopt new surface dimensions. Width and height change together;
    /// zero dimensions are clamped to one pixel.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.disposed {
            return;
        }
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
