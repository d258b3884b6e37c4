use glam::{Mat4, Vec3};

use experience_common::Disposable;

/// Perspective projection parameters. `fov` is vertical, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }
}

/// A camera the stage drives every frame.
pub trait Camera {
    /// Recompute the projection for a new surface aspect ratio.
    fn resize(&mut self, aspect: f32);

    /// Advance controls by `dt` seconds.
    fn update(&mut self, dt: f32);

    fn projection(&self) -> &Projection;

    fn position(&self) -> Vec3;

    fn view_matrix(&self) -> Mat4;

    fn projection_matrix(&self) -> Mat4 {
        self.projection().matrix()
    }

    fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

const MIN_POLAR: f32 = 0.01;
const MAX_POLAR: f32 = std::f32::consts::PI - 0.01;

/// Orbit controls: the camera circles `target`, with optional damping.
///
/// Rotation input accumulates as a pending spherical delta; each update applies
/// `damping_factor` of it (or all of it without damping). Released controls
/// ignore input and stop moving the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub damping: bool,
    pub damping_factor: f32,
    pub sensitivity: f32,
    pending_azimuth: f32,
    pending_polar: f32,
    released: bool,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            damping: true,
            damping_factor: 0.05,
            sensitivity: 0.003,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            released: false,
        }
    }
}

impl OrbitControls {
    /// Queue a rotation from pointer motion in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if self.released {
            return;
        }
        self.pending_azimuth -= dx * self.sensitivity;
        self.pending_polar -= dy * self.sensitivity;
    }

    pub fn is_settled(&self) -> bool {
        self.pending_azimuth.abs() < 1e-6 && self.pending_polar.abs() < 1e-6
    }

    /// Apply pending rotation to `position`, returning the new position.
    pub fn update(&mut self, position: Vec3) -> Vec3 {
        if self.released {
            return position;
        }
        let offset = position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return position;
        }
        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let step = if self.damping { self.damping_factor } else { 1.0 };
        azimuth += self.pending_azimuth * step;
        polar = (polar + self.pending_polar * step).clamp(MIN_POLAR, MAX_POLAR);
        if self.damping {
            self.pending_azimuth *= 1.0 - self.damping_factor;
            self.pending_polar *= 1.0 - self.damping_factor;
        } else {
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
        }

        let sin_polar = polar.sin();
        self.target
            + Vec3::new(
                radius * sin_polar * azimuth.sin(),
                radius * polar.cos(),
                radius * sin_polar * azimuth.cos(),
            )
    }
}

impl Disposable for OrbitControls {
    fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.pending_azimuth = 0.0;
        self.pending_polar = 0.0;
        true
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

/// Perspective camera looking at its orbit target.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub position: Vec3,
    projection: Projection,
    controls: OrbitControls,
}

impl OrbitCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32, position: Vec3) -> Self {
        Self {
            position,
            projection: Projection {
                fov,
                aspect,
                near,
                far,
            },
            controls: OrbitControls::default(),
        }
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }
}

impl Camera for OrbitCamera {
    fn resize(&mut self, aspect: f32) {
        self.projection.aspect = aspect;
    }

    fn update(&mut self, _dt: f32) {
        self.position = self.controls.update(self.position);
    }

    fn projection(&self) -> &Projection {
        &self.projection
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.controls.target, Vec3::Y)
    }
}
