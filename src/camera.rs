use glam::{Mat3, Mat4, Quat, Vec3};

const MIN_POLAR: f32 = 0.01;
const MAX_POLAR: f32 = std::f32::consts::PI - 0.01;

/// Orbit camera around a target point (spherical coordinates, Y up).
///
/// Left-drag orbits, right-drag pans the target, the wheel zooms.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    /// Azimuth around +Y, 0 looks down -Z.
    pub theta: f32,
    /// Angle from +Y.
    pub phi: f32,

    pub fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,

    pub rotate_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl OrbitCamera {
    pub fn new(position: Vec3, target: Vec3, fov_y_deg: f32, z_near: f32, z_far: f32) -> Self {
        let offset = position - target;
        let radius = offset.length().max(1e-3);
        let theta = offset.x.atan2(offset.z);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos().clamp(MIN_POLAR, MAX_POLAR);
        Self {
            target,
            radius,
            theta,
            phi,
            fov_y: fov_y_deg.to_radians(),
            z_near,
            z_far,
            aspect: 1.0,
            rotate_speed: 0.005,
            min_radius: z_near * 2.0,
            max_radius: z_far * 0.75,
        }
    }

    pub fn position(&self) -> Vec3 {
        let s = self.phi.sin();
        self.target
            + self.radius * Vec3::new(s * self.theta.sin(), self.phi.cos(), s * self.theta.cos())
    }

    /// Orientation with the camera looking down its local -Z, +Y up.
    pub fn rotation(&self) -> Quat {
        let back = (self.position() - self.target).normalize_or_zero();
        let mut right = Vec3::Y.cross(back);
        if right.length_squared() < 1e-8 {
            right = Vec3::X;
        }
        let right = right.normalize();
        let up = back.cross(right);
        Quat::from_mat3(&Mat3::from_cols(right, up, back)).normalize()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = (width.max(1) as f32) / (height.max(1) as f32);
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.position(), self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }

    /// Mouse drag in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.theta -= dx * self.rotate_speed;
        self.phi = (self.phi - dy * self.rotate_speed).clamp(MIN_POLAR, MAX_POLAR);
    }

    /// Shifts the target in the camera plane, scaled by distance.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let rot = self.rotation();
        let scale = self.radius * 0.001;
        self.target += rot * Vec3::new(-dx * scale, dy * scale, 0.0);
    }

    /// Positive `steps` moves closer.
    pub fn zoom(&mut self, steps: f32) {
        let factor = 0.95_f32.powf(steps);
        self.radius = (self.radius * factor).clamp(self.min_radius, self.max_radius);
    }
}
