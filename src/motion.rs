use glam::{Mat4, Quat, Vec3};

use crate::collision::{self, Aabb, Obstacle};
use crate::input::{KeyTracker, MOVE_BACK, MOVE_FORWARD, MOVE_LEFT, MOVE_RIGHT};

/// Position and facing of the controlled character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for ModelPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl ModelPose {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Turns the local +Z axis towards `dir` (horizontal only).
    pub fn face(&mut self, dir: Vec3) {
        if dir.x.abs() < 1e-6 && dir.z.abs() < 1e-6 {
            return;
        }
        self.rotation = Quat::from_rotation_y(dir.x.atan2(dir.z));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// No direction key held, nothing tested.
    Idle,
    Moved,
    Blocked,
}

/// Camera-local displacement for the held keys. Not normalized: two keys
/// give a diagonal of length `distance * sqrt(2)`.
pub fn local_displacement(keys: &KeyTracker, distance: f32) -> Vec3 {
    let mut x = 0.0;
    let mut z = 0.0;
    if keys.is_pressed(MOVE_FORWARD) {
        z = -distance;
    }
    if keys.is_pressed(MOVE_BACK) {
        z = distance;
    }
    if keys.is_pressed(MOVE_LEFT) {
        x = -distance;
    }
    if keys.is_pressed(MOVE_RIGHT) {
        x = distance;
    }
    Vec3::new(x, 0.0, z)
}

/// Rotates into world space by the camera orientation and drops the
/// vertical part. The length shrinks when the camera pitches.
pub fn world_displacement(local: Vec3, camera_rotation: Quat) -> Vec3 {
    let mut d = camera_rotation * local;
    d.y = 0.0;
    d
}

/// One frame of keyboard movement with collision against `obstacles`.
///
/// `local_bounds` is the character box in model space. It is placed with the
/// new facing before the test, and the facing is kept even when the move
/// itself is rejected.
pub fn step(
    pose: &mut ModelPose,
    keys: &KeyTracker,
    camera_rotation: Quat,
    distance: f32,
    local_bounds: &Aabb,
    obstacles: &[Obstacle],
) -> MotionOutcome {
    let local = local_displacement(keys, distance);
    if local == Vec3::ZERO {
        return MotionOutcome::Idle;
    }

    let dir = world_displacement(local, camera_rotation);
    pose.face(dir);

    let model_box = local_bounds.transformed(&pose.matrix());
    let candidate = pose.position + dir;
    if collision::is_blocked(&model_box, pose.position, candidate, obstacles) {
        log::debug!("move to {candidate:?} blocked");
        return MotionOutcome::Blocked;
    }
    pose.position = candidate;
    MotionOutcome::Moved
}
