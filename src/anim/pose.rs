use glam::{Mat4, Quat, Vec3};

/// Local translation/rotation/scale of one skeleton node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Local transforms for every node of a skeleton, indexed like the skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub locals: Vec<Transform>,
}

impl Pose {
    pub fn new(locals: Vec<Transform>) -> Self {
        Self { locals }
    }
}

/// Weighted accumulator for one animated property.
///
/// Values are folded in one by one: each new sample is mixed into the running
/// result by `w / (acc + w)`, which gives the normalized weighted average for
/// vectors and an order-stable slerp chain for rotations. Once all actions
/// are in, the leftover weight `1 - acc` goes to the rest value.
#[derive(Debug, Clone, Copy)]
pub struct Accum<T> {
    value: T,
    weight: f32,
}

pub trait Blend: Copy {
    fn mix(a: Self, b: Self, t: f32) -> Self;
}

impl Blend for Vec3 {
    fn mix(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }
}

impl Blend for Quat {
    fn mix(a: Self, b: Self, t: f32) -> Self {
        a.slerp(b, t)
    }
}

impl<T: Blend> Accum<T> {
    pub fn new(rest: T) -> Self {
        Self {
            value: rest,
            weight: 0.0,
        }
    }

    pub fn add(&mut self, v: T, w: f32) {
        if w <= 0.0 {
            return;
        }
        let total = self.weight + w;
        if self.weight == 0.0 {
            self.value = v;
        } else {
            self.value = T::mix(self.value, v, w / total);
        }
        self.weight = total;
    }

    /// Result after topping up with `rest` when the total weight is below one.
    pub fn finish(self, rest: T) -> T {
        if self.weight <= 0.0 {
            rest
        } else if self.weight < 1.0 {
            T::mix(rest, self.value, self.weight)
        } else {
            self.value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_accum_is_rest() {
        let a = Accum::new(Vec3::ZERO);
        assert_eq!(a.finish(Vec3::X), Vec3::X);
    }

    #[test]
    fn full_weight_replaces_rest() {
        let mut a = Accum::new(Vec3::ZERO);
        a.add(Vec3::new(2.0, 0.0, 0.0), 1.0);
        assert_eq!(a.finish(Vec3::ZERO), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn partial_weight_mixes_with_rest() {
        let mut a = Accum::new(Vec3::ZERO);
        a.add(Vec3::new(4.0, 0.0, 0.0), 0.25);
        let v = a.finish(Vec3::ZERO);
        assert!((v.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn two_sources_average_by_weight() {
        let mut a = Accum::new(Vec3::ZERO);
        a.add(Vec3::new(0.0, 0.0, 0.0), 0.5);
        a.add(Vec3::new(2.0, 0.0, 0.0), 0.5);
        let v = a.finish(Vec3::new(100.0, 0.0, 0.0));
        assert!((v.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rotations_slerp() {
        let mut a = Accum::new(Quat::IDENTITY);
        let quarter = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        a.add(quarter, 0.5);
        let q = a.finish(Quat::IDENTITY);
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(q.angle_between(expected) < 1e-4);
    }
}
