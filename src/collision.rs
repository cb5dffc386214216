use glam::{Mat4, Vec3};

/// Axis-aligned bounding box in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box around `points`. `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut b = Aabb::new(first, first);
        for p in it {
            b.min = b.min.min(p);
            b.max = b.max.max(p);
        }
        Some(b)
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// World box of this (local) box after `m`.
    pub fn transformed(&self, m: &Mat4) -> Aabb {
        let pts = self.corners().map(|c| m.transform_point3(c));
        // 8 corners, never empty
        Aabb::from_points(pts).unwrap_or(*self)
    }

    pub fn translated(&self, by: Vec3) -> Aabb {
        Aabb::new(self.min + by, self.max + by)
    }

    /// Touching faces count as overlap.
    pub fn intersects(&self, o: &Aabb) -> bool {
        !(o.max.x < self.min.x
            || o.min.x > self.max.x
            || o.max.y < self.min.y
            || o.min.y > self.max.y
            || o.max.z < self.min.z
            || o.min.z > self.max.z)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Static box obstacle placed once at scene setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub half_extent: Vec3,
}

impl Obstacle {
    pub fn cube(center: Vec3, size: f32) -> Self {
        Self {
            center,
            half_extent: Vec3::splat(size * 0.5),
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_half(self.center, self.half_extent)
    }
}

/// `true` if `model_box` moved from `position` to `candidate` overlaps any
/// obstacle. Obstacle boxes are rebuilt on every call.
pub fn is_blocked(model_box: &Aabb, position: Vec3, candidate: Vec3, obstacles: &[Obstacle]) -> bool {
    let moved = model_box.translated(candidate - position);
    obstacles.iter().any(|o| moved.intersects(&o.aabb()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(c: Vec3) -> Aabb {
        Aabb::from_center_half(c, Vec3::splat(0.5))
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = unit_at(Vec3::ZERO);
        let b = unit_at(Vec3::new(0.75, 0.2, -0.3));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn separated_on_one_axis_is_no_overlap() {
        let a = unit_at(Vec3::ZERO);
        let b = unit_at(Vec3::new(0.0, 0.0, 1.5));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn touching_faces_overlap() {
        let a = unit_at(Vec3::ZERO);
        let b = unit_at(Vec3::new(1.0, 0.0, 0.0));
        assert!(a.intersects(&b));
    }

    #[test]
    fn from_points_bounds_everything() {
        let b = Aabb::from_points([
            Vec3::new(1.0, -2.0, 3.0),
            Vec3::new(-1.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, -5.0),
        ])
        .unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, -5.0));
        assert_eq!(b.max, Vec3::new(1.0, 4.0, 3.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn rotated_box_grows() {
        let b = unit_at(Vec3::ZERO);
        let m = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let r = b.transformed(&m);
        let half_diag = 0.5 * std::f32::consts::SQRT_2;
        assert!((r.max.x - half_diag).abs() < 1e-5);
        assert!((r.max.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn blocked_uses_translated_box() {
        let model = unit_at(Vec3::ZERO);
        let wall = [Obstacle::cube(Vec3::new(0.0, 0.0, -3.0), 2.0)];
        // stays clear
        assert!(!is_blocked(&model, Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), &wall));
        // runs into the wall
        assert!(is_blocked(&model, Vec3::ZERO, Vec3::new(0.0, 0.0, -1.8), &wall));
    }

    #[test]
    fn obstacle_order_does_not_matter() {
        let model = unit_at(Vec3::ZERO);
        let a = Obstacle::cube(Vec3::new(5.0, 0.0, 0.0), 1.0);
        let b = Obstacle::cube(Vec3::new(0.0, 0.0, 2.0), 2.0);
        let to = Vec3::new(0.0, 0.0, 0.6);
        assert_eq!(
            is_blocked(&model, Vec3::ZERO, to, &[a, b]),
            is_blocked(&model, Vec3::ZERO, to, &[b, a])
        );
    }
}
