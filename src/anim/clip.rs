use std::collections::HashMap;

use glam::{Quat, Vec3};

use super::pose::Blend;
use crate::model::Skeleton;

/// Keyframes of one property. `times` is ascending and as long as `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Track<T> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
}

impl<T: Blend> Track<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>) -> Self {
        Self { times, values }
    }

    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Interpolated value at `t`, clamped to the first/last key.
    pub fn sample(&self, t: f32) -> Option<T> {
        let n = self.times.len().min(self.values.len());
        if n == 0 {
            return None;
        }
        if n == 1 || t <= self.times[0] {
            return Some(self.values[0]);
        }
        if t >= self.times[n - 1] {
            return Some(self.values[n - 1]);
        }
        // first key strictly after t
        let hi = self.times[..n].partition_point(|&k| k <= t);
        let lo = hi - 1;
        let span = self.times[hi] - self.times[lo];
        let f = if span > 0.0 {
            (t - self.times[lo]) / span
        } else {
            0.0
        };
        Some(T::mix(self.values[lo], self.values[hi], f))
    }
}

/// Animated properties of one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channels {
    pub translation: Option<Track<Vec3>>,
    pub rotation: Option<Track<Quat>>,
    pub scale: Option<Track<Vec3>>,
}

impl Channels {
    fn end_time(&self) -> f32 {
        let t = self.translation.as_ref().map_or(0.0, Track::end_time);
        let r = self.rotation.as_ref().map_or(0.0, Track::end_time);
        let s = self.scale.as_ref().map_or(0.0, Track::end_time);
        t.max(r).max(s)
    }
}

/// Clip as read from a file: channels keyed by node name, so clips exported
/// separately from the character can be played on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    pub duration: f32,
    pub channels: HashMap<String, Channels>,
}

impl Clip {
    pub fn new(name: impl Into<String>, channels: HashMap<String, Channels>) -> Self {
        let duration = channels
            .values()
            .map(Channels::end_time)
            .fold(0.0, f32::max);
        Self {
            name: name.into(),
            duration,
            channels,
        }
    }

    /// Resolves node names against `skeleton`. Unknown nodes are dropped.
    pub fn bind(&self, skeleton: &Skeleton) -> BoundClip {
        let mut channels = Vec::with_capacity(self.channels.len());
        let mut missing = 0usize;
        for (name, ch) in &self.channels {
            match skeleton.find(name) {
                Some(node) => channels.push((node, ch.clone())),
                None => missing += 1,
            }
        }
        if missing > 0 {
            log::debug!(
                "clip '{}': {} of {} channels target unknown nodes",
                self.name,
                missing,
                self.channels.len()
            );
        }
        channels.sort_by_key(|(node, _)| *node);
        BoundClip {
            name: self.name.clone(),
            duration: self.duration,
            channels,
        }
    }
}

/// Clip resolved to skeleton node indices.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<(usize, Channels)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::pose::Transform;

    fn ramp() -> Track<Vec3> {
        Track::new(vec![0.0, 1.0, 3.0], vec![Vec3::ZERO, Vec3::X, Vec3::X * 5.0])
    }

    #[test]
    fn sample_interpolates_between_keys() {
        let t = ramp();
        assert_eq!(t.sample(0.5), Some(Vec3::X * 0.5));
        assert_eq!(t.sample(2.0), Some(Vec3::X * 3.0));
    }

    #[test]
    fn sample_clamps_outside_range() {
        let t = ramp();
        assert_eq!(t.sample(-1.0), Some(Vec3::ZERO));
        assert_eq!(t.sample(10.0), Some(Vec3::X * 5.0));
        assert_eq!(t.sample(1.0), Some(Vec3::X));
    }

    #[test]
    fn empty_track_has_no_value() {
        let t: Track<Vec3> = Track::new(vec![], vec![]);
        assert_eq!(t.sample(0.0), None);
    }

    #[test]
    fn quat_tracks_slerp() {
        let half = Quat::from_rotation_y(std::f32::consts::PI * 0.5);
        let t = Track::new(vec![0.0, 1.0], vec![Quat::IDENTITY, half]);
        let q = t.sample(0.5).unwrap();
        assert!(q.angle_between(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4)) < 1e-4);
    }

    #[test]
    fn duration_is_longest_track() {
        let mut ch = HashMap::new();
        ch.insert(
            "hips".to_string(),
            Channels {
                translation: Some(ramp()),
                ..Default::default()
            },
        );
        ch.insert(
            "spine".to_string(),
            Channels {
                rotation: Some(Track::new(vec![0.0, 4.5], vec![Quat::IDENTITY; 2])),
                ..Default::default()
            },
        );
        let clip = Clip::new("walk", ch);
        assert_eq!(clip.duration, 4.5);
    }

    #[test]
    fn bind_drops_unknown_nodes() {
        let skel = Skeleton::new(
            vec!["root".into(), "hips".into()],
            vec![None, Some(0)],
            vec![Transform::IDENTITY; 2],
        );
        let mut ch = HashMap::new();
        ch.insert("hips".to_string(), Channels::default());
        ch.insert("tail".to_string(), Channels::default());
        let bound = Clip::new("idle", ch).bind(&skel);
        assert_eq!(bound.channels.len(), 1);
        assert_eq!(bound.channels[0].0, 1);
    }
}
