use glam::{Quat, Vec3};

use super::clip::BoundClip;
use super::pose::{Accum, Pose, Transform};
use crate::model::Skeleton;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

/// Linear weight ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    elapsed: f32,
    duration: f32,
    from: f32,
    to: f32,
}

impl Fade {
    fn value(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let f = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * f
    }

    fn done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// One playing instance of a clip. Loops forever once started.
#[derive(Debug, Clone)]
pub struct Action {
    clip: BoundClip,
    time: f32,
    weight: f32,
    playing: bool,
    enabled: bool,
    fade: Option<Fade>,
}

impl Action {
    fn new(clip: BoundClip) -> Self {
        Self {
            clip,
            time: 0.0,
            weight: 1.0,
            playing: false,
            enabled: true,
            fade: None,
        }
    }

    fn effective_weight(&self) -> f32 {
        if !self.playing || !self.enabled {
            return 0.0;
        }
        match &self.fade {
            Some(f) => self.weight * f.value(),
            None => self.weight,
        }
    }

    fn advance(&mut self, dt: f32) {
        if !self.playing || !self.enabled {
            return;
        }
        if let Some(fade) = &mut self.fade {
            fade.elapsed += dt;
            if fade.done() {
                let end = fade.to;
                self.fade = None;
                self.weight = end;
                if end <= 0.0 {
                    // faded out: stop contributing until reset
                    self.enabled = false;
                    return;
                }
            }
        }
        self.time += dt;
        if self.clip.duration > 0.0 {
            self.time = self.time.rem_euclid(self.clip.duration);
        } else {
            self.time = 0.0;
        }
    }
}

/// Plays clip actions on one skeleton and blends them by weight.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: Vec<Action>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, clip: BoundClip) -> ActionId {
        self.actions.push(Action::new(clip));
        ActionId(self.actions.len() - 1)
    }

    pub fn play(&mut self, id: ActionId) {
        if let Some(a) = self.actions.get_mut(id.0) {
            a.playing = true;
        }
    }

    /// Back to the start, enabled, full weight, no pending fade.
    pub fn reset(&mut self, id: ActionId) {
        if let Some(a) = self.actions.get_mut(id.0) {
            a.time = 0.0;
            a.enabled = true;
            a.weight = 1.0;
            a.fade = None;
        }
    }

    pub fn fade_in(&mut self, id: ActionId, duration: f32) {
        self.schedule_fade(id, duration, 0.0, 1.0);
    }

    pub fn fade_out(&mut self, id: ActionId, duration: f32) {
        self.schedule_fade(id, duration, 1.0, 0.0);
    }

    fn schedule_fade(&mut self, id: ActionId, duration: f32, from: f32, to: f32) {
        if let Some(a) = self.actions.get_mut(id.0) {
            a.weight = 1.0;
            a.fade = Some(Fade {
                elapsed: 0.0,
                duration,
                from,
                to,
            });
        }
    }

    /// Advances every running action by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for a in &mut self.actions {
            a.advance(dt);
        }
    }

    pub fn weight(&self, id: ActionId) -> f32 {
        self.actions.get(id.0).map_or(0.0, Action::effective_weight)
    }

    pub fn time(&self, id: ActionId) -> f32 {
        self.actions.get(id.0).map_or(0.0, |a| a.time)
    }

    pub fn clip_name(&self, id: ActionId) -> Option<&str> {
        self.actions.get(id.0).map(|a| a.clip.name.as_str())
    }

    /// Blended local pose. Nodes no running action animates keep their rest
    /// transform; a total weight below one is topped up with the rest value.
    pub fn pose(&self, skeleton: &Skeleton) -> Pose {
        if self.actions.is_empty() {
            return skeleton.rest_pose();
        }
        let n = skeleton.len();
        let mut t: Vec<Accum<Vec3>> = skeleton.rest.iter().map(|x| Accum::new(x.translation)).collect();
        let mut r: Vec<Accum<Quat>> = skeleton.rest.iter().map(|x| Accum::new(x.rotation)).collect();
        let mut s: Vec<Accum<Vec3>> = skeleton.rest.iter().map(|x| Accum::new(x.scale)).collect();

        for a in &self.actions {
            let w = a.effective_weight();
            if w <= 0.0 {
                continue;
            }
            for (node, ch) in &a.clip.channels {
                if *node >= n {
                    continue;
                }
                if let Some(v) = ch.translation.as_ref().and_then(|tr| tr.sample(a.time)) {
                    t[*node].add(v, w);
                }
                if let Some(v) = ch.rotation.as_ref().and_then(|tr| tr.sample(a.time)) {
                    r[*node].add(v, w);
                }
                if let Some(v) = ch.scale.as_ref().and_then(|tr| tr.sample(a.time)) {
                    s[*node].add(v, w);
                }
            }
        }

        let locals = skeleton
            .rest
            .iter()
            .enumerate()
            .map(|(i, rest)| Transform {
                translation: t[i].finish(rest.translation),
                rotation: r[i].finish(rest.rotation).normalize(),
                scale: s[i].finish(rest.scale),
            })
            .collect();
        Pose::new(locals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::clip::{Channels, Clip, Track};
    use std::collections::HashMap;

    fn skeleton() -> Skeleton {
        Skeleton::new(vec!["hips".into()], vec![None], vec![Transform::IDENTITY])
    }

    fn slide(name: &str, to: Vec3, duration: f32) -> BoundClip {
        let mut ch = HashMap::new();
        ch.insert(
            "hips".to_string(),
            Channels {
                translation: Some(Track::new(vec![0.0, duration], vec![to, to])),
                ..Default::default()
            },
        );
        Clip::new(name, ch).bind(&skeleton())
    }

    #[test]
    fn idle_mixer_is_rest_pose() {
        let m = AnimationMixer::new();
        assert_eq!(m.pose(&skeleton()), skeleton().rest_pose());
    }

    #[test]
    fn added_action_is_silent_until_played() {
        let mut m = AnimationMixer::new();
        let a = m.add_action(slide("a", Vec3::X, 1.0));
        assert_eq!(m.weight(a), 0.0);
        m.play(a);
        assert_eq!(m.weight(a), 1.0);
        assert_eq!(m.pose(&skeleton()).locals[0].translation, Vec3::X);
    }

    #[test]
    fn crossfade_moves_weight_over_duration() {
        let mut m = AnimationMixer::new();
        let a = m.add_action(slide("a", Vec3::X, 1.0));
        let b = m.add_action(slide("b", Vec3::Z, 1.0));
        m.play(a);

        m.fade_out(a, 0.5);
        m.reset(b);
        m.fade_in(b, 0.5);
        m.play(b);
        assert_eq!(m.weight(a), 1.0);
        assert_eq!(m.weight(b), 0.0);

        m.update(0.25);
        assert!((m.weight(a) - 0.5).abs() < 1e-6);
        assert!((m.weight(b) - 0.5).abs() < 1e-6);
        let p = m.pose(&skeleton()).locals[0].translation;
        assert!((p - Vec3::new(0.5, 0.0, 0.5)).length() < 1e-5);

        m.update(0.25);
        assert_eq!(m.weight(a), 0.0);
        assert_eq!(m.weight(b), 1.0);
        assert_eq!(m.pose(&skeleton()).locals[0].translation, Vec3::Z);
    }

    #[test]
    fn faded_out_action_stops_advancing() {
        let mut m = AnimationMixer::new();
        let a = m.add_action(slide("a", Vec3::X, 10.0));
        m.play(a);
        m.fade_out(a, 0.1);
        m.update(0.2);
        let t = m.time(a);
        m.update(1.0);
        assert_eq!(m.time(a), t);
    }

    #[test]
    fn time_loops() {
        let mut m = AnimationMixer::new();
        let a = m.add_action(slide("a", Vec3::X, 1.0));
        m.play(a);
        m.update(0.75);
        m.update(0.5);
        assert!((m.time(a) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn reset_rewinds() {
        let mut m = AnimationMixer::new();
        let a = m.add_action(slide("a", Vec3::X, 2.0));
        m.play(a);
        m.update(0.5);
        m.reset(a);
        assert_eq!(m.time(a), 0.0);
        assert_eq!(m.clip_name(a), Some("a"));
    }
}
