use std::fmt;

use super::mixer::{ActionId, AnimationMixer};
use crate::input::KeyTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimName {
    Idle,
    Walk,
    Attack1,
    Attack2,
    Defense,
    Emote,
    Kick,
}

impl AnimName {
    pub const ALL: [AnimName; 7] = [
        AnimName::Idle,
        AnimName::Walk,
        AnimName::Attack1,
        AnimName::Attack2,
        AnimName::Defense,
        AnimName::Emote,
        AnimName::Kick,
    ];

    /// Action clips in priority order, each with its trigger key.
    const ACTIONS: [(&'static str, AnimName); 5] = [
        ("q", AnimName::Attack1),
        ("e", AnimName::Attack2),
        ("r", AnimName::Defense),
        ("b", AnimName::Emote),
        ("t", AnimName::Kick),
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnimName::Idle => "idle",
            AnimName::Walk => "walk",
            AnimName::Attack1 => "attack1",
            AnimName::Attack2 => "attack2",
            AnimName::Defense => "defense",
            AnimName::Emote => "emote",
            AnimName::Kick => "kick",
        }
    }
}

impl fmt::Display for AnimName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clip wanted for the current keys: movement, then q, e, r, b, t, else idle.
pub fn select(keys: &KeyTracker) -> AnimName {
    if keys.any_movement() {
        return AnimName::Walk;
    }
    AnimName::ACTIONS
        .iter()
        .find(|(key, _)| keys.is_pressed(key))
        .map_or(AnimName::Idle, |(_, name)| *name)
}

/// Load state of one animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipSlot {
    #[default]
    Loading,
    Ready(ActionId),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Option<AnimName>,
    pub to: AnimName,
}

/// Tracks which clip is active and cross-fades to the one the keys ask for.
#[derive(Debug)]
pub struct AnimationSelector {
    slots: [ClipSlot; 7],
    active: Option<AnimName>,
    previous: Option<AnimName>,
    fade_duration: f32,
}

impl AnimationSelector {
    pub fn new(fade_duration: f32) -> Self {
        Self {
            slots: [ClipSlot::Loading; 7],
            active: None,
            previous: None,
            fade_duration,
        }
    }

    pub fn slot(&self, name: AnimName) -> ClipSlot {
        self.slots[name.index()]
    }

    pub fn set_slot(&mut self, name: AnimName, slot: ClipSlot) {
        self.slots[name.index()] = slot;
    }

    pub fn active(&self) -> Option<AnimName> {
        self.active
    }

    pub fn previous(&self) -> Option<AnimName> {
        self.previous
    }

    fn ready(&self, name: AnimName) -> Option<ActionId> {
        match self.slot(name) {
            ClipSlot::Ready(id) => Some(id),
            _ => None,
        }
    }

    /// Picks the clip for `keys` and starts a cross-fade if it differs from
    /// the active one. A clip that isn't ready yet falls back to idle.
    pub fn evaluate(&mut self, keys: &KeyTracker, mixer: &mut AnimationMixer) -> Option<Transition> {
        let wanted = select(keys);
        let (target, id) = match self.ready(wanted) {
            Some(id) => (wanted, id),
            None => (AnimName::Idle, self.ready(AnimName::Idle)?),
        };
        if self.active == Some(target) {
            return None;
        }

        let from = self.active;
        match from.and_then(|a| self.ready(a)) {
            Some(old) => {
                mixer.fade_out(old, self.fade_duration);
                mixer.reset(id);
                mixer.fade_in(id, self.fade_duration);
                mixer.play(id);
            }
            None => {
                // first clip: starts at full weight
                mixer.reset(id);
                mixer.play(id);
            }
        }
        self.previous = from;
        self.active = Some(target);
        log::debug!(
            "animation {} -> {}",
            from.map_or("none", AnimName::as_str),
            target
        );
        Some(Transition { from, to: target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::clip::Clip;
    use crate::anim::pose::Transform;
    use crate::model::Skeleton;
    use std::collections::HashMap;

    fn keys(pressed: &[&str]) -> KeyTracker {
        let mut k = KeyTracker::default();
        for p in pressed {
            k.set_key(p, true);
        }
        k
    }

    fn loaded(names: &[AnimName]) -> (AnimationSelector, AnimationMixer) {
        let skel = Skeleton::new(vec!["root".into()], vec![None], vec![Transform::IDENTITY]);
        let mut mixer = AnimationMixer::new();
        let mut sel = AnimationSelector::new(0.5);
        for n in names {
            let id = mixer.add_action(Clip::new(n.as_str(), HashMap::new()).bind(&skel));
            sel.set_slot(*n, ClipSlot::Ready(id));
        }
        (sel, mixer)
    }

    #[test]
    fn priority_order() {
        assert_eq!(select(&keys(&[])), AnimName::Idle);
        assert_eq!(select(&keys(&["w"])), AnimName::Walk);
        assert_eq!(select(&keys(&["q", "w"])), AnimName::Walk);
        assert_eq!(select(&keys(&["t", "q"])), AnimName::Attack1);
        assert_eq!(select(&keys(&["e", "r"])), AnimName::Attack2);
        assert_eq!(select(&keys(&["b", "r"])), AnimName::Defense);
        assert_eq!(select(&keys(&["b", "t"])), AnimName::Emote);
        assert_eq!(select(&keys(&["t"])), AnimName::Kick);
        assert_eq!(select(&keys(&["x", "z"])), AnimName::Idle);
    }

    #[test]
    fn every_key_subset_selects_the_highest_priority() {
        let all = ["w", "a", "s", "d", "q", "e", "r", "b", "t"];
        for mask in 0u32..(1 << all.len()) {
            let pressed: Vec<&str> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, k)| *k)
                .collect();
            let expected = if pressed.iter().any(|k| ["w", "a", "s", "d"].contains(k)) {
                AnimName::Walk
            } else if pressed.contains(&"q") {
                AnimName::Attack1
            } else if pressed.contains(&"e") {
                AnimName::Attack2
            } else if pressed.contains(&"r") {
                AnimName::Defense
            } else if pressed.contains(&"b") {
                AnimName::Emote
            } else if pressed.contains(&"t") {
                AnimName::Kick
            } else {
                AnimName::Idle
            };
            assert_eq!(select(&keys(&pressed)), expected, "keys {pressed:?}");
        }
    }

    #[test]
    fn first_ready_idle_plays_at_full_weight() {
        let (mut sel, mut mixer) = loaded(&[AnimName::Idle]);
        let t = sel.evaluate(&keys(&[]), &mut mixer).unwrap();
        assert_eq!(t, Transition { from: None, to: AnimName::Idle });
        let ClipSlot::Ready(idle) = sel.slot(AnimName::Idle) else {
            panic!("idle not ready");
        };
        assert_eq!(mixer.weight(idle), 1.0);
    }

    #[test]
    fn switching_crossfades() {
        let (mut sel, mut mixer) = loaded(&AnimName::ALL);
        sel.evaluate(&keys(&[]), &mut mixer);
        let t = sel.evaluate(&keys(&["w"]), &mut mixer).unwrap();
        assert_eq!(t.from, Some(AnimName::Idle));
        assert_eq!(t.to, AnimName::Walk);
        assert_eq!(sel.active(), Some(AnimName::Walk));
        assert_eq!(sel.previous(), Some(AnimName::Idle));

        let (ClipSlot::Ready(idle), ClipSlot::Ready(walk)) =
            (sel.slot(AnimName::Idle), sel.slot(AnimName::Walk))
        else {
            panic!("clips not ready");
        };
        assert_eq!(mixer.weight(walk), 0.0);
        mixer.update(0.5);
        assert_eq!(mixer.weight(walk), 1.0);
        assert_eq!(mixer.weight(idle), 0.0);
    }

    #[test]
    fn same_input_twice_is_a_no_op() {
        let (mut sel, mut mixer) = loaded(&AnimName::ALL);
        sel.evaluate(&keys(&[]), &mut mixer);
        assert!(sel.evaluate(&keys(&["q"]), &mut mixer).is_some());
        mixer.update(0.2);
        let ClipSlot::Ready(atk) = sel.slot(AnimName::Attack1) else {
            panic!();
        };
        let before = (mixer.weight(atk), mixer.time(atk));
        assert!(sel.evaluate(&keys(&["q"]), &mut mixer).is_none());
        assert_eq!((mixer.weight(atk), mixer.time(atk)), before);
    }

    #[test]
    fn movement_beats_attack() {
        let (mut sel, mut mixer) = loaded(&AnimName::ALL);
        sel.evaluate(&keys(&["w"]), &mut mixer);
        assert!(sel.evaluate(&keys(&["w", "q"]), &mut mixer).is_none());
        assert_eq!(sel.active(), Some(AnimName::Walk));
    }

    #[test]
    fn loading_clip_falls_back_to_idle() {
        let (mut sel, mut mixer) = loaded(&[AnimName::Idle, AnimName::Attack1]);
        sel.evaluate(&keys(&["q"]), &mut mixer);
        assert_eq!(sel.active(), Some(AnimName::Attack1));
        // walk still loading: back to idle rather than touching an absent clip
        let t = sel.evaluate(&keys(&["w"]), &mut mixer).unwrap();
        assert_eq!(t.to, AnimName::Idle);
    }

    #[test]
    fn nothing_ready_does_nothing() {
        let (mut sel, mut mixer) = loaded(&[]);
        assert!(sel.evaluate(&keys(&["w"]), &mut mixer).is_none());
        assert_eq!(sel.active(), None);
        sel.set_slot(AnimName::Idle, ClipSlot::Failed);
        assert!(sel.evaluate(&keys(&[]), &mut mixer).is_none());
    }
}
