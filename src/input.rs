use std::collections::HashMap;

use winit::keyboard::{Key, NamedKey};

pub const MOVE_FORWARD: &str = "w";
pub const MOVE_BACK: &str = "s";
pub const MOVE_LEFT: &str = "a";
pub const MOVE_RIGHT: &str = "d";

pub const MOVEMENT_KEYS: [&str; 4] = [MOVE_FORWARD, MOVE_BACK, MOVE_LEFT, MOVE_RIGHT];

/// Pressed/released state per key identifier (lower-cased).
///
/// Keys stay down until their release event arrives. A missed release
/// leaves the key stuck, there is no polling against the OS.
#[derive(Debug, Default, Clone)]
pub struct KeyTracker {
    keys: HashMap<String, bool>,
}

impl KeyTracker {
    /// Records the state. Returns `true` if it differs from the previous one.
    pub fn set_key(&mut self, id: &str, pressed: bool) -> bool {
        let id = id.to_lowercase();
        let prev = self.keys.insert(id, pressed).unwrap_or(false);
        prev != pressed
    }

    pub fn is_pressed(&self, id: &str) -> bool {
        self.keys.get(id).copied().unwrap_or(false)
    }

    pub fn any_movement(&self) -> bool {
        MOVEMENT_KEYS.iter().any(|k| self.is_pressed(k))
    }
}

/// Maps a winit logical key to the identifier used by [`KeyTracker`].
pub fn key_id(key: &Key) -> Option<String> {
    match key {
        Key::Character(s) => Some(s.to_lowercase()),
        Key::Named(NamedKey::Space) => Some(" ".to_string()),
        Key::Named(named) => Some(format!("{named:?}").to_lowercase()),
        _ => None,
    }
}
