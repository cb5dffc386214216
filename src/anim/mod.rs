//! Skeletal animation: keyframe clips, a weight-blending mixer and the
//! key-driven clip selector.

pub mod clip;
pub mod mixer;
pub mod pose;
pub mod selector;

pub use clip::{Channels, Clip, Track};
pub use mixer::AnimationMixer;
pub use pose::{Pose, Transform};
pub use selector::{AnimName, AnimationSelector, ClipSlot, Transition};
