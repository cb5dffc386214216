use glam::{Mat4, Vec3};

use crate::anim::{AnimName, AnimationMixer, AnimationSelector, Clip, ClipSlot, Transition};
use crate::assets::{AssetError, ClipLoaded};
use crate::camera::OrbitCamera;
use crate::collision::Aabb;
use crate::config::MotionConfig;
use crate::debug_panel::DebugPanel;
use crate::input::KeyTracker;
use crate::mesh::Vertex;
use crate::model::Model;
use crate::motion::{self, ModelPose, MotionOutcome};
use crate::scene::{Lighting, SceneLayout};

/// Everything the frame loop mutates, owned in one place.
pub struct Viewer {
    keys: KeyTracker,
    selector: AnimationSelector,
    mixer: AnimationMixer,
    model: Model,
    pose: ModelPose,
    layout: SceneLayout,
    camera: OrbitCamera,
    debug: DebugPanel,
    base_speed: f32,

    vertices: Vec<Vertex>,
    local_bounds: Aabb,
}

impl Viewer {
    pub fn new(model: Model, layout: SceneLayout, camera: OrbitCamera, motion: &MotionConfig) -> Self {
        let debug = DebugPanel::new(&layout.lighting);
        let mut v = Self {
            keys: KeyTracker::default(),
            selector: AnimationSelector::new(motion.fade_duration),
            mixer: AnimationMixer::new(),
            model,
            pose: ModelPose::default(),
            layout,
            camera,
            debug,
            base_speed: motion.base_speed,
            vertices: Vec::new(),
            local_bounds: Aabb::new(Vec3::ZERO, Vec3::ZERO),
        };
        v.reskin();
        v
    }

    /// Key press or release. Only actual state changes reach the selector.
    pub fn on_key(&mut self, id: &str, pressed: bool) -> Option<Transition> {
        if !self.keys.set_key(id, pressed) {
            return None;
        }
        if pressed {
            self.debug.on_key(id);
        }
        self.selector.evaluate(&self.keys, &mut self.mixer)
    }

    /// Registers a finished clip load and re-runs the selector, so a key
    /// held while the clip was loading takes effect now.
    pub fn on_clip_loaded(&mut self, name: AnimName, result: Result<Clip, AssetError>) -> Option<Transition> {
        match result {
            Ok(clip) => {
                let id = self.mixer.add_action(clip.bind(&self.model.skeleton));
                self.selector.set_slot(name, ClipSlot::Ready(id));
            }
            Err(e) => {
                log::warn!("{name} animation unavailable: {e}");
                self.selector.set_slot(name, ClipSlot::Failed);
                return None;
            }
        }
        self.selector.evaluate(&self.keys, &mut self.mixer)
    }

    pub fn on_clips_loaded(&mut self, loaded: Vec<ClipLoaded>) {
        for c in loaded {
            self.on_clip_loaded(c.name, c.result);
        }
    }

    /// One frame: move, advance animation, re-skin for rendering.
    pub fn frame(&mut self, dt: f32) -> MotionOutcome {
        let outcome = motion::step(
            &mut self.pose,
            &self.keys,
            self.camera.rotation(),
            self.base_speed * dt,
            &self.local_bounds,
            &self.layout.obstacles,
        );
        self.mixer.update(dt);
        self.reskin();
        outcome
    }

    fn model_matrix(&self) -> Mat4 {
        self.pose.matrix()
    }

    fn reskin(&mut self) {
        let pose = self.mixer.pose(&self.model.skeleton);
        let skinned = self.model.skin(&pose, &self.model_matrix());
        self.vertices = skinned.vertices;
        if let Some(b) = skinned.local_bounds {
            self.local_bounds = b;
        }
    }

    /// World AABB of the character as used by the collision test.
    pub fn model_bounds(&self) -> Aabb {
        self.local_bounds.transformed(&self.model_matrix())
    }

    pub fn character_vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn character_indices(&self) -> &[u32] {
        &self.model.mesh.indices
    }

    pub fn lighting(&self) -> Lighting {
        self.debug.apply(&self.layout.lighting)
    }

    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn pose(&self) -> ModelPose {
        self.pose
    }

    pub fn active_animation(&self) -> Option<AnimName> {
        self.selector.active()
    }

    pub fn clip_slot(&self, name: AnimName) -> ClipSlot {
        self.selector.slot(name)
    }

    /// Active clip with its weight and time, plus the one fading out.
    pub fn animation_status(&self) -> String {
        let Some(active) = self.selector.active() else {
            return "no animation".to_string();
        };
        let describe = |name: AnimName| match self.clip_slot(name) {
            ClipSlot::Ready(id) => format!(
                "{} {:.2} @{:.2}s",
                self.mixer.clip_name(id).unwrap_or(name.as_str()),
                self.mixer.weight(id),
                self.mixer.time(id)
            ),
            _ => name.to_string(),
        };
        let fading = self
            .selector
            .previous()
            .filter(|p| matches!(self.clip_slot(*p), ClipSlot::Ready(id) if self.mixer.weight(id) > 0.0));
        match fading {
            Some(prev) => format!("{} <- {}", describe(active), describe(prev)),
            None => describe(active),
        }
    }
}
