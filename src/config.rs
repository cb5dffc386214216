//! Viewer settings: RON file with CLI overrides.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::anim::AnimName;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub motion: MotionConfig,
    pub scene: SceneConfig,
    pub camera: CameraConfig,
    /// env_logger filter used when `RUST_LOG` is unset.
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    pub directory: PathBuf,
    pub model: String,
    pub model_scale: f32,
    pub idle: String,
    pub walk: String,
    pub attack1: String,
    pub attack2: String,
    pub defense: String,
    pub emote: String,
    pub kick: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Units per second.
    pub base_speed: f32,
    /// Cross-fade length in seconds.
    pub fade_duration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub seed: Option<u64>,
    pub obstacle_count: usize,
    pub obstacle_size: f32,
    pub obstacle_spread: f32,
    pub obstacle_height: f32,
    pub ground_size: f32,
    pub grid_divisions: u32,
    pub background: u32,
    pub fog_color: u32,
    pub fog_near: f32,
    pub fog_far: f32,
    pub hemi_color: u32,
    pub hemi_intensity: f32,
    pub sun_position: [f32; 3],
    pub sun_intensity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Paladin Viewer".to_string(),
            vsync: true,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("assets/models"),
            model: "paladin.glb".to_string(),
            model_scale: 1.0,
            idle: "combatidle.glb".to_string(),
            walk: "walk.glb".to_string(),
            attack1: "swordattack1.glb".to_string(),
            attack2: "swordattack2slash.glb".to_string(),
            defense: "DefensePosition.glb".to_string(),
            emote: "ScreamBattle.glb".to_string(),
            kick: "paladinkick.glb".to_string(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            base_speed: 250.0,
            fade_duration: 0.5,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: None,
            obstacle_count: 10,
            obstacle_size: 100.0,
            obstacle_spread: 2000.0,
            obstacle_height: 25.0,
            ground_size: 4000.0,
            grid_divisions: 40,
            background: 0xB2D9F6,
            fog_color: 0x8E91A4,
            fog_near: 200.0,
            fog_far: 1400.0,
            hemi_color: 0xFDC373,
            hemi_intensity: 1.0,
            sun_position: [0.0, 200.0, 100.0],
            sun_intensity: 1.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 50.0,
            near: 1.0,
            far: 2000.0,
            position: [0.0, 200.0, 400.0],
            target: [0.0, 100.0, 0.0],
        }
    }
}

impl AssetConfig {
    pub fn model_path(&self) -> PathBuf {
        self.directory.join(&self.model)
    }

    pub fn clip_path(&self, name: AnimName) -> PathBuf {
        let file = match name {
            AnimName::Idle => &self.idle,
            AnimName::Walk => &self.walk,
            AnimName::Attack1 => &self.attack1,
            AnimName::Attack2 => &self.attack2,
            AnimName::Defense => &self.defense,
            AnimName::Emote => &self.emote,
            AnimName::Kick => &self.kick,
        };
        self.directory.join(file)
    }
}

impl ViewerConfig {
    /// Reads `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_ron(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref dir) = args.assets {
            self.assets.directory = dir.clone();
        }
        if let Some(seed) = args.seed {
            self.scene.seed = Some(seed);
        }
        if let Some(speed) = args.speed {
            self.motion.base_speed = speed;
        }
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref level) = args.log_level {
            self.log_level = Some(level.clone());
        }
    }
}

/// Command-line arguments. Values override `viewer.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "paladin_viewer", about = "Animated character viewer")]
pub struct CliArgs {
    /// Path to the RON config file.
    #[arg(long, default_value = "viewer.ron")]
    pub config: PathBuf,

    /// Directory holding the model and clip files.
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Seed for obstacle placement.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Movement speed in units per second.
    #[arg(long)]
    pub speed: Option<f32>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo() {
        let c = ViewerConfig::default();
        assert_eq!(c.motion.base_speed, 250.0);
        assert_eq!(c.motion.fade_duration, 0.5);
        assert_eq!(c.scene.obstacle_count, 10);
        assert_eq!(c.camera.position, [0.0, 200.0, 400.0]);
        assert_eq!(
            c.assets.clip_path(AnimName::Kick),
            PathBuf::from("assets/models/paladinkick.glb")
        );
    }

    #[test]
    fn partial_ron_keeps_other_defaults() {
        let c = ViewerConfig::from_ron("(motion: (base_speed: 100.0), scene: (seed: Some(3)))").unwrap();
        assert_eq!(c.motion.base_speed, 100.0);
        assert_eq!(c.motion.fade_duration, 0.5);
        assert_eq!(c.scene.seed, Some(3));
        assert_eq!(c.window, WindowConfig::default());
    }

    #[test]
    fn ron_round_trip() {
        let mut c = ViewerConfig::default();
        c.scene.fog_far = 900.0;
        let text = ron::ser::to_string_pretty(&c, ron::ser::PrettyConfig::default()).unwrap();
        assert_eq!(ViewerConfig::from_ron(&text).unwrap(), c);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let c = ViewerConfig::load(&dir.path().join("nope.ron")).unwrap();
        assert_eq!(c, ViewerConfig::default());
    }

    #[test]
    fn bad_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.ron");
        std::fs::write(&path, "(motion: (base_speed: \"fast\"))").unwrap();
        assert!(matches!(ViewerConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn cli_overrides() {
        let mut c = ViewerConfig::default();
        let args = CliArgs {
            seed: Some(9),
            speed: Some(400.0),
            ..Default::default()
        };
        c.apply_cli_overrides(&args);
        assert_eq!(c.scene.seed, Some(9));
        assert_eq!(c.motion.base_speed, 400.0);
        assert_eq!(c.window.width, 1280);
    }
}
