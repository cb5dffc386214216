use crate::scene::Lighting;

/// Live-editable numeric setting with a clamped range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    pub label: &'static str,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    /// Amount per key press.
    pub step: f32,
}

impl Param {
    fn nudge(&mut self, dir: f32) {
        self.value = (self.value + dir * self.step).clamp(self.min, self.max);
    }
}

/// Debug parameters bound to the number keys:
/// 1/2 sun intensity, 3/4 hemisphere intensity, 5/6 fog distance.
#[derive(Debug, Clone)]
pub struct DebugPanel {
    pub sun_intensity: Param,
    pub hemi_intensity: Param,
    pub fog_far: Param,
}

impl DebugPanel {
    pub fn new(lighting: &Lighting) -> Self {
        let intensity = |label, value: f32| Param {
            label,
            value: value.clamp(0.0, 2.0),
            min: 0.0,
            max: 2.0,
            step: 0.05,
        };
        Self {
            sun_intensity: intensity("sun intensity", lighting.sun_intensity),
            hemi_intensity: intensity("hemisphere intensity", lighting.hemi_intensity),
            fog_far: Param {
                label: "fog distance",
                value: lighting.fog_far.clamp(500.0, 3000.0),
                min: 500.0,
                max: 3000.0,
                step: 50.0,
            },
        }
    }

    /// Applies a key press. Returns the changed parameter, if any.
    pub fn on_key(&mut self, id: &str) -> Option<Param> {
        let (param, dir) = match id {
            "1" => (&mut self.sun_intensity, -1.0),
            "2" => (&mut self.sun_intensity, 1.0),
            "3" => (&mut self.hemi_intensity, -1.0),
            "4" => (&mut self.hemi_intensity, 1.0),
            "5" => (&mut self.fog_far, -1.0),
            "6" => (&mut self.fog_far, 1.0),
            _ => return None,
        };
        param.nudge(dir);
        log::info!("{} = {:.2}", param.label, param.value);
        Some(*param)
    }

    /// `base` with the panel's values applied.
    pub fn apply(&self, base: &Lighting) -> Lighting {
        Lighting {
            sun_intensity: self.sun_intensity.value,
            hemi_intensity: self.hemi_intensity.value,
            fog_far: self.fog_far.value,
            ..*base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::SceneLayout;

    fn lighting() -> Lighting {
        SceneLayout::build(&SceneConfig {
            seed: Some(0),
            ..Default::default()
        })
        .lighting
    }

    #[test]
    fn starts_from_scene_values() {
        let l = lighting();
        let p = DebugPanel::new(&l);
        assert_eq!(p.fog_far.value, 1400.0);
        assert_eq!(p.apply(&l), l);
    }

    #[test]
    fn keys_nudge_and_clamp() {
        let l = lighting();
        let mut p = DebugPanel::new(&l);
        assert_eq!(p.on_key("6").unwrap().value, 1450.0);
        for _ in 0..100 {
            p.on_key("2");
            p.on_key("5");
        }
        assert_eq!(p.sun_intensity.value, 2.0);
        assert_eq!(p.fog_far.value, 500.0);
        assert!(p.on_key("w").is_none());
        let applied = p.apply(&l);
        assert_eq!(applied.fog_far, 500.0);
        assert_eq!(applied.fog_near, l.fog_near);
    }
}
