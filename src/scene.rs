use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::collision::Obstacle;
use crate::config::SceneConfig;
use crate::mesh::{self, Mesh};

const GROUND_COLOR: u32 = 0x999999;
const OBSTACLE_COLOR: u32 = 0x00ff00;

/// Hemisphere + directional light and linear fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub background: [f32; 3],
    pub sky_color: [f32; 3],
    pub ground_color: [f32; 3],
    pub hemi_intensity: f32,
    pub sun_position: Vec3,
    pub sun_intensity: f32,
    pub fog_color: [f32; 3],
    pub fog_near: f32,
    pub fog_far: f32,
}

/// Static part of the scene, built once at startup.
#[derive(Debug, Clone)]
pub struct SceneLayout {
    pub obstacles: Vec<Obstacle>,
    pub ground_size: f32,
    pub grid_divisions: u32,
    pub lighting: Lighting,
}

impl SceneLayout {
    pub fn build(cfg: &SceneConfig) -> Self {
        let seed = cfg.seed.unwrap_or_else(rand::random);
        log::info!("scene seed {seed}");
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let obstacles = scatter_obstacles(
            &mut rng,
            cfg.obstacle_count,
            cfg.obstacle_size,
            cfg.obstacle_spread,
            cfg.obstacle_height,
        );
        Self {
            obstacles,
            ground_size: cfg.ground_size,
            grid_divisions: cfg.grid_divisions,
            lighting: Lighting {
                background: mesh::rgb(cfg.background),
                sky_color: mesh::rgb(cfg.hemi_color),
                ground_color: mesh::rgb(cfg.hemi_color),
                hemi_intensity: cfg.hemi_intensity,
                sun_position: Vec3::from(cfg.sun_position),
                sun_intensity: cfg.sun_intensity,
                fog_color: mesh::rgb(cfg.fog_color),
                fog_near: cfg.fog_near,
                fog_far: cfg.fog_far,
            },
        }
    }

    /// Ground plus obstacle cubes, all lit.
    pub fn solid_mesh(&self) -> Mesh {
        let mut m = mesh::ground_plane(self.ground_size, mesh::rgb(GROUND_COLOR));
        for o in &self.obstacles {
            m.append(&mesh::box_mesh(o.center, o.half_extent, mesh::rgb(OBSTACLE_COLOR)));
        }
        m
    }

    /// Unlit wireframe grid over the ground.
    pub fn grid_mesh(&self) -> Mesh {
        // black at 20% over the grey ground
        let c = mesh::rgb(GROUND_COLOR).map(|v| v * 0.8);
        mesh::grid_lines(self.ground_size, self.grid_divisions, c)
    }
}

/// `count` cubes of edge `size`, uniformly placed in a `spread` wide square
/// around the origin with their centers at `height`.
pub fn scatter_obstacles(
    rng: &mut impl Rng,
    count: usize,
    size: f32,
    spread: f32,
    height: f32,
) -> Vec<Obstacle> {
    let half = spread * 0.5;
    (0..count)
        .map(|_| {
            let x = rng.gen_range(-half..half);
            let z = rng.gen_range(-half..half);
            Obstacle::cube(Vec3::new(x, height, z), size)
        })
        .collect()
}
