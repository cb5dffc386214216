use glam::{Mat4, Vec3};

use crate::anim::{Pose, Transform};
use crate::collision::Aabb;
use crate::mesh::Vertex;

/// Node hierarchy of the character, in glTF node order.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub names: Vec<String>,
    pub parent: Vec<Option<usize>>,
    pub rest: Vec<Transform>,
    /// Parents before children.
    order: Vec<usize>,
}

impl Skeleton {
    pub fn new(names: Vec<String>, parent: Vec<Option<usize>>, rest: Vec<Transform>) -> Self {
        let order = topo_order(&parent);
        Self {
            names,
            parent,
            rest,
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn rest_pose(&self) -> Pose {
        Pose::new(self.rest.clone())
    }

    /// Model-space matrix of every node for `pose`.
    pub fn globals(&self, pose: &Pose) -> Vec<Mat4> {
        let mut out = vec![Mat4::IDENTITY; self.len()];
        for &i in &self.order {
            let local = pose.locals.get(i).copied().unwrap_or_default().matrix();
            out[i] = match self.parent[i] {
                Some(p) => out[p] * local,
                None => local,
            };
        }
        out
    }
}

fn topo_order(parent: &[Option<usize>]) -> Vec<usize> {
    let n = parent.len();
    let mut children = vec![Vec::new(); n];
    let mut roots = Vec::new();
    for (i, p) in parent.iter().enumerate() {
        match p {
            Some(p) if *p < n => children[*p].push(i),
            _ => roots.push(i),
        }
    }
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<usize> = roots.into_iter().rev().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev());
    }
    order
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinVertex {
    pub pos: Vec3,
    pub normal: Vec3,
    pub color: [f32; 3],
    pub joints: [u16; 4],
    pub weights: [f32; 4],
}

/// Skinned triangle mesh bound to a skeleton.
#[derive(Debug, Clone)]
pub struct SkinnedMesh {
    pub vertices: Vec<SkinVertex>,
    pub indices: Vec<u32>,
    /// Skeleton node index per skin joint.
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<Mat4>,
}

impl SkinnedMesh {
    pub fn palette(&self, globals: &[Mat4]) -> Vec<Mat4> {
        self.joints
            .iter()
            .enumerate()
            .map(|(j, &node)| {
                let g = globals.get(node).copied().unwrap_or(Mat4::IDENTITY);
                let ibm = self.inverse_bind.get(j).copied().unwrap_or(Mat4::IDENTITY);
                g * ibm
            })
            .collect()
    }
}

/// The controllable character: skeleton, skin and a uniform scale.
#[derive(Debug, Clone)]
pub struct Model {
    pub skeleton: Skeleton,
    pub mesh: SkinnedMesh,
    pub scale: f32,
}

/// Output of one skinning pass.
#[derive(Debug, Default, Clone)]
pub struct Skinned {
    /// World-space vertices ready for upload.
    pub vertices: Vec<Vertex>,
    /// Bounds of the skinned mesh before the model transform.
    pub local_bounds: Option<Aabb>,
}

impl Model {
    /// Box-shaped stand-in used when the character file can't be loaded.
    pub fn placeholder(height: f32, width: f32) -> Self {
        let half = Vec3::new(width * 0.5, height * 0.5, width * 0.25);
        let body = crate::mesh::box_mesh(Vec3::new(0.0, half.y, 0.0), half, [0.8, 0.7, 0.3]);
        let vertices = body
            .vertices
            .iter()
            .map(|v| SkinVertex {
                pos: Vec3::from(v.pos),
                normal: Vec3::from(v.normal),
                color: v.color,
                joints: [0; 4],
                weights: [1.0, 0.0, 0.0, 0.0],
            })
            .collect();
        Self {
            skeleton: Skeleton::new(
                vec!["root".to_string()],
                vec![None],
                vec![Transform::IDENTITY],
            ),
            mesh: SkinnedMesh {
                vertices,
                indices: body.indices,
                joints: vec![0],
                inverse_bind: vec![Mat4::IDENTITY],
            },
            scale: 1.0,
        }
    }

    /// CPU skinning of `pose`, placed in the world by `model_matrix`.
    pub fn skin(&self, pose: &Pose, model_matrix: &Mat4) -> Skinned {
        let globals = self.skeleton.globals(pose);
        let palette = self.mesh.palette(&globals);

        let mut out = Vec::with_capacity(self.mesh.vertices.len());
        let mut lo = Vec3::splat(f32::INFINITY);
        let mut hi = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.mesh.vertices {
            let m = blend_matrix(&palette, v);
            let p = m.transform_point3(v.pos) * self.scale;
            let n = m.transform_vector3(v.normal).normalize_or_zero();
            lo = lo.min(p);
            hi = hi.max(p);
            out.push(Vertex {
                pos: model_matrix.transform_point3(p).to_array(),
                normal: model_matrix.transform_vector3(n).normalize_or_zero().to_array(),
                color: v.color,
            });
        }

        let local_bounds = (!self.mesh.vertices.is_empty()).then(|| Aabb::new(lo, hi));
        Skinned {
            vertices: out,
            local_bounds,
        }
    }
}

fn blend_matrix(palette: &[Mat4], v: &SkinVertex) -> Mat4 {
    let mut m = Mat4::ZERO;
    let mut total = 0.0;
    for k in 0..4 {
        let w = v.weights[k];
        if w <= 0.0 {
            continue;
        }
        if let Some(j) = palette.get(v.joints[k] as usize) {
            m += *j * w;
            total += w;
        }
    }
    if total <= 1e-6 {
        Mat4::IDENTITY
    } else {
        m * (1.0 / total)
    }
}
