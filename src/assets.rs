//! glTF loading for the character and its clips.
//!
//! The character is read up front. Each clip file is read on its own thread
//! and handed back through a channel that the frame loop drains, so clips
//! show up one by one while the viewer is already running.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::mesh::util::{ReadIndices, ReadJoints, ReadWeights};

use crate::anim::{AnimName, Channels, Clip, Track, Transform};
use crate::config::AssetConfig;
use crate::model::{Model, SkinVertex, SkinnedMesh, Skeleton};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to import {path}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("{0}: no skinned mesh")]
    NoSkinnedMesh(PathBuf),

    #[error("{0}: no animation")]
    NoAnimation(PathBuf),

    #[error("{path}: primitive without {what}")]
    MissingData { path: PathBuf, what: &'static str },
}

fn import(path: &Path) -> Result<(gltf::Document, Vec<gltf::buffer::Data>), AssetError> {
    let (doc, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Import {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((doc, buffers))
}

fn node_transform(node: &gltf::Node) -> Transform {
    let (t, r, s) = node.transform().decomposed();
    Transform {
        translation: Vec3::from(t),
        rotation: Quat::from_array(r).normalize(),
        scale: Vec3::from(s),
    }
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node{}", node.index()))
}

/// Reads the first skinned mesh of `path` together with the node hierarchy.
pub fn load_model(path: &Path, scale: f32) -> Result<Model, AssetError> {
    let (doc, buffers) = import(path)?;

    let node_count = doc.nodes().len();
    let mut parent = vec![None; node_count];
    for n in doc.nodes() {
        for c in n.children() {
            parent[c.index()] = Some(n.index());
        }
    }
    let names = doc.nodes().map(|n| node_name(&n)).collect();
    let rest = doc.nodes().map(|n| node_transform(&n)).collect();
    let skeleton = Skeleton::new(names, parent, rest);

    let (node, skin) = doc
        .nodes()
        .find_map(|n| Some((n.clone(), n.skin()?)))
        .ok_or_else(|| AssetError::NoSkinnedMesh(path.to_path_buf()))?;
    let mesh = node
        .mesh()
        .ok_or_else(|| AssetError::NoSkinnedMesh(path.to_path_buf()))?;

    let missing = |what| AssetError::MissingData {
        path: path.to_path_buf(),
        what,
    };

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for prim in mesh.primitives() {
        if prim.mode() != gltf::mesh::Mode::Triangles {
            continue;
        }
        let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let pos: Vec<[f32; 3]> = reader.read_positions().ok_or_else(|| missing("positions"))?.collect();
        let nrm: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|it| it.collect())
            .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; pos.len()]);
        let joints: Vec<[u16; 4]> = match reader.read_joints(0).ok_or_else(|| missing("joints"))? {
            ReadJoints::U8(it) => it.map(|j| j.map(u16::from)).collect(),
            ReadJoints::U16(it) => it.collect(),
        };
        let weights: Vec<[f32; 4]> = match reader.read_weights(0).ok_or_else(|| missing("weights"))? {
            ReadWeights::F32(it) => it.collect(),
            ReadWeights::U16(it) => it.map(|w| w.map(|v| v as f32 / 65535.0)).collect(),
            ReadWeights::U8(it) => it.map(|w| w.map(|v| v as f32 / 255.0)).collect(),
        };
        let [r, g, b, _a] = prim.material().pbr_metallic_roughness().base_color_factor();

        let base = vertices.len() as u32;
        for i in 0..pos.len() {
            vertices.push(SkinVertex {
                pos: Vec3::from(pos[i]),
                normal: Vec3::from(nrm.get(i).copied().unwrap_or([0.0, 1.0, 0.0])),
                color: [r, g, b],
                joints: joints.get(i).copied().unwrap_or([0; 4]),
                weights: weights.get(i).copied().unwrap_or([1.0, 0.0, 0.0, 0.0]),
            });
        }
        match reader.read_indices() {
            Some(ReadIndices::U8(it)) => indices.extend(it.map(|i| base + i as u32)),
            Some(ReadIndices::U16(it)) => indices.extend(it.map(|i| base + i as u32)),
            Some(ReadIndices::U32(it)) => indices.extend(it.map(|i| base + i)),
            None => indices.extend(base..base + pos.len() as u32),
        }
    }
    if vertices.is_empty() {
        return Err(AssetError::NoSkinnedMesh(path.to_path_buf()));
    }

    let joint_nodes: Vec<usize> = skin.joints().map(|j| j.index()).collect();
    let inverse_bind = skin
        .reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()))
        .read_inverse_bind_matrices()
        .map(|it| it.map(|m| Mat4::from_cols_array_2d(&m)).collect())
        .unwrap_or_else(|| vec![Mat4::IDENTITY; joint_nodes.len()]);

    log::info!(
        "loaded {}: {} vertices, {} joints, {} nodes",
        path.display(),
        vertices.len(),
        joint_nodes.len(),
        skeleton.len()
    );

    Ok(Model {
        skeleton,
        mesh: SkinnedMesh {
            vertices,
            indices,
            joints: joint_nodes,
            inverse_bind,
        },
        scale,
    })
}

/// Reads the first animation of `path`, keyed by target node name.
pub fn load_clip(path: &Path, name: &str) -> Result<Clip, AssetError> {
    let (doc, buffers) = import(path)?;
    let anim = doc
        .animations()
        .next()
        .ok_or_else(|| AssetError::NoAnimation(path.to_path_buf()))?;

    let mut channels: HashMap<String, Channels> = HashMap::new();
    for ch in anim.channels() {
        let target = ch.target();
        let reader = ch.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        let Some(outputs) = reader.read_outputs() else {
            continue;
        };
        let entry = channels.entry(node_name(&target.node())).or_default();
        match outputs {
            ReadOutputs::Translations(it) => {
                entry.translation = Some(Track::new(times, it.map(Vec3::from).collect()));
            }
            ReadOutputs::Rotations(it) => {
                let values = it
                    .into_f32()
                    .map(|q| Quat::from_array(q).normalize())
                    .collect();
                entry.rotation = Some(Track::new(times, values));
            }
            ReadOutputs::Scales(it) => {
                entry.scale = Some(Track::new(times, it.map(Vec3::from).collect()));
            }
            ReadOutputs::MorphTargetWeights(_) => {}
        }
    }

    let clip = Clip::new(name, channels);
    log::info!(
        "loaded clip {} from {} ({:.2}s, {} nodes)",
        name,
        path.display(),
        clip.duration,
        clip.channels.len()
    );
    Ok(clip)
}

pub struct ClipLoaded {
    pub name: AnimName,
    pub result: Result<Clip, AssetError>,
}

/// Background clip loading, one detached thread per file.
///
/// There is no cancellation and no timeout: a load that never finishes
/// leaves its slot loading for good.
pub struct ClipLoader {
    rx: crossbeam_channel::Receiver<ClipLoaded>,
    remaining: usize,
}

impl ClipLoader {
    pub fn spawn(cfg: &AssetConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        for name in AnimName::ALL {
            let tx = tx.clone();
            let path = cfg.clip_path(name);
            std::thread::spawn(move || {
                let result = load_clip(&path, name.as_str());
                // receiver gone means the viewer closed
                let _ = tx.send(ClipLoaded { name, result });
            });
        }
        Self {
            rx,
            remaining: AnimName::ALL.len(),
        }
    }

    /// Clips finished since the last call. Never blocks.
    pub fn drain(&mut self) -> Vec<ClipLoaded> {
        let done: Vec<ClipLoaded> = self.rx.try_iter().collect();
        self.remaining = self.remaining.saturating_sub(done.len());
        done
    }

    pub fn pending(&self) -> usize {
        self.remaining
    }
}
