use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Triangle (or line) list with u32 indices.
#[derive(Debug, Default, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn append(&mut self, other: &Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    fn push_quad(&mut self, color: [f32; 3], normal: Vec3, p: [Vec3; 4]) {
        let base = self.vertices.len() as u32;
        for c in p {
            self.vertices.push(Vertex {
                pos: c.to_array(),
                normal: normal.to_array(),
                color,
            });
        }
        // (0,1,2) and (0,2,3)
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Axis-aligned box with flat per-face normals (CCW from outside).
pub fn box_mesh(center: Vec3, half: Vec3, color: [f32; 3]) -> Mesh {
    let mut m = Mesh::default();
    let (lo, hi) = (center - half, center + half);
    let v = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);

    // +X
    m.push_quad(color, Vec3::X, [
        v(hi.x, lo.y, hi.z),
        v(hi.x, lo.y, lo.z),
        v(hi.x, hi.y, lo.z),
        v(hi.x, hi.y, hi.z),
    ]);
    // -X
    m.push_quad(color, Vec3::NEG_X, [
        v(lo.x, lo.y, lo.z),
        v(lo.x, lo.y, hi.z),
        v(lo.x, hi.y, hi.z),
        v(lo.x, hi.y, lo.z),
    ]);
    // +Y
    m.push_quad(color, Vec3::Y, [
        v(lo.x, hi.y, hi.z),
        v(hi.x, hi.y, hi.z),
        v(hi.x, hi.y, lo.z),
        v(lo.x, hi.y, lo.z),
    ]);
    // -Y
    m.push_quad(color, Vec3::NEG_Y, [
        v(lo.x, lo.y, lo.z),
        v(hi.x, lo.y, lo.z),
        v(hi.x, lo.y, hi.z),
        v(lo.x, lo.y, hi.z),
    ]);
    // +Z
    m.push_quad(color, Vec3::Z, [
        v(lo.x, lo.y, hi.z),
        v(hi.x, lo.y, hi.z),
        v(hi.x, hi.y, hi.z),
        v(lo.x, hi.y, hi.z),
    ]);
    // -Z
    m.push_quad(color, Vec3::NEG_Z, [
        v(hi.x, lo.y, lo.z),
        v(lo.x, lo.y, lo.z),
        v(lo.x, hi.y, lo.z),
        v(hi.x, hi.y, lo.z),
    ]);
    m
}

/// Square ground plane at y = 0, facing up.
pub fn ground_plane(size: f32, color: [f32; 3]) -> Mesh {
    let h = size * 0.5;
    let mut m = Mesh::default();
    m.push_quad(color, Vec3::Y, [
        Vec3::new(-h, 0.0, h),
        Vec3::new(h, 0.0, h),
        Vec3::new(h, 0.0, -h),
        Vec3::new(-h, 0.0, -h),
    ]);
    m
}

/// Wireframe of a triangulated grid on the ground, as a line list.
///
/// Every cell is split along its diagonal, so each cell contributes its two
/// lower edges plus the diagonal; the outer border closes the grid.
pub fn grid_lines(size: f32, divisions: u32, color: [f32; 3]) -> Mesh {
    let mut m = Mesh::default();
    let divisions = divisions.max(1);
    let step = size / divisions as f32;
    let h = size * 0.5;
    // slightly above the ground to avoid z-fighting
    let y = 0.05;

    let mut line = |a: Vec3, b: Vec3| {
        let base = m.vertices.len() as u32;
        for p in [a, b] {
            m.vertices.push(Vertex {
                pos: p.to_array(),
                normal: [0.0, 1.0, 0.0],
                color,
            });
        }
        m.indices.extend_from_slice(&[base, base + 1]);
    };

    for i in 0..divisions {
        for j in 0..divisions {
            let x = i as f32 * step - h;
            let z = j as f32 * step - h;
            line(Vec3::new(x, y, z), Vec3::new(x + step, y, z));
            line(Vec3::new(x, y, z), Vec3::new(x, y, z + step));
            line(Vec3::new(x, y, z), Vec3::new(x + step, y, z + step));
        }
    }
    line(Vec3::new(h, y, -h), Vec3::new(h, y, h));
    line(Vec3::new(-h, y, h), Vec3::new(h, y, h));
    m
}

/// `0xRRGGBB` to sRGB floats in 0..1.
pub fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_six_faces() {
        let m = box_mesh(Vec3::ZERO, Vec3::ONE, [1.0; 3]);
        assert_eq!(m.vertices.len(), 24);
        assert_eq!(m.indices.len(), 36);
    }

    #[test]
    fn box_faces_wind_outwards() {
        let m = box_mesh(Vec3::ZERO, Vec3::splat(2.0), [1.0; 3]);
        for tri in m.indices.chunks(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from(m.vertices[i as usize].pos))
                .collect();
            let n = (p[1] - p[0]).cross(p[2] - p[0]);
            let stored = Vec3::from(m.vertices[tri[0] as usize].normal);
            assert!(n.dot(stored) > 0.0, "face winding disagrees with normal");
        }
    }

    #[test]
    fn append_offsets_indices() {
        let mut a = ground_plane(10.0, [0.5; 3]);
        let b = ground_plane(10.0, [0.5; 3]);
        a.append(&b);
        assert_eq!(a.vertices.len(), 8);
        assert_eq!(a.indices[6], 4);
    }

    #[test]
    fn grid_line_count() {
        let m = grid_lines(100.0, 4, [0.0; 3]);
        // 3 lines per cell + 2 border lines
        assert_eq!(m.indices.len(), (4 * 4 * 3 + 2) * 2);
    }

    #[test]
    fn hex_colors() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0]);
        assert_eq!(rgb(0x000000), [0.0, 0.0, 0.0]);
    }
}
