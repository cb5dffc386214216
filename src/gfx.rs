use std::sync::Arc;

use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::mesh::{Mesh, Vertex};
use crate::scene::Lighting;
use crate::viewer::Viewer;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    sky: [f32; 4],
    ground: [f32; 4],
    sun: [f32; 4],
    fog_color: [f32; 4],
    fog: [f32; 4],
}

impl SceneUniform {
    fn new(viewer: &Viewer) -> Self {
        let cam = viewer.camera();
        let l: Lighting = viewer.lighting();
        let rgbw = |c: [f32; 3], w: f32| [c[0], c[1], c[2], w];
        let sun_dir = l.sun_position.try_normalize().unwrap_or(Vec3::Y);
        Self {
            view_proj: cam.view_proj().to_cols_array_2d(),
            camera_pos: cam.position().extend(1.0).to_array(),
            sky: rgbw(l.sky_color, l.hemi_intensity),
            ground: rgbw(l.ground_color, 0.0),
            sun: sun_dir.extend(l.sun_intensity).to_array(),
            fog_color: rgbw(l.fog_color, 1.0),
            fog: [l.fog_near, l.fog_far, 0.0, 0.0],
        }
    }
}

struct Depth {
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
}

impl Depth {
    fn create(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let format = wgpu::TextureFormat::Depth32Float;
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        Self { view, format }
    }
}

/// Vertex and index buffers for one draw call.
struct GpuMesh {
    vertex_buf: wgpu::Buffer,
    index_buf: wgpu::Buffer,
    index_count: u32,
    vertex_count: usize,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, vertices: &[Vertex], indices: &[u32]) -> Option<Self> {
        if vertices.is_empty() || indices.is_empty() {
            return None;
        }
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(Self {
            vertex_buf,
            index_buf,
            index_count: indices.len() as u32,
            vertex_count: vertices.len(),
        })
    }

    fn from_mesh(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Option<Self> {
        Self::upload(device, label, &mesh.vertices, &mesh.indices)
    }

    fn draw(&self, rp: &mut wgpu::RenderPass<'_>) {
        rp.set_vertex_buffer(0, self.vertex_buf.slice(..));
        rp.set_index_buffer(self.index_buf.slice(..), wgpu::IndexFormat::Uint32);
        rp.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

fn srgb_to_linear(c: f32) -> f64 {
    (c as f64).powf(2.2)
}

pub struct Gfx {
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    solid_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,

    scene_buf: wgpu::Buffer,
    scene_bg: wgpu::BindGroup,

    solids: Option<GpuMesh>,
    grid: Option<GpuMesh>,
    character: Option<GpuMesh>,

    depth: Depth,
}

impl Gfx {
    pub async fn new(window: Arc<Window>, viewer: &Viewer, vsync: bool) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .context("create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("request adapter")?;
        log::info!("adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("request device")?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("surface has no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        // ----- Meshes -----
        let layout = viewer.layout();
        let solids = GpuMesh::from_mesh(&device, "solids", &layout.solid_mesh());
        let grid = GpuMesh::from_mesh(&device, "grid", &layout.grid_mesh());
        let character = GpuMesh::upload(
            &device,
            "character",
            viewer.character_vertices(),
            viewer.character_indices(),
        );

        // ----- Scene uniform -----
        let scene_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene buffer"),
            contents: bytemuck::bytes_of(&SceneUniform::new(viewer)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene bg"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buf.as_entire_binding(),
            }],
        });

        // ----- Pipelines -----
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline layout"),
            bind_group_layouts: &[&scene_bgl],
            immediate_size: 0,
        });

        let depth = Depth::create(&device, &config);

        let make_pipeline = |label: &str, fs: &str, topology: wgpu::PrimitiveTopology| {
            let cull_mode = match topology {
                wgpu::PrimitiveTopology::TriangleList => Some(wgpu::Face::Back),
                _ => None,
            };
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::layout()],
                    compilation_options: Default::default(),
                },

                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fs),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),

                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode,
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth.format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),

                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let solid_pipeline = make_pipeline("solid pipeline", "fs_main", wgpu::PrimitiveTopology::TriangleList);
        let line_pipeline = make_pipeline("line pipeline", "fs_flat", wgpu::PrimitiveTopology::LineList);

        Ok(Self {
            size,
            surface,
            device,
            queue,
            config,
            solid_pipeline,
            line_pipeline,
            scene_buf,
            scene_bg,
            solids,
            grid,
            character,
            depth,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);

        self.depth = Depth::create(&self.device, &self.config);
    }

    /// Re-applies the current configuration after a lost or outdated surface.
    pub fn reconfigure(&mut self) {
        self.resize(self.size);
    }

    /// Uploads this frame's skinned character.
    fn update_character(&mut self, viewer: &Viewer) {
        let vertices = viewer.character_vertices();
        match &self.character {
            Some(c) if c.vertex_count == vertices.len() => {
                self.queue
                    .write_buffer(&c.vertex_buf, 0, bytemuck::cast_slice(vertices));
            }
            _ => {
                self.character = GpuMesh::upload(
                    &self.device,
                    "character",
                    vertices,
                    viewer.character_indices(),
                );
            }
        }
    }

    pub fn render(&mut self, viewer: &Viewer) -> Result<(), wgpu::SurfaceError> {
        self.queue.write_buffer(
            &self.scene_buf,
            0,
            bytemuck::bytes_of(&SceneUniform::new(viewer)),
        );
        self.update_character(viewer);

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render encoder"),
            });

        let [r, g, b] = viewer.lighting().background;
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: srgb_to_linear(r),
                            g: srgb_to_linear(g),
                            b: srgb_to_linear(b),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            rp.set_bind_group(0, &self.scene_bg, &[]);

            rp.set_pipeline(&self.solid_pipeline);
            for mesh in [&self.solids, &self.character].into_iter().flatten() {
                mesh.draw(&mut rp);
            }

            rp.set_pipeline(&self.line_pipeline);
            if let Some(grid) = &self.grid {
                grid.draw(&mut rp);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
