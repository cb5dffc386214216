mod anim;
mod assets;
mod camera;
mod collision;
mod config;
mod debug_panel;
mod gfx;
mod input;
mod mesh;
mod model;
mod motion;
mod scene;
mod stats;
mod viewer;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use glam::Vec3;

use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use anim::AnimName;
use assets::ClipLoader;
use camera::OrbitCamera;
use config::{CliArgs, ViewerConfig};
use gfx::Gfx;
use model::Model;
use scene::SceneLayout;
use stats::FrameStats;
use viewer::Viewer;

const PLACEHOLDER_HEIGHT: f32 = 180.0;
const PLACEHOLDER_WIDTH: f32 = 60.0;

const CONTROLS: &[&str] = &[
    "w/a/s/d  walk (relative to the camera)",
    "q        sword attack",
    "e        sword slash",
    "r        defend",
    "b        battle cry",
    "t        kick",
    "1/2 3/4  sun / hemisphere light -/+",
    "5/6      fog distance -/+",
    "mouse    left-drag orbit, right-drag pan, wheel zoom",
    "esc      quit",
];

#[derive(Default)]
struct Drag {
    left: bool,
    right: bool,
    last: Option<PhysicalPosition<f64>>,
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let mut cfg = ViewerConfig::load(&args.config)?;
    cfg.apply_cli_overrides(&args);

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let model = match assets::load_model(&cfg.assets.model_path(), cfg.assets.model_scale) {
        Ok(m) => m,
        Err(e) => {
            log::error!("{e}; using a placeholder model");
            Model::placeholder(PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH)
        }
    };
    let layout = SceneLayout::build(&cfg.scene);
    let mut camera = OrbitCamera::new(
        Vec3::from(cfg.camera.position),
        Vec3::from(cfg.camera.target),
        cfg.camera.fov_y_deg,
        cfg.camera.near,
        cfg.camera.far,
    );
    camera.set_viewport(cfg.window.width, cfg.window.height);
    let mut viewer = Viewer::new(model, layout, camera, &cfg.motion);
    let bounds = viewer.model_bounds();
    log::info!("character at {}, size {}", bounds.center(), bounds.size());
    let mut loader = ClipLoader::spawn(&cfg.assets);

    let event_loop = EventLoop::new().context("create event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&cfg.window.title)
            .with_inner_size(PhysicalSize::new(cfg.window.width, cfg.window.height))
            .build(&event_loop)
            .context("create window")?,
    );
    let window_for_loop = window.clone();
    let mut gfx = pollster::block_on(Gfx::new(window, &viewer, cfg.window.vsync))?;
    viewer.camera_mut().set_viewport(gfx.size.width, gfx.size.height);

    log::info!("controls:");
    for line in CONTROLS {
        log::info!("  {line}");
    }

    let title = cfg.window.title.clone();
    let mut stats = FrameStats::new(Duration::from_secs(2));
    let mut last_frame = Instant::now();
    let mut drag = Drag::default();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => elwt.exit(),

                    WindowEvent::Resized(size) => {
                        gfx.resize(size);
                        viewer.camera_mut().set_viewport(size.width, size.height);
                        log::info!("resized to {}x{}", size.width, size.height);
                    }

                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.repeat {
                            return;
                        }
                        let down = event.state == ElementState::Pressed;
                        if down && event.logical_key == Key::Named(NamedKey::Escape) {
                            elwt.exit();
                            return;
                        }
                        if let Some(id) = input::key_id(&event.logical_key) {
                            if let Some(t) = viewer.on_key(&id, down) {
                                log::debug!("key {id:?}: {:?} -> {}", t.from, t.to);
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        let down = state == ElementState::Pressed;
                        match button {
                            MouseButton::Left => drag.left = down,
                            MouseButton::Right => drag.right = down,
                            _ => {}
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        if let Some(last) = drag.last {
                            let dx = (position.x - last.x) as f32;
                            let dy = (position.y - last.y) as f32;
                            if drag.left {
                                viewer.camera_mut().orbit(dx, dy);
                            } else if drag.right {
                                viewer.camera_mut().pan(dx, dy);
                            }
                        }
                        drag.last = Some(position);
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let steps = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(p) => (p.y / 50.0) as f32,
                        };
                        viewer.camera_mut().zoom(steps);
                    }

                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        let frame_time = now - last_frame;
                        last_frame = now;

                        viewer.on_clips_loaded(loader.drain());
                        viewer.frame(frame_time.as_secs_f32());

                        match gfx.render(&viewer) {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                gfx.reconfigure();
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("out of GPU memory");
                                elwt.exit();
                            }
                            Err(e) => log::warn!("frame skipped: {e}"),
                        }

                        if let Some(snap) = stats.record(frame_time) {
                            let anim = viewer.active_animation().map_or("loading", AnimName::as_str);
                            window_for_loop.set_title(&format!("{title} - {:.0} fps - {anim}", snap.fps));
                            log::info!(
                                "{:.1} fps, avg {:.2} ms, max {:.2} ms, {} clips pending, character at {}, {}",
                                snap.fps,
                                snap.avg_ms,
                                snap.max_ms,
                                loader.pending(),
                                viewer.pose().position,
                                viewer.animation_status()
                            );
                        }
                    }

                    _ => {}
                },

                Event::AboutToWait => {
                    window_for_loop.request_redraw();
                }

                _ => {}
            }
        })
        .context("run event loop")?;

    Ok(())
}
