//! The viewer application: window, event loop, and per-frame orchestration.
//!
//! Each redraw follows the same sequence: fold input into [`SceneState`],
//! poll the asset handles, assemble the instance list, resolve instances to
//! GPU meshes, render the 3D pass, then the overlay readouts on top.
//!
//! Keyboard controls stand in for the three sliders:
//!
//! | Keys            | Control                     |
//! |-----------------|-----------------------------|
//! | Left / Right    | assembly rotation, 0-360°   |
//! | Down / Up       | view angle, 0-90°           |
//! | `[` / `]`       | field of view, 10-100       |
//! | `R`             | reset to the baseline pose  |

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::gpu::GpuContext;
use crate::input::Input;
use crate::mesh::Mesh;
use crate::mesh_pass::{DrawCall, MeshPass, FAR, NEAR};
use crate::overlay::{Color, Overlay};
use crate::scene::{self, ModelSlot, NodeKind, SceneComposer, SceneConfig};
use crate::state::SceneState;
use crate::geometry;
use crate::view::camera_pose;

/// Degrees of rotation per second while an arrow key is held.
const ROTATION_RATE: f32 = 60.0;
/// Degrees of view angle per second.
const VIEW_RATE: f32 = 45.0;
/// FOV units per second.
const FOV_RATE: f32 = 40.0;

/// Background clear, 0xf0f0f0 converted to linear for the sRGB surface.
const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.871,
    g: 0.871,
    b: 0.871,
    a: 1.0,
};

const MARGIN: f32 = 10.0;
const PANEL_PAD: f32 = 6.0;

/// Window and scene configuration for [`run`].
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub scene: SceneConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Turnstage".to_string(),
            width: 1280,
            height: 720,
            scene: SceneConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }
}

/// Opens the window and runs the viewer until closed.
pub fn run(config: ViewerConfig) {
    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::Pending { config };
    event_loop.run_app(&mut app).unwrap();
}

/// GPU-resident meshes for one loaded model, indexed alongside
/// [`Model::parts`](crate::model::Model::parts).
struct GpuModel {
    parts: Vec<Mesh>,
}

struct StaticMeshes {
    ground: Mesh,
    ring: Mesh,
    dome: Mesh,
}

impl StaticMeshes {
    fn upload(gpu: &GpuContext) -> Self {
        Self {
            ground: Mesh::from_geometry(gpu, &geometry::plane(scene::GROUND_SIZE)),
            ring: Mesh::from_geometry(
                gpu,
                &geometry::ring(scene::RING_RADIUS, scene::RING_WIDTH, scene::RING_SEGMENTS),
            ),
            dome: Mesh::from_geometry(
                gpu,
                &geometry::hemisphere(scene::DOME_RADIUS, 32, 16),
            ),
        }
    }
}

enum ViewerApp {
    Pending {
        config: ViewerConfig,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        mesh_pass: MeshPass,
        overlay: Overlay,
        input: Input,
        state: SceneState,
        composer: SceneComposer,
        statics: StaticMeshes,
        gpu_models: [Option<GpuModel>; 2],
        last_frame: Instant,
    },
}

impl ViewerApp {
    fn slot_index(slot: ModelSlot) -> usize {
        match slot {
            ModelSlot::A => 0,
            ModelSlot::B => 1,
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let ViewerApp::Pending { config } = self {
            let window_attrs = WindowAttributes::default()
                .with_title(&config.title)
                .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

            let window = Arc::new(event_loop.create_window(window_attrs).unwrap());
            let gpu = GpuContext::new(window.clone());
            let mesh_pass = MeshPass::new(&gpu);
            let overlay = Overlay::new(&gpu, 16.0);
            let composer = SceneComposer::new(&config.scene);
            let statics = StaticMeshes::upload(&gpu);

            *self = ViewerApp::Running {
                window,
                gpu,
                mesh_pass,
                overlay,
                input: Input::new(),
                state: SceneState::new(),
                composer,
                statics,
                gpu_models: [None, None],
                last_frame: Instant::now(),
            };
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let ViewerApp::Running {
            window,
            gpu,
            mesh_pass,
            overlay,
            input,
            state,
            composer,
            statics,
            gpu_models,
            last_frame,
        } = self
        else {
            return;
        };

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;

                apply_controls(state, input, dt);

                // Marshal finished loads onto this thread and upload any
                // newly arrived geometry.
                if composer.poll() {
                    for slot in [ModelSlot::A, ModelSlot::B] {
                        let index = ViewerApp::slot_index(slot);
                        if gpu_models[index].is_none() {
                            if let Some(model) = composer.asset(slot).model() {
                                gpu_models[index] = Some(GpuModel {
                                    parts: model
                                        .parts
                                        .iter()
                                        .map(|part| Mesh::from_geometry(gpu, &part.geometry))
                                        .collect(),
                                });
                            }
                        }
                    }
                }

                let camera = camera_pose(state.view_angle_degrees, state.fov);
                let instances = composer.assemble(state.rotation_radians);

                let mut draw_calls = Vec::with_capacity(instances.len());
                for instance in &instances {
                    let mesh = match instance.kind {
                        NodeKind::Ground => &statics.ground,
                        NodeKind::Ring => &statics.ring,
                        NodeKind::Dome => &statics.dome,
                        NodeKind::Part { slot, index } => {
                            let Some(model) = &gpu_models[ViewerApp::slot_index(slot)] else {
                                continue;
                            };
                            &model.parts[index]
                        }
                    };
                    draw_calls.push(DrawCall {
                        mesh,
                        transform: instance.transform,
                        color: instance.color,
                    });
                }

                let output = match gpu.surface.get_current_texture() {
                    Ok(output) => output,
                    Err(e) => {
                        log::warn!("surface frame unavailable: {e}; reconfiguring");
                        gpu.resize(gpu.width(), gpu.height());
                        window.request_redraw();
                        return;
                    }
                };
                let target = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                let mut encoder = gpu
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("Frame Encoder"),
                    });

                mesh_pass.render(gpu, &mut encoder, &target, BACKGROUND, &camera, &draw_calls);
                queue_readouts(overlay, gpu, state, composer, &camera);
                overlay.render(gpu, &mut encoder, &target);

                gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                input.end_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}

/// Folds held keys into the scene state, rate-scaled by `dt`.
fn apply_controls(state: &mut SceneState, input: &Input, dt: f32) {
    let mut rotation = state.rotation_degrees();
    if input.key_down(KeyCode::ArrowRight) {
        rotation += ROTATION_RATE * dt;
    }
    if input.key_down(KeyCode::ArrowLeft) {
        rotation -= ROTATION_RATE * dt;
    }
    state.set_rotation_degrees(rotation);

    let mut view_angle = state.view_angle_degrees;
    if input.key_down(KeyCode::ArrowUp) {
        view_angle += VIEW_RATE * dt;
    }
    if input.key_down(KeyCode::ArrowDown) {
        view_angle -= VIEW_RATE * dt;
    }
    state.set_view_angle(view_angle);

    let mut fov = state.fov;
    if input.key_down(KeyCode::BracketRight) {
        fov += FOV_RATE * dt;
    }
    if input.key_down(KeyCode::BracketLeft) {
        fov -= FOV_RATE * dt;
    }
    state.set_fov(fov);

    if input.key_pressed(KeyCode::KeyR) {
        state.reset();
    }
}

/// Queues the control readouts and any asset-failure messages.
fn queue_readouts(
    overlay: &mut Overlay,
    gpu: &GpuContext,
    state: &SceneState,
    composer: &SceneComposer,
    camera: &crate::camera::Camera,
) {
    let width = gpu.width() as f32;
    let height = gpu.height() as f32;
    let line = overlay.line_height();

    let panel_line = |overlay: &mut Overlay, x: f32, y: f32, text: &str, color: Color| {
        let w = overlay.text_width(text);
        overlay.rect(
            x - PANEL_PAD,
            y - PANEL_PAD,
            w + PANEL_PAD * 2.0,
            line + PANEL_PAD * 2.0,
            Color::PANEL_BG,
        );
        overlay.text(x, y, text, color);
    };

    // Top-left: current view angle.
    let view_label = format!("{:.0}° View", state.view_angle_degrees);
    panel_line(overlay, MARGIN + PANEL_PAD, MARGIN + PANEL_PAD, &view_label, Color::BLACK);

    // Bottom-left: rotation (one decimal) and fov.
    let rotate_label = format!("Rotate: {}", state.rotation_label());
    let fov_label = format!("FOV: {:.0}", state.fov);
    let stack_y = height - MARGIN - (line + PANEL_PAD * 2.0) * 2.0 + PANEL_PAD;
    panel_line(overlay, MARGIN + PANEL_PAD, stack_y, &rotate_label, Color::BLACK);
    panel_line(
        overlay,
        MARGIN + PANEL_PAD,
        stack_y + line + PANEL_PAD * 2.0,
        &fov_label,
        Color::BLACK,
    );

    // Bottom-right: the one-shot binding.
    let hint = "R: reset view";
    let hint_w = overlay.text_width(hint);
    panel_line(
        overlay,
        width - MARGIN - PANEL_PAD - hint_w,
        height - MARGIN - line - PANEL_PAD,
        hint,
        Color::BLACK,
    );

    // Failure messages ride a fixed world anchor so they sit in the scene,
    // not in a screen corner. Skipped when the anchor is behind the camera.
    let errors = composer.errors();
    if !errors.is_empty() {
        if let Some(screen) = camera.world_to_screen(scene::ERROR_ANCHOR, width, height, NEAR, FAR)
        {
            for (i, message) in errors.iter().enumerate() {
                let w = overlay.text_width(message);
                let x = screen.x - w * 0.5;
                let y = screen.y + i as f32 * (line + 2.0);
                overlay.rect(
                    x - PANEL_PAD,
                    y - PANEL_PAD,
                    w + PANEL_PAD * 2.0,
                    line + PANEL_PAD * 2.0,
                    Color::PANEL_BG,
                );
                overlay.text(x, y, message, Color::RED);
            }
        }
    }
}
