//! # Turnstage
//!
//! **An interactive turntable viewer for 3D model assemblies.**
//!
//! Turnstage renders a fixed stage (a ground plane, an outline circle, a
//! small dome) with two externally loaded models attached above it, and lets
//! you spin the whole assembly, tilt the camera along a quarter-circle arc,
//! and widen or narrow the field of view. Models load in the background;
//! a load failure shows its message in the scene instead of taking the
//! viewer down.
//!
//! ## Quick Start
//!
//! ```no_run
//! use turnstage::ViewerConfig;
//!
//! fn main() {
//!     env_logger::init();
//!     turnstage::run(ViewerConfig::new().title("Turnstage"));
//! }
//! ```
//!
//! ## Controls
//!
//! - **Left / Right** — rotate the assembly (0-360°)
//! - **Down / Up** — camera elevation (0-90°, top-down at 0)
//! - **`[` / `]`** — field of view (10-100)
//! - **`R`** — reset to the baseline pose

mod app;
mod assets;
mod camera;
mod geometry;
mod gpu;
mod input;
mod mesh;
mod mesh_pass;
mod model;
mod overlay;
pub mod scene;
mod state;
mod view;

pub use app::{ViewerConfig, run};
pub use assets::{AssetHandle, AssetState};
pub use camera::Camera;
pub use geometry::{RawGeometry, Vertex3d};
pub use gpu::GpuContext;
pub use input::Input;
pub use mesh::{Mesh, Transform};
pub use mesh_pass::{DrawCall, MeshPass};
pub use model::{Model, ModelError, ModelPart};
pub use overlay::{Color, Overlay};
pub use scene::{SceneComposer, SceneConfig};
pub use state::{DEFAULT_FOV, RESET_VIEW_ANGLE, SceneState};
pub use view::{CAMERA_RADIUS, camera_pose, elevation_radians};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export the key codes used by the control bindings
pub use winit::keyboard::KeyCode;
