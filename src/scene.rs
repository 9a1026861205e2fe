//! The scene composer: fixed geometry plus two asynchronously loaded models,
//! rotated as one assembly.
//!
//! The composer is deliberately GPU-free. [`SceneComposer::assemble`] is the
//! per-frame tick function: given the latest committed rotation it returns the
//! full instance list (static nodes plus whatever model parts have arrived),
//! and the viewer shell maps those instances onto GPU meshes. That keeps the
//! rotation and attachment logic callable from plain unit tests.

use std::path::PathBuf;

use glam::{Quat, Vec3};

use crate::assets::AssetHandle;
use crate::mesh::Transform;
use crate::overlay::Color;

/// Edge length of the square ground quad.
pub const GROUND_SIZE: f32 = 200.0;
/// Radius of the outline circle drawn on the ground.
pub const RING_RADIUS: f32 = 100.0;
/// Radial thickness of the outline ring mesh.
pub const RING_WIDTH: f32 = 1.0;
/// Segments for the outline circle.
pub const RING_SEGMENTS: u32 = 64;
/// Radius of the hemisphere dome at the assembly origin.
pub const DOME_RADIUS: f32 = 2.5;
/// Lift applied to the ring and dome so they never z-fight the ground.
pub const SURFACE_LIFT: f32 = 0.05;
/// Uniform scale applied to both loaded models.
pub const MODEL_SCALE: f32 = 0.05;
/// World-space anchor for asset-failure overlay messages.
pub const ERROR_ANCHOR: Vec3 = Vec3::new(0.0, 2.0, 0.0);

const MODEL_A_OFFSET: Vec3 = Vec3::new(60.0, 50.0, 0.0);
const MODEL_B_OFFSET: Vec3 = Vec3::new(-60.0, 50.0, 0.0);

const GROUND_COLOR: Color = Color::rgb(0.678, 0.847, 0.902); // light blue
const RING_COLOR: Color = Color::rgb(0.564, 0.933, 0.564); // light green
const DOME_COLOR: Color = Color::rgb(0.0, 0.502, 0.0); // green

/// The two model attachment points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelSlot {
    /// Reshaded to red on load.
    A,
    /// Attached with its own material colors.
    B,
}

impl ModelSlot {
    fn offset(self) -> Vec3 {
        match self {
            ModelSlot::A => MODEL_A_OFFSET,
            ModelSlot::B => MODEL_B_OFFSET,
        }
    }
}

/// Identifies which geometry an [`Instance`] renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Ground,
    Ring,
    Dome,
    /// One part of a loaded model.
    Part { slot: ModelSlot, index: usize },
}

/// One renderable node of the assembled scene for the current frame.
#[derive(Clone, Copy, Debug)]
pub struct Instance {
    pub kind: NodeKind,
    pub transform: Transform,
    pub color: Color,
}

/// Where the composer finds its two model files.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub model_a: PathBuf,
    pub model_b: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model_a: PathBuf::from("assets/models/probe.obj"),
            model_b: PathBuf::from("assets/models/glider.glb"),
        }
    }
}

/// Owns the two asset handles and produces the per-frame instance list.
pub struct SceneComposer {
    model_a: AssetHandle,
    model_b: AssetHandle,
}

impl SceneComposer {
    /// Builds the composer and fires both load requests. Loads are issued
    /// once, here; they are never repeated or retried.
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            model_a: AssetHandle::spawn("probe", config.model_a.clone(), Some(Color::RED)),
            model_b: AssetHandle::spawn("glider", config.model_b.clone(), None),
        }
    }

    #[cfg(test)]
    fn from_handles(model_a: AssetHandle, model_b: AssetHandle) -> Self {
        Self { model_a, model_b }
    }

    /// Drains both load channels. Returns `true` if either handle
    /// transitioned this frame, so the caller knows to upload new geometry.
    pub fn poll(&mut self) -> bool {
        let a = self.model_a.poll();
        let b = self.model_b.poll();
        a || b
    }

    pub fn asset(&self, slot: ModelSlot) -> &AssetHandle {
        match slot {
            ModelSlot::A => &self.model_a,
            ModelSlot::B => &self.model_b,
        }
    }

    /// The per-frame tick: applies `rotation_radians` about +Y to the whole
    /// assembly and lists every node to draw.
    ///
    /// Static geometry is always present. Model parts appear only once their
    /// asset is `Loaded`; a failed asset simply contributes nothing. Called
    /// every frame, so the output always reflects the latest committed
    /// rotation with no buffering beyond the frame itself.
    pub fn assemble(&self, rotation_radians: f32) -> Vec<Instance> {
        let group = Quat::from_rotation_y(rotation_radians);
        let lift = Vec3::new(0.0, SURFACE_LIFT, 0.0);

        let mut instances = vec![
            Instance {
                kind: NodeKind::Ground,
                transform: Transform::new().rotation(group),
                color: GROUND_COLOR,
            },
            Instance {
                kind: NodeKind::Ring,
                transform: Transform::new().rotation(group).position(group * lift),
                color: RING_COLOR,
            },
            Instance {
                kind: NodeKind::Dome,
                transform: Transform::new().rotation(group).position(group * lift),
                color: DOME_COLOR,
            },
        ];

        for slot in [ModelSlot::A, ModelSlot::B] {
            let Some(model) = self.asset(slot).model() else {
                continue;
            };
            for (index, part) in model.parts.iter().enumerate() {
                instances.push(Instance {
                    kind: NodeKind::Part { slot, index },
                    transform: Transform::new()
                        .position(group * slot.offset())
                        .rotation(group)
                        .uniform_scale(MODEL_SCALE),
                    color: part.color,
                });
            }
        }

        instances
    }

    /// Failure messages to overlay at [`ERROR_ANCHOR`], at most one per asset.
    pub fn errors(&self) -> Vec<&str> {
        [&self.model_a, &self.model_b]
            .into_iter()
            .filter_map(|handle| handle.error())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;
    use crate::model::{Model, ModelPart};

    fn pending_composer() -> (
        SceneComposer,
        std::sync::mpsc::Sender<Result<Model, String>>,
        std::sync::mpsc::Sender<Result<Model, String>>,
    ) {
        let (a, tx_a) = AssetHandle::with_channel("probe");
        let (b, tx_b) = AssetHandle::with_channel("glider");
        (SceneComposer::from_handles(a, b), tx_a, tx_b)
    }

    fn sample_model(parts: usize) -> Model {
        Model {
            parts: (0..parts)
                .map(|_| ModelPart {
                    geometry: geometry::plane(1.0),
                    color: Color::WHITE,
                })
                .collect(),
        }
    }

    #[test]
    fn static_geometry_renders_before_any_asset_arrives() {
        let (composer, _tx_a, _tx_b) = pending_composer();
        let instances = composer.assemble(0.0);
        let kinds: Vec<NodeKind> = instances.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, [NodeKind::Ground, NodeKind::Ring, NodeKind::Dome]);
        assert!(composer.errors().is_empty());
    }

    #[test]
    fn rotation_is_applied_uniformly_to_every_node() {
        let (mut composer, tx_a, _tx_b) = pending_composer();
        tx_a.send(Ok(sample_model(1))).unwrap();
        composer.poll();

        let rotation = std::f32::consts::FRAC_PI_2;
        let group = Quat::from_rotation_y(rotation);
        for instance in composer.assemble(rotation) {
            assert!(
                instance.transform.rotation.abs_diff_eq(group, 1e-6),
                "{:?} missed the group rotation",
                instance.kind
            );
        }
    }

    #[test]
    fn model_offsets_rotate_with_the_assembly() {
        let (mut composer, tx_a, tx_b) = pending_composer();
        tx_a.send(Ok(sample_model(1))).unwrap();
        tx_b.send(Ok(sample_model(1))).unwrap();
        composer.poll();

        // Quarter turn about +Y carries (60, 50, 0) to (0, 50, -60).
        let instances = composer.assemble(std::f32::consts::FRAC_PI_2);
        let part_a = instances
            .iter()
            .find(|i| matches!(i.kind, NodeKind::Part { slot: ModelSlot::A, .. }))
            .unwrap();
        assert!(
            (part_a.transform.position - Vec3::new(0.0, 50.0, -60.0)).length() < 1e-3,
            "got {:?}",
            part_a.transform.position
        );
        let part_b = instances
            .iter()
            .find(|i| matches!(i.kind, NodeKind::Part { slot: ModelSlot::B, .. }))
            .unwrap();
        assert!((part_b.transform.position - Vec3::new(0.0, 50.0, 60.0)).length() < 1e-3);
    }

    #[test]
    fn loaded_parts_are_scaled_down_uniformly() {
        let (mut composer, tx_a, _tx_b) = pending_composer();
        tx_a.send(Ok(sample_model(2))).unwrap();
        composer.poll();

        for instance in composer.assemble(0.0) {
            match instance.kind {
                NodeKind::Part { .. } => {
                    assert_eq!(instance.transform.scale, Vec3::splat(MODEL_SCALE));
                }
                _ => assert_eq!(instance.transform.scale, Vec3::ONE),
            }
        }
    }

    #[test]
    fn one_failure_never_blocks_the_other_model() {
        let (mut composer, tx_a, tx_b) = pending_composer();
        tx_a.send(Err("Failed to load probe model: Parse error".into()))
            .unwrap();
        tx_b.send(Ok(sample_model(3))).unwrap();
        composer.poll();

        let instances = composer.assemble(0.0);
        let part_count = instances
            .iter()
            .filter(|i| matches!(i.kind, NodeKind::Part { slot: ModelSlot::B, .. }))
            .count();
        assert_eq!(part_count, 3);
        assert!(
            !instances
                .iter()
                .any(|i| matches!(i.kind, NodeKind::Part { slot: ModelSlot::A, .. }))
        );

        // Exactly one error message, and the static geometry is untouched.
        assert_eq!(composer.errors().len(), 1);
        assert_eq!(instances[0].kind, NodeKind::Ground);
    }
}
