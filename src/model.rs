//! Model asset parsing.
//!
//! Two interchange formats are supported, matching the two scene assets:
//!
//! | Format        | Extensions        | Notes                                  |
//! |---------------|-------------------|----------------------------------------|
//! | Wavefront OBJ | `.obj`            | multi-mesh, per-material diffuse color |
//! | glTF binary   | `.glb`, `.gltf`   | node transforms baked at load          |
//!
//! A parsed [`Model`] is a flat list of colored parts. The hierarchy of a
//! scene bundle is flattened by baking each node's world transform into the
//! vertex data, so the composer only deals in whole-model transforms.

use std::path::Path;

use glam::Mat4;

use crate::geometry::{RawGeometry, Vertex3d};
use crate::overlay::Color;

/// Errors that can occur when loading a model asset.
#[derive(Debug)]
pub enum ModelError {
    /// File could not be read.
    Io(std::io::Error),
    /// File format could not be determined from the extension.
    UnknownFormat(String),
    /// The model data was invalid or corrupt.
    Parse(String),
    /// The file parsed but contained no renderable geometry.
    Empty,
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Io(e) => write!(f, "IO error: {}", e),
            ModelError::UnknownFormat(ext) => write!(f, "Unknown model format: '{}'", ext),
            ModelError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ModelError::Empty => write!(f, "Model contains no geometry"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Io(e)
    }
}

/// One renderable piece of a model: geometry plus its surface color.
#[derive(Clone, Debug)]
pub struct ModelPart {
    pub geometry: RawGeometry,
    pub color: Color,
}

/// A parsed model asset, ready for upload and attachment to the scene.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub parts: Vec<ModelPart>,
}

impl Model {
    /// Loads a model file, detecting the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "obj" => Self::load_obj(path),
            "glb" | "gltf" => Self::load_gltf(path),
            _ => Err(ModelError::UnknownFormat(ext)),
        }
    }

    /// Forces the surface color of every part.
    ///
    /// The one-time post-load reshade applied to slot A before it is attached
    /// to the scene.
    pub fn force_color(&mut self, color: Color) {
        for part in &mut self.parts {
            part.color = color;
        }
    }

    /// Total vertex count across all parts, for startup logging.
    pub fn vertex_count(&self) -> usize {
        self.parts.iter().map(|p| p.geometry.vertices.len()).sum()
    }

    fn load_obj(path: &Path) -> Result<Self, ModelError> {
        let (meshes, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| ModelError::Parse(format!("OBJ: {}", e)))?;

        // Missing material library is tolerated; parts fall back to white.
        let materials = materials.unwrap_or_default();

        let mut parts = Vec::with_capacity(meshes.len());
        for mesh in meshes.into_iter().map(|m| m.mesh) {
            let has_normals = !mesh.normals.is_empty();
            let has_uvs = !mesh.texcoords.is_empty();

            let vertices: Vec<Vertex3d> = (0..mesh.positions.len() / 3)
                .map(|i| {
                    let position = [
                        mesh.positions[i * 3],
                        mesh.positions[i * 3 + 1],
                        mesh.positions[i * 3 + 2],
                    ];
                    let normal = if has_normals {
                        [
                            mesh.normals[i * 3],
                            mesh.normals[i * 3 + 1],
                            mesh.normals[i * 3 + 2],
                        ]
                    } else {
                        [0.0, 0.0, 0.0]
                    };
                    let uv = if has_uvs {
                        [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
                    } else {
                        [0.0, 0.0]
                    };
                    Vertex3d::new(position, normal, uv)
                })
                .collect();

            if vertices.is_empty() {
                continue;
            }

            let color = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .and_then(|m| m.diffuse)
                .map(|[r, g, b]| Color::rgb(r, g, b))
                .unwrap_or(Color::WHITE);

            let mut geometry = RawGeometry::new(vertices, mesh.indices);
            if !has_normals {
                geometry.recalculate_normals();
            }
            parts.push(ModelPart { geometry, color });
        }

        if parts.is_empty() {
            return Err(ModelError::Empty);
        }
        Ok(Self { parts })
    }

    fn load_gltf(path: &Path) -> Result<Self, ModelError> {
        let (document, buffers, _images) =
            gltf::import(path).map_err(|e| ModelError::Parse(format!("glTF: {}", e)))?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(ModelError::Empty)?;

        let mut parts = Vec::new();
        for node in scene.nodes() {
            collect_gltf_node(&node, Mat4::IDENTITY, &buffers, &mut parts);
        }

        if parts.is_empty() {
            return Err(ModelError::Empty);
        }
        Ok(Self { parts })
    }
}

/// Walks a glTF node hierarchy, baking accumulated transforms into each
/// primitive's vertices.
fn collect_gltf_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    parts: &mut Vec<ModelPart>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()][..]));

            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|n| n.collect())
                .unwrap_or_default();
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect())
                .unwrap_or_default();

            let vertices: Vec<Vertex3d> = positions
                .iter()
                .enumerate()
                .map(|(i, &position)| {
                    Vertex3d::new(
                        position,
                        normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
                        uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                    )
                })
                .collect();

            if vertices.is_empty() {
                continue;
            }

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|i| i.into_u32().collect())
                .unwrap_or_else(|| (0..vertices.len() as u32).collect());

            let [r, g, b, a] = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_factor();

            let mut geometry = RawGeometry::new(vertices, indices);
            if normals.is_empty() {
                geometry.recalculate_normals();
            }
            geometry.apply_transform(world);

            parts.push(ModelPart {
                geometry,
                color: Color::rgba(r, g, b, a),
            });
        }
    }

    for child in node.children() {
        collect_gltf_node(&child, world, buffers, parts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;

    fn two_part_model() -> Model {
        Model {
            parts: vec![
                ModelPart {
                    geometry: geometry::plane(1.0),
                    color: Color::rgb(0.2, 0.4, 0.6),
                },
                ModelPart {
                    geometry: geometry::hemisphere(1.0, 8, 4),
                    color: Color::WHITE,
                },
            ],
        }
    }

    #[test]
    fn force_color_reshades_every_part() {
        let mut model = two_part_model();
        model.force_color(Color::RED);
        for part in &model.parts {
            assert_eq!(part.color, Color::RED);
        }
    }

    #[test]
    fn unknown_extension_is_reported() {
        let err = Model::load("scene.xyz").unwrap_err();
        assert!(matches!(err, ModelError::UnknownFormat(ext) if ext == "xyz"));
    }

    #[test]
    fn missing_file_fails_with_parse_or_io() {
        // tobj reports missing files through its own error type.
        assert!(Model::load("does-not-exist.obj").is_err());
        assert!(Model::load("does-not-exist.glb").is_err());
    }

    #[test]
    fn vertex_count_sums_parts() {
        let model = two_part_model();
        assert_eq!(
            model.vertex_count(),
            model.parts[0].geometry.vertices.len() + model.parts[1].geometry.vertices.len()
        );
    }
}
