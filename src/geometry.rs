//! CPU-side geometry: the raw vertex representation and the fixed scene
//! primitives.
//!
//! Everything here is GPU-free so the scene composer and its tests can run
//! without a device. [`RawGeometry`] is uploaded to a [`Mesh`](crate::Mesh)
//! once, at viewer startup or when a model asset arrives.

use glam::{Mat4, Vec3};

/// A vertex with position, normal, and texture coordinates.
///
/// `#[repr(C)]` with [`bytemuck`] derives so slices upload directly into
/// wgpu vertex buffers (32 bytes per vertex).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// Vertex buffer layout matching `shaders/scene.wgsl`.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Geometry data before GPU upload.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned bounding box as `(min, max)` corners.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    /// Recomputes smooth vertex normals from face geometry.
    ///
    /// Averages the area-weighted face normals of all triangles sharing each
    /// vertex. Used for model files that ship without normals.
    pub fn recalculate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = [0.0, 0.0, 0.0];
        }

        for tri in self.indices.chunks(3) {
            if tri.len() < 3 {
                continue;
            }
            let i0 = tri[0] as usize;
            let i1 = tri[1] as usize;
            let i2 = tri[2] as usize;

            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);
            let face_normal = (p1 - p0).cross(p2 - p0);

            for &i in &[i0, i1, i2] {
                self.vertices[i].normal[0] += face_normal.x;
                self.vertices[i].normal[1] += face_normal.y;
                self.vertices[i].normal[2] += face_normal.z;
            }
        }

        for v in &mut self.vertices {
            v.normal = Vec3::from(v.normal).normalize_or_zero().into();
        }
    }

    /// Bakes a node transform into the vertex data.
    ///
    /// Used when flattening a scene-bundle hierarchy: positions get the full
    /// matrix, normals the inverse-transpose (renormalized).
    pub fn apply_transform(&mut self, matrix: Mat4) {
        let normal_matrix = matrix.inverse().transpose();
        for v in &mut self.vertices {
            let p = matrix.transform_point3(Vec3::from(v.position));
            v.position = p.into();
            let n = normal_matrix
                .transform_vector3(Vec3::from(v.normal))
                .normalize_or_zero();
            v.normal = n.into();
        }
    }
}

/// A flat square quad on the XZ plane, normals up, centered at the origin.
///
/// The scene's 200x200 ground.
pub fn plane(size: f32) -> RawGeometry {
    let half = size * 0.5;
    let vertices = vec![
        Vertex3d::new([-half, 0.0, -half], [0.0, 1.0, 0.0], [0.0, 0.0]),
        Vertex3d::new([half, 0.0, -half], [0.0, 1.0, 0.0], [1.0, 0.0]),
        Vertex3d::new([half, 0.0, half], [0.0, 1.0, 0.0], [1.0, 1.0]),
        Vertex3d::new([-half, 0.0, half], [0.0, 1.0, 0.0], [0.0, 1.0]),
    ];
    let indices = vec![0, 2, 1, 0, 3, 2];
    RawGeometry::new(vertices, indices)
}

/// A thin flat annulus on the XZ plane: the circle outline.
///
/// Rendered as a mesh ring rather than a line primitive so the whole scene
/// goes through the one depth-tested pipeline. `width` is the radial
/// thickness, split evenly to either side of `radius`.
pub fn ring(radius: f32, width: f32, segments: u32) -> RawGeometry {
    let inner = radius - width * 0.5;
    let outer = radius + width * 0.5;
    let mut vertices = Vec::with_capacity((segments as usize + 1) * 2);
    let mut indices = Vec::with_capacity(segments as usize * 6);

    for seg in 0..=segments {
        let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
        let (sin, cos) = theta.sin_cos();
        let u = seg as f32 / segments as f32;
        vertices.push(Vertex3d::new(
            [cos * inner, 0.0, sin * inner],
            [0.0, 1.0, 0.0],
            [u, 0.0],
        ));
        vertices.push(Vertex3d::new(
            [cos * outer, 0.0, sin * outer],
            [0.0, 1.0, 0.0],
            [u, 1.0],
        ));
    }

    for seg in 0..segments {
        let base = seg * 2;
        indices.extend_from_slice(&[base, base + 2, base + 1, base + 1, base + 2, base + 3]);
    }

    RawGeometry::new(vertices, indices)
}

/// The upper half of a UV sphere, open at the bottom, centered at the origin.
///
/// The scene's dome. Poles at `y = radius`, rim at `y = 0`.
pub fn hemisphere(radius: f32, segments: u32, rings: u32) -> RawGeometry {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        // phi sweeps only the top quarter-arc: 0 (pole) to pi/2 (rim)
        let phi = std::f32::consts::FRAC_PI_2 * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for seg in 0..=segments {
            let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
            let x = ring_radius * theta.cos();
            let z = ring_radius * theta.sin();

            vertices.push(Vertex3d::new(
                [x * radius, y * radius, z * radius],
                [x, y, z],
                [seg as f32 / segments as f32, ring as f32 / rings as f32],
            ));
        }
    }

    for ring in 0..rings {
        for seg in 0..segments {
            let current = ring * (segments + 1) + seg;
            let next = current + segments + 1;

            indices.push(current);
            indices.push(current + 1);
            indices.push(next);

            indices.push(current + 1);
            indices.push(next + 1);
            indices.push(next);
        }
    }

    RawGeometry::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_spans_its_size_on_xz() {
        let geom = plane(200.0);
        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-100.0, 0.0, -100.0));
        assert_eq!(max, Vec3::new(100.0, 0.0, 100.0));
    }

    #[test]
    fn ring_is_coplanar_and_at_radius() {
        let (radius, width) = (100.0, 1.0);
        let geom = ring(radius, width, 64);
        for v in &geom.vertices {
            assert_eq!(v.position[1], 0.0);
            let r = (v.position[0].powi(2) + v.position[2].powi(2)).sqrt();
            // Rim vertices sit exactly on the band edge; allow f32 rounding.
            assert!(
                (r - radius).abs() <= width * 0.5 + 1e-3,
                "radius {r} out of band"
            );
        }
    }

    #[test]
    fn hemisphere_never_dips_below_its_rim() {
        let geom = hemisphere(2.5, 32, 16);
        let (min, max) = geom.bounds();
        assert!(min.y >= -1e-4);
        assert!((max.y - 2.5).abs() < 1e-4);
    }

    #[test]
    fn apply_transform_moves_positions_and_keeps_unit_normals() {
        let mut geom = plane(2.0);
        geom.apply_transform(Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)));
        let (min, _) = geom.bounds();
        assert_eq!(min.y, 5.0);
        for v in &geom.vertices {
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-4);
        }
    }
}
