use glam::{Mat4, Vec2, Vec3};

/// A look-at camera for the scene.
///
/// Holds position, target, and vertical field of view. The view controller
/// in [`crate::view`] derives one of these from the two user inputs; nothing
/// else ever mutates it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// World-space position.
    pub position: Vec3,
    /// Point the camera looks at. Always the world origin in this viewer.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 200.0, 200.0),
            target: Vec3::ZERO,
            fov_degrees: 50.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Up vector for the look-at basis.
    ///
    /// When the camera sits directly above the target (top-down view at a
    /// view angle of 0°) the forward vector is parallel to world up, which
    /// would degenerate the basis. Fall back to -Z so the scene's +X stays
    /// to the right of the screen.
    pub fn up(&self) -> Vec3 {
        let forward = (self.target - self.position).normalize_or(Vec3::NEG_Z);
        if forward.y.abs() > 0.999 {
            Vec3::NEG_Z
        } else {
            Vec3::Y
        }
    }

    /// World-to-camera transformation.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up())
    }

    /// Camera-to-clip transformation for the given aspect ratio.
    pub fn projection_matrix(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, near, far)
    }

    /// Projects a world-space point to pixel coordinates.
    ///
    /// Returns `None` when the point is behind the camera. Used to anchor
    /// overlay text (asset-load error messages) at a fixed point in the scene.
    pub fn world_to_screen(
        &self,
        point: Vec3,
        width: f32,
        height: f32,
        near: f32,
        far: f32,
    ) -> Option<Vec2> {
        let view_proj = self.projection_matrix(width / height, near, far) * self.view_matrix();
        let clip = view_proj * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * width,
            (1.0 - ndc.y) * 0.5 * height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_matrix_finite_in_top_down_pose() {
        let camera = Camera {
            position: Vec3::new(0.0, 200.0, 0.0),
            target: Vec3::ZERO,
            fov_degrees: 50.0,
        };
        let view = camera.view_matrix();
        assert!(view.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = Camera {
            position: Vec3::new(0.0, 100.0, 100.0),
            target: Vec3::ZERO,
            fov_degrees: 50.0,
        };
        let screen = camera
            .world_to_screen(Vec3::ZERO, 800.0, 600.0, 0.1, 1000.0)
            .unwrap();
        assert!((screen.x - 400.0).abs() < 0.01);
        assert!((screen.y - 300.0).abs() < 0.01);
    }

    #[test]
    fn point_behind_camera_is_rejected() {
        let camera = Camera {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            fov_degrees: 50.0,
        };
        assert!(
            camera
                .world_to_screen(Vec3::new(0.0, 0.0, 20.0), 800.0, 600.0, 0.1, 1000.0)
                .is_none()
        );
    }
}
