//! The view controller: maps the two camera inputs to a camera pose.
//!
//! Both functions are pure. The frame loop calls [`camera_pose`] with the
//! current `SceneState` snapshot every time either input changes; calling it
//! with the same inputs always yields the same pose.

use glam::Vec3;

use crate::camera::Camera;

/// Distance from the world origin at which the camera orbits.
pub const CAMERA_RADIUS: f32 = 200.0;

/// Maps the view-angle slider range [0, 90] onto radians [0, π/2].
///
/// This is a deliberate range compression rather than a plain degree-to-radian
/// conversion: the full slider travel sweeps exactly a quarter circle, from
/// top-down at 0 to horizon-level at 90. Out-of-range input is clamped.
pub fn elevation_radians(view_angle_degrees: f32) -> f32 {
    let view = view_angle_degrees.clamp(0.0, 90.0);
    (view / 90.0) * std::f32::consts::FRAC_PI_2
}

/// Derives the camera pose from the two independent inputs.
///
/// The position traces a quarter-circle arc of radius [`CAMERA_RADIUS`] in the
/// X-Y plane and the camera re-targets the origin after every move. The field
/// of view is applied as-is (clamped to its documented range) and never
/// affects the position; likewise the view angle never affects the fov.
pub fn camera_pose(view_angle_degrees: f32, fov: f32) -> Camera {
    let angle = elevation_radians(view_angle_degrees);
    Camera {
        position: Vec3::new(angle.sin() * CAMERA_RADIUS, angle.cos() * CAMERA_RADIUS, 0.0),
        target: Vec3::ZERO,
        fov_degrees: fov.clamp(10.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevation_maps_endpoints_exactly() {
        assert_eq!(elevation_radians(0.0), 0.0);
        assert_eq!(elevation_radians(90.0), std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn elevation_is_monotonic() {
        let mut previous = elevation_radians(0.0);
        for deg in 1..=90 {
            let current = elevation_radians(deg as f32);
            assert!(current > previous, "not increasing at {deg}");
            previous = current;
        }
    }

    #[test]
    fn elevation_clamps_out_of_range_input() {
        assert_eq!(elevation_radians(-10.0), 0.0);
        assert_eq!(elevation_radians(120.0), std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn camera_stays_on_the_arc() {
        for deg in 0..=90 {
            let pose = camera_pose(deg as f32, 50.0);
            let radius = pose.position.length();
            assert!(
                (radius - CAMERA_RADIUS).abs() < 1e-3,
                "radius {radius} at {deg}"
            );
            assert_eq!(pose.position.z, 0.0);
        }
    }

    #[test]
    fn top_down_and_horizon_poses() {
        let top = camera_pose(0.0, 50.0);
        assert!((top.position - Vec3::new(0.0, 200.0, 0.0)).length() < 1e-3);

        let horizon = camera_pose(90.0, 50.0);
        assert!((horizon.position - Vec3::new(200.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn camera_always_targets_origin() {
        for deg in [0.0, 13.0, 45.0, 77.0, 90.0] {
            assert_eq!(camera_pose(deg, 50.0).target, Vec3::ZERO);
        }
    }

    #[test]
    fn fov_and_view_angle_are_orthogonal() {
        let base = camera_pose(30.0, 50.0);
        for fov in [10.0, 25.0, 60.0, 100.0] {
            let pose = camera_pose(30.0, fov);
            assert_eq!(pose.position, base.position, "fov {fov} moved the camera");
        }
        for deg in [0.0, 30.0, 60.0, 90.0] {
            let pose = camera_pose(deg, 50.0);
            assert_eq!(pose.fov_degrees, 50.0, "view {deg} changed the fov");
        }
    }

    #[test]
    fn fov_is_clamped() {
        assert_eq!(camera_pose(45.0, 5.0).fov_degrees, 10.0);
        assert_eq!(camera_pose(45.0, 250.0).fov_degrees, 100.0);
    }
}
