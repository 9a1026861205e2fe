//! User-adjustable scene state.
//!
//! `SceneState` is owned by the input layer and passed by value into the
//! scene composer and view controller each frame. Each field has exactly one
//! writer (its setter); the rendering side never mutates it.

/// View angle restored by [`SceneState::reset`], in degrees.
///
/// Intentionally different from the mount-time default of 0°: the initial
/// pose is a straight top-down view, while reset returns to a three-quarter
/// view. Both literals are load-bearing.
pub const RESET_VIEW_ANGLE: f32 = 50.0;

/// Field of view used both at mount time and after reset.
pub const DEFAULT_FOV: f32 = 50.0;

/// The three numeric inputs driving the scene, snapshotted per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneState {
    /// Assembly rotation about +Y, in radians.
    pub rotation_radians: f32,
    /// Camera elevation input, degrees in [0, 90].
    pub view_angle_degrees: f32,
    /// Vertical field of view, degrees in [10, 100].
    pub fov: f32,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            rotation_radians: 0.0,
            view_angle_degrees: 0.0,
            fov: DEFAULT_FOV,
        }
    }
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rotation from a degree value, clamped to [0, 360].
    pub fn set_rotation_degrees(&mut self, degrees: f32) {
        self.rotation_radians = degrees.clamp(0.0, 360.0).to_radians();
    }

    /// Rotation converted back to degrees for display.
    pub fn rotation_degrees(&self) -> f32 {
        self.rotation_radians.to_degrees()
    }

    /// Rotation readout formatted to one decimal degree.
    pub fn rotation_label(&self) -> String {
        format!("{:.1}°", self.rotation_degrees())
    }

    /// Sets the view angle, clamped to [0, 90].
    pub fn set_view_angle(&mut self, degrees: f32) {
        self.view_angle_degrees = degrees.clamp(0.0, 90.0);
    }

    /// Sets the field of view, clamped to [10, 100].
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(10.0, 100.0);
    }

    /// Restores the baseline pose in one update: rotation 0°, view angle
    /// [`RESET_VIEW_ANGLE`], fov [`DEFAULT_FOV`].
    pub fn reset(&mut self) {
        *self = Self {
            rotation_radians: 0.0,
            view_angle_degrees: RESET_VIEW_ANGLE,
            fov: DEFAULT_FOV,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_to_documented_ranges() {
        let mut state = SceneState::new();

        state.set_rotation_degrees(400.0);
        assert_eq!(state.rotation_degrees().round(), 360.0);
        state.set_rotation_degrees(-20.0);
        assert_eq!(state.rotation_radians, 0.0);

        state.set_view_angle(120.0);
        assert_eq!(state.view_angle_degrees, 90.0);
        state.set_view_angle(-5.0);
        assert_eq!(state.view_angle_degrees, 0.0);

        state.set_fov(3.0);
        assert_eq!(state.fov, 10.0);
        state.set_fov(400.0);
        assert_eq!(state.fov, 100.0);
    }

    #[test]
    fn rotation_round_trips_through_radians() {
        let mut state = SceneState::new();
        state.set_rotation_degrees(90.0);
        assert!((state.rotation_radians - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((state.rotation_degrees() - 90.0).abs() < 1e-4);
        assert_eq!(state.rotation_label(), "90.0°");
    }

    #[test]
    fn reset_restores_baseline_regardless_of_prior_state() {
        let mut state = SceneState::new();
        state.set_rotation_degrees(213.0);
        state.set_view_angle(12.0);
        state.set_fov(95.0);

        state.reset();

        assert_eq!(state.rotation_radians, 0.0);
        assert_eq!(state.view_angle_degrees, RESET_VIEW_ANGLE);
        assert_eq!(state.fov, DEFAULT_FOV);
    }

    #[test]
    fn mount_default_differs_from_reset_view_angle() {
        // Deliberate asymmetry: initial view is top-down, reset is not.
        assert_eq!(SceneState::default().view_angle_degrees, 0.0);
        assert_ne!(SceneState::default().view_angle_degrees, RESET_VIEW_ANGLE);
    }
}
