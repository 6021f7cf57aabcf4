use glam::{Mat4, Vec3};

/// Camera orbiting a target point at a fixed distance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
}

const MIN_PITCH: f32 = 0.1;
const MAX_PITCH: f32 = 1.45;

impl OrbitCamera {
    pub fn new(yaw: f32, pitch: f32, distance: f32, target: Vec3) -> Self {
        Self {
            yaw,
            pitch: pitch.clamp(MIN_PITCH, MAX_PITCH),
            distance,
            target,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.target
            + Vec3::new(
                self.distance * self.yaw.cos() * self.pitch.cos(),
                self.distance * self.pitch.sin(),
                self.distance * self.yaw.sin() * self.pitch.cos(),
            )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn proj_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, aspect, 0.1, self.distance * 4.0)
    }

    pub fn view_proj_matrix(&self, aspect: f32) -> Mat4 {
        self.proj_matrix(aspect) * self.view_matrix()
    }

    /// Pitch stays above the surface and short of the pole.
    pub fn orbit(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw = (self.yaw + d_yaw).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + d_pitch).clamp(MIN_PITCH, MAX_PITCH);
    }

    pub fn zoom(&mut self, lines: f32, min: f32, max: f32) {
        self.distance = (self.distance * 0.9f32.powf(lines)).clamp(min, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(0.0, 0.5, 10.0, Vec3::ZERO)
    }

    #[test]
    fn position_is_at_distance_from_target() {
        let mut c = camera();
        for _ in 0..8 {
            c.orbit(0.7, 0.1);
            assert!((c.position().distance(c.target) - c.distance).abs() < 1e-4);
        }
    }

    #[test]
    fn pitch_is_clamped() {
        let mut c = camera();
        c.orbit(0.0, 10.0);
        assert_eq!(c.pitch, MAX_PITCH);
        c.orbit(0.0, -10.0);
        assert_eq!(c.pitch, MIN_PITCH);
        assert!(c.position().y > 0.0);
    }

    #[test]
    fn zoom_respects_bounds() {
        let mut c = camera();
        c.zoom(100.0, 2.0, 50.0);
        assert_eq!(c.distance, 2.0);
        c.zoom(-100.0, 2.0, 50.0);
        assert_eq!(c.distance, 50.0);
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let c = camera();
        let clip = c.view_proj_matrix(16.0 / 9.0) * c.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
