use glam::{Mat4, Vec2, Vec3};

/// Orthographic camera framing a square board, letterboxed to the window.
///
/// The board spans `[0, board_size]` on both axes; the shorter window side
/// fits the board exactly and the longer side gets empty margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCamera {
    pub board_size: f32,
    pub aspect: f32,
}

impl GridCamera {
    pub fn new(board_size: i32, width: u32, height: u32) -> Self {
        let mut cam = Self {
            board_size: board_size as f32,
            aspect: 1.0,
        };
        cam.resize(width, height);
        cam
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Half the visible world width and height.
    pub fn half_extents(&self) -> Vec2 {
        let half = self.board_size * 0.5;
        if self.aspect >= 1.0 {
            Vec2::new(half * self.aspect, half)
        } else {
            Vec2::new(half, half / self.aspect)
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        let center = self.board_size * 0.5;
        let half = self.half_extents();
        Mat4::orthographic_rh(
            center - half.x,
            center + half.x,
            center - half.y,
            center + half.y,
            -1.0,
            1.0,
        )
    }
}

/// Perspective camera with position, yaw and pitch.
///
/// Camera motion lives outside the simulation; only the sandbox uses it.
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 2.0),
            yaw: -90.0_f32.to_radians(),
            pitch: 0.0,
            fov: 90.0_f32.to_radians(),
            aspect: 1.0,
            near: 0.01,
            far: 100.0,
            speed: 2.0,
        }
    }
}

impl FlyCamera {
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Move along the camera's own axes; each component of `input` is
    /// typically -1, 0 or 1 (x right, y up, z forward).
    pub fn fly(&mut self, input: Vec3, dt: f32) {
        let step = self.speed * dt;
        self.position += self.right() * input.x * step;
        self.position += Vec3::Y * input.y * step;
        self.position += self.forward() * input.z * step;
    }

    pub fn look(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn ndc(m: Mat4, x: f32, y: f32) -> Vec2 {
        let p = m * Vec4::new(x, y, 0.0, 1.0);
        Vec2::new(p.x / p.w, p.y / p.w)
    }

    #[test]
    fn square_window_fits_board_exactly() {
        let cam = GridCamera::new(10, 500, 500);
        let m = cam.view_projection();
        assert!(ndc(m, 5.0, 5.0).abs_diff_eq(Vec2::ZERO, 1e-5));
        assert!(ndc(m, 0.0, 0.0).abs_diff_eq(Vec2::new(-1.0, -1.0), 1e-5));
        assert!(ndc(m, 10.0, 10.0).abs_diff_eq(Vec2::new(1.0, 1.0), 1e-5));
    }

    #[test]
    fn wide_window_letterboxes_horizontally() {
        let cam = GridCamera::new(10, 1000, 500);
        let m = cam.view_projection();
        let corner = ndc(m, 10.0, 10.0);
        assert!((corner.x - 0.5).abs() < 1e-5);
        assert!((corner.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn tall_window_letterboxes_vertically() {
        let mut cam = GridCamera::new(10, 500, 500);
        cam.resize(500, 1000);
        let corner = ndc(cam.view_projection(), 0.0, 0.0);
        assert!((corner.x + 1.0).abs() < 1e-5);
        assert!((corner.y + 0.5).abs() < 1e-5);
    }

    #[test]
    fn zero_sized_window_is_clamped() {
        let cam = GridCamera::new(10, 0, 0);
        assert_eq!(cam.aspect, 1.0);
        assert!(cam.view_projection().is_finite());
    }

    #[test]
    fn fly_camera_looks_down_negative_z() {
        let cam = FlyCamera::default();
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-5));
        assert!(cam.view_projection().is_finite());
    }

    #[test]
    fn fly_moves_along_local_axes() {
        let mut cam = FlyCamera::default();
        cam.fly(Vec3::new(0.0, 0.0, 1.0), 0.5);
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-5));
        cam.fly(Vec3::new(1.0, 0.0, 0.0), 0.5);
        assert!(cam.position.abs_diff_eq(Vec3::new(1.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = FlyCamera::default();
        cam.look(0.0, 10.0);
        assert!(cam.pitch < 90.0_f32.to_radians());
    }
}
