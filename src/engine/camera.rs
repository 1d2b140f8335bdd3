// Turntable camera: the tree spins slowly about its trunk while a fixed eye
// looks at it.
//
// Camera model:
//   - model = rotate_y(angle) · translate(0, −3, 0) · scale(zoom_scale)
//   - Perspective: eye at (4, 4, 2) looking at the origin, 45° vertical fov
//   - Flat: orthographic front view along −Z, no spin
//   - normal_matrix = upper 3×3 of view · model (uniform scale only)

use glam::{Mat3, Mat4, Vec3};

use super::config::ViewMode;

/// Per-frame transforms handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct FrameMatrices {
    pub mvp:           Mat4,
    pub normal_matrix: Mat3,
}

pub struct TurntableCamera {
    /// Current spin about +Y in radians.
    angle: f32,
    /// Spin rate in radians per second.
    pub spin_speed: f32,

    pub eye:    Vec3,
    pub fov:    f32,
    pub near:   f32,
    pub far:    f32,

    /// Uniform model scale; larger values zoom toward the tree.
    pub zoom_scale: f32,
    /// Vertical offset applied before scaling so the trunk base sits low in view.
    pub drop:       f32,

    /// Half-height of the orthographic view volume in Flat mode.
    pub flat_half_height: f32,
    pub mode: ViewMode,
}

impl TurntableCamera {
    pub fn new(zoom_scale: f32, mode: ViewMode) -> Self {
        Self {
            angle: 0.0,
            spin_speed: 0.6,
            eye: Vec3::new(4.0, 4.0, 2.0),
            fov: 45.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            zoom_scale,
            drop: 3.0,
            flat_half_height: 4.0,
            mode,
        }
    }

    /// Advance the spin. Flat mode holds still.
    pub fn update(&mut self, dt: f32) {
        if self.mode == ViewMode::Perspective {
            self.angle = (self.angle + self.spin_speed * dt) % std::f32::consts::TAU;
        }
    }

    pub fn angle(&self) -> f32 { self.angle }

    pub fn model_matrix(&self) -> Mat4 {
        let spin = match self.mode {
            ViewMode::Perspective => self.angle,
            ViewMode::Flat => 0.0,
        };
        Mat4::from_rotation_y(spin)
            * Mat4::from_translation(Vec3::new(0.0, -self.drop, 0.0))
            * Mat4::from_scale(Vec3::splat(self.zoom_scale))
    }

    pub fn view_matrix(&self) -> Mat4 {
        match self.mode {
            ViewMode::Perspective => Mat4::look_at_rh(self.eye, Vec3::ZERO, Vec3::Y),
            ViewMode::Flat => Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y),
        }
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.mode {
            ViewMode::Perspective => Mat4::perspective_rh(self.fov, aspect, self.near, self.far),
            ViewMode::Flat => {
                let h = self.flat_half_height;
                Mat4::orthographic_rh(-h * aspect, h * aspect, -h, h, self.near, self.far)
            }
        }
    }

    pub fn matrices(&self, aspect: f32) -> FrameMatrices {
        let model_view = self.view_matrix() * self.model_matrix();
        FrameMatrices {
            mvp: self.projection_matrix(aspect) * model_view,
            normal_matrix: Mat3::from_mat4(model_view),
        }
    }
}
