use frameline_common::{Aabb, CameraMode};
use glam::{Mat4, Vec3, Vec4};

use crate::config::CameraConfig;

/// Render-side camera.
///
/// In [`CameraMode::Editor`] the view is built from the camera pose; in
/// [`CameraMode::Motor`] the logic side supplies the main view matrix.
#[derive(Debug, Clone)]
pub struct RenderCamera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Horizontal field of view in radians.
    fov_x: f32,
    pub znear: f32,
    pub zfar: f32,
    aspect: f32,
    mode: CameraMode,
    main_view_matrix: Mat4,
}

impl Default for RenderCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 15.0),
            forward: Vec3::new(0.0, -10.0, -15.0).normalize(),
            up: Vec3::Y,
            fov_x: 89.0_f32.to_radians(),
            znear: 0.1,
            zfar: 1000.0,
            aspect: 16.0 / 9.0,
            mode: CameraMode::Editor,
            main_view_matrix: Mat4::IDENTITY,
        }
    }
}

impl RenderCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self {
            znear: config.z_near,
            zfar: config.z_far,
            ..Self::default()
        };
        camera.look_at(config.pose.position, config.pose.target, config.pose.up);
        camera.set_aspect(config.aspect.x / config.aspect.y);
        camera
    }

    pub fn look_at(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.position = position;
        self.forward = (target - position).normalize_or(Vec3::NEG_Z);
        self.up = up.normalize_or(Vec3::Y);
    }

    pub fn fov_x(&self) -> f32 {
        self.fov_x
    }

    pub fn set_fov_x(&mut self, fov_x: f32) {
        self.fov_x = fov_x;
    }

    /// Vertical field of view derived from `fov_x` and the aspect ratio.
    pub fn fov_y(&self) -> f32 {
        2.0 * ((self.fov_x * 0.5).tan() / self.aspect).atan()
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        } else {
            tracing::warn!(aspect, "ignoring invalid camera aspect");
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        self.mode = mode;
    }

    pub fn main_view_matrix(&self) -> Mat4 {
        self.main_view_matrix
    }

    pub fn set_main_view_matrix(&mut self, view: Mat4) {
        self.main_view_matrix = view;
    }

    pub fn view_matrix(&self) -> Mat4 {
        match self.mode {
            CameraMode::Editor => {
                Mat4::look_at_rh(self.position, self.position + self.forward, self.up)
            }
            CameraMode::Motor => self.main_view_matrix,
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y(), self.aspect, self.znear, self.zfar)
    }

    pub fn proj_view(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space eye position for the active mode.
    pub fn eye_position(&self) -> Vec3 {
        match self.mode {
            CameraMode::Editor => self.position,
            CameraMode::Motor => self.main_view_matrix.inverse().w_axis.truncate(),
        }
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(&self.proj_view())
    }
}

/// Six clip planes extracted from a projection-view matrix.
///
/// Planes point inward; a point is inside when every plane distance is
/// non-negative. Assumes a `[0, 1]` depth range.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    pub fn from_matrix(m: &Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(|p| {
            let len = p.truncate().length();
            if len > 0.0 { p / len } else { p }
        });
        Self { planes }
    }

    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let positive = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(positive) + plane.w >= 0.0
        })
    }
}
