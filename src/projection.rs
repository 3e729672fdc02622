//! Viewport and screen-to-world picking
//!
//! Pointer coordinates arrive in page pixels. They are mapped to NDC with
//! the current viewport rectangle, un-projected through the camera, and the
//! resulting pick ray is intersected with the play plane (z = 0).

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::CameraPose;

/// Near clip plane
const NEAR: f32 = 0.1;
/// Far clip plane
const FAR: f32 = 200.0;

/// Canvas rectangle in page pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 800.0, 600.0)
    }
}

impl Viewport {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Width / height, 1.0 for a degenerate rectangle
    pub fn aspect(&self) -> f32 {
        if self.width > 0.0 && self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Page pixels to NDC (x right, y up, both in [-1, 1] inside the canvas)
    pub fn to_ndc(&self, screen_x: f32, screen_y: f32) -> Option<Vec2> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        let x = (screen_x - self.left) / self.width * 2.0 - 1.0;
        let y = 1.0 - (screen_y - self.top) / self.height * 2.0;
        Some(Vec2::new(x, y))
    }
}

/// Combined projection * view matrix for a camera pose
pub fn view_projection(pose: &CameraPose, aspect: f32) -> Mat4 {
    let proj = Mat4::perspective_rh(pose.fov_y, aspect, NEAR, FAR);
    let view = Mat4::look_at_rh(pose.eye, pose.target, pose.up);
    proj * view
}

/// Map a pointer position to the point on the play plane under it.
///
/// Returns `None` when the viewport is empty or the pick ray never meets
/// the plane in front of the camera.
pub fn screen_to_world(
    screen_x: f32,
    screen_y: f32,
    viewport: &Viewport,
    pose: &CameraPose,
) -> Option<Vec2> {
    let ndc = viewport.to_ndc(screen_x, screen_y)?;
    let inv = view_projection(pose, viewport.aspect()).inverse();

    // glam's perspective_rh maps depth to [0, 1]
    let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
    let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
    let dir = far - near;

    if dir.z.abs() < 1e-6 {
        return None;
    }
    let t = -near.z / dir.z;
    if t < 0.0 || !t.is_finite() {
        return None;
    }
    Some((near + dir * t).truncate())
}
