//! Collision detection and response
//!
//! Balls are circles; blocks are axis-aligned squares; power-ups are
//! circles. Everything lives in the play plane, so plain 2D vectors are
//! enough and no out-of-plane component can ever creep in.

use glam::Vec2;

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n, `normal` must be unit length.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Circle vs axis-aligned rectangle (closest point, clamped distance).
///
/// `rect_pos` is the rectangle center, `rect_size` its full extents.
pub fn circle_rect_collision(circle_pos: Vec2, radius: f32, rect_pos: Vec2, rect_size: Vec2) -> bool {
    let half = rect_size * 0.5;
    let closest = circle_pos.clamp(rect_pos - half, rect_pos + half);
    circle_pos.distance_squared(closest) < radius * radius
}

/// Circle vs circle
#[inline]
pub fn circle_circle_collision(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) < reach * reach
}

/// Contact normal used for ball/block response: from the obstacle center
/// toward the ball. Falls back to straight down when the centers coincide.
#[inline]
pub fn contact_normal(ball_pos: Vec2, obstacle_pos: Vec2) -> Vec2 {
    (ball_pos - obstacle_pos).try_normalize().unwrap_or(Vec2::NEG_Y)
}

/// Keep a unit direction from going (near) horizontal.
///
/// A ball with no vertical motion would bounce between the side walls
/// forever and the turn could never end.
pub fn enforce_min_vertical(dir: Vec2, min_vertical: f32) -> Vec2 {
    let dir = dir.try_normalize().unwrap_or(Vec2::Y);
    if dir.y.abs() >= min_vertical {
        return dir;
    }
    let sign_y = if dir.y < 0.0 { -1.0 } else { 1.0 };
    let sign_x = if dir.x < 0.0 { -1.0 } else { 1.0 };
    let y = min_vertical * sign_y;
    let x = (1.0 - y * y).max(0.0).sqrt() * sign_x;
    Vec2::new(x, y)
}
