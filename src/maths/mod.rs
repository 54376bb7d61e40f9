pub use std::f32::consts::PI;
mod matrix;
pub use matrix::Mat4;
mod vec2;
pub use vec2::Vec2;
mod vec3;
pub use vec3::Vec3;

pub const EPSILON: f32 = 1e-4;

pub fn cotan(x: f32) -> f32 {
    x.cos() / x.sin()
}

pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

/// Floating point equality within [`EPSILON`].
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}
