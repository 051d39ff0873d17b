//! Sampling helpers shared by materials, primitives and the camera.

use lumen_math::Vec3;
use rand::{Rng, RngCore};
use std::f32::consts::PI;

/// Uniform float in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Uniform direction on the hemisphere around `n`.
pub fn uniform_sample_hemisphere(n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let z = gen_f32(rng);
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * gen_f32(rng);
    let local = Vec3::new(r * phi.cos(), r * phi.sin(), z);
    to_world(local, n)
}

/// Uniform direction on the unit sphere.
pub fn uniform_sample_sphere(rng: &mut dyn RngCore) -> Vec3 {
    let z = 1.0 - 2.0 * gen_f32(rng);
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * gen_f32(rng);
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniform barycentric coordinates `(b0, b1)` over a triangle.
pub fn uniform_sample_triangle(rng: &mut dyn RngCore) -> (f32, f32) {
    let su0 = gen_f32(rng).sqrt();
    let u1 = gen_f32(rng);
    (1.0 - su0, u1 * su0)
}

/// Rotate a vector from the local frame (z up) into the frame around `n`.
pub fn to_world(local: Vec3, n: Vec3) -> Vec3 {
    let (t, b) = n.any_orthonormal_pair();
    local.x * t + local.y * b + local.z * n
}
