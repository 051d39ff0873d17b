//! Material trait for surface scattering.

use crate::sampling::uniform_sample_hemisphere;
use lumen_math::Vec3;
use rand::RngCore;
use std::f32::consts::{FRAC_1_PI, PI};

/// Color type alias (linear RGB radiance or reflectance)
pub type Color = Vec3;

/// Trait for materials that describe how light interacts with surfaces.
///
/// Directions follow the convention of the integrator: `wo` points from the
/// surface toward the viewer, `wi` from the surface toward the light.
pub trait Material: Send + Sync {
    /// Whether this material emits light.
    fn has_emission(&self) -> bool {
        false
    }

    /// Emitted radiance. Most materials return black (no emission).
    fn emission(&self) -> Color {
        Color::ZERO
    }

    /// BRDF value for the pair of directions.
    fn eval(&self, wi: Vec3, wo: Vec3, n: Vec3) -> Color;

    /// Importance-sample an incident direction.
    fn sample(&self, wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> Vec3;

    /// Solid-angle density of [`Material::sample`] returning `wi`.
    fn pdf(&self, wo: Vec3, wi: Vec3, n: Vec3) -> f32;
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn eval(&self, wi: Vec3, _wo: Vec3, n: Vec3) -> Color {
        if wi.dot(n) > 0.0 {
            self.albedo * FRAC_1_PI
        } else {
            Color::ZERO
        }
    }

    fn sample(&self, _wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        uniform_sample_hemisphere(n, rng)
    }

    fn pdf(&self, _wo: Vec3, wi: Vec3, n: Vec3) -> f32 {
        if wi.dot(n) > 0.0 {
            0.5 / PI
        } else {
            0.0
        }
    }
}

/// Diffuse light emitter.
///
/// Emits `emit` uniformly and reflects like a Lambertian surface with the
/// given albedo (black by default).
#[derive(Debug, Clone)]
pub struct DiffuseLight {
    emit: Color,
    surface: Lambertian,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub fn new(emit: Color) -> Self {
        Self {
            emit,
            surface: Lambertian::new(Color::ZERO),
        }
    }

    /// Set the reflectance of the emitting surface.
    pub fn with_albedo(mut self, albedo: Color) -> Self {
        self.surface = Lambertian::new(albedo);
        self
    }
}

impl Material for DiffuseLight {
    fn has_emission(&self) -> bool {
        self.emit.max_element() > 0.0
    }

    fn emission(&self) -> Color {
        self.emit
    }

    fn eval(&self, wi: Vec3, wo: Vec3, n: Vec3) -> Color {
        self.surface.eval(wi, wo, n)
    }

    fn sample(&self, wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.surface.sample(wo, n, rng)
    }

    fn pdf(&self, wo: Vec3, wi: Vec3, n: Vec3) -> f32 {
        self.surface.pdf(wo, wi, n)
    }
}
