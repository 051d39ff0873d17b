//! Monte Carlo path tracing over a built [`Scene`].
//!
//! Each shading point gathers one explicit light sample (next event
//! estimation) and continues the path by sampling the BRDF, terminating
//! with Russian roulette. Paths stop when the continuation ray escapes or
//! lands on an emitter, since emitters are already counted by the light
//! sample.

use crate::renderer::RenderConfig;
use crate::sampling::gen_f32;
use crate::scene::{LightSample, Scene};
use crate::{Color, Intersection};
use lumen_math::{Ray, Vec3};
use rand::RngCore;

impl Scene {
    /// Radiance arriving along `ray`, using the scene's render config.
    ///
    /// `depth` is the bounce index of `ray`; only camera rays (`depth == 0`)
    /// see emitters directly.
    pub fn cast_ray(&self, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        self.trace(ray, depth, self.render_config(), rng)
    }

    /// Same as [`Scene::cast_ray`] with an explicit, already validated config.
    pub(crate) fn trace(&self, ray: &Ray, depth: u32, config: &RenderConfig, rng: &mut dyn RngCore) -> Color {
        let mut hit = self.intersect(ray);
        if !hit.happened {
            return Color::ZERO;
        }
        if depth == 0 && hit.is_emissive() {
            return hit.emission();
        }

        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut wo = -ray.direction().normalize();

        loop {
            let Some(material) = hit.material else {
                break;
            };
            let n = hit.normal;

            if let Some(light) = self.sample_light(rng) {
                radiance += throughput * self.direct_lighting(&hit, wo, &light, config);
            }

            if gen_f32(rng) >= config.russian_roulette {
                break;
            }

            let mut wi = material.sample(wo, n, rng).normalize();
            if wi.dot(n) < 0.0 {
                wi = -wi;
            }

            let next = self.intersect(&Ray::new(hit.point + config.ray_epsilon * n, wi));
            if !next.happened || next.is_emissive() {
                break;
            }

            let f = material.eval(wi, wo, n);
            let pdf = material.pdf(wo, wi, n).max(config.pdf_floor);
            throughput *= f * wi.dot(n).max(0.0) / pdf / config.russian_roulette;

            if throughput == Color::ZERO {
                break;
            }

            wo = -wi;
            hit = next;
        }

        radiance
    }

    /// Contribution of one light sample at a shading point, zero when the
    /// sample is occluded or faces away.
    pub(crate) fn direct_lighting(
        &self,
        hit: &Intersection<'_>,
        wo: Vec3,
        light: &LightSample,
        config: &RenderConfig,
    ) -> Color {
        let Some(material) = hit.material else {
            return Color::ZERO;
        };

        let p = hit.point;
        let n = hit.normal;
        let to_light = light.point - p;
        let distance_squared = to_light.length_squared();
        if distance_squared <= 0.0 {
            return Color::ZERO;
        }
        let distance = distance_squared.sqrt();
        let ws = to_light / distance;

        let shadow = self.intersect(&Ray::new(p + config.ray_epsilon * n, ws));
        if shadow.distance + config.shadow_slack < distance {
            return Color::ZERO;
        }

        let cos_surface = ws.dot(n).max(0.0);
        let cos_light = (-ws).dot(light.normal).max(0.0);

        light.emission * material.eval(ws, wo, n) * cos_surface * cos_light
            / distance_squared
            / light.pdf.max(config.pdf_floor)
    }
}
