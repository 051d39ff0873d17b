//! Render driver.
//!
//! Averages independent path-traced samples per pixel into an image buffer,
//! with gamma correction for 8-bit output. Single-threaded; a built scene is
//! `Sync`, so callers that want parallelism can split the image themselves.

use crate::error::{Error, Result};
use crate::{Camera, Color, Scene};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Samples per pixel for anti-aliasing and noise reduction
    pub samples_per_pixel: u32,
    /// Probability that a path continues past each bounce
    pub russian_roulette: f32,
    /// Offset along the normal for secondary ray origins
    pub ray_epsilon: f32,
    /// Tolerance when deciding whether a shadow ray reached the light
    pub shadow_slack: f32,
    /// Lower bound applied to every pdf before dividing by it
    pub pdf_floor: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 16,
            russian_roulette: 0.8,
            ray_epsilon: 1e-4,
            shadow_slack: 0.01,
            pdf_floor: 1e-7,
        }
    }
}

impl RenderConfig {
    pub fn with_samples(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub fn with_russian_roulette(mut self, probability: f32) -> Self {
        self.russian_roulette = probability;
        self
    }

    pub fn with_ray_epsilon(mut self, ray_epsilon: f32) -> Self {
        self.ray_epsilon = ray_epsilon;
        self
    }

    pub fn with_shadow_slack(mut self, shadow_slack: f32) -> Self {
        self.shadow_slack = shadow_slack;
        self
    }

    pub fn with_pdf_floor(mut self, pdf_floor: f32) -> Self {
        self.pdf_floor = pdf_floor;
        self
    }

    /// Check every field is usable by the integrator.
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_pixel == 0 {
            return Err(Error::ZeroSamples);
        }
        // Written so that NaN fails too
        if !(self.russian_roulette > 0.0 && self.russian_roulette <= 1.0) {
            return Err(Error::InvalidRussianRoulette(self.russian_roulette));
        }
        for (name, value) in [
            ("ray_epsilon", self.ray_epsilon),
            ("shadow_slack", self.shadow_slack),
            ("pdf_floor", self.pdf_floor),
        ] {
            if !(value > 0.0) {
                return Err(Error::NonPositiveEpsilon { name, value });
            }
        }
        Ok(())
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let to_byte = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [to_byte(color.x), to_byte(color.y), to_byte(color.z), 255]
}

/// Average `samples_per_pixel` camera rays through pixel (x, y).
pub fn render_pixel(
    scene: &Scene,
    camera: &Camera,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Result<Color> {
    config.validate()?;
    Ok(sample_pixel(scene, camera, x, y, config, rng))
}

fn sample_pixel(
    scene: &Scene,
    camera: &Camera,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;
    for _ in 0..config.samples_per_pixel {
        let ray = camera.get_ray(x, y, rng);
        pixel_color += scene.trace(&ray, 0, config, rng);
    }

    pixel_color / config.samples_per_pixel as f32
}

/// Image buffer of linear colors.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| color_to_rgba(*c)).collect()
    }
}

/// Render the whole image on the calling thread.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Result<ImageBuffer> {
    config.validate()?;
    if camera.image_width == 0 || camera.image_height == 0 {
        return Err(Error::InvalidResolution {
            width: camera.image_width,
            height: camera.image_height,
        });
    }
    if scene.bvh().is_none() {
        log::warn!("Rendering a scene without a built accelerator; every ray will miss");
    }

    log::info!(
        "Rendering {}x{} @ {} spp",
        camera.image_width,
        camera.image_height,
        config.samples_per_pixel
    );
    let start = Instant::now();

    let mut image = ImageBuffer::new(camera.image_width, camera.image_height);
    for y in 0..camera.image_height {
        for x in 0..camera.image_width {
            let color = sample_pixel(scene, camera, x, y, config, rng);
            image.set(x, y, color);
        }
        log::debug!("Row {}/{} done", y + 1, camera.image_height);
    }

    log::info!("Rendered in {:?}", start.elapsed());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::SplitMethod;
    use crate::{DiffuseLight, Lambertian, Sphere, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lit_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add(Sphere::new(
            Vec3::new(0.0, 0.0, -1.0),
            0.5,
            Lambertian::new(Color::new(0.5, 0.5, 0.5)),
        ));
        scene.add(Sphere::new(Vec3::new(0.0, 3.0, 0.0), 1.0, DiffuseLight::new(Color::splat(10.0))));
        scene.build_accelerator(SplitMethod::Sah, 1).unwrap();
        scene
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgba() {
        assert_eq!(color_to_rgba(Color::ZERO), [0, 0, 0, 255]);
        assert_eq!(color_to_rgba(Color::splat(4.0)), [255, 255, 255, 255]);
        assert_eq!(color_to_rgba(Color::new(0.25, 0.0, 1.0)), [127, 0, 255, 255]);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            RenderConfig::default().with_samples(0).validate(),
            Err(Error::ZeroSamples)
        );
        assert_eq!(
            RenderConfig::default().with_russian_roulette(0.0).validate(),
            Err(Error::InvalidRussianRoulette(0.0))
        );
        assert!(RenderConfig::default()
            .with_russian_roulette(f32::NAN)
            .validate()
            .is_err());
        assert!(RenderConfig::default().with_russian_roulette(1.0).validate().is_ok());
        assert_eq!(
            RenderConfig::default().with_ray_epsilon(0.0).validate(),
            Err(Error::NonPositiveEpsilon {
                name: "ray_epsilon",
                value: 0.0
            })
        );
        assert!(RenderConfig::default().with_pdf_floor(-1.0).validate().is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = RenderConfig::default().with_samples(64).with_russian_roulette(0.5);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        // Missing fields fall back to defaults
        let partial: RenderConfig = serde_json::from_str(r#"{ "samples_per_pixel": 4 }"#).unwrap();
        assert_eq!(partial.samples_per_pixel, 4);
        assert_eq!(partial.ray_epsilon, RenderConfig::default().ray_epsilon);
    }

    #[test]
    fn test_image_buffer() {
        let mut image = ImageBuffer::new(3, 2);
        assert_eq!(image.pixels.len(), 6);

        image.set(2, 1, Color::ONE);
        assert_eq!(image.get(2, 1), Color::ONE);
        assert_eq!(image.get(0, 0), Color::ZERO);

        let bytes = image.to_rgba();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[20..24], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_render_pixel() {
        let scene = lit_scene();
        let mut camera = Camera::new().with_resolution(10, 10);
        camera.initialize();

        let config = RenderConfig::default().with_samples(8);
        let mut rng = StdRng::seed_from_u64(42);

        // Center pixel sees the lit top of the sphere
        let color = render_pixel(&scene, &camera, 5, 5, &config, &mut rng).unwrap();
        assert!(color.length() > 0.0);
    }

    #[test]
    fn test_render_pixel_rejects_invalid_config() {
        let scene = lit_scene();
        let camera = Camera::new().with_resolution(10, 10);
        let mut rng = StdRng::seed_from_u64(42);

        let config = RenderConfig::default().with_pdf_floor(0.0);
        let err = render_pixel(&scene, &camera, 5, 5, &config, &mut rng).unwrap_err();
        assert_eq!(
            err,
            Error::NonPositiveEpsilon {
                name: "pdf_floor",
                value: 0.0
            }
        );

        let config = RenderConfig::default().with_russian_roulette(0.0);
        assert_eq!(
            render_pixel(&scene, &camera, 5, 5, &config, &mut rng),
            Err(Error::InvalidRussianRoulette(0.0))
        );
    }

    #[test]
    fn test_render_rejects_bad_input() {
        let scene = lit_scene();
        let mut rng = StdRng::seed_from_u64(1);

        let camera = Camera::new().with_resolution(0, 10);
        let err = render(&scene, &camera, &RenderConfig::default(), &mut rng).unwrap_err();
        assert_eq!(err, Error::InvalidResolution { width: 0, height: 10 });

        let camera = Camera::new().with_resolution(4, 4);
        let config = RenderConfig::default().with_samples(0);
        assert!(render(&scene, &camera, &config, &mut rng).is_err());
    }

    #[test]
    fn test_render_small_image() {
        let scene = lit_scene();
        let mut camera = Camera::new().with_resolution(8, 6);
        camera.initialize();
        let mut rng = StdRng::seed_from_u64(7);

        let image = render(&scene, &camera, &RenderConfig::default().with_samples(2), &mut rng).unwrap();
        assert_eq!((image.width, image.height), (8, 6));
        assert!(image.pixels.iter().all(|c| c.is_finite() && c.min_element() >= 0.0));
        assert!(image.pixels.iter().any(|c| c.max_element() > 0.0));
    }
}
