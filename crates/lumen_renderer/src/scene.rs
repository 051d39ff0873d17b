//! Scene container: owns the primitives and the BVH built over them.

use crate::bvh::{AcceleratorConfig, Bvh, SplitMethod};
use crate::error::Result;
use crate::renderer::RenderConfig;
use crate::sampling::gen_f32;
use crate::{Color, Intersection, Primitive};
use lumen_math::{Ray, Vec3};
use rand::RngCore;

/// A point on an emitter chosen for direct lighting.
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    pub point: Vec3,
    /// Outward normal of the emitter at `point`
    pub normal: Vec3,
    pub emission: Color,
    /// Density per unit area over the whole emissive set
    pub pdf: f32,
}

/// The world being rendered.
///
/// Primitives are added first, then [`Scene::build_accelerator`] freezes them
/// into a BVH. Queries take `&self`, so a built scene can be shared between
/// threads.
pub struct Scene {
    primitives: Vec<Box<dyn Primitive>>,
    /// Indices of the emitting primitives
    emitters: Vec<usize>,
    emissive_area: f32,
    bvh: Option<Bvh>,
    config: RenderConfig,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            primitives: Vec::new(),
            emitters: Vec::new(),
            emissive_area: 0.0,
            bvh: None,
            config: RenderConfig::default(),
        }
    }

    /// Use `config` for [`Scene::cast_ray`].
    pub fn with_render_config(mut self, config: RenderConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.config
    }

    /// Add a primitive. Any previously built BVH is discarded.
    pub fn add<P: Primitive + 'static>(&mut self, primitive: P) {
        self.add_boxed(Box::new(primitive));
    }

    pub fn add_boxed(&mut self, primitive: Box<dyn Primitive>) {
        if self.bvh.take().is_some() {
            log::debug!("Primitive added after the BVH was built; rebuild required");
        }
        if primitive.has_emission() {
            self.emitters.push(self.primitives.len());
            self.emissive_area += primitive.area();
        }
        self.primitives.push(primitive);
    }

    pub fn primitives(&self) -> &[Box<dyn Primitive>] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    /// Build the BVH over every primitive added so far.
    pub fn build_accelerator(&mut self, split_method: SplitMethod, max_leaf_size: usize) -> Result<()> {
        self.build_accelerator_with(&AcceleratorConfig::new(split_method, max_leaf_size))
    }

    pub fn build_accelerator_with(&mut self, config: &AcceleratorConfig) -> Result<()> {
        self.bvh = Some(Bvh::build(&self.primitives, config)?);
        Ok(())
    }

    /// Nearest hit along `ray`. Misses everything until the BVH is built.
    pub fn intersect(&self, ray: &Ray) -> Intersection<'_> {
        match &self.bvh {
            Some(bvh) => bvh.intersect(&self.primitives, ray),
            None => Intersection::none(),
        }
    }

    /// Total area of all emitting primitives.
    pub fn emissive_area(&self) -> f32 {
        self.emissive_area
    }

    fn emitters(&self) -> impl Iterator<Item = &dyn Primitive> + '_ {
        self.emitters.iter().map(|&i| self.primitives[i].as_ref())
    }

    /// Pick a point on the emitters, each chosen with probability
    /// proportional to its area. `None` when nothing emits.
    pub fn sample_light(&self, rng: &mut dyn RngCore) -> Option<LightSample> {
        let total = self.emissive_area();
        if total <= 0.0 {
            return None;
        }

        let target = gen_f32(rng) * total;
        let mut running = 0.0;
        let mut chosen = None;
        for emitter in self.emitters() {
            running += emitter.area();
            chosen = Some(emitter);
            if target < running {
                break;
            }
        }

        // The last emitter absorbs any rounding in the running sum
        let emitter = chosen?;
        let surface = emitter.sample(rng);
        let selection = emitter.area() / total;

        Some(LightSample {
            point: surface.point,
            normal: surface.normal,
            emission: emitter.material().emission(),
            pdf: surface.pdf * selection,
        })
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiffuseLight, Lambertian, Sphere, Triangle};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_scene_is_sync() {
        assert_sync::<Scene>();
        assert_sync::<LightSample>();
    }

    #[test]
    fn test_empty_scene_misses() {
        let mut scene = Scene::new();
        scene.build_accelerator(SplitMethod::Sah, 1).unwrap();

        let hit = scene.intersect(&Ray::new(Vec3::ZERO, Vec3::X));
        assert!(!hit.happened);
        assert_eq!(hit.distance, f32::INFINITY);
        assert!(hit.primitive.is_none());
    }

    #[test]
    fn test_unbuilt_scene_misses() {
        let mut scene = Scene::new();
        scene.add(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, Lambertian::new(Color::ONE)));
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        assert!(!scene.intersect(&ray).happened);

        scene.build_accelerator(SplitMethod::Naive, 1).unwrap();
        assert!(scene.intersect(&ray).happened);

        // Adding invalidates the tree
        scene.add(Sphere::new(Vec3::new(0.0, 0.0, -1.5), 0.25, Lambertian::new(Color::ONE)));
        assert!(scene.bvh().is_none());
    }

    #[test]
    fn test_intersect_reports_primitive_and_material() {
        let mut scene = Scene::new();
        scene.add(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, DiffuseLight::new(Color::splat(2.0))));
        scene.build_accelerator(SplitMethod::Sah, 1).unwrap();

        let hit = scene.intersect(&Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0)));
        assert!(hit.happened);
        assert!(hit.primitive.is_some());
        assert!(hit.is_emissive());
        assert_eq!(hit.emission(), Color::splat(2.0));
        assert!((hit.point - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn test_no_emitters_no_light_sample() {
        let mut scene = Scene::new();
        scene.add(Sphere::new(Vec3::ZERO, 1.0, Lambertian::new(Color::ONE)));
        scene.add(Sphere::new(Vec3::X * 3.0, 1.0, DiffuseLight::new(Color::ZERO)));

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(scene.emissive_area(), 0.0);
        assert!(scene.sample_light(&mut rng).is_none());
    }

    #[test]
    fn test_single_light_sample() {
        let mut scene = Scene::new();
        scene.add(Sphere::new(Vec3::ZERO, 1.0, Lambertian::new(Color::ONE)));
        let light = Sphere::new(Vec3::new(0.0, 6.0, 0.0), 1.0, DiffuseLight::new(Color::splat(8.0)));
        let area = light.area();
        scene.add(light);

        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let sample = scene.sample_light(&mut rng).unwrap();
            assert!(((sample.point - Vec3::new(0.0, 6.0, 0.0)).length() - 1.0).abs() < 1e-4);
            assert_eq!(sample.emission, Color::splat(8.0));
            assert!((sample.pdf - 1.0 / area).abs() < 1e-6);
        }
    }

    #[test]
    fn test_light_selection_proportional_to_area() {
        // Two flat emitters with areas 1 and 3
        let mut scene = Scene::new();
        scene.add(Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            DiffuseLight::new(Color::ONE),
        ));
        scene.add(Triangle::new(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(13.0, 0.0, 0.0),
            Vec3::new(10.0, 2.0, 0.0),
            DiffuseLight::new(Color::ONE),
        ));
        assert!((scene.emissive_area() - 4.0).abs() < 1e-5);

        let mut rng = StdRng::seed_from_u64(8);
        let draws = 20_000;
        let mut second = 0;
        for _ in 0..draws {
            let sample = scene.sample_light(&mut rng).unwrap();
            if sample.point.x >= 10.0 {
                second += 1;
            }
            // Uniform over the combined area
            assert!((sample.pdf - 0.25).abs() < 1e-5);
        }

        let fraction = second as f32 / draws as f32;
        assert!((fraction - 0.75).abs() < 0.02, "fraction = {}", fraction);
    }
}
