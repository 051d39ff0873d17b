//! Sphere primitive for ray tracing.

use crate::{
    primitive::{Intersection, Primitive, SurfaceSample},
    sampling::uniform_sample_sphere,
    Material,
};
use lumen_math::{Aabb, Ray, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// A sphere primitive.
pub struct Sphere<M: Material> {
    center: Vec3,
    radius: f32,
    material: M,
    bbox: Aabb,
}

impl<M: Material> Sphere<M> {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: M) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material,
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl<M: Material + 'static> Primitive for Sphere<M> {
    fn bounds(&self) -> Aabb {
        self.bbox
    }

    fn centroid(&self) -> Vec3 {
        self.center
    }

    fn intersect(&self, ray: &Ray) -> Intersection<'_> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return Intersection::none();
        }

        let sqrtd = discriminant.sqrt();

        // Nearest root in front of the origin
        let mut root = (h - sqrtd) / a;
        if root <= 0.0 {
            root = (h + sqrtd) / a;
            if root <= 0.0 {
                return Intersection::none();
            }
        }

        let outward_normal = (ray.at(root) - self.center) / self.radius;
        Intersection::hit(ray, root, outward_normal, self, &self.material)
    }

    fn has_emission(&self) -> bool {
        self.material.has_emission()
    }

    fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    fn sample(&self, rng: &mut dyn RngCore) -> SurfaceSample {
        let dir = uniform_sample_sphere(rng);
        SurfaceSample {
            point: self.center + self.radius * dir,
            normal: dir,
            pdf: 1.0 / self.area(),
        }
    }

    fn material(&self) -> &dyn Material {
        &self.material
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grey() -> Lambertian {
        Lambertian::new(Vec3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, grey());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let hit = sphere.intersect(&ray);
        assert!(hit.happened);
        assert!((hit.distance - 0.5).abs() < 0.001); // Should hit at t=0.5
        assert!(hit.front_face);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, grey());

        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let hit = sphere.intersect(&ray);

        assert!(!hit.happened);
        assert_eq!(hit.distance, f32::INFINITY);
    }

    #[test]
    fn test_sphere_behind_origin() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 3.0), 1.0, grey());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        assert!(!sphere.intersect(&ray).happened);
    }

    #[test]
    fn test_sphere_area_and_samples() {
        let sphere = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 2.0, grey());
        assert_eq!(sphere.radius(), 2.0);
        assert!((sphere.area() - 16.0 * PI).abs() < 1e-4);

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let s = sphere.sample(&mut rng);
            assert!(((s.point - sphere.center()).length() - sphere.radius()).abs() < 1e-4);
            assert!((s.normal.length() - 1.0).abs() < 1e-4);
            assert!((s.pdf - 1.0 / sphere.area()).abs() < 1e-7);
        }
    }
}
