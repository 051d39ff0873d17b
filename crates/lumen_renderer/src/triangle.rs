//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::{
    primitive::{Intersection, Primitive, SurfaceSample},
    sampling::uniform_sample_triangle,
    Material,
};
use lumen_math::{Aabb, Ray, Vec3};
use rand::RngCore;

/// A triangle primitive.
pub struct Triangle<M: Material> {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Pre-computed face normal (unit length)
    normal: Vec3,
    area: f32,
    /// Material
    material: M,
    /// Bounding box
    bbox: Aabb,
}

impl<M: Material> Triangle<M> {
    /// Create a new triangle from three vertices.
    ///
    /// The face normal follows the winding `(v1 - v0) x (v2 - v0)`.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: M) -> Self {
        let cross = (v1 - v0).cross(v2 - v0);
        let normal = cross.normalize_or_zero();
        let area = 0.5 * cross.length();

        // Pad thin dimensions to avoid degenerate AABBs
        let delta = Vec3::splat(0.0001);
        let bbox = Aabb::from_points(v0.min(v1).min(v2) - delta, v0.max(v1).max(v2) + delta);

        Self {
            v0,
            v1,
            v2,
            normal,
            area,
            material,
            bbox,
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }
}

impl<M: Material + 'static> Primitive for Triangle<M> {
    fn bounds(&self) -> Aabb {
        self.bbox
    }

    fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn intersect(&self, ray: &Ray) -> Intersection<'_> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return Intersection::none();
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);

        // Check if intersection is outside triangle (u parameter)
        if !(0.0..=1.0).contains(&u) {
            return Intersection::none();
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);

        // Check if intersection is outside triangle (v parameter)
        if v < 0.0 || u + v > 1.0 {
            return Intersection::none();
        }

        let t = f * edge2.dot(q);
        if t <= 0.0 {
            return Intersection::none();
        }

        Intersection::hit(ray, t, self.normal, self, &self.material)
    }

    fn has_emission(&self) -> bool {
        self.material.has_emission()
    }

    fn area(&self) -> f32 {
        self.area
    }

    fn sample(&self, rng: &mut dyn RngCore) -> SurfaceSample {
        let (b0, b1) = uniform_sample_triangle(rng);
        SurfaceSample {
            point: b0 * self.v0 + b1 * self.v1 + (1.0 - b0 - b1) * self.v2,
            normal: self.normal,
            pdf: 1.0 / self.area,
        }
    }

    fn material(&self) -> &dyn Material {
        &self.material
    }
}
