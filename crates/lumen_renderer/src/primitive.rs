//! Primitive trait and Intersection record for ray-object queries.

use crate::{Color, Material};
use lumen_math::{Aabb, Ray, Vec3};
use rand::RngCore;

/// Record of a ray-object intersection.
///
/// A miss is `happened == false` with `distance == f32::INFINITY`, so a miss
/// never wins a nearest-hit comparison.
#[derive(Clone, Copy)]
pub struct Intersection<'a> {
    pub happened: bool,
    /// Point of intersection
    pub point: Vec3,
    /// Surface normal at the intersection (unit length, faces the ray)
    pub normal: Vec3,
    /// Ray parameter of the hit
    pub distance: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
    pub primitive: Option<&'a dyn Primitive>,
    pub material: Option<&'a dyn Material>,
}

impl<'a> Intersection<'a> {
    /// The non-happened result.
    pub fn none() -> Self {
        Self {
            happened: false,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            distance: f32::INFINITY,
            front_face: false,
            primitive: None,
            material: None,
        }
    }

    /// Build a hit, orienting the normal against the ray.
    ///
    /// If the ray and outward normal point the same way we are inside, and
    /// the stored normal is flipped.
    pub fn hit(
        ray: &Ray,
        distance: f32,
        outward_normal: Vec3,
        primitive: &'a dyn Primitive,
        material: &'a dyn Material,
    ) -> Self {
        let front_face = ray.direction().dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };

        Self {
            happened: true,
            point: ray.at(distance),
            normal,
            distance,
            front_face,
            primitive: Some(primitive),
            material: Some(material),
        }
    }

    /// Keep whichever of two results is nearer.
    #[inline]
    pub fn nearer(self, other: Intersection<'a>) -> Intersection<'a> {
        if other.distance < self.distance {
            other
        } else {
            self
        }
    }

    /// True when the hit surface emits light.
    pub fn is_emissive(&self) -> bool {
        self.material.map_or(false, |m| m.has_emission())
    }

    /// Emitted radiance at the hit, zero for a miss.
    pub fn emission(&self) -> Color {
        self.material.map_or(Color::ZERO, |m| m.emission())
    }
}

impl Default for Intersection<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Intersection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Intersection")
            .field("happened", &self.happened)
            .field("point", &self.point)
            .field("normal", &self.normal)
            .field("distance", &self.distance)
            .field("front_face", &self.front_face)
            .finish_non_exhaustive()
    }
}

/// A point drawn on a primitive's surface with its per-area density.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSample {
    pub point: Vec3,
    /// Outward surface normal at `point`
    pub normal: Vec3,
    /// Density with respect to surface area
    pub pdf: f32,
}

/// Trait for anything the BVH can hold.
pub trait Primitive: Send + Sync {
    /// Get the axis-aligned bounding box of this object.
    fn bounds(&self) -> Aabb;

    /// Point used to sort and bucket the primitive during the BVH build.
    fn centroid(&self) -> Vec3 {
        self.bounds().centroid()
    }

    /// Nearest hit with positive ray parameter, or [`Intersection::none`].
    fn intersect(&self, ray: &Ray) -> Intersection<'_>;

    /// Whether the surface is a light source.
    fn has_emission(&self) -> bool;

    /// Total surface area.
    fn area(&self) -> f32;

    /// Uniformly sample a point on the surface.
    fn sample(&self, rng: &mut dyn RngCore) -> SurfaceSample;

    /// Material of the surface.
    fn material(&self) -> &dyn Material;
}

/// Nearest hit over every primitive, without any acceleration.
pub fn intersect_linear<'a>(primitives: &'a [Box<dyn Primitive>], ray: &Ray) -> Intersection<'a> {
    primitives
        .iter()
        .map(|p| p.intersect(ray))
        .fold(Intersection::none(), Intersection::nearer)
}
