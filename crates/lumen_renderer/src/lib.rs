//! Lumen renderer - BVH-accelerated path tracing
//!
//! Primitives are collected into a [`Scene`], frozen into a bounding volume
//! hierarchy with [`Scene::build_accelerator`], and then queried with
//! [`Scene::intersect`] or shaded with the Monte Carlo estimator
//! [`Scene::cast_ray`].

pub mod bvh;
mod camera;
pub mod error;
mod integrator;
mod material;
pub mod primitive;
mod renderer;
pub mod sampling;
mod scene;
mod sphere;
mod triangle;

pub use bvh::{AcceleratorConfig, Bvh, BvhNode, BvhStats, SplitMethod};
pub use camera::Camera;
pub use error::{Error, Result};
pub use material::{Color, DiffuseLight, Lambertian, Material};
pub use primitive::{intersect_linear, Intersection, Primitive, SurfaceSample};
pub use renderer::{color_to_rgba, linear_to_gamma, render, render_pixel, ImageBuffer, RenderConfig};
pub use scene::{LightSample, Scene};
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Aabb, Ray, Vec3};
