use crate::Vec3;

/// A ray in 3D space with origin and direction.
///
/// The reciprocal of the direction and the per-axis sign flags are computed
/// once at construction, so the slab test in [`crate::Aabb`] does only
/// multiplies and swaps. Rays are immutable after construction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
    dir_is_neg: [bool; 3],
}

impl Ray {
    /// Create a new ray. `direction` is not normalized here.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        // IEEE division gives +inf / -inf for signed zeros, which is what the
        // slab test needs for axis-parallel rays.
        let inv_direction = Vec3::ONE / direction;
        let dir_is_neg = [
            direction.x.is_sign_negative(),
            direction.y.is_sign_negative(),
            direction.z.is_sign_negative(),
        ];

        Self {
            origin,
            direction,
            inv_direction,
            dir_is_neg,
        }
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Component-wise reciprocal of the direction.
    #[inline]
    pub fn inv_direction(&self) -> Vec3 {
        self.inv_direction
    }

    /// Whether the direction's sign bit is set, per axis.
    #[inline]
    pub fn dir_is_neg(&self) -> [bool; 3] {
        self.dir_is_neg
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
