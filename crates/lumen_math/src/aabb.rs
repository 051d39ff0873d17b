use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// Defined by its `min` and `max` corners. The empty box has `+inf` minimums
/// and `-inf` maximums, so it is the identity for [`Aabb::union`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from two corner points (in any order).
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Degenerate box around a single point.
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// True for the empty sentinel (or any inverted box).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow the box to include a point.
    pub fn union_point(&self, p: Vec3) -> Aabb {
        Aabb {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Region shared by both boxes. Inverted (empty) if they don't overlap.
    pub fn intersection(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Whether the two boxes touch or overlap on every axis.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let x = self.max.x >= other.min.x && self.min.x <= other.max.x;
        let y = self.max.y >= other.min.y && self.min.y <= other.max.y;
        let z = self.max.z >= other.min.z && self.min.z <= other.max.z;
        x && y && z
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Position of `p` relative to the box, 0 at `min` and 1 at `max`.
    ///
    /// Axes where the box has no extent report 0.
    pub fn offset(&self, p: Vec3) -> Vec3 {
        let mut o = p - self.min;
        for axis in 0..3 {
            if self.max[axis] > self.min[axis] {
                o[axis] /= self.max[axis] - self.min[axis];
            } else {
                o[axis] = 0.0;
            }
        }
        o
    }

    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        0.5 * self.min + 0.5 * self.max
    }

    pub fn surface_area(&self) -> f32 {
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    ///
    /// Ties go to the earlier axis: X beats Y, Y beats Z.
    pub fn max_extent(&self) -> usize {
        let d = self.diagonal();

        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Parametric range `[t_in, t_out]` where the ray's line is inside the box.
    ///
    /// Slab method using the ray's precomputed reciprocal direction; the
    /// near/far planes are swapped on axes where the direction is negative.
    /// The range is inverted when the line misses the box.
    #[inline]
    pub fn slab(&self, ray: &Ray) -> Interval {
        let inv = ray.inv_direction();
        let neg = ray.dir_is_neg();
        let mut t0 = (self.min - ray.origin()) * inv;
        let mut t1 = (self.max - ray.origin()) * inv;

        for axis in 0..3 {
            if neg[axis] {
                let tmp = t0[axis];
                t0[axis] = t1[axis];
                t1[axis] = tmp;
            }
        }

        Interval::new(t0.max_element(), t1.min_element())
    }

    /// Test if a ray hits this AABB in front of its origin.
    ///
    /// Exact slab clipping, no epsilon. Callers offset their ray origins when
    /// they need to avoid self-intersection.
    #[inline]
    pub fn intersects_ray(&self, ray: &Ray) -> bool {
        let t = self.slab(ray);
        t.max > t.min && t.max > 0.0
    }

    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::EMPTY
    }
}
