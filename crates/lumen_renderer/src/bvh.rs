//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree of nested boxes over the scene's primitives. Two build
//! strategies are available: a median split on the dominant centroid axis,
//! and a bucketed Surface Area Heuristic. The tree stores indices into the
//! primitive list it was built from and never owns geometry.

use crate::error::{Error, Result};
use crate::{Intersection, Primitive};
use lumen_math::{Aabb, Ray, Vec3};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Number of buckets the SAH build bins centroids into.
pub const SAH_BUCKETS: usize = 12;

/// Relative cost of visiting an interior node in the SAH cost model.
const SAH_TRAVERSAL_COST: f32 = 0.125;

/// Upper bound applied to the configured leaf size.
pub const MAX_LEAF_SIZE_LIMIT: usize = 255;

/// How the builder partitions a set of primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// Sort by centroid on the dominant axis and split at the median.
    #[default]
    Naive,
    /// Surface Area Heuristic over fixed buckets.
    Sah,
}

/// Accelerator build settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceleratorConfig {
    pub split_method: SplitMethod,
    /// Largest primitive count the SAH build turns straight into a leaf.
    /// The median split always stops at one primitive per leaf.
    pub max_leaf_size: usize,
    /// Nodes with at least this many primitives build their subtrees
    /// on the rayon pool. `usize::MAX` keeps the build on one thread.
    pub parallel_threshold: usize,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            split_method: SplitMethod::Naive,
            max_leaf_size: 1,
            parallel_threshold: 4096,
        }
    }
}

impl AcceleratorConfig {
    pub fn new(split_method: SplitMethod, max_leaf_size: usize) -> Self {
        Self {
            split_method,
            max_leaf_size,
            ..Default::default()
        }
    }

    pub fn with_split_method(mut self, split_method: SplitMethod) -> Self {
        self.split_method = split_method;
        self
    }

    pub fn with_max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.max_leaf_size = max_leaf_size;
        self
    }

    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    /// Reject settings the builder cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_leaf_size == 0 {
            return Err(Error::InvalidLeafSize(self.max_leaf_size));
        }
        Ok(())
    }

    /// Leaf size actually used by the builder.
    pub fn effective_leaf_size(&self) -> usize {
        self.max_leaf_size.clamp(1, MAX_LEAF_SIZE_LIMIT)
    }
}

/// What the builder needs to know about one primitive.
///
/// Computed once up front so the recursive build works on plain owned data
/// and never calls back into the primitives.
#[derive(Debug, Clone, Copy)]
pub struct BuildPrimitive {
    /// Position in the scene's primitive list
    pub index: usize,
    pub bounds: Aabb,
    pub centroid: Vec3,
}

impl BuildPrimitive {
    pub fn new(index: usize, primitive: &dyn Primitive) -> Self {
        Self {
            index,
            bounds: primitive.bounds(),
            centroid: primitive.centroid(),
        }
    }
}

/// BVH node.
#[derive(Debug)]
pub enum BvhNode {
    /// Leaf holding exactly one primitive.
    Leaf { bounds: Aabb, primitive: usize },
    /// Leaf holding several primitives the SAH build chose not to split.
    Cluster { bounds: Aabb, primitives: Vec<usize> },
    /// Internal node with two children.
    Interior {
        bounds: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn leaf(item: &BuildPrimitive) -> Self {
        BvhNode::Leaf {
            bounds: item.bounds,
            primitive: item.index,
        }
    }

    fn cluster(bounds: Aabb, items: &[BuildPrimitive]) -> Self {
        BvhNode::Cluster {
            bounds,
            primitives: items.iter().map(|p| p.index).collect(),
        }
    }

    fn interior(left: BvhNode, right: BvhNode) -> Self {
        BvhNode::Interior {
            bounds: left.bounds().union(&right.bounds()),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn bounds(&self) -> Aabb {
        match self {
            BvhNode::Leaf { bounds, .. } => *bounds,
            BvhNode::Cluster { bounds, .. } => *bounds,
            BvhNode::Interior { bounds, .. } => *bounds,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, BvhNode::Interior { .. })
    }

    /// Append every primitive index below this node, left to right.
    pub fn collect_primitives(&self, out: &mut Vec<usize>) {
        match self {
            BvhNode::Leaf { primitive, .. } => out.push(*primitive),
            BvhNode::Cluster { primitives, .. } => out.extend_from_slice(primitives),
            BvhNode::Interior { left, right, .. } => {
                left.collect_primitives(out);
                right.collect_primitives(out);
            }
        }
    }

    /// Nearest hit below this node.
    ///
    /// A failed box test prunes the whole subtree. Both children of an
    /// interior node are always visited and the nearer result kept.
    pub fn intersect<'a>(&self, primitives: &'a [Box<dyn Primitive>], ray: &Ray) -> Intersection<'a> {
        if !self.bounds().intersects_ray(ray) {
            return Intersection::none();
        }

        match self {
            BvhNode::Leaf { primitive, .. } => primitives[*primitive].intersect(ray),
            BvhNode::Cluster {
                primitives: indices, ..
            } => indices
                .iter()
                .map(|&i| primitives[i].intersect(ray))
                .fold(Intersection::none(), Intersection::nearer),
            BvhNode::Interior { left, right, .. } => {
                let hit_left = left.intersect(primitives, ray);
                let hit_right = right.intersect(primitives, ray);
                hit_left.nearer(hit_right)
            }
        }
    }

    fn accumulate_stats(&self, depth: usize, stats: &mut BvhStats) {
        stats.nodes += 1;
        stats.max_depth = stats.max_depth.max(depth);
        match self {
            BvhNode::Leaf { .. } => {
                stats.leaves += 1;
                stats.primitives += 1;
                stats.largest_leaf = stats.largest_leaf.max(1);
            }
            BvhNode::Cluster { primitives, .. } => {
                stats.leaves += 1;
                stats.clusters += 1;
                stats.primitives += primitives.len();
                stats.largest_leaf = stats.largest_leaf.max(primitives.len());
            }
            BvhNode::Interior { left, right, .. } => {
                left.accumulate_stats(depth + 1, stats);
                right.accumulate_stats(depth + 1, stats);
            }
        }
    }
}

/// Shape of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub primitives: usize,
    pub nodes: usize,
    /// Leaves of either kind
    pub leaves: usize,
    /// Leaves holding more than one primitive
    pub clusters: usize,
    /// Depth of the deepest node, the root being 0
    pub max_depth: usize,
    pub largest_leaf: usize,
}

#[derive(Default, Clone, Copy)]
struct SahBucket {
    count: usize,
    bounds: Aabb,
}

impl SahBucket {
    fn merge(buckets: &[SahBucket]) -> SahBucket {
        buckets.iter().fold(SahBucket::default(), |acc, b| SahBucket {
            count: acc.count + b.count,
            bounds: acc.bounds.union(&b.bounds),
        })
    }
}

/// Recursive builder. Cheap to copy into rayon tasks.
#[derive(Debug, Clone, Copy)]
struct Builder {
    split_method: SplitMethod,
    max_leaf_size: usize,
    parallel_threshold: usize,
}

impl Builder {
    fn build(&self, items: Vec<BuildPrimitive>) -> BvhNode {
        match self.split_method {
            SplitMethod::Naive => self.build_naive(items),
            SplitMethod::Sah => self.build_sah(items),
        }
    }

    fn build_children(&self, left: Vec<BuildPrimitive>, right: Vec<BuildPrimitive>) -> BvhNode {
        let (left, right) = if left.len() + right.len() >= self.parallel_threshold {
            rayon::join(|| self.build(left), || self.build(right))
        } else {
            (self.build(left), self.build(right))
        };
        BvhNode::interior(left, right)
    }

    /// Median split on the dominant axis of the centroid bounds.
    fn build_naive(&self, mut items: Vec<BuildPrimitive>) -> BvhNode {
        match items.as_slice() {
            [only] => return BvhNode::leaf(only),
            [first, second] => return BvhNode::interior(BvhNode::leaf(first), BvhNode::leaf(second)),
            _ => {}
        }

        let centroid_bounds = items
            .iter()
            .fold(Aabb::EMPTY, |acc, p| acc.union_point(p.centroid));
        let axis = centroid_bounds.max_extent();

        items.sort_unstable_by(|a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));

        let mid = items.len() / 2;
        let right = items.split_off(mid);
        self.build_children(items, right)
    }

    /// Bucketed SAH split on the dominant axis of the full bounds.
    fn build_sah(&self, items: Vec<BuildPrimitive>) -> BvhNode {
        if let [only] = items.as_slice() {
            return BvhNode::leaf(only);
        }

        let bounds = items.iter().fold(Aabb::EMPTY, |acc, p| acc.union(&p.bounds));
        if items.len() <= self.max_leaf_size {
            return BvhNode::cluster(bounds, &items);
        }

        let axis = bounds.max_extent();
        let assignment: Vec<usize> = items
            .iter()
            .map(|p| {
                let offset = bounds.offset(p.centroid)[axis];
                // Saturating cast: negative or NaN offsets land in bucket 0
                ((offset * SAH_BUCKETS as f32) as usize).min(SAH_BUCKETS - 1)
            })
            .collect();

        let mut buckets = [SahBucket::default(); SAH_BUCKETS];
        for (p, &b) in items.iter().zip(&assignment) {
            buckets[b].count += 1;
            buckets[b].bounds = buckets[b].bounds.union(&p.bounds);
        }

        let total_area = bounds.surface_area();
        let mut best: Option<(usize, f32)> = None;
        for split in 1..SAH_BUCKETS {
            let (below, above) = buckets.split_at(split);
            let left = SahBucket::merge(below);
            let right = SahBucket::merge(above);
            if left.count == 0 || right.count == 0 {
                continue;
            }

            let cost = SAH_TRAVERSAL_COST
                + left.count as f32 * left.bounds.surface_area() / total_area
                + right.count as f32 * right.bounds.surface_area() / total_area;
            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((split, cost));
            }
        }

        let split = best.map_or(0, |(split, _)| split);
        let mut left = Vec::new();
        let mut right = Vec::new();
        for (p, b) in items.iter().zip(assignment) {
            if b < split {
                left.push(*p);
            } else {
                right.push(*p);
            }
        }

        if left.is_empty() || right.is_empty() {
            log::debug!(
                "SAH found no split for {} primitives, keeping them in one leaf",
                items.len()
            );
            return BvhNode::cluster(bounds, &items);
        }

        self.build_children(left, right)
    }
}

/// A built, immutable BVH.
#[derive(Debug)]
pub struct Bvh {
    root: Option<BvhNode>,
    split_method: SplitMethod,
    stats: BvhStats,
}

impl Bvh {
    /// Build a BVH over `primitives`. Node indices refer to this slice.
    pub fn build(primitives: &[Box<dyn Primitive>], config: &AcceleratorConfig) -> Result<Self> {
        let items = primitives
            .iter()
            .enumerate()
            .map(|(i, p)| BuildPrimitive::new(i, p.as_ref()))
            .collect();
        Self::from_build_primitives(items, config)
    }

    /// Build from precomputed per-primitive data.
    ///
    /// An empty input gives a tree with no root, which every query misses.
    pub fn from_build_primitives(items: Vec<BuildPrimitive>, config: &AcceleratorConfig) -> Result<Self> {
        config.validate()?;

        let start = Instant::now();
        let builder = Builder {
            split_method: config.split_method,
            max_leaf_size: config.effective_leaf_size(),
            parallel_threshold: config.parallel_threshold,
        };

        let root = if items.is_empty() {
            log::warn!("Building BVH over an empty primitive list");
            None
        } else {
            Some(builder.build(items))
        };

        let mut stats = BvhStats::default();
        if let Some(root) = &root {
            root.accumulate_stats(0, &mut stats);
        }

        log::info!(
            "BVH ({:?}) built over {} primitives in {:?}: {} nodes, {} leaves ({} clusters), depth {}",
            config.split_method,
            stats.primitives,
            start.elapsed(),
            stats.nodes,
            stats.leaves,
            stats.clusters,
            stats.max_depth
        );

        Ok(Self {
            root,
            split_method: config.split_method,
            stats,
        })
    }

    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// Bounds of the whole tree, empty if there is no root.
    pub fn bounds(&self) -> Aabb {
        self.root.as_ref().map_or(Aabb::EMPTY, BvhNode::bounds)
    }

    pub fn split_method(&self) -> SplitMethod {
        self.split_method
    }

    pub fn stats(&self) -> BvhStats {
        self.stats
    }

    /// Nearest hit of `ray` against `primitives`, which must be the slice
    /// the tree was built from.
    pub fn intersect<'a>(&self, primitives: &'a [Box<dyn Primitive>], ray: &Ray) -> Intersection<'a> {
        match &self.root {
            Some(root) => root.intersect(primitives, ray),
            None => Intersection::none(),
        }
    }
}
