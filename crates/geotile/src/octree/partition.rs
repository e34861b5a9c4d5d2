//! Generic octant classification and recursive partitioning.
//!
//! One parameterized split serves every caller: vertex welding buckets
//! vertices, mesh tiling routes triangle centroids, point tiling routes
//! points. Restricting the split to the XY plane turns the octree into a
//! quadtree for surface-only datasets.

use glam::DVec3;
use serde::Deserialize;
use smallvec::SmallVec;

use super::BoundingBox;

/// Axes participating in a split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitAxes {
  /// 4-way split in the XY plane (quadtree).
  Xy,
  /// 8-way split (octree).
  #[default]
  Xyz,
}

impl SplitAxes {
  /// Number of children a split can produce.
  #[inline]
  pub fn child_count(self) -> usize {
    match self {
      SplitAxes::Xy => 4,
      SplitAxes::Xyz => 8,
    }
  }
}

/// Classify a point against a midpoint.
///
/// Octant: 0-7 where bits represent +X, +Y, +Z offsets:
/// - bit 0: X (`>=` mid)
/// - bit 1: Y (`>=` mid)
/// - bit 2: Z (`>=` mid, XYZ mode only)
///
/// Ties go to the high side, so identical input always lands identically.
#[inline]
pub fn classify(point: DVec3, mid: DVec3, axes: SplitAxes) -> u8 {
  let mut octant = 0u8;
  if point.x >= mid.x {
    octant |= 1;
  }
  if point.y >= mid.y {
    octant |= 2;
  }
  if axes == SplitAxes::Xyz && point.z >= mid.z {
    octant |= 4;
  }
  octant
}

/// Route every item into exactly one octant bucket.
///
/// Buckets 4-7 stay empty in XY mode.
pub fn partition<T, I, F>(items: I, mid: DVec3, axes: SplitAxes, key: F) -> [Vec<T>; 8]
where
  I: IntoIterator<Item = T>,
  F: Fn(&T) -> DVec3,
{
  let mut buckets: [Vec<T>; 8] = std::array::from_fn(|_| Vec::new());
  for item in items {
    let octant = classify(key(&item), mid, axes);
    buckets[octant as usize].push(item);
  }
  buckets
}

/// Recursion limits for a partitioning pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitLimits {
  /// Stop splitting once a branch holds this many items or fewer.
  pub threshold: usize,
  /// Stop splitting at this depth.
  pub max_depth: u32,
  /// Stop splitting once the longest axis is below this size.
  pub min_size: f64,
}

impl SplitLimits {
  pub fn new(threshold: usize) -> Self {
    Self {
      threshold,
      ..Self::default()
    }
  }

  pub fn with_max_depth(mut self, max_depth: u32) -> Self {
    self.max_depth = max_depth;
    self
  }

  pub fn with_min_size(mut self, min_size: f64) -> Self {
    self.min_size = min_size;
    self
  }

  /// True when a branch with `count` items inside `bounds` at `depth` must
  /// be split further.
  #[inline]
  pub fn should_split(&self, count: usize, bounds: &BoundingBox, depth: u32) -> bool {
    count > self.threshold && self.can_split(bounds, depth)
  }

  /// Depth and size escape hatches only, ignoring the item count.
  #[inline]
  pub fn can_split(&self, bounds: &BoundingBox, depth: u32) -> bool {
    depth < self.max_depth && bounds.longest_axis() >= self.min_size
  }
}

impl Default for SplitLimits {
  fn default() -> Self {
    Self {
      threshold: 50,
      max_depth: 32,
      min_size: 1.0,
    }
  }
}

/// Terminal branch of a recursive partition.
#[derive(Clone, Debug)]
pub struct Leaf<T> {
  /// Bounds of the branch (a child of the root bounds, not a tight fit).
  pub bounds: BoundingBox,
  /// Octant path from the root.
  pub path: SmallVec<[u8; 16]>,
  pub items: Vec<T>,
}

impl<T> Leaf<T> {
  #[inline]
  pub fn depth(&self) -> u32 {
    self.path.len() as u32
  }
}

/// Recursively partition `items` until every branch satisfies `limits`.
///
/// Empty branches are dropped. The concatenation of all leaf item lists is
/// a permutation of the input.
pub fn build_leaves<T, F>(
  items: Vec<T>,
  bounds: BoundingBox,
  axes: SplitAxes,
  limits: &SplitLimits,
  key: F,
) -> Vec<Leaf<T>>
where
  F: Fn(&T) -> DVec3,
{
  let mut leaves = Vec::new();
  let mut stack = vec![Leaf {
    bounds,
    path: SmallVec::new(),
    items,
  }];

  while let Some(branch) = stack.pop() {
    if branch.items.is_empty() {
      continue;
    }
    if !limits.should_split(branch.items.len(), &branch.bounds, branch.depth()) {
      leaves.push(branch);
      continue;
    }

    let mid = branch.bounds.center();
    let buckets = partition(branch.items, mid, axes, &key);
    // Reverse push keeps octant 0 first in the output order.
    for (octant, bucket) in buckets.into_iter().enumerate().rev() {
      if bucket.is_empty() {
        continue;
      }
      let mut path = branch.path.clone();
      path.push(octant as u8);
      stack.push(Leaf {
        bounds: branch.bounds.child_bounds(octant as u8, axes),
        path,
        items: bucket,
      });
    }
  }

  leaves
}

#[cfg(test)]
#[path = "partition_test.rs"]
mod partition_test;
