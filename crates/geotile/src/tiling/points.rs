//! Point cloud decomposition into a tile tree.
//!
//! Count driven: a node above `max_points_per_node` is split into octants
//! (logical, `Replace`) and only leaves carry content. Points are routed in
//! chunks of `divide_chunk_size`, draining the parent list as they go so a
//! split never holds two full copies of a large subset.

use super::enu::{placement, Georeference};
use super::lod::{child_error, octant_code, truncate_error, ROOT_CODE};
use super::tree::{ContentPayload, TileContent, TileId, TileNode, TileTree};
use crate::config::TilingConfig;
use crate::error::{Result, TilingError};
use crate::octree::{partition, BoundingBox, SplitAxes, SplitLimits};
use crate::scene::{Point, PointCloud};

struct WorkItem {
  tile: TileId,
  points: Vec<Point>,
  depth: u32,
}

/// Route `points` into octant buckets around the center of `cell`,
/// consuming the input `chunk_size` points at a time.
pub fn route_chunked(
  mut points: Vec<Point>,
  cell: &BoundingBox,
  axes: SplitAxes,
  chunk_size: usize,
) -> [Vec<Point>; 8] {
  let mid = cell.center();
  let chunk_size = chunk_size.max(1);
  let mut buckets: [Vec<Point>; 8] = std::array::from_fn(|_| Vec::new());

  while !points.is_empty() {
    let start = points.len().saturating_sub(chunk_size);
    let routed = partition(points.drain(start..), mid, axes, |p: &Point| p.position);
    for (bucket, part) in buckets.iter_mut().zip(routed) {
      bucket.extend(part);
    }
    // Release the parent allocation as it empties (amortized).
    if points.len() <= points.capacity() / 2 {
      points.shrink_to_fit();
    }
  }

  buckets
}

/// Decompose a point cloud into a tile tree.
///
/// Points with non-finite positions are dropped with a warning. Fails with
/// [`TilingError::EmptyDataset`] when no point remains.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "tiling::tile_points"))]
pub fn tile_points(
  cloud: PointCloud,
  config: &TilingConfig,
  georeference: &dyn Georeference,
) -> Result<TileTree> {
  let mut cloud = cloud;
  cloud.drop_non_finite();

  let full = BoundingBox::from_points(cloud.points.iter().map(|p| p.position));
  if !full.is_valid() {
    return Err(TilingError::EmptyDataset);
  }

  let settings = &config.points;
  let root_bounds = full.to_cube();
  let root = TileNode::new(ROOT_CODE, root_bounds, truncate_error(full.longest_diagonal()))
    .with_transform(placement(georeference, &root_bounds));
  let mut tree = TileTree::new(root);

  let limits = SplitLimits::new(settings.max_points_per_node)
    .with_max_depth(settings.max_depth)
    .with_min_size(settings.min_node_size);

  let mut work = vec![WorkItem {
    tile: tree.root(),
    points: cloud.points,
    depth: 0,
  }];

  while let Some(item) = work.pop() {
    let node = tree.get(item.tile);
    let cell = node.bounds;

    if !limits.should_split(item.points.len(), &cell, item.depth) {
      if item.points.len() > settings.max_points_per_node {
        tracing::debug!(
          tile = %node.code,
          points = item.points.len(),
          depth = item.depth,
          "point leaf above the ceiling (split limits reached)"
        );
      }
      let uri = format!("{}.{}", node.code, settings.extension);
      tree.get_mut(item.tile).content = Some(TileContent {
        uri,
        payload: ContentPayload::Points(item.points),
        deferred: 0,
      });
      continue;
    }

    let code = node.code.clone();
    let parent_error = node.geometric_error;
    let buckets = route_chunked(item.points, &cell, settings.split_axes, settings.divide_chunk_size);

    for (octant, points) in buckets.into_iter().enumerate().rev() {
      if points.is_empty() {
        continue;
      }
      let bounds = cell.child_bounds(octant as u8, settings.split_axes);
      let child = TileNode::new(
        octant_code(&code, octant as u8),
        bounds,
        child_error(parent_error, bounds.longest_diagonal()),
      )
      .with_transform(placement(georeference, &bounds));
      let tile = tree.add_child(item.tile, child);
      work.push(WorkItem {
        tile,
        points,
        depth: item.depth + 1,
      });
    }
  }

  tracing::debug!(
    tiles = tree.len(),
    leaves = tree.content_nodes().count(),
    depth = tree.max_depth(),
    "point tiling complete"
  );
  Ok(tree)
}

#[cfg(test)]
#[path = "points_test.rs"]
mod points_test;
