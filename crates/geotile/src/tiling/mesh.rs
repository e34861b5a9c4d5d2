//! Mesh decomposition into a tile tree.
//!
//! Work list of `(tile, primitives)` pairs starting from the whole dataset:
//!
//! - **Spatial split**: a tile above the triangle ceiling routes every
//!   triangle by centroid into one octant of its cell. Each non-empty octant
//!   becomes a logical child (no content, `Replace`).
//! - **LOD resolve**: a tile within the ceiling whose extent exceeds the
//!   next finer LOD threshold keeps triangles at least as large as its own
//!   threshold as content and pushes the rest down to a `C` child one level
//!   finer (the tile becomes `Add`).
//! - **Absorb**: at the maximum level, or once the tile is small enough,
//!   every remaining triangle resolves here.

use glam::DVec3;

use super::enu::{placement, Georeference};
use super::lod::{child_error, level_from_code, octant_code, remainder_code, truncate_error, ROOT_CODE};
use super::tree::{ContentPayload, Refine, TileContent, TileId, TileNode, TileTree};
use crate::config::TilingConfig;
use crate::error::{Result, TilingError};
use crate::octree::{partition, BoundingBox, SplitLimits};
use crate::scene::{validate_primitive, Primitive};

struct WorkItem {
  tile: TileId,
  /// Region split by the octree; may be smaller than the tile's volume.
  cell: BoundingBox,
  primitives: Vec<Primitive>,
  /// Number of spatial splits above this tile.
  depth: u32,
}

#[inline]
fn triangle_positions(primitive: &Primitive, tri: [u32; 3]) -> [DVec3; 3] {
  tri.map(|i| primitive.vertices[i as usize].position)
}

#[inline]
fn centroid(primitive: &Primitive, tri: [u32; 3]) -> DVec3 {
  let [a, b, c] = triangle_positions(primitive, tri);
  (a + b + c) / 3.0
}

/// Size of a triangle for LOD purposes: diagonal of its bounds.
#[inline]
pub fn triangle_diagonal(primitive: &Primitive, tri: [u32; 3]) -> f64 {
  BoundingBox::from_points(triangle_positions(primitive, tri)).longest_diagonal()
}

fn triangle_count(primitives: &[Primitive]) -> usize {
  primitives.iter().map(Primitive::triangle_count).sum()
}

/// Bounds of the vertices referenced by triangles (unreferenced vertices ignored).
fn referenced_bounds(primitives: &[Primitive]) -> BoundingBox {
  let mut bounds = BoundingBox::empty();
  for primitive in primitives {
    for tri in primitive.triangles() {
      for p in triangle_positions(primitive, tri) {
        bounds.add_point(p);
      }
    }
  }
  bounds
}

/// Decompose triangulated primitives into a tile tree.
///
/// Faces that are not triangles are ignored; malformed faces are skipped
/// with a warning and vertices no triangle uses are pruned. Fails with [`TilingError::EmptyDataset`] when no
/// triangle remains.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "tiling::tile_mesh"))]
pub fn tile_mesh(
  primitives: Vec<Primitive>,
  config: &TilingConfig,
  georeference: &dyn Georeference,
) -> Result<TileTree> {
  let mut primitives = primitives;
  for (i, primitive) in primitives.iter_mut().enumerate() {
    validate_primitive(primitive, &format!("primitive #{i}"));
    let polygons = primitive.face_count() - primitive.triangle_count();
    if polygons > 0 {
      tracing::warn!(primitive = i, polygons, "ignoring non-triangle faces; triangulate first");
    }
    // Content is quantized over every vertex it carries, so stray ones go.
    let unreferenced = primitive.unreferenced_vertex_count();
    if unreferenced > 0 {
      tracing::debug!(primitive = i, unreferenced, "pruning unreferenced vertices");
    }
    if polygons > 0 || unreferenced > 0 {
      let triangles: Vec<[u32; 3]> = primitive.triangles().collect();
      *primitive = primitive.subset(triangles);
    }
  }
  primitives.retain(|p| p.triangle_count() > 0);

  let full = referenced_bounds(&primitives);
  if !full.is_valid() {
    return Err(TilingError::EmptyDataset);
  }

  let root_bounds = full.to_cube();
  let root = TileNode::new(ROOT_CODE, root_bounds, truncate_error(full.longest_diagonal()))
    .with_lod_level(config.lod.clamp(0))
    .with_transform(placement(georeference, &root_bounds));
  let mut tree = TileTree::new(root);

  let limits = SplitLimits::new(config.mesh.max_triangles_per_tile)
    .with_max_depth(config.mesh.max_depth)
    .with_min_size(config.mesh.min_node_size);

  let mut work = vec![WorkItem {
    tile: tree.root(),
    cell: root_bounds,
    primitives,
    depth: 0,
  }];

  while let Some(item) = work.pop() {
    let count = triangle_count(&item.primitives);
    if limits.should_split(count, &item.cell, item.depth) {
      split_spatially(&mut tree, item, config, georeference, &mut work);
    } else {
      resolve_lod(&mut tree, item, config, georeference, &mut work);
    }
  }

  tracing::debug!(
    tiles = tree.len(),
    content = tree.content_nodes().count(),
    depth = tree.max_depth(),
    "mesh tiling complete"
  );
  Ok(tree)
}

fn split_spatially(
  tree: &mut TileTree,
  item: WorkItem,
  config: &TilingConfig,
  georeference: &dyn Georeference,
  work: &mut Vec<WorkItem>,
) {
  let axes = config.mesh.split_axes;
  let mid = item.cell.center();
  let mut buckets: [Vec<Primitive>; 8] = std::array::from_fn(|_| Vec::new());

  for primitive in &item.primitives {
    let routed = partition(primitive.triangles(), mid, axes, |&tri| centroid(primitive, tri));
    for (octant, triangles) in routed.into_iter().enumerate() {
      if !triangles.is_empty() {
        buckets[octant].push(primitive.subset(triangles));
      }
    }
  }

  let parent = tree.get(item.tile);
  let parent_code = parent.code.clone();
  let parent_error = parent.geometric_error;
  let lod_level = parent.lod_level;

  for (octant, primitives) in buckets.into_iter().enumerate().rev() {
    if primitives.is_empty() {
      continue;
    }
    let cell = item.cell.child_bounds(octant as u8, axes);
    let bounds = cell.union(&referenced_bounds(&primitives));
    let node = TileNode::new(
      octant_code(&parent_code, octant as u8),
      bounds,
      child_error(parent_error, bounds.longest_diagonal()),
    )
    .with_lod_level(lod_level)
    .with_transform(placement(georeference, &bounds));
    let tile = tree.add_child(item.tile, node);
    work.push(WorkItem {
      tile,
      cell,
      primitives,
      depth: item.depth + 1,
    });
  }
}

fn resolve_lod(
  tree: &mut TileTree,
  item: WorkItem,
  config: &TilingConfig,
  georeference: &dyn Georeference,
  work: &mut Vec<WorkItem>,
) {
  let lod = &config.lod;
  let node = tree.get(item.tile);
  let code = node.code.clone();
  let level = lod.clamp(level_from_code(&code));
  let threshold = lod.error_at(level);
  let diagonal = node.bounds.longest_diagonal();
  let parent_error = node.geometric_error;

  let refine_further = match lod.next_error(level) {
    Some(next) => diagonal > next,
    None => false,
  };

  let (resolved, remainder) = if refine_further {
    split_by_size(item.primitives, threshold)
  } else {
    if lod.is_max(level) {
      let absorbed = item
        .primitives
        .iter()
        .flat_map(|p| p.triangles().map(move |t| triangle_diagonal(p, t)))
        .filter(|&d| d < threshold)
        .count();
      if absorbed > 0 {
        tracing::debug!(tile = %code, absorbed, "absorbing LOD remainder at the maximum level");
      }
    }
    (item.primitives, Vec::new())
  };

  let deferred = triangle_count(&remainder);
  let node = tree.get_mut(item.tile);
  node.lod_level = level;
  if !resolved.is_empty() {
    node.content = Some(TileContent {
      uri: format!("{code}.{}", config.mesh.extension),
      payload: ContentPayload::Mesh(resolved),
      deferred,
    });
    if deferred > 0 {
      node.refine = Refine::Add;
    }
  }

  if remainder.is_empty() {
    return;
  }

  let child_code = remainder_code(&code);
  let child_level = lod.clamp(level_from_code(&child_code));
  let bounds = referenced_bounds(&remainder).to_cube();
  let candidate = bounds.longest_diagonal().min(lod.error_at(child_level));
  let child = TileNode::new(child_code, bounds, child_error(parent_error, candidate))
    .with_lod_level(child_level)
    .with_transform(placement(georeference, &bounds));
  let tile = tree.add_child(item.tile, child);
  work.push(WorkItem {
    tile,
    cell: bounds,
    primitives: remainder,
    depth: item.depth,
  });
}

/// Partition triangles into those at least `threshold` across and the rest.
fn split_by_size(primitives: Vec<Primitive>, threshold: f64) -> (Vec<Primitive>, Vec<Primitive>) {
  let mut resolved = Vec::new();
  let mut remainder = Vec::new();
  for primitive in primitives {
    let (large, small): (Vec<[u32; 3]>, Vec<[u32; 3]>) = primitive
      .triangles()
      .partition(|&tri| triangle_diagonal(&primitive, tri) >= threshold);
    if small.is_empty() {
      resolved.push(primitive);
    } else if large.is_empty() {
      remainder.push(primitive);
    } else {
      resolved.push(primitive.subset(large));
      remainder.push(primitive.subset(small));
    }
  }
  (resolved, remainder)
}

#[cfg(test)]
#[path = "mesh_test.rs"]
mod mesh_test;
