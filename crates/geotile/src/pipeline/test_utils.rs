//! Test utilities for pipeline tests.
//!
//! Provides scene and point cloud fixtures shared by the weld, tiling,
//! encoder and pipeline tests.

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::scene::{Mesh, Node, Point, PointCloud, Primitive, Scene, Vertex};

// =============================================================================
// Meshes
// =============================================================================

/// Corners of an axis-aligned cube of edge `size` with its min corner at `origin`.
pub fn cube_corners(origin: DVec3, size: f64) -> [DVec3; 8] {
  std::array::from_fn(|i| {
    origin
      + DVec3::new(
        if i & 1 != 0 { size } else { 0.0 },
        if i & 2 != 0 { size } else { 0.0 },
        if i & 4 != 0 { size } else { 0.0 },
      )
  })
}

/// The 12 outward-facing triangles of a cube, indexing [`cube_corners`].
pub const CUBE_TRIANGLES: [[u32; 3]; 12] = [
  // -Z
  [0, 2, 3],
  [0, 3, 1],
  // +Z
  [4, 5, 7],
  [4, 7, 6],
  // -Y
  [0, 1, 5],
  [0, 5, 4],
  // +Y
  [2, 6, 7],
  [2, 7, 3],
  // -X
  [0, 4, 6],
  [0, 6, 2],
  // +X
  [1, 3, 7],
  [1, 7, 5],
];

/// Cube exported "per face": every triangle owns its three vertices (36 total).
pub fn unwelded_cube(origin: DVec3, size: f64) -> Primitive {
  let corners = cube_corners(origin, size);
  let mut vertices = Vec::with_capacity(36);
  let mut triangles = Vec::with_capacity(12);
  for tri in CUBE_TRIANGLES {
    let base = vertices.len() as u32;
    vertices.extend(tri.iter().map(|&i| Vertex::new(corners[i as usize])));
    triangles.push([base, base + 1, base + 2]);
  }
  Primitive::from_triangles(vertices, &triangles)
}

/// Cube with shared corners (8 vertices, 12 triangles).
pub fn welded_cube(origin: DVec3, size: f64) -> Primitive {
  let vertices = cube_corners(origin, size).into_iter().map(Vertex::new).collect();
  Primitive::from_triangles(vertices, &CUBE_TRIANGLES)
}

/// Flat `n`×`n` quad grid in the XY plane at `z`, two triangles per cell.
pub fn grid_primitive(n: u32, cell: f64, z: f64) -> Primitive {
  let mut vertices = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
  for y in 0..=n {
    for x in 0..=n {
      vertices.push(Vertex::new(DVec3::new(x as f64 * cell, y as f64 * cell, z)));
    }
  }
  let row = n + 1;
  let mut triangles = Vec::with_capacity((n * n * 2) as usize);
  for y in 0..n {
    for x in 0..n {
      let i = y * row + x;
      triangles.push([i, i + 1, i + row + 1]);
      triangles.push([i, i + row + 1, i + row]);
    }
  }
  Primitive::from_triangles(vertices, &triangles)
}

/// Wrap primitives into a single-node scene.
pub fn scene_with(name: &str, primitives: Vec<Primitive>) -> Scene {
  Scene::new(name).with_root(Node::new("root").with_mesh(Mesh::new(primitives)))
}

// =============================================================================
// Point clouds
// =============================================================================

/// Uniformly distributed points inside `[0, extent)³`, reproducible per seed.
pub fn random_cloud(count: usize, extent: f64, seed: u64) -> PointCloud {
  let mut rng = StdRng::seed_from_u64(seed);
  let points = (0..count)
    .map(|_| {
      Point::new(DVec3::new(
        rng.random_range(0.0..extent),
        rng.random_range(0.0..extent),
        rng.random_range(0.0..extent),
      ))
      .with_color([rng.random(), rng.random(), rng.random(), 255])
    })
    .collect();
  PointCloud::new("random", points)
}

/// `count` copies of the same position plus two corner points spanning a box.
pub fn coincident_cloud(count: usize, at: DVec3, extent: f64) -> PointCloud {
  let mut points = vec![Point::new(at); count];
  points.push(Point::new(DVec3::ZERO));
  points.push(Point::new(DVec3::splat(extent)));
  PointCloud::new("coincident", points)
}
