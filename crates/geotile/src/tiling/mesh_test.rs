use glam::DVec3;

use super::*;
use crate::config::LodConfig;
use crate::octree::SplitAxes;
use crate::pipeline::test_utils::*;
use crate::scene::Vertex;
use crate::tiling::enu::{Geodetic, LocalFrame};
use crate::weld::{weld_primitive, WeldOptions};

fn frame() -> LocalFrame {
  LocalFrame::new(Geodetic::new(6.95, 50.94, 0.0))
}

fn mesh_content(node: &TileNode) -> &[Primitive] {
  match &node.content.as_ref().expect("content").payload {
    ContentPayload::Mesh(primitives) => primitives,
    ContentPayload::Points(_) => panic!("expected mesh content"),
  }
}

fn shifted(mut primitive: Primitive, offset: DVec3) -> Primitive {
  for v in &mut primitive.vertices {
    v.position += offset;
  }
  primitive
}

fn assert_errors_decrease(tree: &TileTree) {
  for (id, node) in tree.iter() {
    if let Some(parent) = tree.parent(id) {
      assert!(
        node.geometric_error < tree.get(parent).geometric_error,
        "{} error {} not below parent {}",
        node.code,
        node.geometric_error,
        tree.get(parent).geometric_error
      );
    }
  }
}

fn assert_indices_valid(tree: &TileTree) {
  for (_, node) in tree.content_nodes() {
    for primitive in mesh_content(node) {
      for face in primitive.faces() {
        for &i in &face.indices {
          assert!((i as usize) < primitive.vertices.len(), "{}: index {i} out of range", node.code);
        }
      }
    }
  }
}

// =========================================================================
// Scenarios
// =========================================================================

/// Welded per-face cube fits one tile: a single `Replace` root with content.
#[test]
fn test_cube_single_root_tile() {
  let mut cube = unwelded_cube(DVec3::ZERO, 1.0);
  weld_primitive(&mut cube, &WeldOptions::default().with_error(1e-6));
  assert_eq!(cube.vertices.len(), 8);
  assert_eq!(cube.face_count(), 12);

  let tree = tile_mesh(vec![cube], &TilingConfig::default(), &frame()).unwrap();
  assert_eq!(tree.len(), 1);

  let root = tree.get(tree.root());
  assert_eq!(root.code, "R");
  assert_eq!(root.refine, Refine::Replace);
  assert_eq!(root.geometric_error, truncate_error(3f64.sqrt()));
  let content = root.content.as_ref().unwrap();
  assert_eq!(content.uri, "R.b3dm");
  assert_eq!(content.payload.item_count(), 12);
  assert_eq!(content.deferred, 0);
  assert_indices_valid(&tree);
}

/// A ceiling of one triangle splits the unit cube once; the half-size cells
/// are below the minimum node size.
#[test]
fn test_cube_with_tiny_ceiling() {
  let config = TilingConfig::default().with_max_triangles(1);
  let tree = tile_mesh(vec![welded_cube(DVec3::ZERO, 1.0)], &config, &frame()).unwrap();

  let root = tree.get(tree.root());
  assert!(root.content.is_none());
  assert_eq!(tree.max_depth(), 1);
  assert_eq!(tree.total_items(), 12);
  for &child in tree.children(tree.root()) {
    let node = tree.get(child);
    assert_eq!(node.code.len(), 2);
    assert_eq!(node.refine, Refine::Replace);
    assert!(node.has_content());
  }
  assert_errors_decrease(&tree);
}

#[test]
fn test_empty_dataset() {
  let err = tile_mesh(Vec::new(), &TilingConfig::default(), &frame()).unwrap_err();
  assert!(matches!(err, TilingError::EmptyDataset));

  let no_faces = Primitive::from_triangles(vec![Vertex::new(DVec3::ZERO)], &[]);
  let err = tile_mesh(vec![no_faces], &TilingConfig::default(), &frame()).unwrap_err();
  assert!(matches!(err, TilingError::EmptyDataset));
}

// =========================================================================
// Properties
// =========================================================================

/// Every triangle lands in exactly one content tile and tiles respect the ceiling.
#[test]
fn test_split_completeness() {
  let grid = grid_primitive(100, 1.0, 0.0);
  let total = grid.triangle_count();
  let config = TilingConfig::default().with_max_triangles(1000);
  let tree = tile_mesh(vec![grid], &config, &frame()).unwrap();

  assert!(tree.len() > 1);
  assert_eq!(tree.total_items(), total);
  for (_, node) in tree.content_nodes() {
    assert!(node.content.as_ref().unwrap().payload.item_count() <= 1000);
    assert!(node.is_leaf());
  }
  assert_indices_valid(&tree);
  assert_errors_decrease(&tree);
}

/// Content vertices are re-indexed: no tile carries the full vertex list.
#[test]
fn test_content_is_reindexed() {
  let grid = grid_primitive(60, 1.0, 0.0);
  let vertex_count = grid.vertices.len();
  let config = TilingConfig::default().with_max_triangles(500);
  let tree = tile_mesh(vec![grid], &config, &frame()).unwrap();
  for (_, node) in tree.content_nodes() {
    let vertices: usize = mesh_content(node).iter().map(|p| p.vertices.len()).sum();
    assert!(vertices < vertex_count);
  }
}

#[test]
fn test_quadtree_codes() {
  let config = TilingConfig::default()
    .with_max_triangles(200)
    .with_split_axes(SplitAxes::Xy);
  let tree = tile_mesh(vec![grid_primitive(40, 1.0, 0.0)], &config, &frame()).unwrap();
  assert!(tree.len() > 1);
  for (_, node) in tree.iter() {
    assert!(node.code[1..].chars().all(|c| ('0'..='3').contains(&c)), "{}", node.code);
  }
  assert_eq!(tree.total_items(), 40 * 40 * 2);
}

// =========================================================================
// LOD
// =========================================================================

fn lod_dataset() -> Vec<Primitive> {
  let big = Primitive::from_triangles(
    vec![
      Vertex::new(DVec3::ZERO),
      Vertex::new(DVec3::new(1500.0, 0.0, 0.0)),
      Vertex::new(DVec3::new(0.0, 1500.0, 0.0)),
    ],
    &[[0, 1, 2]],
  );
  let small = shifted(grid_primitive(10, 1.0, 0.0), DVec3::new(1000.0, 1000.0, 0.0));
  vec![big, small]
}

/// Large triangles resolve at the root; small ones are deferred to `RC`.
#[test]
fn test_lod_remainder_child() {
  let config = TilingConfig::default().with_lod(LodConfig::halving(1000.0, 3));
  let tree = tile_mesh(lod_dataset(), &config, &frame()).unwrap();

  let root = tree.get(tree.root());
  assert_eq!(root.refine, Refine::Add);
  let content = root.content.as_ref().unwrap();
  assert_eq!(content.payload.item_count(), 1);
  assert_eq!(content.deferred, 200);

  let child = tree.get(tree.find("RC").expect("remainder child"));
  assert_eq!(child.lod_level, 1);
  assert_eq!(child.refine, Refine::Replace);
  assert_eq!(child.content.as_ref().unwrap().payload.item_count(), 200);
  assert_eq!(child.content.as_ref().unwrap().uri, "RC.b3dm");
  assert_eq!(child.geometric_error, truncate_error(10.0 * 3f64.sqrt()));
  assert_errors_decrease(&tree);
  assert_indices_valid(&tree);
}

/// With a single LOD level everything is absorbed at the root.
#[test]
fn test_lod_absorbs_at_max_level() {
  let config = TilingConfig::default().with_lod(LodConfig::halving(1000.0, 1));
  let tree = tile_mesh(lod_dataset(), &config, &frame()).unwrap();
  assert_eq!(tree.len(), 1);
  let root = tree.get(tree.root());
  assert_eq!(root.refine, Refine::Replace);
  assert_eq!(root.content.as_ref().unwrap().payload.item_count(), 201);
}

/// Per-tile transforms follow each tile's own center.
#[test]
fn test_tiles_have_independent_frames() {
  let config = TilingConfig::default().with_max_triangles(1000);
  let tree = tile_mesh(vec![grid_primitive(100, 1.0, 0.0)], &config, &frame()).unwrap();
  let root = tree.get(tree.root()).transform;
  let child = tree.get(tree.children(tree.root())[0]).transform;
  assert_ne!(root, child);
}
