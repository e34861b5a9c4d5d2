use std::f64::consts::FRAC_PI_2;

use glam::{DMat4, DVec3};

use super::*;
use crate::scene::{Mesh, Primitive, Vertex};

fn one_vertex_mesh(position: DVec3) -> Mesh {
  let vertex = Vertex::new(position).with_normal(DVec3::X);
  Mesh::new(vec![Primitive::from_triangles(vec![vertex], &[])])
}

/// root (translate +10 X) → mid (rotate 90° about Z) → leaf (translate +1 X)
fn three_level_scene() -> Scene {
  let leaf = Node::new("leaf")
    .with_transform(DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0)))
    .with_mesh(one_vertex_mesh(DVec3::ZERO));
  let mid = Node::new("mid")
    .with_transform(DMat4::from_rotation_z(FRAC_PI_2))
    .with_child(leaf);
  let root = Node::new("root")
    .with_transform(DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0)))
    .with_child(mid);
  Scene::new("three-level").with_root(root)
}

/// world(node) equals the product of ancestor locals in root-to-node order.
#[test]
fn test_world_transform_composition() {
  let mut scene = three_level_scene();
  scene.update_world_transforms();

  let root = &scene.roots[0];
  let mid = &root.children[0];
  let leaf = &mid.children[0];

  let expected = root.local * mid.local * leaf.local;
  assert!(leaf.world.abs_diff_eq(expected, 1e-12));
  assert!(mid.world.abs_diff_eq(root.local * mid.local, 1e-12));

  // Origin of the leaf lands at (10, 1, 0): +1 X rotated onto +Y, then shifted.
  let origin = leaf.world.transform_point3(DVec3::ZERO);
  assert!(origin.abs_diff_eq(DVec3::new(10.0, 1.0, 0.0), 1e-12));
}

#[test]
fn test_bounding_box_uses_composed_transform() {
  let mut scene = three_level_scene();
  let bounds = scene.bounding_box().expect("scene has geometry");
  assert!(bounds.min.abs_diff_eq(DVec3::new(10.0, 1.0, 0.0), 1e-12));
  assert!(bounds.max.abs_diff_eq(DVec3::new(10.0, 1.0, 0.0), 1e-12));
}

#[test]
fn test_bounding_box_none_without_geometry() {
  let node = Node::new("empty").with_child(Node::new("also-empty"));
  assert!(node.bounding_box(&DMat4::IDENTITY).is_none());

  let mut scene = Scene::new("empty").with_root(node);
  assert!(scene.bounding_box().is_none());
}

#[test]
fn test_flatten_bakes_positions_and_normals() {
  let mut scene = three_level_scene();
  scene.flatten_transforms();

  let root = &scene.roots[0];
  let leaf = &root.children[0].children[0];
  assert_eq!(root.local, DMat4::IDENTITY);
  assert_eq!(leaf.local, DMat4::IDENTITY);
  assert_eq!(leaf.world, DMat4::IDENTITY);

  let vertex = &leaf.meshes[0].primitives[0].vertices[0];
  assert!(vertex.position.abs_diff_eq(DVec3::new(10.0, 1.0, 0.0), 1e-12));
  // +X normal rotated 90° about Z becomes +Y.
  let normal = vertex.normal.expect("normal preserved");
  assert!(normal.abs_diff_eq(DVec3::Y, 1e-12));
}

/// Flattening twice is the same as flattening once.
#[test]
fn test_flatten_is_idempotent() {
  let mut once = three_level_scene();
  once.flatten_transforms();

  let mut twice = once.clone();
  twice.flatten_transforms();

  assert_eq!(once, twice);
}

/// Bounds are invariant under flattening.
#[test]
fn test_flatten_preserves_bounds() {
  let mut scene = three_level_scene();
  let before = scene.bounding_box().unwrap();
  scene.flatten_transforms();
  let after = scene.bounding_box().unwrap();
  assert!(before.min.abs_diff_eq(after.min, 1e-9));
  assert!(before.max.abs_diff_eq(after.max, 1e-9));
}
