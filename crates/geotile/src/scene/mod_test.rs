use glam::DVec3;

use super::*;

fn quad_vertices() -> Vec<Vertex> {
  vec![
    Vertex::new(DVec3::new(0.0, 0.0, 0.0)),
    Vertex::new(DVec3::new(1.0, 0.0, 0.0)),
    Vertex::new(DVec3::new(1.0, 1.0, 0.0)),
    Vertex::new(DVec3::new(0.0, 1.0, 0.0)),
    Vertex::new(DVec3::new(5.0, 5.0, 5.0)),
  ]
}

// =========================================================================
// Primitive
// =========================================================================

#[test]
fn test_primitive_counts() {
  let primitive = Primitive::from_triangles(quad_vertices(), &[[0, 1, 2], [0, 2, 3]]);
  assert_eq!(primitive.face_count(), 2);
  assert_eq!(primitive.triangle_count(), 2);
  assert_eq!(primitive.material, NO_MATERIAL);
}

/// Subsets are re-indexed from 0 and carry only referenced vertices.
#[test]
fn test_subset_reindexes_from_zero() {
  let primitive = Primitive::from_triangles(quad_vertices(), &[[0, 1, 2], [0, 2, 3]]).with_material(4);
  let subset = primitive.subset([[0, 2, 3]]);

  assert_eq!(subset.vertices.len(), 3);
  assert_eq!(subset.triangles().collect::<Vec<_>>(), vec![[0, 1, 2]]);
  assert_eq!(subset.vertices[1].position, DVec3::new(1.0, 1.0, 0.0));
  assert_eq!(subset.material, 4);
}

#[test]
fn test_unreferenced_vertex_count() {
  let mut primitive = Primitive::from_triangles(quad_vertices(), &[[0, 1, 2], [0, 2, 3]]);
  assert_eq!(primitive.unreferenced_vertex_count(), 1);

  primitive.surfaces[0].faces.push(Face::new([1u32, 4, 99]));
  assert_eq!(primitive.unreferenced_vertex_count(), 0);
}

#[test]
fn test_flatten_surfaces() {
  let mut primitive = Primitive::from_triangles(quad_vertices(), &[[0, 1, 2]]);
  primitive.surfaces.push(Surface::new(vec![Face::triangle(0, 2, 3)]));
  primitive.flatten_surfaces();
  assert_eq!(primitive.surfaces.len(), 1);
  assert_eq!(primitive.triangle_count(), 2);
}

#[test]
fn test_face_normal_is_cached() {
  let vertices = quad_vertices();
  let mut face = Face::new([0u32, 1, 2, 3]);
  let normal = face.compute_normal(&vertices).expect("planar quad");
  assert!(normal.abs_diff_eq(DVec3::Z, 1e-12));
  assert_eq!(face.normal, Some(normal));
}

#[test]
fn test_face_normal_out_of_range() {
  let mut face = Face::triangle(0, 1, 42);
  assert!(face.compute_normal(&quad_vertices()).is_none());
}

// =========================================================================
// Scene
// =========================================================================

#[test]
fn test_extract_primitives_walks_tree() {
  let a = Primitive::from_triangles(quad_vertices(), &[[0, 1, 2]]);
  let b = a.clone().with_material(1);
  let root = Node::new("root")
    .with_mesh(Mesh::new(vec![a]))
    .with_child(Node::new("child").with_mesh(Mesh::new(vec![b])));
  let scene = Scene::new("s").with_root(root);

  let extracted = scene.extract_primitives();
  assert_eq!(extracted.len(), 2);
  assert_eq!(extracted[1].material, 1);

  let moved = scene.into_primitives();
  assert_eq!(moved, extracted);
}

#[test]
fn test_bounding_box_is_cached_and_invalidated() {
  let primitive = Primitive::from_triangles(quad_vertices(), &[[0, 1, 2]]);
  let mut scene = Scene::new("s").with_root(Node::new("root").with_mesh(Mesh::new(vec![primitive])));

  let bounds = scene.bounding_box().unwrap();
  assert_eq!(bounds.max, DVec3::splat(5.0));

  scene.for_each_primitive_mut(|p| p.vertices.truncate(4));
  let bounds = scene.bounding_box().unwrap();
  assert_eq!(bounds.max, DVec3::new(1.0, 1.0, 0.0));
}

#[test]
fn test_point_cloud_bounds_skip_non_finite() {
  let mut cloud = PointCloud::new(
    "pc",
    vec![
      Point::new(DVec3::ZERO),
      Point::new(DVec3::splat(2.0)),
      Point::new(DVec3::new(f64::NAN, 0.0, 0.0)),
    ],
  );
  assert_eq!(cloud.bounds.max, DVec3::splat(2.0));
  assert_eq!(cloud.drop_non_finite(), 1);
  assert_eq!(cloud.len(), 2);
}
