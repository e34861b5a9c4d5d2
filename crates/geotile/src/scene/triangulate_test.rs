use glam::DVec3;

use super::*;
use crate::scene::Surface;

fn polygon_primitive(points: &[[f64; 3]]) -> Primitive {
  let vertices = points
    .iter()
    .map(|&p| Vertex::new(DVec3::from_array(p)))
    .collect();
  Primitive {
    vertices,
    surfaces: vec![Surface::new(vec![Face::new(0..points.len() as u32)])],
    ..Default::default()
  }
}

fn triangle_area(primitive: &Primitive, [a, b, c]: [u32; 3]) -> f64 {
  let p = |i: u32| primitive.vertices[i as usize].position;
  (p(b) - p(a)).cross(p(c) - p(a)).length() * 0.5
}

fn total_area(primitive: &Primitive) -> f64 {
  primitive.triangles().map(|t| triangle_area(primitive, t)).sum()
}

#[test]
fn test_triangles_are_kept() {
  let mut primitive = polygon_primitive(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
  let dropped = triangulate(&mut primitive);
  assert_eq!(dropped, 0);
  assert_eq!(primitive.triangles().collect::<Vec<_>>(), vec![[0, 1, 2]]);
}

#[test]
fn test_convex_quad_fans() {
  let mut primitive = polygon_primitive(&[
    [0.0, 0.0, 0.0],
    [2.0, 0.0, 0.0],
    [2.0, 2.0, 0.0],
    [0.0, 2.0, 0.0],
  ]);
  triangulate(&mut primitive);
  let triangles: Vec<_> = primitive.triangles().collect();
  assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3]]);
  assert!((total_area(&primitive) - 4.0).abs() < 1e-12);
}

/// L-shaped hexagon: a fan from vertex 0 would spill outside the polygon.
#[test]
fn test_concave_polygon_is_ear_clipped() {
  let mut primitive = polygon_primitive(&[
    [0.0, 0.0, 0.0],
    [2.0, 0.0, 0.0],
    [2.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [1.0, 2.0, 0.0],
    [0.0, 2.0, 0.0],
  ]);
  triangulate(&mut primitive);

  assert_eq!(primitive.triangle_count(), 4);
  assert!((total_area(&primitive) - 3.0).abs() < 1e-12);
  for tri in primitive.triangles() {
    assert!(triangle_area(&primitive, tri) > 0.0);
  }
}

/// Polygon standing in the XZ plane projects onto its dominant axis.
#[test]
fn test_vertical_polygon() {
  let mut primitive = polygon_primitive(&[
    [0.0, 0.0, 0.0],
    [2.0, 0.0, 0.0],
    [2.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 0.0, 2.0],
    [0.0, 0.0, 2.0],
  ]);
  triangulate(&mut primitive);
  assert_eq!(primitive.triangle_count(), 4);
  assert!((total_area(&primitive) - 3.0).abs() < 1e-12);
}

#[test]
fn test_degenerate_faces_are_dropped() {
  let mut primitive = polygon_primitive(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
  primitive.surfaces[0].faces.push(Face::new([0u32]));
  let dropped = triangulate(&mut primitive);
  assert_eq!(dropped, 2);
  assert!(primitive.is_empty());
}
