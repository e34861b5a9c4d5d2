//! Polygon triangulation.
//!
//! Convex polygons are fanned from their first vertex; concave polygons are
//! ear-clipped in the plane of their dominant Newell-normal axis. Winding is
//! preserved in both cases.

use glam::DVec2;
use smallvec::SmallVec;

use super::{newell_normal, Face, Primitive, Vertex};

/// Replace every face of `primitive` with triangles.
///
/// Faces with fewer than 3 indices are dropped. Returns the number of
/// dropped faces.
pub fn triangulate(primitive: &mut Primitive) -> usize {
  let mut dropped = 0;

  for surface in &mut primitive.surfaces {
    let mut faces = Vec::with_capacity(surface.faces.len());
    for face in surface.faces.drain(..) {
      match face.indices.len() {
        0..=2 => dropped += 1,
        3 => faces.push(face),
        _ => {
          for [a, b, c] in triangulate_polygon(&primitive.vertices, &face.indices) {
            faces.push(Face::triangle(a, b, c));
          }
        }
      }
    }
    surface.faces = faces;
  }

  dropped
}

/// Triangulate one polygon given as indices into `vertices`.
pub fn triangulate_polygon(vertices: &[Vertex], polygon: &[u32]) -> Vec<[u32; 3]> {
  let Some(projected) = project_polygon(vertices, polygon) else {
    return fan(polygon);
  };

  let orientation = signed_area(&projected).signum();
  if orientation == 0.0 || is_convex(&projected, orientation) {
    return fan(polygon);
  }

  ear_clip(&projected, polygon, orientation)
}

fn fan(polygon: &[u32]) -> Vec<[u32; 3]> {
  (1..polygon.len().saturating_sub(1))
    .map(|i| [polygon[0], polygon[i], polygon[i + 1]])
    .collect()
}

/// Drop the dominant axis of the polygon normal, yielding 2D coordinates.
fn project_polygon(vertices: &[Vertex], polygon: &[u32]) -> Option<Vec<DVec2>> {
  let normal = newell_normal(vertices, polygon)?.abs();
  let points = polygon.iter().map(|&i| vertices[i as usize].position);

  let projected = if normal.z >= normal.x && normal.z >= normal.y {
    points.map(|p| DVec2::new(p.x, p.y)).collect()
  } else if normal.x >= normal.y {
    points.map(|p| DVec2::new(p.y, p.z)).collect()
  } else {
    points.map(|p| DVec2::new(p.z, p.x)).collect()
  };
  Some(projected)
}

fn signed_area(points: &[DVec2]) -> f64 {
  let mut area = 0.0;
  for i in 0..points.len() {
    let a = points[i];
    let b = points[(i + 1) % points.len()];
    area += a.perp_dot(b);
  }
  area * 0.5
}

#[inline]
fn turn(a: DVec2, b: DVec2, c: DVec2) -> f64 {
  (b - a).perp_dot(c - b)
}

fn is_convex(points: &[DVec2], orientation: f64) -> bool {
  let n = points.len();
  (0..n).all(|i| {
    let t = turn(points[(i + n - 1) % n], points[i], points[(i + 1) % n]);
    t * orientation >= 0.0
  })
}

fn point_in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2, orientation: f64) -> bool {
  let d1 = (b - a).perp_dot(p - a) * orientation;
  let d2 = (c - b).perp_dot(p - b) * orientation;
  let d3 = (a - c).perp_dot(p - c) * orientation;
  d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
}

fn ear_clip(points: &[DVec2], polygon: &[u32], orientation: f64) -> Vec<[u32; 3]> {
  let mut remaining: SmallVec<[usize; 16]> = (0..points.len()).collect();
  let mut triangles = Vec::with_capacity(points.len() - 2);

  while remaining.len() > 3 {
    let n = remaining.len();
    let ear = (0..n).find(|&i| {
      let prev = remaining[(i + n - 1) % n];
      let curr = remaining[i];
      let next = remaining[(i + 1) % n];
      let (a, b, c) = (points[prev], points[curr], points[next]);
      if turn(a, b, c) * orientation <= 0.0 {
        return false;
      }
      remaining
        .iter()
        .filter(|&&k| k != prev && k != curr && k != next)
        .all(|&k| !point_in_triangle(points[k], a, b, c, orientation))
    });

    // Self-intersecting or collinear leftovers: fan what is left.
    let Some(i) = ear else {
      let rest: Vec<u32> = remaining.iter().map(|&k| polygon[k]).collect();
      triangles.extend(fan(&rest));
      return triangles;
    };

    let prev = remaining[(i + n - 1) % n];
    let next = remaining[(i + 1) % n];
    triangles.push([polygon[prev], polygon[remaining[i]], polygon[next]]);
    remaining.remove(i);
  }

  triangles.push([
    polygon[remaining[0]],
    polygon[remaining[1]],
    polygon[remaining[2]],
  ]);
  triangles
}

#[cfg(test)]
#[path = "triangulate_test.rs"]
mod triangulate_test;
