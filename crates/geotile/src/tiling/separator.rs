//! Primitive separator: splits one oversized primitive into pieces small
//! enough for the encoder's vertex limit.
//!
//! Triangles are routed by centroid through octree splits of the
//! primitive's own bounds. When a split makes no spatial progress (every
//! centroid lands in the same octant) the triangle list is halved instead,
//! so recursion always terminates.

use crate::octree::{partition, BoundingBox, SplitAxes};
use crate::scene::Primitive;

/// Split `primitive` until every piece has at most `max_vertices` vertices.
///
/// Pieces are re-indexed from 0 and keep the material. `max_vertices` below
/// 3 is treated as 3.
pub fn separate_primitive(primitive: Primitive, max_vertices: usize) -> Vec<Primitive> {
  let max_vertices = max_vertices.max(3);
  if primitive.vertices.len() <= max_vertices {
    return vec![primitive];
  }

  let mut pieces = Vec::new();
  let mut stack = vec![primitive];
  let mut halvings = 0usize;

  while let Some(piece) = stack.pop() {
    let triangle_count = piece.triangle_count();
    if piece.vertices.len() <= max_vertices || triangle_count <= 1 {
      pieces.push(piece);
      continue;
    }

    let mut bounds = BoundingBox::empty();
    for tri in piece.triangles() {
      for i in tri {
        bounds.add_point(piece.vertices[i as usize].position);
      }
    }
    let mid = bounds.to_cube().center();
    let routed = partition(piece.triangles(), mid, SplitAxes::Xyz, |&[a, b, c]| {
      (piece.vertices[a as usize].position
        + piece.vertices[b as usize].position
        + piece.vertices[c as usize].position)
        / 3.0
    });

    let occupied = routed.iter().filter(|b| !b.is_empty()).count();
    if occupied > 1 {
      for triangles in routed.into_iter().rev().filter(|b| !b.is_empty()) {
        stack.push(piece.subset(triangles));
      }
    } else {
      halvings += 1;
      let triangles: Vec<[u32; 3]> = piece.triangles().collect();
      let (low, high) = triangles.split_at(triangle_count / 2);
      stack.push(piece.subset(high.iter().copied()));
      stack.push(piece.subset(low.iter().copied()));
    }
  }

  tracing::debug!(
    pieces = pieces.len(),
    halvings,
    max_vertices,
    "separated oversized primitive"
  );
  pieces
}
