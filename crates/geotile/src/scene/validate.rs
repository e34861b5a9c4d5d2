//! Input invariant checks.
//!
//! Malformed faces are skipped rather than failing the run, so one broken
//! polygon cannot abort a whole tiling job.

use super::Primitive;

/// Counts of problems found (and repaired) in one primitive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
  /// Faces referencing an index outside the vertex list.
  pub faces_out_of_range: usize,
  /// Faces touching a NaN/Inf position.
  pub faces_non_finite: usize,
  /// Vertices with a NaN/Inf position.
  pub non_finite_vertices: usize,
}

impl ValidationReport {
  #[inline]
  pub fn is_clean(&self) -> bool {
    *self == Self::default()
  }

  #[inline]
  pub fn faces_skipped(&self) -> usize {
    self.faces_out_of_range + self.faces_non_finite
  }

  pub fn merge(&mut self, other: ValidationReport) {
    self.faces_out_of_range += other.faces_out_of_range;
    self.faces_non_finite += other.faces_non_finite;
    self.non_finite_vertices += other.non_finite_vertices;
  }
}

/// Drop faces that violate index or position invariants.
///
/// `label` identifies the primitive in log output.
pub fn validate_primitive(primitive: &mut Primitive, label: &str) -> ValidationReport {
  let mut report = ValidationReport::default();
  let vertex_count = primitive.vertices.len();

  let finite: Vec<bool> = primitive
    .vertices
    .iter()
    .map(|v| v.position.is_finite())
    .collect();
  report.non_finite_vertices = finite.iter().filter(|ok| !**ok).count();

  for (surface_idx, surface) in primitive.surfaces.iter_mut().enumerate() {
    let mut face_idx = 0usize;
    surface.faces.retain(|face| {
      let current = face_idx;
      face_idx += 1;

      if let Some(&bad) = face.indices.iter().find(|&&i| i as usize >= vertex_count) {
        tracing::warn!(
          primitive = label,
          surface = surface_idx,
          face = current,
          index = bad,
          vertex_count,
          "skipping face with out-of-range index"
        );
        report.faces_out_of_range += 1;
        return false;
      }

      if face.indices.iter().any(|&i| !finite[i as usize]) {
        tracing::warn!(
          primitive = label,
          surface = surface_idx,
          face = current,
          "skipping face with non-finite position"
        );
        report.faces_non_finite += 1;
        return false;
      }

      true
    });
  }

  if report.non_finite_vertices > 0 {
    tracing::warn!(
      primitive = label,
      count = report.non_finite_vertices,
      "primitive holds non-finite vertex positions"
    );
  }

  report
}

#[cfg(test)]
mod tests {
  use glam::DVec3;

  use super::*;
  use crate::scene::{Face, Vertex};

  fn quad_primitive() -> Primitive {
    let vertices = vec![
      Vertex::new(DVec3::new(0.0, 0.0, 0.0)),
      Vertex::new(DVec3::new(1.0, 0.0, 0.0)),
      Vertex::new(DVec3::new(1.0, 1.0, 0.0)),
      Vertex::new(DVec3::new(0.0, 1.0, 0.0)),
    ];
    Primitive::from_triangles(vertices, &[[0, 1, 2], [0, 2, 3]])
  }

  #[test]
  fn test_clean_primitive_untouched() {
    let mut primitive = quad_primitive();
    let report = validate_primitive(&mut primitive, "quad");
    assert!(report.is_clean());
    assert_eq!(primitive.triangle_count(), 2);
  }

  #[test]
  fn test_out_of_range_face_skipped() {
    let mut primitive = quad_primitive();
    primitive.surfaces[0].faces.push(Face::triangle(0, 1, 99));
    let report = validate_primitive(&mut primitive, "quad");
    assert_eq!(report.faces_out_of_range, 1);
    assert_eq!(primitive.triangle_count(), 2);
  }

  #[test]
  fn test_non_finite_face_skipped() {
    let mut primitive = quad_primitive();
    primitive.vertices[3].position.x = f64::NAN;
    let report = validate_primitive(&mut primitive, "quad");
    assert_eq!(report.non_finite_vertices, 1);
    assert_eq!(report.faces_non_finite, 1);
    assert_eq!(report.faces_skipped(), 1);
    assert_eq!(primitive.triangles().collect::<Vec<_>>(), vec![[0, 1, 2]]);
  }
}
