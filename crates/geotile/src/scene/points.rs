//! Point cloud records.

use glam::DVec3;

use crate::octree::BoundingBox;

/// One point of a point cloud.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
  pub position: DVec3,
  pub normal: Option<DVec3>,
  pub color: Option<[u8; 4]>,
  pub batch_id: Option<f32>,
  pub classification: u8,
  pub intensity: u16,
}

impl Point {
  pub fn new(position: DVec3) -> Self {
    Self {
      position,
      ..Default::default()
    }
  }

  pub fn with_color(mut self, color: [u8; 4]) -> Self {
    self.color = Some(color);
    self
  }

  pub fn with_normal(mut self, normal: DVec3) -> Self {
    self.normal = Some(normal);
    self
  }

  pub fn with_batch_id(mut self, batch_id: f32) -> Self {
    self.batch_id = Some(batch_id);
    self
  }
}

/// Fully materialized point list plus its world bounds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
  pub name: String,
  pub points: Vec<Point>,
  pub bounds: BoundingBox,
}

impl PointCloud {
  /// Build a cloud, computing bounds from finite positions.
  pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
    let bounds = BoundingBox::from_points(
      points
        .iter()
        .map(|p| p.position)
        .filter(|p| p.is_finite()),
    );
    Self {
      name: name.into(),
      points,
      bounds,
    }
  }

  /// Override the bounds supplied by the importer.
  pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
    self.bounds = bounds;
    self
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  /// Remove points with NaN/Inf positions. Returns the number removed.
  pub fn drop_non_finite(&mut self) -> usize {
    let before = self.points.len();
    self.points.retain(|p| p.position.is_finite());
    let removed = before - self.points.len();
    if removed > 0 {
      tracing::warn!(cloud = %self.name, removed, "skipping points with non-finite positions");
    }
    removed
  }
}
