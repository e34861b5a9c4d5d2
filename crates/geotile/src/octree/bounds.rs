//! Axis-aligned bounding box with double precision for geospatial extents.

use glam::{DMat4, DVec3};

use super::SplitAxes;

/// Double-precision axis-aligned bounding box.
///
/// A box created with [`BoundingBox::empty`] has inverted extents and is
/// *uninitialized* until the first point is added. That state is distinct
/// from a degenerate box around a single point, which is valid with zero size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
  /// Minimum corner (inclusive).
  pub min: DVec3,
  /// Maximum corner (inclusive).
  pub max: DVec3,
}

impl BoundingBox {
  /// Create an uninitialized box (ready for `add_point`).
  pub fn empty() -> Self {
    Self {
      min: DVec3::splat(f64::INFINITY),
      max: DVec3::splat(f64::NEG_INFINITY),
    }
  }

  /// Create a new box from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on all axes.
  pub fn new(min: DVec3, max: DVec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "AABB min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// Create a box from center and half-extents.
  pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
    Self {
      min: center - half_extents,
      max: center + half_extents,
    }
  }

  /// Smallest box enclosing all points. Uninitialized when the iterator is empty.
  pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
    let mut bounds = Self::empty();
    for p in points {
      bounds.add_point(p);
    }
    bounds
  }

  /// True once at least one point has been added (min <= max on all axes).
  #[inline]
  pub fn is_valid(&self) -> bool {
    self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
  }

  /// Expand the box to include a point.
  #[inline]
  pub fn add_point(&mut self, point: DVec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  /// Smallest box containing both boxes. Uninitialized boxes are neutral.
  #[inline]
  pub fn union(&self, other: &BoundingBox) -> BoundingBox {
    BoundingBox {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  /// Check if this box contains a point.
  #[inline]
  pub fn contains_point(&self, point: DVec3) -> bool {
    point.x >= self.min.x
      && point.x <= self.max.x
      && point.y >= self.min.y
      && point.y <= self.max.y
      && point.z >= self.min.z
      && point.z <= self.max.z
  }

  /// Get the size of the box (max - min).
  #[inline]
  pub fn size(&self) -> DVec3 {
    self.max - self.min
  }

  /// Get the center of the box.
  #[inline]
  pub fn center(&self) -> DVec3 {
    (self.min + self.max) * 0.5
  }

  /// Length of the longest edge.
  #[inline]
  pub fn longest_axis(&self) -> f64 {
    self.size().max_element()
  }

  /// Length of the space diagonal. Zero for an uninitialized box.
  #[inline]
  pub fn longest_diagonal(&self) -> f64 {
    if !self.is_valid() {
      return 0.0;
    }
    self.size().length()
  }

  /// Expand the shorter axes around the center to match the longest one.
  ///
  /// Recursive 4-way/8-way splits of a cube produce well-shaped children
  /// even for flat or elongated inputs.
  pub fn to_cube(&self) -> BoundingBox {
    if !self.is_valid() {
      return *self;
    }
    let half = self.longest_axis() * 0.5;
    // Union absorbs rounding so the cube always contains the original box.
    Self::from_center_half_extents(self.center(), DVec3::splat(half)).union(self)
  }

  /// Bounds of one octant (or quadrant when `axes` is XY only).
  ///
  /// Octant bits match [`super::classify`]: bit 0 = +X, bit 1 = +Y, bit 2 = +Z.
  /// In XY mode the Z range is inherited unchanged.
  pub fn child_bounds(&self, octant: u8, axes: SplitAxes) -> BoundingBox {
    let mid = self.center();
    let mut min = self.min;
    let mut max = self.max;

    if octant & 1 != 0 {
      min.x = mid.x;
    } else {
      max.x = mid.x;
    }
    if octant & 2 != 0 {
      min.y = mid.y;
    } else {
      max.y = mid.y;
    }
    if axes == SplitAxes::Xyz {
      if octant & 4 != 0 {
        min.z = mid.z;
      } else {
        max.z = mid.z;
      }
    }

    BoundingBox { min, max }
  }

  /// Axis-aligned box around the 8 transformed corners.
  pub fn transformed(&self, transform: &DMat4) -> BoundingBox {
    if !self.is_valid() {
      return *self;
    }
    let mut out = BoundingBox::empty();
    for corner in 0..8u8 {
      let p = DVec3::new(
        if corner & 1 != 0 { self.max.x } else { self.min.x },
        if corner & 2 != 0 { self.max.y } else { self.min.y },
        if corner & 4 != 0 { self.max.z } else { self.min.z },
      );
      out.add_point(transform.transform_point3(p));
    }
    out
  }
}

impl Default for BoundingBox {
  fn default() -> Self {
    Self::empty()
  }
}
