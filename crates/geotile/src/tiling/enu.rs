//! Geodetic helpers and per-tile placement frames.
//!
//! Every tile is placed by an East-North-Up frame anchored at the geodetic
//! position of its own bounding box center, followed by a -90° rotation
//! about X to match the consumer axis convention. Tiles are
//! not nested frames: each one is computed independently.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{DMat4, DVec3, DVec4};
use serde::Deserialize;

use crate::octree::BoundingBox;

/// WGS84 semi-major axis (metres).
pub const WGS84_A: f64 = 6378137.0;
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = 0.00669437999014;

/// Longitude/latitude in degrees, ellipsoidal height in metres.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geodetic {
  pub longitude: f64,
  pub latitude: f64,
  pub height: f64,
}

impl Geodetic {
  pub fn new(longitude: f64, latitude: f64, height: f64) -> Self {
    Self {
      longitude,
      latitude,
      height,
    }
  }
}

/// WGS84 geodetic to Earth-centered, Earth-fixed cartesian.
pub fn geodetic_to_ecef(geodetic: Geodetic) -> DVec3 {
  let lon = geodetic.longitude.to_radians();
  let lat = geodetic.latitude.to_radians();
  let (sin_lat, cos_lat) = lat.sin_cos();
  let (sin_lon, cos_lon) = lon.sin_cos();
  let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
  DVec3::new(
    (n + geodetic.height) * cos_lat * cos_lon,
    (n + geodetic.height) * cos_lat * sin_lon,
    (n * (1.0 - WGS84_E2) + geodetic.height) * sin_lat,
  )
}

/// ECEF to WGS84 geodetic (fixed-point iteration on latitude).
pub fn ecef_to_geodetic(ecef: DVec3) -> Geodetic {
  let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();
  let lon = ecef.y.atan2(ecef.x);
  let mut lat = ecef.z.atan2(p * (1.0 - WGS84_E2));
  let mut height = 0.0;
  for _ in 0..8 {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    height = p * cos_lat + ecef.z * sin_lat - WGS84_A * WGS84_A / n;
    lat = ecef.z.atan2(p * (1.0 - WGS84_E2 * n / (n + height)));
  }
  Geodetic::new(lon.to_degrees(), lat.to_degrees(), height)
}

/// East, north and up unit vectors at a geodetic position (ECEF axes).
pub fn enu_basis(geodetic: Geodetic) -> (DVec3, DVec3, DVec3) {
  let (sin_lat, cos_lat) = geodetic.latitude.to_radians().sin_cos();
  let (sin_lon, cos_lon) = geodetic.longitude.to_radians().sin_cos();
  let east = DVec3::new(-sin_lon, cos_lon, 0.0);
  let north = DVec3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
  let up = DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);
  (east, north, up)
}

/// Local ENU frame to ECEF.
pub fn enu_to_ecef(geodetic: Geodetic) -> DMat4 {
  let (east, north, up) = enu_basis(geodetic);
  let origin = geodetic_to_ecef(geodetic);
  DMat4::from_cols(
    east.extend(0.0),
    north.extend(0.0),
    up.extend(0.0),
    DVec4::new(origin.x, origin.y, origin.z, 1.0),
  )
}

/// Placement transform of a tile anchored at `geodetic`.
pub fn tile_transform(geodetic: Geodetic) -> DMat4 {
  enu_to_ecef(geodetic) * DMat4::from_rotation_x(-FRAC_PI_2)
}

/// Placement transform of a tile covering `bounds`.
pub fn placement(georeference: &dyn Georeference, bounds: &BoundingBox) -> DMat4 {
  tile_transform(georeference.to_geodetic(bounds.center()))
}

/// Converts dataset coordinates to geodetic positions.
///
/// Importers with a real CRS implement this; CRS lookup itself is not part
/// of the crate.
pub trait Georeference: Send + Sync {
  fn to_geodetic(&self, point: DVec3) -> Geodetic;
}

/// Coordinates already are longitude/latitude degrees plus height.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeographicFrame;

impl Georeference for GeographicFrame {
  #[inline]
  fn to_geodetic(&self, point: DVec3) -> Geodetic {
    Geodetic::new(point.x, point.y, point.z)
  }
}

/// Coordinates are metres east/north/up of a geodetic anchor.
#[derive(Clone, Copy, Debug)]
pub struct LocalFrame {
  frame: DMat4,
}

impl LocalFrame {
  pub fn new(anchor: Geodetic) -> Self {
    Self {
      frame: enu_to_ecef(anchor),
    }
  }
}

impl Georeference for LocalFrame {
  fn to_geodetic(&self, point: DVec3) -> Geodetic {
    ecef_to_geodetic(self.frame.transform_point3(point))
  }
}

/// Serializable choice of [`Georeference`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeoreferenceConfig {
  Geographic,
  Local {
    longitude: f64,
    latitude: f64,
    #[serde(default)]
    height: f64,
  },
}

impl Default for GeoreferenceConfig {
  fn default() -> Self {
    Self::Local {
      longitude: 0.0,
      latitude: 0.0,
      height: 0.0,
    }
  }
}

impl GeoreferenceConfig {
  pub fn build(&self) -> Arc<dyn Georeference> {
    match *self {
      Self::Geographic => Arc::new(GeographicFrame),
      Self::Local {
        longitude,
        latitude,
        height,
      } => Arc::new(LocalFrame::new(Geodetic::new(longitude, latitude, height))),
    }
  }
}
