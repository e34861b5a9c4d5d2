//! Tiling configuration.
//!
//! Every section has defaults, so an empty TOML document (or
//! `TilingConfig::default()`) is a valid configuration:
//!
//! ```toml
//! [weld]
//! enabled = true
//! error = 1e-6
//!
//! [mesh]
//! max_triangles_per_tile = 524288
//! split_axes = "xyz"
//!
//! [points]
//! max_points_per_node = 20000
//!
//! [lod]
//! min_level = 0
//! max_level = 2
//! levels = [
//!   { geometric_error = 200.0, texture_scale = 0.25 },
//!   { geometric_error = 50.0, texture_scale = 0.5 },
//!   { geometric_error = 10.0, texture_scale = 1.0 },
//! ]
//!
//! [georeference]
//! kind = "local"
//! longitude = 6.95
//! latitude = 50.94
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, TilingError};
use crate::octree::SplitAxes;
use crate::tiling::GeoreferenceConfig;
use crate::weld::WeldOptions;

/// Default triangle ceiling for one mesh tile.
pub const DEFAULT_MAX_TRIANGLES: usize = 8 * 65536;

/// Root configuration for a tiling run.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TilingConfig {
  pub weld: WeldConfig,
  pub mesh: MeshTilingConfig,
  pub points: PointTilingConfig,
  pub lod: LodConfig,
  pub encoder: EncoderConfig,
  pub georeference: GeoreferenceConfig,
}

/// Vertex welding pass.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeldConfig {
  pub enabled: bool,
  #[serde(flatten)]
  pub options: WeldOptions,
}

impl Default for WeldConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      options: WeldOptions::default(),
    }
  }
}

/// Mesh decomposition limits.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshTilingConfig {
  /// Triangle ceiling above which a tile is split spatially.
  pub max_triangles_per_tile: usize,
  /// Octree (XYZ) or quadtree (XY, surface-only data).
  pub split_axes: SplitAxes,
  /// Depth escape hatch for degenerate data.
  pub max_depth: u32,
  /// Size escape hatch: volumes with a shorter longest axis are not split.
  pub min_node_size: f64,
  /// Extension of content URIs.
  pub extension: String,
}

impl Default for MeshTilingConfig {
  fn default() -> Self {
    Self {
      max_triangles_per_tile: DEFAULT_MAX_TRIANGLES,
      split_axes: SplitAxes::Xyz,
      max_depth: 24,
      min_node_size: 1.0,
      extension: "b3dm".to_string(),
    }
  }
}

/// Point cloud decomposition limits.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PointTilingConfig {
  pub max_points_per_node: usize,
  /// Points routed per batch when splitting, capping in-flight copies.
  pub divide_chunk_size: usize,
  pub split_axes: SplitAxes,
  pub max_depth: u32,
  pub min_node_size: f64,
  pub extension: String,
}

impl Default for PointTilingConfig {
  fn default() -> Self {
    Self {
      max_points_per_node: 20_000,
      divide_chunk_size: 1_000_000,
      split_axes: SplitAxes::Xyz,
      max_depth: 24,
      min_node_size: 1.0,
      extension: "pnts".to_string(),
    }
  }
}

/// One row of the LOD table.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct LodLevel {
  /// Items with a diagonal at least this large resolve at this level.
  pub geometric_error: f64,
  /// Texture downscale hint for writers (1.0 = full resolution).
  pub texture_scale: f64,
}

/// Fixed, ordered LOD table (coarse to fine).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
  pub min_level: u32,
  pub max_level: u32,
  pub levels: Vec<LodLevel>,
}

impl LodConfig {
  /// Table with thresholds halving from `coarsest` over `count` levels.
  pub fn halving(coarsest: f64, count: u32) -> Self {
    let levels = (0..count)
      .map(|i| LodLevel {
        geometric_error: coarsest / 2f64.powi(i as i32),
        texture_scale: 0.5f64.powi((count - 1 - i) as i32).max(1.0 / 64.0),
      })
      .collect();
    Self {
      min_level: 0,
      max_level: count.saturating_sub(1),
      levels,
    }
  }

  /// Clamp a raw level into `[min_level, max_level]`.
  #[inline]
  pub fn clamp(&self, level: u32) -> u32 {
    level.clamp(self.min_level, self.max_level)
  }

  /// Threshold for a level (clamped).
  #[inline]
  pub fn error_at(&self, level: u32) -> f64 {
    self.levels[self.clamp(level) as usize].geometric_error
  }

  /// Texture hint for a level (clamped).
  #[inline]
  pub fn texture_scale_at(&self, level: u32) -> f64 {
    self.levels[self.clamp(level) as usize].texture_scale
  }

  /// Threshold of the next finer level, `None` at the maximum level.
  #[inline]
  pub fn next_error(&self, level: u32) -> Option<f64> {
    let level = self.clamp(level);
    (level < self.max_level).then(|| self.levels[level as usize + 1].geometric_error)
  }

  #[inline]
  pub fn is_max(&self, level: u32) -> bool {
    self.clamp(level) >= self.max_level
  }
}

impl Default for LodConfig {
  fn default() -> Self {
    Self::halving(1024.0, 11)
  }
}

/// Binary encoder limits.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EncoderConfig {
  /// Primitives with more vertices are separated spatially before encoding.
  pub max_primitive_vertices: usize,
}

impl Default for EncoderConfig {
  fn default() -> Self {
    Self {
      max_primitive_vertices: u32::MAX as usize,
    }
  }
}

impl TilingConfig {
  pub fn new() -> Self {
    Self::default()
  }

  /// Load and validate a TOML configuration file.
  pub fn load(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path).map_err(|e| TilingError::io(path, e))?;
    let config: TilingConfig = toml::from_str(&content).map_err(|source| TilingError::ConfigParse {
      path: path.to_path_buf(),
      source,
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Parse and validate a TOML document.
  pub fn from_toml_str(content: &str) -> Result<Self> {
    let config: TilingConfig = toml::from_str(content).map_err(|source| TilingError::ConfigParse {
      path: "<inline>".into(),
      source,
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Reject configurations the engine cannot honor.
  pub fn validate(&self) -> Result<()> {
    let lod = &self.lod;
    if lod.levels.is_empty() {
      return Err(TilingError::Config("lod.levels must not be empty".into()));
    }
    if lod.min_level > lod.max_level || lod.max_level as usize >= lod.levels.len() {
      return Err(TilingError::Config(format!(
        "lod level range {}..={} does not fit a table of {} levels",
        lod.min_level,
        lod.max_level,
        lod.levels.len()
      )));
    }
    if lod.levels.iter().any(|l| !(l.geometric_error > 0.0)) {
      return Err(TilingError::Config("lod geometric errors must be positive".into()));
    }
    if lod
      .levels
      .windows(2)
      .any(|w| w[1].geometric_error >= w[0].geometric_error)
    {
      return Err(TilingError::Config(
        "lod geometric errors must strictly decrease from coarse to fine".into(),
      ));
    }
    if self.mesh.max_triangles_per_tile == 0 {
      return Err(TilingError::Config("mesh.max_triangles_per_tile must be > 0".into()));
    }
    if self.points.max_points_per_node == 0 || self.points.divide_chunk_size == 0 {
      return Err(TilingError::Config(
        "points.max_points_per_node and points.divide_chunk_size must be > 0".into(),
      ));
    }
    let weld = &self.weld.options;
    if !(weld.error >= 0.0 && weld.error.is_finite()) || weld.bucket_size == 0 {
      return Err(TilingError::Config(format!(
        "weld error must be finite and >= 0 and bucket_size > 0 (got {}, {})",
        weld.error, weld.bucket_size
      )));
    }
    if self.encoder.max_primitive_vertices < 3 {
      return Err(TilingError::Config("encoder.max_primitive_vertices must be >= 3".into()));
    }
    Ok(())
  }

  pub fn with_max_triangles(mut self, max: usize) -> Self {
    self.mesh.max_triangles_per_tile = max;
    self
  }

  pub fn with_max_points(mut self, max: usize) -> Self {
    self.points.max_points_per_node = max;
    self
  }

  pub fn with_split_axes(mut self, axes: SplitAxes) -> Self {
    self.mesh.split_axes = axes;
    self.points.split_axes = axes;
    self
  }

  pub fn with_lod(mut self, lod: LodConfig) -> Self {
    self.lod = lod;
    self
  }

  pub fn with_weld(mut self, enabled: bool) -> Self {
    self.weld.enabled = enabled;
    self
  }

  pub fn with_weld_options(mut self, options: WeldOptions) -> Self {
    self.weld.options = options;
    self
  }

  pub fn with_georeference(mut self, georeference: GeoreferenceConfig) -> Self {
    self.georeference = georeference;
    self
  }

  pub fn with_max_primitive_vertices(mut self, max: usize) -> Self {
    self.encoder.max_primitive_vertices = max;
    self
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
