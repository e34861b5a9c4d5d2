//! Pipeline inputs, outputs and collaborator traits.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::TilingConfig;
use crate::encode::EncodedTile;
use crate::error::{Result, TilingError};
use crate::scene::{PointCloud, Scene, ValidationReport};
use crate::tiling::{Georeference, TileTree};
use crate::weld::WeldStats;

/// A fully materialized dataset.
#[derive(Clone, Debug, PartialEq)]
pub enum TilingInput {
  Mesh(Scene),
  Points(PointCloud),
}

impl TilingInput {
  pub fn name(&self) -> &str {
    match self {
      TilingInput::Mesh(scene) => scene.name(),
      TilingInput::Points(cloud) => &cloud.name,
    }
  }
}

/// Produces one dataset. Importers implement this.
///
/// `load` runs on the worker thread that tiles the result.
pub trait InputSource: Send {
  /// Identity used for logs and output paths.
  fn name(&self) -> &str;

  fn load(self: Box<Self>) -> Result<TilingInput>;
}

impl InputSource for TilingInput {
  fn name(&self) -> &str {
    TilingInput::name(self)
  }

  fn load(self: Box<Self>) -> Result<TilingInput> {
    Ok(*self)
  }
}

impl InputSource for Scene {
  fn name(&self) -> &str {
    Scene::name(self)
  }

  fn load(self: Box<Self>) -> Result<TilingInput> {
    Ok(TilingInput::Mesh(*self))
  }
}

impl InputSource for PointCloud {
  fn name(&self) -> &str {
    &self.name
  }

  fn load(self: Box<Self>) -> Result<TilingInput> {
    Ok(TilingInput::Points(*self))
  }
}

/// One unit of work for a stage: a source plus the settings to tile it with.
pub struct TilingJob {
  pub source: Box<dyn InputSource>,
  pub config: Arc<TilingConfig>,
  pub georeference: Arc<dyn Georeference>,
}

impl TilingJob {
  /// Job using the georeference described by `config`.
  pub fn new(source: impl InputSource + 'static, config: Arc<TilingConfig>) -> Self {
    let georeference = config.georeference.build();
    Self {
      source: Box::new(source),
      config,
      georeference,
    }
  }

  pub fn with_georeference(mut self, georeference: Arc<dyn Georeference>) -> Self {
    self.georeference = georeference;
    self
  }
}

/// Per-job counters and timings (microseconds).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TilingStats {
  pub validation: ValidationReport,
  /// Faces dropped by triangulation (fewer than 3 indices).
  pub faces_dropped: usize,
  pub weld: WeldStats,
  pub tiles: usize,
  pub content_tiles: usize,
  pub max_depth: usize,
  pub prepare_us: u64,
  pub tile_us: u64,
  pub encode_us: u64,
  pub total_us: u64,
}

/// Result of one job: the tile tree and encoded content buffers.
#[derive(Debug, Clone)]
pub struct TilingOutput {
  pub name: String,
  pub tree: TileTree,
  pub tiles: Vec<EncodedTile>,
  pub stats: TilingStats,
}

/// Receives encoded tiles as jobs complete.
///
/// Called from worker threads; each job writes distinct URIs.
pub trait ContentSink: Send + Sync {
  fn write(&self, job: &str, tile: &EncodedTile) -> Result<()>;
}

/// Writes each tile to `<root>/<job>/<uri>`, refusing to overwrite.
#[derive(Debug, Clone)]
pub struct DirectorySink {
  root: PathBuf,
}

impl DirectorySink {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn tile_path(&self, job: &str, uri: &str) -> PathBuf {
    self.root.join(job).join(uri)
  }
}

impl ContentSink for DirectorySink {
  fn write(&self, job: &str, tile: &EncodedTile) -> Result<()> {
    let path = self.tile_path(job, &tile.uri);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|e| TilingError::io(parent, e))?;
    }
    let mut file = OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(&path)
      .map_err(|e| TilingError::io(&path, e))?;
    file.write_all(&tile.buffer).map_err(|e| TilingError::io(&path, e))?;
    Ok(())
  }
}
