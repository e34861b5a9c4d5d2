//! Single-job processing: prepare, decompose, encode.
//!
//! Everything here runs on one worker thread and owns its input end to end.

use web_time::Instant;

use super::types::{ContentSink, InputSource, TilingInput, TilingOutput, TilingStats};
use crate::config::TilingConfig;
use crate::encode::{encode_tree, EncodedTile};
use crate::error::Result;
use crate::scene::{triangulate, validate_primitive, Scene};
use crate::tiling::{tile_mesh, tile_points, Georeference};
use crate::weld::weld_scene;

/// Bring a scene into tiling shape.
///
/// Transforms are baked into vertices, polygons triangulated, malformed
/// faces dropped, and coincident vertices welded when enabled.
pub fn prepare_scene(scene: &mut Scene, config: &TilingConfig, stats: &mut TilingStats) {
  scene.flatten_transforms();

  let mut index = 0usize;
  scene.for_each_primitive_mut(|primitive| {
    stats.faces_dropped += triangulate(primitive);
    let report = validate_primitive(primitive, &format!("primitive #{index}"));
    stats.validation.merge(report);
    index += 1;
  });

  if stats.faces_dropped > 0 {
    tracing::warn!(
      scene = scene.name(),
      faces = stats.faces_dropped,
      "dropped faces with fewer than 3 indices"
    );
  }

  if config.weld.enabled {
    stats.weld = weld_scene(scene, &config.weld.options);
  }
}

/// Load, tile and encode one input.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "pipeline::run_job"))]
pub fn run_job(
  source: Box<dyn InputSource>,
  config: &TilingConfig,
  georeference: &dyn Georeference,
) -> Result<TilingOutput> {
  let total_start = Instant::now();
  let mut stats = TilingStats::default();
  config.validate()?;

  let input = source.load()?;
  let name = input.name().to_string();

  // Stage 1: input preparation
  let prepare_start = Instant::now();
  let input = {
    #[cfg(feature = "profiling")]
    let _span = tracing::info_span!("prepare_stage").entered();
    match input {
      TilingInput::Mesh(mut scene) => {
        prepare_scene(&mut scene, config, &mut stats);
        TilingInput::Mesh(scene)
      }
      points @ TilingInput::Points(_) => points,
    }
  };
  stats.prepare_us = prepare_start.elapsed().as_micros() as u64;

  // Stage 2: decomposition
  let tile_start = Instant::now();
  let mut tree = {
    #[cfg(feature = "profiling")]
    let _span = tracing::info_span!("tile_stage").entered();
    match input {
      TilingInput::Mesh(scene) => tile_mesh(scene.into_primitives(), config, georeference)?,
      TilingInput::Points(cloud) => tile_points(cloud, config, georeference)?,
    }
  };
  stats.tile_us = tile_start.elapsed().as_micros() as u64;

  // Stage 3: encoding
  let encode_start = Instant::now();
  let tiles = {
    #[cfg(feature = "profiling")]
    let _span = tracing::info_span!("encode_stage").entered();
    encode_tree(&mut tree, &config.encoder)?
  };
  stats.encode_us = encode_start.elapsed().as_micros() as u64;

  stats.tiles = tree.len();
  stats.content_tiles = tiles.len();
  stats.max_depth = tree.max_depth();
  stats.total_us = total_start.elapsed().as_micros() as u64;

  tracing::info!(
    job = %name,
    tiles = stats.tiles,
    content = stats.content_tiles,
    depth = stats.max_depth,
    total_us = stats.total_us,
    "tiling job complete"
  );

  Ok(TilingOutput {
    name,
    tree,
    tiles,
    stats,
  })
}

/// Hand every tile of a job to `sink`, stopping at the first failure.
pub fn write_tiles(job: &str, tiles: &[EncodedTile], sink: &dyn ContentSink) -> Result<()> {
  for tile in tiles {
    sink.write(job, tile)?;
  }
  Ok(())
}
