//! Tiling run statistics.
//!
//! Feature-gated and runtime-toggled so recording is free when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use geotile::metrics::{TilingMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! // After each job:
//! metrics.record_output(&output);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;

use crate::pipeline::TilingOutput;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// LOD buckets tracked per level; deeper levels share the last bucket.
pub const LOD_BUCKETS: usize = 16;

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Fixed-capacity window of recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  /// Push a new value, evicting the oldest if at capacity.
  pub fn push(&mut self, value: T) {
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
  }

  /// Oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.buffer.iter()
  }

  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  pub fn sum(&self) -> u64 {
    self.buffer.iter().sum()
  }

  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }

  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = *self.buffer.iter().min()?;
    let max = *self.buffer.iter().max()?;
    Some((min, max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(128)
  }
}

/// Aggregated statistics over completed tiling jobs.
#[derive(Debug, Clone)]
pub struct TilingMetrics {
  // Output shape
  /// Content tiles per LOD level (index = level).
  pub contents_per_lod: [u32; LOD_BUCKETS],
  /// Triangles (meshes) or points per LOD level.
  pub items_per_lod: [u64; LOD_BUCKETS],
  /// Encoded bytes across all tiles.
  pub encoded_bytes: u64,
  /// Deepest tile seen.
  pub max_tree_depth: usize,

  // Jobs
  pub jobs_completed: u64,
  pub jobs_failed: u64,
  /// Vertices removed by welding.
  pub vertices_welded: u64,

  // Timing
  /// Rolling window of whole-job times in microseconds.
  pub job_timings: RollingWindow<u64>,
  /// Rolling window of decomposition times in microseconds.
  pub tile_timings: RollingWindow<u64>,
  /// Rolling window of encoding times in microseconds.
  pub encode_timings: RollingWindow<u64>,
}

impl Default for TilingMetrics {
  fn default() -> Self {
    Self {
      contents_per_lod: [0; LOD_BUCKETS],
      items_per_lod: [0; LOD_BUCKETS],
      encoded_bytes: 0,
      max_tree_depth: 0,
      jobs_completed: 0,
      jobs_failed: 0,
      vertices_welded: 0,
      job_timings: RollingWindow::default(),
      tile_timings: RollingWindow::default(),
      encode_timings: RollingWindow::default(),
    }
  }
}

impl TilingMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reset everything except the cumulative job counters.
  pub fn reset(&mut self) {
    self.contents_per_lod.fill(0);
    self.items_per_lod.fill(0);
    self.encoded_bytes = 0;
    self.max_tree_depth = 0;
    self.vertices_welded = 0;
    self.job_timings.clear();
    self.tile_timings.clear();
    self.encode_timings.clear();
  }

  /// Record one content tile.
  pub fn record_content(&mut self, lod_level: u32, items: usize, bytes: usize) {
    if !is_enabled() {
      return;
    }
    let idx = (lod_level as usize).min(LOD_BUCKETS - 1);
    self.contents_per_lod[idx] += 1;
    self.items_per_lod[idx] += items as u64;
    self.encoded_bytes += bytes as u64;
  }

  /// Record a finished job and all of its tiles.
  pub fn record_output(&mut self, output: &TilingOutput) {
    if !is_enabled() {
      return;
    }
    self.jobs_completed += 1;
    self.vertices_welded += output.stats.weld.vertices_removed() as u64;
    self.max_tree_depth = self.max_tree_depth.max(output.tree.max_depth());
    self.job_timings.push(output.stats.total_us);
    self.tile_timings.push(output.stats.tile_us);
    self.encode_timings.push(output.stats.encode_us);

    for tile in &output.tiles {
      let node = output.tree.get(tile.tile);
      let items = node.content.as_ref().map_or(0, |c| c.payload.item_count());
      self.record_content(node.lod_level, items, tile.buffer.len());
    }
  }

  pub fn record_failure(&mut self) {
    if is_enabled() {
      self.jobs_failed += 1;
    }
  }

  pub fn total_contents(&self) -> u32 {
    self.contents_per_lod.iter().sum()
  }

  pub fn total_items(&self) -> u64 {
    self.items_per_lod.iter().sum()
  }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
  use super::*;

  #[test]
  fn test_rolling_window() {
    let mut window = RollingWindow::new(3);
    assert!(window.is_empty());

    window.push(10u64);
    window.push(20);
    window.push(30);
    assert_eq!(window.sum(), 60);

    window.push(40);
    assert_eq!(window.len(), 3);
    assert_eq!(window.average(), 30.0);
    assert_eq!(window.min_max(), Some((20, 40)));
  }

  #[test]
  fn test_record_content() {
    let mut metrics = TilingMetrics::new();
    metrics.record_content(0, 12, 136);
    metrics.record_content(1, 200, 4000);
    metrics.record_content(40, 5, 64);

    assert_eq!(metrics.contents_per_lod[0], 1);
    assert_eq!(metrics.contents_per_lod[LOD_BUCKETS - 1], 1);
    assert_eq!(metrics.total_contents(), 3);
    assert_eq!(metrics.total_items(), 217);
    assert_eq!(metrics.encoded_bytes, 4200);

    metrics.reset();
    assert_eq!(metrics.total_contents(), 0);
  }

  #[test]
  fn test_failures_are_cumulative() {
    let mut metrics = TilingMetrics::new();
    metrics.record_failure();
    metrics.reset();
    assert_eq!(metrics.jobs_failed, 1);
  }
}
