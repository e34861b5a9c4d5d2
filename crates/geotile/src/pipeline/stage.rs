//! Task stage for parallel tiling jobs.
//!
//! Following the IStage pattern: Enqueue → Tick → Completions
//!
//! Jobs are independent; each rayon worker owns one input from load to
//! encoded buffers. A failed job produces an `Err` completion and never
//! stops the rest of the batch.

use std::sync::Arc;

use rayon::prelude::*;
use web_time::Instant;

use super::process::{run_job, write_tiles};
use super::types::{ContentSink, TilingJob, TilingOutput};
use crate::error::Result;
use crate::metrics::{is_enabled, TilingMetrics};

/// A queued job with its assigned ID.
struct QueuedJob {
  id: u64,
  job: TilingJob,
}

/// Completed tiling result.
#[derive(Debug)]
pub struct TilingCompletion {
  /// Request ID this completion corresponds to
  pub id: u64,
  /// Source name
  pub name: String,
  pub result: Result<TilingOutput>,
  /// Wall time of the whole job in microseconds
  pub time_us: u64,
}

/// Tiling stage that processes jobs in parallel.
pub struct TilingStage {
  /// Pending jobs waiting to be processed
  pending: Vec<QueuedJob>,
  /// Completed results ready to be collected
  completed: Vec<TilingCompletion>,
  /// Next job ID
  next_id: u64,
  /// Receives encoded tiles as soon as a job finishes
  sink: Option<Arc<dyn ContentSink>>,
  metrics: TilingMetrics,
}

impl Default for TilingStage {
  fn default() -> Self {
    Self::new()
  }
}

impl TilingStage {
  /// Create a new tiling stage.
  pub fn new() -> Self {
    Self {
      pending: Vec::new(),
      completed: Vec::new(),
      next_id: 0,
      sink: None,
      metrics: TilingMetrics::default(),
    }
  }

  /// Write every encoded tile to `sink` on the worker that produced it.
  pub fn with_sink(mut self, sink: Arc<dyn ContentSink>) -> Self {
    self.sink = Some(sink);
    self
  }

  /// Enqueue a job, returning the assigned ID.
  pub fn enqueue(&mut self, job: TilingJob) -> u64 {
    let id = self.next_id;
    self.next_id += 1;
    self.pending.push(QueuedJob { id, job });
    id
  }

  /// Process pending jobs in parallel and move completions to output.
  /// Returns the number of jobs processed this tick.
  pub fn tick(&mut self) -> usize {
    if self.pending.is_empty() {
      return 0;
    }

    let jobs = std::mem::take(&mut self.pending);
    let count = jobs.len();
    let sink = self.sink.clone();

    let completions: Vec<TilingCompletion> = jobs
      .into_par_iter()
      .map(|queued| run_queued(queued, sink.as_deref()))
      .collect();

    if is_enabled() {
      for completion in &completions {
        match &completion.result {
          Ok(output) => self.metrics.record_output(output),
          Err(_) => self.metrics.record_failure(),
        }
      }
    }

    self.completed.extend(completions);
    count
  }

  /// Take all completed results.
  pub fn drain_completions(&mut self) -> Vec<TilingCompletion> {
    std::mem::take(&mut self.completed)
  }

  /// Number of pending jobs.
  pub fn pending_count(&self) -> usize {
    self.pending.len()
  }

  /// Number of completed results waiting to be drained.
  pub fn completed_count(&self) -> usize {
    self.completed.len()
  }

  /// True when no work remains.
  pub fn is_idle(&self) -> bool {
    self.pending.is_empty() && self.completed.is_empty()
  }

  pub fn metrics(&self) -> &TilingMetrics {
    &self.metrics
  }
}

/// Run one job to completion on the current worker.
pub(super) fn run_job_with_sink(job: TilingJob, sink: Option<&dyn ContentSink>) -> (String, Result<TilingOutput>) {
  let TilingJob {
    source,
    config,
    georeference,
  } = job;
  let name = source.name().to_string();

  let result = run_job(source, &config, georeference.as_ref()).and_then(|output| {
    if let Some(sink) = sink {
      write_tiles(&output.name, &output.tiles, sink)?;
    }
    Ok(output)
  });

  if let Err(err) = &result {
    tracing::error!(job = %name, error = %err, "tiling job failed");
  }
  (name, result)
}

fn run_queued(queued: QueuedJob, sink: Option<&dyn ContentSink>) -> TilingCompletion {
  let start = Instant::now();
  let (name, result) = run_job_with_sink(queued.job, sink);
  TilingCompletion {
    id: queued.id,
    name,
    result,
    time_us: start.elapsed().as_micros() as u64,
  }
}
