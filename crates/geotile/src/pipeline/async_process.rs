//! Async Tiling Pipeline
//!
//! Runs a whole batch of tiling jobs off the calling thread.
//!
//! # Flow
//!
//! ```text
//! Caller                            Async (rayon)
//! ┌────────────────┐
//! │ Collect jobs   │
//! └───────┬────────┘
//!         │ start()
//!         ▼
//!                                  ┌───────────────┐
//!                                  │ par_iter jobs │
//!                                  │ (load, weld,  │
//!                                  │  tile, encode)│
//!                                  └───────┬───────┘
//!                                          │
//! ┌────────────────┐                       │
//! │ poll_results() │◄──────────────────────┘
//! └────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let mut pipeline = AsyncTilingPipeline::new();
//! pipeline.start(BatchRequest::new(jobs));
//!
//! // Poll from the driving loop
//! if let Some(batch) = pipeline.poll_results() {
//!     for completion in batch.completions {
//!         // ...
//!     }
//! }
//! ```

use std::sync::Arc;

use crossbeam_channel::{self as channel, Receiver, TryRecvError};
use rayon::prelude::*;
use web_time::Instant;

use super::stage::{run_job_with_sink, TilingCompletion};
use super::types::{ContentSink, TilingJob};

/// Request to start an async batch.
pub struct BatchRequest {
  pub jobs: Vec<TilingJob>,
  pub sink: Option<Arc<dyn ContentSink>>,
}

impl BatchRequest {
  pub fn new(jobs: Vec<TilingJob>) -> Self {
    Self { jobs, sink: None }
  }

  pub fn with_sink(mut self, sink: Arc<dyn ContentSink>) -> Self {
    self.sink = Some(sink);
    self
  }
}

/// Result of a finished batch.
#[derive(Debug)]
pub struct BatchResult {
  /// One completion per job, in submission order.
  pub completions: Vec<TilingCompletion>,
  pub stats: BatchStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
  pub succeeded: usize,
  pub failed: usize,
  /// Batch wall time in microseconds.
  pub total_us: u64,
}

/// Non-blocking batch tiling on rayon's thread pool.
pub struct AsyncTilingPipeline {
  /// Receiver for pending result.
  receiver: Option<Receiver<BatchResult>>,
}

impl AsyncTilingPipeline {
  pub fn new() -> Self {
    Self { receiver: None }
  }

  /// Check if a batch is running.
  pub fn is_busy(&self) -> bool {
    self.receiver.is_some()
  }

  /// Start tiling a batch.
  ///
  /// Returns `true` if started, `false` if already busy.
  pub fn start(&mut self, request: BatchRequest) -> bool {
    if self.is_busy() {
      return false;
    }

    let (sender, receiver) = channel::bounded(1);
    self.receiver = Some(receiver);

    rayon::spawn(move || {
      let result = run_batch(request);
      // Receiver dropped = cancelled
      let _ = sender.send(result);
    });

    true
  }

  /// Poll for results (non-blocking).
  ///
  /// Returns `Some(result)` when the batch is complete, `None` if still
  /// running or cancelled.
  pub fn poll_results(&mut self) -> Option<BatchResult> {
    let receiver = self.receiver.as_ref()?;

    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        Some(result)
      }
      Err(TryRecvError::Empty) => None,
      Err(TryRecvError::Disconnected) => {
        self.receiver = None;
        None
      }
    }
  }

  /// Forget the running batch. Jobs already started still run to
  /// completion; their result is discarded.
  pub fn cancel(&mut self) {
    self.receiver = None;
  }
}

impl Default for AsyncTilingPipeline {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "pipeline::run_batch"))]
fn run_batch(request: BatchRequest) -> BatchResult {
  let start = Instant::now();
  let BatchRequest { jobs, sink } = request;
  let sink = sink.as_deref();

  let completions: Vec<TilingCompletion> = jobs
    .into_par_iter()
    .enumerate()
    .map(|(id, job)| {
      let job_start = Instant::now();
      let (name, result) = run_job_with_sink(job, sink);
      TilingCompletion {
        id: id as u64,
        name,
        result,
        time_us: job_start.elapsed().as_micros() as u64,
      }
    })
    .collect();

  let failed = completions.iter().filter(|c| c.result.is_err()).count();
  let stats = BatchStats {
    succeeded: completions.len() - failed,
    failed,
    total_us: start.elapsed().as_micros() as u64,
  };
  tracing::info!(succeeded = stats.succeeded, failed = stats.failed, "tiling batch complete");

  BatchResult { completions, stats }
}
