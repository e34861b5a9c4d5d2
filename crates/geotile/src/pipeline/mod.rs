//! Tiling Pipeline
//!
//! Drives independent tiling jobs on rayon, one input per worker.
//!
//! ```text
//! ┌────────┐     ┌─────────┐     ┌──────┐     ┌──────┐     ┌────────┐     ┌──────┐
//! │  Load  ├────►│ Prepare ├────►│ Weld ├────►│ Tile ├────►│ Encode ├────►│ Sink │
//! └────────┘     └─────────┘     └──────┘     └──────┘     └────────┘     └──────┘
//!     │               │              │            │             │             │
//! TilingInput   flatten/tri/    WeldStats     TileTree    EncodedTile     files
//!               validate       (optional)
//! ```
//!
//! # Entry Points
//!
//! - [`run_job`]: one job, synchronously on the calling thread
//! - [`TilingStage`]: enqueue → tick → drain completions
//! - [`AsyncTilingPipeline`]: non-blocking batch, polled for the result
//!
//! Point clouds skip preparation and welding.

pub mod types;

pub mod process;
pub mod stage;
pub mod async_process;

// Test utilities
#[cfg(test)]
pub mod test_utils;


// Re-exports
pub use types::{
  ContentSink, DirectorySink, InputSource, TilingInput, TilingJob, TilingOutput, TilingStats,
};

// Synchronous entry points
pub use process::{prepare_scene, run_job, write_tiles};
pub use stage::{TilingCompletion, TilingStage};

// Async entry point
pub use async_process::{AsyncTilingPipeline, BatchRequest, BatchResult, BatchStats};
