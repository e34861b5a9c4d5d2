//! Error types for tiling runs.
//!
//! Only unrecoverable conditions surface here. Malformed faces and vertices
//! are skipped with a warning instead (see [`crate::scene::validate_primitive`]).

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T, E = TilingError> = std::result::Result<T, E>;

/// Errors that abort a tiling run for one input.
#[derive(Debug, thiserror::Error)]
pub enum TilingError {
  /// No geometry to build a root bounding box from.
  #[error("dataset is empty: cannot build a root bounding box")]
  EmptyDataset,

  /// Every position in a content subset is identical, so no quantization
  /// scale can be derived.
  #[error("cannot derive a quantization scale for `{uri}`: all positions are identical")]
  DegenerateQuantization { uri: String },

  /// Configuration failed validation.
  #[error("invalid configuration: {0}")]
  Config(String),

  /// Configuration file could not be parsed.
  #[error("failed to parse config {path}: {source}")]
  ConfigParse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  /// An input source failed to produce a scene or point list.
  #[error("input `{name}` could not be loaded: {reason}")]
  Input { name: String, reason: String },

  #[error("I/O error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl TilingError {
  /// Wrap an I/O error with the path it occurred at.
  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}
