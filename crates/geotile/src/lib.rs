//! geotile - Geometry-to-tile decomposition for streamable 3D tilesets
//!
//! Turns a materialized scene (or point list) into a hierarchical tile tree:
//! every tile carries a bounding volume, a geometric error driving client-side
//! LOD selection, a refinement mode and optionally quantized binary content.
//! Importers, manifest writers and container formats live outside this crate.
//!
//! # Features
//!
//! - **Scene model**: node tree with local/world transforms, primitives,
//!   polygon triangulation and input validation
//! - **Octree index**: one parameterized partitioner (octree or quadtree) used
//!   by welding, decomposition and primitive separation
//! - **Vertex welding**: tolerance-based dedup with per-attribute checks
//! - **Tile/LOD decomposition**: spatial split by triangle or point count,
//!   LOD partitioning by feature size, ENU placement per tile
//! - **Quantized encoding**: 16-bit positions plus typed attribute sections
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use geotile::{TilingConfig, TilingJob, TilingStage};
//!
//! let config = Arc::new(TilingConfig::load("tiling.toml".as_ref())?);
//! let mut stage = TilingStage::new();
//! stage.enqueue(TilingJob::new(scene, config));
//! stage.tick();
//!
//! for completion in stage.drain_completions() {
//!     let output = completion.result?;
//!     println!("{}: {} tiles", output.name, output.tree.len());
//! }
//! ```

pub mod config;
pub mod error;

pub use config::{LodConfig, TilingConfig};
pub use error::{Result, TilingError};

// Geometry data model
pub mod scene;
pub use scene::{Face, Mesh, Node, Point, PointCloud, Primitive, Scene, Surface, Vertex};

// Spatial index
pub mod octree;
pub use octree::{BoundingBox, SplitAxes};

// Vertex welding
pub mod weld;
pub use weld::{weld_primitive, weld_scene, WeldOptions, WeldStats};

// Tile tree construction
pub mod tiling;
pub use tiling::{tile_mesh, tile_points, Georeference, Refine, TileId, TileNode, TileTree};

// Binary content encoding
pub mod encode;
pub use encode::{encode_tree, EncodedTile, Quantization};

// Job orchestration
pub mod pipeline;
pub use pipeline::{AsyncTilingPipeline, ContentSink, DirectorySink, TilingJob, TilingOutput, TilingStage};

pub mod metrics;
