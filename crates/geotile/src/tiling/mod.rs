//! Tile/LOD decomposition.
//!
//! Turns a flattened, triangulated (and optionally welded) primitive list or
//! a point cloud into a [`TileTree`]: every node has a bounding volume, a
//! geometric error, a refinement mode, an ENU placement transform and
//! optionally content re-indexed from 0.
//!
//! # Tile codes
//!
//! ```text
//! R        root
//! R3       spatial child (octant 3) of the root
//! R3C      finer LOD child holding what R3 deferred
//! R3C05    spatial children below an LOD step
//! ```
//!
//! The LOD level of a node is the number of `C` markers in its code.
//!
//! # Module Structure
//!
//! - [`tree`]: arena `TileTree`, `TileNode`, content payloads
//! - [`lod`]: code helpers and geometric error rules
//! - [`enu`]: geodetic conversion, `Georeference`, placement frames
//! - [`mesh`]: triangle decomposition with LOD partitioning
//! - [`points`]: count-driven point decomposition with chunked routing
//! - [`separator`]: vertex-limit split of a single primitive

pub mod enu;
pub mod lod;
pub mod mesh;
pub mod points;
pub mod separator;
pub mod tree;

// Re-exports
pub use enu::{Geodetic, GeographicFrame, Georeference, GeoreferenceConfig, LocalFrame};
pub use mesh::tile_mesh;
pub use points::tile_points;
pub use separator::separate_primitive;
pub use tree::{ContentPayload, Refine, TileContent, TileId, TileNode, TileTree};
