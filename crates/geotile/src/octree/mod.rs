//! Octree module for spatial subdivision.
//!
//! No explicit tree is kept here: callers partition item lists into octant
//! buckets and keep whatever structure they need (weld buckets, tile nodes).
//!
//! # Octant Convention
//!
//! ```text
//!        6──────7          bit 0: +X
//!       /│     /│          bit 1: +Y
//!      4─┼────5 │          bit 2: +Z (octree only)
//!      │ 2────┼─3
//!      │/     │/           quadtree (XY): octants 0-3
//!      0──────1
//! ```
//!
//! # Module Structure
//!
//! - [`bounds`]: `BoundingBox` - double precision AABB with uninitialized state
//! - [`partition`]: `classify`, `partition`, `build_leaves` - the single split
//!   routine shared by welding and tiling

pub mod bounds;
pub mod partition;

// Re-exports
pub use bounds::BoundingBox;
pub use partition::{build_leaves, classify, partition, Leaf, SplitAxes, SplitLimits};
