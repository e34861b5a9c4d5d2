//! Tolerance-based vertex welding.
//!
//! Near-duplicate vertices (from per-face export, tessellation or merged
//! files) collapse onto one *master* vertex without a global O(n²) scan:
//!
//! 1. Bucket vertex positions with the shared octree partition
//!    (`bucket_size` vertices per leaf).
//! 2. Compare pairs inside each bucket; the first visited vertex of a group
//!    becomes its master.
//! 3. Collapse: build the master array and remap every face through it.
//! 4. Prune: drop faces whose indices are no longer pairwise distinct, then
//!    drop vertices no face references.
//!
//! Collapse must run before prune; pruning first would leave faces pointing
//! at stale slots.

use serde::Deserialize;

use crate::octree::{build_leaves, BoundingBox, SplitAxes, SplitLimits};
use crate::scene::{Primitive, Scene, Vertex};

/// Welding tolerances and attribute checks.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeldOptions {
  /// Maximum position distance (and texcoord/normal/color delta) to weld.
  pub error: f64,
  pub check_texcoord: bool,
  pub check_normal: bool,
  pub check_color: bool,
  /// Batch ids must match exactly when enabled.
  pub check_batch_id: bool,
  /// Target number of vertices per octree bucket.
  pub bucket_size: usize,
}

impl Default for WeldOptions {
  fn default() -> Self {
    Self {
      error: 1e-6,
      check_texcoord: true,
      check_normal: true,
      check_color: true,
      check_batch_id: true,
      bucket_size: 50,
    }
  }
}

impl WeldOptions {
  pub fn with_error(mut self, error: f64) -> Self {
    self.error = error;
    self
  }

  /// Compare positions only.
  pub fn positions_only(mut self) -> Self {
    self.check_texcoord = false;
    self.check_normal = false;
    self.check_color = false;
    self.check_batch_id = false;
    self
  }
}

/// Outcome of welding one primitive (or a whole scene).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeldStats {
  pub vertices_before: usize,
  pub vertices_after: usize,
  pub faces_before: usize,
  /// Faces that became degenerate after remapping.
  pub faces_dropped: usize,
  /// Vertices left untouched because their position is NaN/Inf.
  pub non_finite_vertices: usize,
}

impl WeldStats {
  #[inline]
  pub fn vertices_removed(&self) -> usize {
    self.vertices_before - self.vertices_after
  }

  pub fn merge(&mut self, other: WeldStats) {
    self.vertices_before += other.vertices_before;
    self.vertices_after += other.vertices_after;
    self.faces_before += other.faces_before;
    self.faces_dropped += other.faces_dropped;
    self.non_finite_vertices += other.non_finite_vertices;
  }
}

#[inline]
fn optional_within<T>(a: Option<T>, b: Option<T>, within: impl Fn(T, T) -> bool) -> bool {
  match (a, b) {
    (Some(a), Some(b)) => within(a, b),
    (None, None) => true,
    _ => false,
  }
}

/// True when `a` and `b` may be merged under `options`.
///
/// Position distance must be `<= error`. Enabled attribute checks compare
/// texcoords and normals by distance, colors channel-wise (all `<= error`)
/// and batch ids exactly. A vertex without a finite position never welds.
pub fn weldable(a: &Vertex, b: &Vertex, options: &WeldOptions) -> bool {
  if !a.position.is_finite() || !b.position.is_finite() {
    return false;
  }
  let error = options.error;
  if a.position.distance(b.position) > error {
    return false;
  }
  if options.check_texcoord && !optional_within(a.texcoord, b.texcoord, |x, y| x.distance(y) <= error) {
    return false;
  }
  if options.check_normal && !optional_within(a.normal, b.normal, |x, y| x.distance(y) <= error) {
    return false;
  }
  if options.check_color
    && !optional_within(a.color, b.color, |x, y| {
      x.iter()
        .zip(y.iter())
        .all(|(&p, &q)| (p as f64 - q as f64).abs() <= error)
    })
  {
    return false;
  }
  if options.check_batch_id && a.batch_id != b.batch_id {
    return false;
  }
  true
}

/// Weld one primitive in place.
///
/// Surfaces are kept; faces inside them are remapped and pruned.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "weld::weld_primitive"))]
pub fn weld_primitive(primitive: &mut Primitive, options: &WeldOptions) -> WeldStats {
  let vertex_count = primitive.vertices.len();
  let mut stats = WeldStats {
    vertices_before: vertex_count,
    faces_before: primitive.face_count(),
    ..Default::default()
  };

  // Phase 1: bucket finite vertices
  let mut finite = Vec::with_capacity(vertex_count);
  let mut bounds = BoundingBox::empty();
  for (i, vertex) in primitive.vertices.iter().enumerate() {
    if vertex.position.is_finite() {
      finite.push(i as u32);
      bounds.add_point(vertex.position);
    } else {
      stats.non_finite_vertices += 1;
    }
  }
  if stats.non_finite_vertices > 0 {
    tracing::warn!(
      count = stats.non_finite_vertices,
      "weld: vertices without a finite position are kept unwelded"
    );
  }

  let mut master: Vec<u32> = (0..vertex_count as u32).collect();

  if bounds.is_valid() {
    let limits = SplitLimits::new(options.bucket_size)
      .with_max_depth(24)
      .with_min_size(options.error * 2.0);
    let vertices = &primitive.vertices;
    let leaves = build_leaves(finite, bounds.to_cube(), SplitAxes::Xyz, &limits, |&i| {
      vertices[i as usize].position
    });

    // Phase 2: pairwise inside each bucket
    for mut leaf in leaves {
      leaf.items.sort_unstable();
      let items = &leaf.items;
      for (k, &a) in items.iter().enumerate() {
        if master[a as usize] != a {
          continue;
        }
        for &b in &items[k + 1..] {
          if master[b as usize] == b && weldable(&vertices[a as usize], &vertices[b as usize], options) {
            master[b as usize] = a;
          }
        }
      }
    }
  }

  // Phase 3: collapse onto masters
  let mut collapsed_index = vec![u32::MAX; vertex_count];
  let mut collapsed = Vec::new();
  for i in 0..vertex_count {
    if master[i] == i as u32 {
      collapsed_index[i] = collapsed.len() as u32;
      collapsed.push(primitive.vertices[i]);
    }
  }

  let mut referenced = vec![false; collapsed.len()];
  for surface in &mut primitive.surfaces {
    surface.faces.retain_mut(|face| {
      for idx in face.indices.iter_mut() {
        let Some(&m) = master.get(*idx as usize) else {
          tracing::warn!(index = *idx, vertex_count, "weld: skipping face with out-of-range index");
          return false;
        };
        *idx = collapsed_index[m as usize];
      }
      let distinct = (0..face.indices.len())
        .all(|i| (i + 1..face.indices.len()).all(|j| face.indices[i] != face.indices[j]));
      if !distinct {
        stats.faces_dropped += 1;
        return false;
      }
      face.normal = None;
      for &idx in &face.indices {
        referenced[idx as usize] = true;
      }
      true
    });
  }

  // Phase 4: prune unreferenced vertices
  let mut pruned_index = vec![u32::MAX; collapsed.len()];
  let mut pruned = Vec::with_capacity(collapsed.len());
  for (i, vertex) in collapsed.into_iter().enumerate() {
    if referenced[i] {
      pruned_index[i] = pruned.len() as u32;
      pruned.push(vertex);
    }
  }
  for surface in &mut primitive.surfaces {
    for face in &mut surface.faces {
      for idx in face.indices.iter_mut() {
        *idx = pruned_index[*idx as usize];
      }
    }
  }

  primitive.vertices = pruned;
  stats.vertices_after = primitive.vertices.len();

  tracing::debug!(
    before = stats.vertices_before,
    after = stats.vertices_after,
    faces_dropped = stats.faces_dropped,
    "welded primitive"
  );
  stats
}

/// Weld every primitive of a scene.
pub fn weld_scene(scene: &mut Scene, options: &WeldOptions) -> WeldStats {
  let mut total = WeldStats::default();
  scene.for_each_primitive_mut(|primitive| total.merge(weld_primitive(primitive, options)));
  total
}
