//! Tile codes and geometric error rules.

/// Code of the root tile.
pub const ROOT_CODE: &str = "R";
/// Marker appended for each LOD step.
pub const LOD_MARKER: char = 'C';

/// LOD level encoded in a tile code (number of LOD markers).
#[inline]
pub fn level_from_code(code: &str) -> u32 {
  code.chars().filter(|&c| c == LOD_MARKER).count() as u32
}

/// Code of a spatial child.
#[inline]
pub fn octant_code(parent: &str, octant: u8) -> String {
  format!("{parent}{octant}")
}

/// Code of the finer-LOD child holding a tile's remainder.
#[inline]
pub fn remainder_code(parent: &str) -> String {
  format!("{parent}{LOD_MARKER}")
}

/// Truncate (toward zero) to 8 decimal digits.
#[inline]
pub fn truncate_error(error: f64) -> f64 {
  (error * 1e8).trunc() / 1e8
}

/// Geometric error for a child, strictly below `parent_error`.
///
/// Takes the truncated candidate when it is smaller than the parent, else
/// halves the parent.
pub fn child_error(parent_error: f64, candidate: f64) -> f64 {
  let candidate = truncate_error(candidate);
  if candidate < parent_error {
    candidate
  } else {
    truncate_error(parent_error * 0.5)
  }
}
