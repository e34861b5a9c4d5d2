//! Position quantization.
//!
//! Positions are mapped into the unit cube spanned by a uniform scale (the
//! largest axis range) and the minimum corner, multiplied by 65535 and
//! truncated. The unsigned result is stored as its i16 bit pattern (values
//! above 32767 wrap by -65536); consumers read it back as normalized u16.

use glam::{DMat4, DVec3};

/// Full range of a quantized component.
pub const QUANTIZED_RANGE: f64 = 65535.0;

/// Uniform scale plus offset mapping quantized positions back to space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quantization {
  pub offset: DVec3,
  pub scale: f64,
}

impl Quantization {
  /// Fit positions. `None` when there are none or all are identical.
  pub fn from_positions(positions: impl IntoIterator<Item = DVec3>) -> Option<Self> {
    let mut min = DVec3::splat(f64::INFINITY);
    let mut max = DVec3::splat(f64::NEG_INFINITY);
    for p in positions {
      min = min.min(p);
      max = max.max(p);
    }
    let scale = (max - min).max_element();
    if !(scale > 0.0 && scale.is_finite()) {
      return None;
    }
    Some(Self { offset: min, scale })
  }

  /// Unit scale anchored at `offset`, for subsets without extent.
  pub fn unit_at(offset: DVec3) -> Self {
    Self { offset, scale: 1.0 }
  }

  /// The quantization transform: `translation(offset) * scale`.
  pub fn matrix(&self) -> DMat4 {
    DMat4::from_translation(self.offset) * DMat4::from_scale(DVec3::splat(self.scale))
  }

  /// Quantize one position to wrapped i16 components.
  #[inline]
  pub fn quantize(&self, position: DVec3) -> [i16; 3] {
    let local = (position - self.offset) / self.scale;
    local.to_array().map(|c| {
      let unsigned = (c * QUANTIZED_RANGE).clamp(0.0, QUANTIZED_RANGE) as i32;
      if unsigned > i16::MAX as i32 {
        (unsigned - 65536) as i16
      } else {
        unsigned as i16
      }
    })
  }

  /// Reconstruct a position. Error is at most `scale / 65535` per axis.
  #[inline]
  pub fn dequantize(&self, quantized: [i16; 3]) -> DVec3 {
    let unit = DVec3::from_array(quantized.map(|q| q as u16 as f64 / QUANTIZED_RANGE));
    unit * self.scale + self.offset
  }

  /// Worst-case absolute reconstruction error per axis.
  #[inline]
  pub fn tolerance(&self) -> f64 {
    self.scale / QUANTIZED_RANGE
  }
}
