//! Typed binary sections laid out back to back.
//!
//! Every section starts on a 4-byte boundary; the padding between sections
//! is zeroed. All values are little-endian.

/// Scalar type of one component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
  I8,
  U8,
  I16,
  U16,
  U32,
  F32,
}

impl ComponentType {
  #[inline]
  pub fn byte_size(self) -> usize {
    match self {
      ComponentType::I8 | ComponentType::U8 => 1,
      ComponentType::I16 | ComponentType::U16 => 2,
      ComponentType::U32 | ComponentType::F32 => 4,
    }
  }
}

/// Number of components per element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementType {
  Scalar,
  Vec2,
  Vec3,
  Vec4,
}

impl ElementType {
  #[inline]
  pub fn component_count(self) -> usize {
    match self {
      ElementType::Scalar => 1,
      ElementType::Vec2 => 2,
      ElementType::Vec3 => 3,
      ElementType::Vec4 => 4,
    }
  }
}

/// Location and layout of one section inside a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferView {
  pub byte_offset: usize,
  pub byte_length: usize,
  /// Number of elements.
  pub count: usize,
  pub component_type: ComponentType,
  pub element_type: ElementType,
  /// Integer components are read as normalized values.
  pub normalized: bool,
}

impl BufferView {
  /// Bytes per element.
  #[inline]
  pub fn stride(&self) -> usize {
    self.component_type.byte_size() * self.element_type.component_count()
  }

  /// The section's bytes inside `buffer`.
  pub fn slice<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
    &buffer[self.byte_offset..self.byte_offset + self.byte_length]
  }
}

pub const SECTION_ALIGNMENT: usize = 4;

/// Appends aligned sections to one byte buffer.
#[derive(Debug, Default)]
pub struct BufferBuilder {
  data: Vec<u8>,
}

impl BufferBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  fn align(&mut self) {
    let padded = self.data.len().next_multiple_of(SECTION_ALIGNMENT);
    self.data.resize(padded, 0);
  }

  /// Start a section, let `write` append `count` elements, and describe it.
  ///
  /// Debug builds assert the written length matches the declared layout.
  pub fn section(
    &mut self,
    count: usize,
    component_type: ComponentType,
    element_type: ElementType,
    normalized: bool,
    write: impl FnOnce(&mut Vec<u8>),
  ) -> BufferView {
    self.align();
    let byte_offset = self.data.len();
    write(&mut self.data);
    let byte_length = self.data.len() - byte_offset;
    let view = BufferView {
      byte_offset,
      byte_length,
      count,
      component_type,
      element_type,
      normalized,
    };
    debug_assert_eq!(byte_length, count * view.stride(), "section length mismatch");
    view
  }

  /// Pad the tail and hand out the bytes.
  pub fn finish(mut self) -> Vec<u8> {
    self.align();
    self.data
  }
}
