//! Quantized binary encoding of tile content.
//!
//! Each content tile becomes one little-endian buffer plus per-attribute
//! [`BufferView`] descriptors. The encoder knows nothing about container
//! formats; a writer turns the descriptors into accessor metadata.
//!
//! | Attribute      | Layout                                  |
//! |----------------|-----------------------------------------|
//! | position       | i16 × 4 (xyz + zero pad), normalized    |
//! | normal         | f32 × 3                                 |
//! | texcoord       | f32 × 2                                 |
//! | color          | u8 × 4, normalized                      |
//! | batch id       | f32 (missing ids written as 0)          |
//! | classification | u8 (points only)                        |
//! | intensity      | u16 (points only)                       |
//! | indices        | u16, or u32 when vertex count ≥ 65535   |
//!
//! Optional attributes are written when any vertex of the primitive (or
//! point of the tile) carries them.

pub mod buffer;
pub mod quantize;

use glam::DVec3;

use crate::config::EncoderConfig;
use crate::error::{Result, TilingError};
use crate::scene::{Point, Primitive};
use crate::tiling::{separate_primitive, ContentPayload, TileId, TileTree};

pub use buffer::{BufferBuilder, BufferView, ComponentType, ElementType};
pub use quantize::Quantization;

/// Vertex counts at or above this use 32-bit indices.
pub const U16_INDEX_LIMIT: usize = 65535;

/// Semantic of an encoded section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
  Position,
  Normal,
  Texcoord,
  Color,
  BatchId,
  Classification,
  Intensity,
}

/// Sections of one primitive (or of a whole point tile).
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedPrimitive {
  /// Material index of the source primitive (-1 for points).
  pub material: i32,
  pub vertex_count: usize,
  pub attributes: Vec<(Attribute, BufferView)>,
  /// `None` for point content.
  pub indices: Option<BufferView>,
}

impl EncodedPrimitive {
  pub fn attribute(&self, attribute: Attribute) -> Option<&BufferView> {
    self
      .attributes
      .iter()
      .find(|(a, _)| *a == attribute)
      .map(|(_, view)| view)
  }
}

/// Encoded content of one tile.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedTile {
  pub tile: TileId,
  pub uri: String,
  pub quantization: Quantization,
  pub buffer: Vec<u8>,
  pub primitives: Vec<EncodedPrimitive>,
}

/// Index component type for a primitive with `vertex_count` vertices.
#[inline]
pub fn index_component_type(vertex_count: usize) -> ComponentType {
  if vertex_count >= U16_INDEX_LIMIT {
    ComponentType::U32
  } else {
    ComponentType::U16
  }
}

fn write_positions(builder: &mut BufferBuilder, quantized: &[[i16; 3]]) -> BufferView {
  builder.section(quantized.len(), ComponentType::I16, ElementType::Vec4, true, |out| {
    for q in quantized {
      for c in q.iter().chain(std::iter::once(&0i16)) {
        out.extend_from_slice(&c.to_le_bytes());
      }
    }
  })
}

fn write_vec3(builder: &mut BufferBuilder, values: impl ExactSizeIterator<Item = DVec3>) -> BufferView {
  builder.section(values.len(), ComponentType::F32, ElementType::Vec3, false, |out| {
    for v in values {
      for c in v.as_vec3().to_array() {
        out.extend_from_slice(&c.to_le_bytes());
      }
    }
  })
}

fn write_colors(builder: &mut BufferBuilder, values: impl ExactSizeIterator<Item = [u8; 4]>) -> BufferView {
  builder.section(values.len(), ComponentType::U8, ElementType::Vec4, true, |out| {
    for c in values {
      out.extend_from_slice(&c);
    }
  })
}

fn write_f32(builder: &mut BufferBuilder, values: impl ExactSizeIterator<Item = f32>) -> BufferView {
  builder.section(values.len(), ComponentType::F32, ElementType::Scalar, false, |out| {
    for v in values {
      out.extend_from_slice(&v.to_le_bytes());
    }
  })
}

fn write_indices(builder: &mut BufferBuilder, primitive: &Primitive) -> BufferView {
  let component_type = index_component_type(primitive.vertices.len());
  let count = primitive.triangle_count() * 3;
  builder.section(count, component_type, ElementType::Scalar, false, |out| {
    for i in primitive.triangles().flatten() {
      match component_type {
        ComponentType::U32 => out.extend_from_slice(&i.to_le_bytes()),
        _ => out.extend_from_slice(&(i as u16).to_le_bytes()),
      }
    }
  })
}

/// Encode mesh primitives sharing one quantization.
///
/// Writes the quantized positions back into each vertex.
pub fn encode_mesh(primitives: &mut [Primitive], uri: &str) -> Result<(Quantization, Vec<u8>, Vec<EncodedPrimitive>)> {
  let quantization = Quantization::from_positions(
    primitives
      .iter()
      .flat_map(|p| p.vertices.iter().map(|v| v.position)),
  )
  .ok_or_else(|| TilingError::DegenerateQuantization { uri: uri.to_string() })?;

  let mut builder = BufferBuilder::new();
  let mut encoded = Vec::with_capacity(primitives.len());

  for primitive in primitives.iter_mut() {
    let quantized: Vec<[i16; 3]> = primitive
      .vertices
      .iter_mut()
      .map(|v| {
        let q = quantization.quantize(v.position);
        v.quantized = Some(q);
        q
      })
      .collect();

    let vertices = &primitive.vertices;
    let mut attributes = vec![(Attribute::Position, write_positions(&mut builder, &quantized))];

    if vertices.iter().any(|v| v.normal.is_some()) {
      let view = write_vec3(&mut builder, vertices.iter().map(|v| v.normal.unwrap_or(DVec3::ZERO)));
      attributes.push((Attribute::Normal, view));
    }
    if vertices.iter().any(|v| v.texcoord.is_some()) {
      let view = builder.section(vertices.len(), ComponentType::F32, ElementType::Vec2, false, |out| {
        for v in vertices {
          for c in v.texcoord.unwrap_or_default().as_vec2().to_array() {
            out.extend_from_slice(&c.to_le_bytes());
          }
        }
      });
      attributes.push((Attribute::Texcoord, view));
    }
    if vertices.iter().any(|v| v.color.is_some()) {
      let view = write_colors(&mut builder, vertices.iter().map(|v| v.color.unwrap_or([0, 0, 0, 255])));
      attributes.push((Attribute::Color, view));
    }
    if vertices.iter().any(|v| v.batch_id.is_some()) {
      let view = write_f32(&mut builder, vertices.iter().map(|v| v.batch_id.unwrap_or(0.0)));
      attributes.push((Attribute::BatchId, view));
    }

    let indices = write_indices(&mut builder, primitive);
    encoded.push(EncodedPrimitive {
      material: primitive.material,
      vertex_count: primitive.vertices.len(),
      attributes,
      indices: Some(indices),
    });
  }

  Ok((quantization, builder.finish(), encoded))
}

/// Encode a point subset. A subset without extent gets a unit scale at its
/// position unless `strict` is set.
pub fn encode_points(points: &[Point], uri: &str, strict: bool) -> Result<(Quantization, Vec<u8>, EncodedPrimitive)> {
  let quantization = match Quantization::from_positions(points.iter().map(|p| p.position)) {
    Some(q) => q,
    None if !strict && !points.is_empty() => {
      tracing::debug!(uri, points = points.len(), "point subset without extent, using unit scale");
      Quantization::unit_at(points[0].position)
    }
    None => return Err(TilingError::DegenerateQuantization { uri: uri.to_string() }),
  };

  let mut builder = BufferBuilder::new();
  let quantized: Vec<[i16; 3]> = points.iter().map(|p| quantization.quantize(p.position)).collect();
  let mut attributes = vec![(Attribute::Position, write_positions(&mut builder, &quantized))];

  if points.iter().any(|p| p.normal.is_some()) {
    let view = write_vec3(&mut builder, points.iter().map(|p| p.normal.unwrap_or(DVec3::ZERO)));
    attributes.push((Attribute::Normal, view));
  }
  if points.iter().any(|p| p.color.is_some()) {
    let view = write_colors(&mut builder, points.iter().map(|p| p.color.unwrap_or([0, 0, 0, 255])));
    attributes.push((Attribute::Color, view));
  }
  if points.iter().any(|p| p.batch_id.is_some()) {
    let view = write_f32(&mut builder, points.iter().map(|p| p.batch_id.unwrap_or(0.0)));
    attributes.push((Attribute::BatchId, view));
  }
  if points.iter().any(|p| p.classification != 0) {
    let view = builder.section(points.len(), ComponentType::U8, ElementType::Scalar, false, |out| {
      out.extend(points.iter().map(|p| p.classification));
    });
    attributes.push((Attribute::Classification, view));
  }
  if points.iter().any(|p| p.intensity != 0) {
    let view = builder.section(points.len(), ComponentType::U16, ElementType::Scalar, false, |out| {
      for p in points {
        out.extend_from_slice(&p.intensity.to_le_bytes());
      }
    });
    attributes.push((Attribute::Intensity, view));
  }

  let primitive = EncodedPrimitive {
    material: crate::scene::NO_MATERIAL,
    vertex_count: points.len(),
    attributes,
    indices: None,
  };
  Ok((quantization, builder.finish(), primitive))
}

/// Encode every content tile of `tree`.
///
/// Oversized mesh primitives are separated first (the content payload is
/// replaced by the pieces). Each tile's quantization matrix is stored on
/// the node.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "encode::encode_tree"))]
pub fn encode_tree(tree: &mut TileTree, config: &EncoderConfig) -> Result<Vec<EncodedTile>> {
  let single_tile = tree.len() == 1;
  let mut tiles = Vec::new();

  for (id, node) in tree.iter_mut() {
    let Some(content) = node.content.as_mut() else {
      continue;
    };
    let uri = content.uri.clone();

    let (quantization, buffer, primitives) = match &mut content.payload {
      ContentPayload::Mesh(primitives) => {
        if primitives.iter().any(|p| p.vertices.len() > config.max_primitive_vertices) {
          let pieces = std::mem::take(primitives)
            .into_iter()
            .flat_map(|p| separate_primitive(p, config.max_primitive_vertices))
            .collect();
          *primitives = pieces;
        }
        encode_mesh(primitives, &uri)?
      }
      ContentPayload::Points(points) => {
        let (quantization, buffer, primitive) = encode_points(points, &uri, single_tile)?;
        (quantization, buffer, vec![primitive])
      }
    };

    node.quantization = Some(quantization.matrix());
    tiles.push(EncodedTile {
      tile: id,
      uri,
      quantization,
      buffer,
      primitives,
    });
  }

  Ok(tiles)
}
