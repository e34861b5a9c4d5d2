//! Scene graph and geometry records.
//!
//! ```text
//! Scene ─┬─ Node ─┬─ Node ...            (children: owned, no cycles)
//!        │        └─ Mesh ── Primitive ─┬─ Vertex[]
//!        │                              └─ Surface ── Face[]  (indices into Vertex[])
//!        └─ Material[]
//! ```
//!
//! A scene is built once per input by an importer, mutated in place by the
//! flatten and weld passes, then consumed by tiling. Every primitive is self
//! contained: face indices only reference its own vertex list.

pub mod points;
pub mod transform;
pub mod triangulate;
pub mod validate;

use std::collections::BTreeMap;

use glam::{DMat4, DVec2, DVec3};
use smallvec::SmallVec;

use crate::octree::BoundingBox;

pub use points::{Point, PointCloud};
pub use transform::flatten_transform;
pub use triangulate::triangulate;
pub use validate::{validate_primitive, ValidationReport};

/// Material index meaning "no material assigned".
pub const NO_MATERIAL: i32 = -1;

/// A single mesh vertex.
///
/// Identity for welding is attribute equality within a tolerance, never the
/// vertex's slot in the array.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
  pub position: DVec3,
  pub normal: Option<DVec3>,
  pub texcoord: Option<DVec2>,
  pub color: Option<[u8; 4]>,
  pub batch_id: Option<f32>,
  /// Derived by the encoder; never authoritative.
  pub quantized: Option<[i16; 3]>,
}

impl Vertex {
  pub fn new(position: DVec3) -> Self {
    Self {
      position,
      ..Default::default()
    }
  }

  pub fn with_normal(mut self, normal: DVec3) -> Self {
    self.normal = Some(normal);
    self
  }

  pub fn with_texcoord(mut self, texcoord: DVec2) -> Self {
    self.texcoord = Some(texcoord);
    self
  }

  pub fn with_color(mut self, color: [u8; 4]) -> Self {
    self.color = Some(color);
    self
  }

  pub fn with_batch_id(mut self, batch_id: f32) -> Self {
    self.batch_id = Some(batch_id);
    self
  }
}

/// Polygon or triangle referencing vertices of the owning primitive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Face {
  pub indices: SmallVec<[u32; 4]>,
  /// Cached face normal, cleared whenever positions move.
  pub normal: Option<DVec3>,
}

impl Face {
  pub fn new(indices: impl IntoIterator<Item = u32>) -> Self {
    Self {
      indices: indices.into_iter().collect(),
      normal: None,
    }
  }

  pub fn triangle(a: u32, b: u32, c: u32) -> Self {
    Self::new([a, b, c])
  }

  #[inline]
  pub fn is_triangle(&self) -> bool {
    self.indices.len() == 3
  }

  /// Triangle indices, if this face is a triangle.
  #[inline]
  pub fn as_triangle(&self) -> Option<[u32; 3]> {
    match self.indices.as_slice() {
      &[a, b, c] => Some([a, b, c]),
      _ => None,
    }
  }

  /// Compute (and cache) the unit normal from the Newell sum of the polygon.
  ///
  /// Returns `None` for degenerate polygons or out-of-range indices.
  pub fn compute_normal(&mut self, vertices: &[Vertex]) -> Option<DVec3> {
    let n = newell_normal(vertices, &self.indices)?;
    let len = n.length();
    if len <= f64::EPSILON {
      return None;
    }
    let normal = n / len;
    self.normal = Some(normal);
    Some(normal)
  }
}

/// Newell normal (unnormalized, twice the projected area).
pub(crate) fn newell_normal(vertices: &[Vertex], indices: &[u32]) -> Option<DVec3> {
  let mut n = DVec3::ZERO;
  for (i, &idx) in indices.iter().enumerate() {
    let next = indices[(i + 1) % indices.len()];
    let a = vertices.get(idx as usize)?.position;
    let b = vertices.get(next as usize)?.position;
    n.x += (a.y - b.y) * (a.z + b.z);
    n.y += (a.z - b.z) * (a.x + b.x);
    n.z += (a.x - b.x) * (a.y + b.y);
  }
  Some(n)
}

/// Group of faces inside a primitive (e.g. one tessellated polygon ring set).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Surface {
  pub faces: Vec<Face>,
}

impl Surface {
  pub fn new(faces: Vec<Face>) -> Self {
    Self { faces }
  }
}

/// Self-contained vertex list plus index groups sharing one material.
#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
  pub vertices: Vec<Vertex>,
  pub surfaces: Vec<Surface>,
  /// Index into the scene material list, [`NO_MATERIAL`] when unset.
  pub material: i32,
}

impl Default for Primitive {
  fn default() -> Self {
    Self {
      vertices: Vec::new(),
      surfaces: Vec::new(),
      material: NO_MATERIAL,
    }
  }
}

impl Primitive {
  /// Build a single-surface primitive from vertices and triangle indices.
  pub fn from_triangles(vertices: Vec<Vertex>, triangles: &[[u32; 3]]) -> Self {
    let faces = triangles
      .iter()
      .map(|&[a, b, c]| Face::triangle(a, b, c))
      .collect();
    Self {
      vertices,
      surfaces: vec![Surface::new(faces)],
      material: NO_MATERIAL,
    }
  }

  pub fn with_material(mut self, material: i32) -> Self {
    self.material = material;
    self
  }

  /// Iterate over all faces across surfaces.
  pub fn faces(&self) -> impl Iterator<Item = &Face> {
    self.surfaces.iter().flat_map(|s| s.faces.iter())
  }

  /// Iterate over triangle faces, skipping non-triangulated polygons.
  pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
    self.faces().filter_map(Face::as_triangle)
  }

  pub fn face_count(&self) -> usize {
    self.surfaces.iter().map(|s| s.faces.len()).sum()
  }

  pub fn triangle_count(&self) -> usize {
    self.triangles().count()
  }

  pub fn is_empty(&self) -> bool {
    self.face_count() == 0
  }

  /// Vertices no face refers to. Out-of-range indices are ignored.
  pub fn unreferenced_vertex_count(&self) -> usize {
    let mut used = vec![false; self.vertices.len()];
    for &idx in self.faces().flat_map(|f| f.indices.iter()) {
      if let Some(slot) = used.get_mut(idx as usize) {
        *slot = true;
      }
    }
    used.iter().filter(|&&u| !u).count()
  }

  /// Bounds of all vertex positions (uninitialized if there are none).
  pub fn bounding_box(&self) -> BoundingBox {
    BoundingBox::from_points(self.vertices.iter().map(|v| v.position))
  }

  /// Merge all surfaces into one index stream.
  pub fn flatten_surfaces(&mut self) {
    if self.surfaces.len() <= 1 {
      return;
    }
    let faces = std::mem::take(&mut self.surfaces)
      .into_iter()
      .flat_map(|s| s.faces)
      .collect();
    self.surfaces = vec![Surface::new(faces)];
  }

  /// Clone the given triangles into a new primitive re-indexed from 0.
  ///
  /// Only vertices referenced by `triangles` are copied, in first-use order.
  pub fn subset<I>(&self, triangles: I) -> Primitive
  where
    I: IntoIterator<Item = [u32; 3]>,
  {
    let mut remap: Vec<u32> = vec![u32::MAX; self.vertices.len()];
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for tri in triangles {
      let mut out = [0u32; 3];
      for (slot, &idx) in out.iter_mut().zip(tri.iter()) {
        let mapped = &mut remap[idx as usize];
        if *mapped == u32::MAX {
          *mapped = vertices.len() as u32;
          vertices.push(self.vertices[idx as usize]);
        }
        *slot = *mapped;
      }
      faces.push(Face::triangle(out[0], out[1], out[2]));
    }

    Primitive {
      vertices,
      surfaces: vec![Surface::new(faces)],
      material: self.material,
    }
  }
}

/// Grouping of primitives. Carries no transform of its own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
  pub primitives: Vec<Primitive>,
}

impl Mesh {
  pub fn new(primitives: Vec<Primitive>) -> Self {
    Self { primitives }
  }
}

/// Scene graph node.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
  pub name: String,
  /// Transform relative to the parent node.
  pub local: DMat4,
  /// Cached `world(parent) * local`, refreshed by
  /// [`Scene::update_world_transforms`].
  pub world: DMat4,
  pub children: Vec<Node>,
  pub meshes: Vec<Mesh>,
}

impl Default for Node {
  fn default() -> Self {
    Self {
      name: String::new(),
      local: DMat4::IDENTITY,
      world: DMat4::IDENTITY,
      children: Vec::new(),
      meshes: Vec::new(),
    }
  }
}

impl Node {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Default::default()
    }
  }

  pub fn with_transform(mut self, local: DMat4) -> Self {
    self.local = local;
    self
  }

  pub fn with_child(mut self, child: Node) -> Self {
    self.children.push(child);
    self
  }

  pub fn with_mesh(mut self, mesh: Mesh) -> Self {
    self.meshes.push(mesh);
    self
  }

  /// Clone every primitive in this subtree into one flat list (depth first).
  pub fn extract_primitives(&self) -> Vec<Primitive> {
    let mut out = Vec::new();
    self.collect_primitives(&mut out);
    out
  }

  fn collect_primitives(&self, out: &mut Vec<Primitive>) {
    for mesh in &self.meshes {
      out.extend(mesh.primitives.iter().cloned());
    }
    for child in &self.children {
      child.collect_primitives(out);
    }
  }

  fn drain_primitives(self, out: &mut Vec<Primitive>) {
    for mesh in self.meshes {
      out.extend(mesh.primitives);
    }
    for child in self.children {
      child.drain_primitives(out);
    }
  }

  /// Mutable visit of every primitive in this subtree.
  pub fn for_each_primitive_mut(&mut self, f: &mut impl FnMut(&mut Primitive)) {
    for mesh in &mut self.meshes {
      for primitive in &mut mesh.primitives {
        f(primitive);
      }
    }
    for child in &mut self.children {
      child.for_each_primitive_mut(f);
    }
  }
}

/// Surface appearance passed through to the container writer unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
  pub name: String,
  pub base_color: [f32; 4],
  /// Texture reference as understood by the importer (path or URI).
  pub texture: Option<String>,
  pub double_sided: bool,
}

impl Default for Material {
  fn default() -> Self {
    Self {
      name: String::new(),
      base_color: [1.0, 1.0, 1.0, 1.0],
      texture: None,
      double_sided: false,
    }
  }
}

/// Opaque attribute bag carried from importer to writer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneAttributes {
  pub name: String,
  /// Identity of the source file.
  pub source: String,
  pub extra: BTreeMap<String, String>,
}

/// Root container. Owns every node exclusively.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
  pub roots: Vec<Node>,
  pub materials: Vec<Material>,
  pub attributes: SceneAttributes,
  bounds: Option<BoundingBox>,
}

impl Scene {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      attributes: SceneAttributes {
        name: name.into(),
        ..Default::default()
      },
      ..Default::default()
    }
  }

  pub fn with_root(mut self, node: Node) -> Self {
    self.roots.push(node);
    self.bounds = None;
    self
  }

  pub fn with_material(mut self, material: Material) -> Self {
    self.materials.push(material);
    self
  }

  pub fn name(&self) -> &str {
    &self.attributes.name
  }

  /// World-space bounds of all geometry, computed on first use and cached.
  ///
  /// Returns `None` for a scene without vertices.
  pub fn bounding_box(&mut self) -> Option<BoundingBox> {
    if self.bounds.is_none() {
      self.bounds = self
        .roots
        .iter()
        .filter_map(|root| root.bounding_box(&DMat4::IDENTITY))
        .reduce(|a, b| a.union(&b));
    }
    self.bounds
  }

  /// Drop the cached bounds after geometry was edited directly.
  pub fn invalidate_bounds(&mut self) {
    self.bounds = None;
  }

  /// Mutable visit of every primitive in the scene.
  pub fn for_each_primitive_mut(&mut self, mut f: impl FnMut(&mut Primitive)) {
    for root in &mut self.roots {
      root.for_each_primitive_mut(&mut f);
    }
    self.bounds = None;
  }

  /// Clone every primitive into one flat list.
  pub fn extract_primitives(&self) -> Vec<Primitive> {
    self.roots.iter().flat_map(Node::extract_primitives).collect()
  }

  /// Consume the scene, moving every primitive into one flat list.
  pub fn into_primitives(self) -> Vec<Primitive> {
    let mut out = Vec::new();
    for root in self.roots {
      root.drain_primitives(&mut out);
    }
    out
  }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
