//! Arena-backed tile tree.
//!
//! Nodes live in one `Vec`; children are held by index and the parent link
//! is a plain [`TileId`], so the tree never owns itself cyclically.

use glam::DMat4;

use crate::octree::BoundingBox;
use crate::scene::{Point, Primitive};

/// Index of a node inside its [`TileTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub usize);

/// How a tile's content relates to its parent's.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Refine {
  /// Children supplement the parent content.
  Add,
  /// Children supersede the parent content.
  #[default]
  Replace,
}

/// Geometry resolved at a tile, re-indexed to start at 0.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentPayload {
  Mesh(Vec<Primitive>),
  Points(Vec<Point>),
}

impl ContentPayload {
  /// Triangles for meshes, points for point clouds.
  pub fn item_count(&self) -> usize {
    match self {
      ContentPayload::Mesh(primitives) => primitives.iter().map(Primitive::triangle_count).sum(),
      ContentPayload::Points(points) => points.len(),
    }
  }

  pub fn vertex_count(&self) -> usize {
    match self {
      ContentPayload::Mesh(primitives) => primitives.iter().map(|p| p.vertices.len()).sum(),
      ContentPayload::Points(points) => points.len(),
    }
  }
}

/// Content attached to a tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileContent {
  /// Written verbatim by the container writer.
  pub uri: String,
  pub payload: ContentPayload,
  /// Items pushed down to a finer LOD child instead of resolving here.
  pub deferred: usize,
}

/// One node of the tile tree.
#[derive(Clone, Debug, PartialEq)]
pub struct TileNode {
  /// Path code: `R` root, one octant digit per spatial split, `C` per LOD step.
  pub code: String,
  pub parent: Option<TileId>,
  pub children: Vec<TileId>,
  pub bounds: BoundingBox,
  pub geometric_error: f64,
  pub refine: Refine,
  pub lod_level: u32,
  /// ENU placement frame of this tile.
  pub transform: DMat4,
  /// Set by the encoder once positions were quantized.
  pub quantization: Option<DMat4>,
  pub content: Option<TileContent>,
}

impl TileNode {
  pub fn new(code: impl Into<String>, bounds: BoundingBox, geometric_error: f64) -> Self {
    Self {
      code: code.into(),
      parent: None,
      children: Vec::new(),
      bounds,
      geometric_error,
      refine: Refine::Replace,
      lod_level: 0,
      transform: DMat4::IDENTITY,
      quantization: None,
      content: None,
    }
  }

  pub fn with_lod_level(mut self, lod_level: u32) -> Self {
    self.lod_level = lod_level;
    self
  }

  pub fn with_transform(mut self, transform: DMat4) -> Self {
    self.transform = transform;
    self
  }

  #[inline]
  pub fn has_content(&self) -> bool {
    self.content.is_some()
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }
}

/// Tile hierarchy produced by one tiling run. Node 0 is the root.
#[derive(Clone, Debug, PartialEq)]
pub struct TileTree {
  nodes: Vec<TileNode>,
}

impl TileTree {
  pub fn new(root: TileNode) -> Self {
    Self { nodes: vec![root] }
  }

  #[inline]
  pub fn root(&self) -> TileId {
    TileId(0)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  #[inline]
  pub fn get(&self, id: TileId) -> &TileNode {
    &self.nodes[id.0]
  }

  #[inline]
  pub fn get_mut(&mut self, id: TileId) -> &mut TileNode {
    &mut self.nodes[id.0]
  }

  /// Attach `node` under `parent`, returning its id.
  pub fn add_child(&mut self, parent: TileId, mut node: TileNode) -> TileId {
    let id = TileId(self.nodes.len());
    node.parent = Some(parent);
    self.nodes.push(node);
    self.nodes[parent.0].children.push(id);
    id
  }

  pub fn parent(&self, id: TileId) -> Option<TileId> {
    self.nodes[id.0].parent
  }

  pub fn children(&self, id: TileId) -> &[TileId] {
    &self.nodes[id.0].children
  }

  /// Number of edges between `id` and the root.
  pub fn depth(&self, id: TileId) -> usize {
    let mut depth = 0;
    let mut current = id;
    while let Some(parent) = self.parent(current) {
      depth += 1;
      current = parent;
    }
    depth
  }

  /// Ancestors of `id`, nearest first.
  pub fn ancestors(&self, id: TileId) -> impl Iterator<Item = TileId> + '_ {
    std::iter::successors(self.parent(id), move |&p| self.parent(p))
  }

  /// Nodes in insertion order (parents always before children).
  pub fn iter(&self) -> impl Iterator<Item = (TileId, &TileNode)> {
    self.nodes.iter().enumerate().map(|(i, n)| (TileId(i), n))
  }

  pub fn iter_mut(&mut self) -> impl Iterator<Item = (TileId, &mut TileNode)> {
    self.nodes.iter_mut().enumerate().map(|(i, n)| (TileId(i), n))
  }

  pub fn content_nodes(&self) -> impl Iterator<Item = (TileId, &TileNode)> {
    self.iter().filter(|(_, n)| n.has_content())
  }

  pub fn leaves(&self) -> impl Iterator<Item = (TileId, &TileNode)> {
    self.iter().filter(|(_, n)| n.is_leaf())
  }

  pub fn find(&self, code: &str) -> Option<TileId> {
    self.iter().find(|(_, n)| n.code == code).map(|(id, _)| id)
  }

  /// Sum of content item counts over the whole tree.
  pub fn total_items(&self) -> usize {
    self
      .nodes
      .iter()
      .filter_map(|n| n.content.as_ref())
      .map(|c| c.payload.item_count())
      .sum()
  }

  /// Deepest node depth.
  pub fn max_depth(&self) -> usize {
    // Insertion order keeps parents first, so one forward pass suffices.
    let mut depths = vec![0usize; self.nodes.len()];
    for (i, node) in self.nodes.iter().enumerate() {
      if let Some(parent) = node.parent {
        depths[i] = depths[parent.0] + 1;
      }
    }
    depths.into_iter().max().unwrap_or(0)
  }
}

#[cfg(test)]
mod tests {
  use glam::DVec3;

  use super::*;

  fn unit_box() -> BoundingBox {
    BoundingBox::new(DVec3::ZERO, DVec3::ONE)
  }

  #[test]
  fn test_parent_links() {
    let mut tree = TileTree::new(TileNode::new("R", unit_box(), 10.0));
    let a = tree.add_child(tree.root(), TileNode::new("R0", unit_box(), 5.0));
    let b = tree.add_child(a, TileNode::new("R0C", unit_box(), 2.0));

    assert_eq!(tree.parent(b), Some(a));
    assert_eq!(tree.children(tree.root()), &[a]);
    assert_eq!(tree.depth(b), 2);
    assert_eq!(tree.ancestors(b).collect::<Vec<_>>(), vec![a, TileId(0)]);
    assert_eq!(tree.find("R0C"), Some(b));
    assert_eq!(tree.max_depth(), 2);
    assert_eq!(tree.leaves().count(), 1);
  }

  #[test]
  fn test_total_items() {
    let mut tree = TileTree::new(TileNode::new("R", unit_box(), 10.0));
    tree.get_mut(tree.root()).content = Some(TileContent {
      uri: "R.pnts".into(),
      payload: ContentPayload::Points(vec![Point::new(DVec3::ZERO); 3]),
      deferred: 0,
    });
    assert_eq!(tree.total_items(), 3);
    assert_eq!(tree.content_nodes().count(), 1);
  }
}
