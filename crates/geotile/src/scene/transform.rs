//! Hierarchical transform composition, bounds and flattening.
//!
//! `world(node) = world(parent) * local(node)`. Tiles need all geometry in
//! one shared frame, so tiling runs after [`Scene::flatten_transforms`] has
//! baked every world transform into vertex positions.

use glam::{DMat3, DMat4};

use super::{Node, Scene};
use crate::octree::BoundingBox;

impl Node {
  /// Bounds of this subtree under `parent_transform`.
  ///
  /// Vertices are transformed individually (tighter than transforming
  /// mesh boxes). Returns `None` when the subtree holds no vertices.
  pub fn bounding_box(&self, parent_transform: &DMat4) -> Option<BoundingBox> {
    let world = *parent_transform * self.local;
    let mut bounds = BoundingBox::empty();

    for mesh in &self.meshes {
      for primitive in &mesh.primitives {
        for vertex in &primitive.vertices {
          bounds.add_point(world.transform_point3(vertex.position));
        }
      }
    }

    for child in &self.children {
      if let Some(child_bounds) = child.bounding_box(&world) {
        bounds = bounds.union(&child_bounds);
      }
    }

    bounds.is_valid().then_some(bounds)
  }

  fn update_world(&mut self, parent: &DMat4) {
    self.world = *parent * self.local;
    let world = self.world;
    for child in &mut self.children {
      child.update_world(&world);
    }
  }
}

/// Bake `parent * local` into this subtree's vertices, then reset every
/// transform to identity.
///
/// Normals go through the inverse-transpose and are renormalized; cached
/// face normals are cleared. Re-applying to an identity subtree is a no-op.
pub fn flatten_transform(node: &mut Node, parent: &DMat4) {
  let world = *parent * node.local;

  if world != DMat4::IDENTITY {
    let linear = DMat3::from_mat4(world);
    let det = linear.determinant();
    let normal_matrix = (det != 0.0).then(|| linear.inverse().transpose());

    for mesh in &mut node.meshes {
      for primitive in &mut mesh.primitives {
        for vertex in &mut primitive.vertices {
          vertex.position = world.transform_point3(vertex.position);
          vertex.quantized = None;
          if let (Some(normal), Some(m)) = (vertex.normal.as_mut(), normal_matrix.as_ref()) {
            let n = *m * *normal;
            let len = n.length();
            if len > 0.0 {
              *normal = n / len;
            }
          }
        }
        for surface in &mut primitive.surfaces {
          for face in &mut surface.faces {
            face.normal = None;
          }
        }
      }
    }
  }

  for child in &mut node.children {
    flatten_transform(child, &world);
  }

  node.local = DMat4::IDENTITY;
  node.world = DMat4::IDENTITY;
}

impl Scene {
  /// Recompute every cached world transform in one top-down pass.
  pub fn update_world_transforms(&mut self) {
    for root in &mut self.roots {
      root.update_world(&DMat4::IDENTITY);
    }
  }

  /// Flatten every root (see [`flatten_transform`]).
  pub fn flatten_transforms(&mut self) {
    for root in &mut self.roots {
      flatten_transform(root, &DMat4::IDENTITY);
    }
    self.invalidate_bounds();
  }
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;
