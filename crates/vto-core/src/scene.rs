//! Minimal scene node type used to describe the anchor subtree.
//!
//! This is not a scene graph engine: nodes only carry what the try-on
//! renderer needs to know (local transform, a geometry tag, occluder
//! metadata) and the renderer itself is external.

use nalgebra::{Quaternion, Similarity3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Identifier of a node inside the render graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Monotonic node id source.
#[derive(Clone, Debug, Default)]
pub struct NodeIdAllocator {
    next: u64,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// Local transform with uniform scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeTransform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: f32,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl NodeTransform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: 1.0,
        }
    }

    pub fn from_translation(t: [f32; 3]) -> Self {
        Self {
            translation: Vector3::from(t),
            ..Self::identity()
        }
    }

    /// Set the orientation from `[x, y, z, w]`.
    ///
    /// A degenerate (near-zero) quaternion leaves the current rotation intact.
    pub fn set_quaternion(&mut self, q: [f32; 4]) {
        let [x, y, z, w] = q;
        if let Some(rotation) = UnitQuaternion::try_new(Quaternion::new(w, x, y, z), 1e-6) {
            self.rotation = rotation;
        }
    }

    /// `None` for a zero scale, which collapses the node.
    pub fn to_similarity(&self) -> Option<Similarity3<f32>> {
        if self.scale == 0.0 || !self.scale.is_finite() {
            return None;
        }
        Some(Similarity3::from_parts(
            Translation3::from(self.translation),
            self.rotation,
            self.scale,
        ))
    }
}

/// What a node draws.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    /// Pure transform node.
    Group,
    /// Mesh coming from a loaded asset.
    Mesh { source: String },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
        open_ended: bool,
    },
    /// Placeholder cube shown while no model can be displayed.
    DebugCube { size: f32 },
}

/// Per-node metadata read by the occlusion pass of the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub is_occluder: bool,
    pub is_soft_occluder: bool,
    /// Outer radius of a soft occluder.
    pub soft_occluder_radius: Option<f32>,
    /// Width of the radial fade band of a soft occluder.
    pub soft_occluder_dr: Option<f32>,
}

impl NodeMetadata {
    pub fn occluder() -> Self {
        Self {
            is_occluder: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub transform: NodeTransform,
    pub geometry: Geometry,
    pub metadata: NodeMetadata,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(id: NodeId, name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id,
            name: name.into(),
            transform: NodeTransform::identity(),
            geometry,
            metadata: NodeMetadata::default(),
            children: Vec::new(),
        }
    }

    pub fn group(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, Geometry::Group)
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Deep copy with fresh ids for every node of the copy.
    pub fn clone_with_ids(&self, ids: &mut NodeIdAllocator) -> SceneNode {
        SceneNode {
            id: ids.alloc(),
            name: self.name.clone(),
            transform: self.transform,
            geometry: self.geometry.clone(),
            metadata: self.metadata,
            children: self
                .children
                .iter()
                .map(|c| c.clone_with_ids(ids))
                .collect(),
        }
    }

    /// Depth-first search by id.
    pub fn find(&self, id: NodeId) -> Option<&SceneNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    /// Whether any node of this subtree is tagged as an occluder.
    pub fn contains_occluder(&self) -> bool {
        self.metadata.is_occluder || self.children.iter().any(SceneNode::contains_occluder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn clone_with_ids_renumbers_subtree() {
        let mut ids = NodeIdAllocator::new();
        let root = SceneNode::group(ids.alloc(), "root")
            .with_child(SceneNode::group(ids.alloc(), "a"))
            .with_child(SceneNode::group(ids.alloc(), "b"));
        let copy = root.clone_with_ids(&mut ids);

        assert_eq!(copy.node_count(), 3);
        assert_eq!(copy.id, NodeId(3));
        assert!(root.find(copy.id).is_none());
        assert!(copy.find(NodeId(5)).is_some());
    }

    #[test]
    fn degenerate_quaternion_keeps_rotation() {
        let mut t = NodeTransform::identity();
        t.set_quaternion([0.0, 0.0, 0.0, 0.0]);
        assert_eq!(t.rotation, UnitQuaternion::identity());

        t.set_quaternion([0.707, 0.0, 0.0, 0.707]);
        assert_relative_eq!(t.rotation.angle(), std::f32::consts::FRAC_PI_2, epsilon = 1e-3);
    }
}
