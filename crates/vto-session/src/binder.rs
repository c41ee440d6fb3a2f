//! Anchor subtree ownership.
//!
//! Layout of the subtree (matching what the tracker expects for followers):
//!
//! ```text
//! anchor            <- tracked transform, written every frame
//! └── follower      <- registered with the tracker as the followed child
//!     └── content
//!         ├── model     (local transform = PoseTransform)
//!         └── occluder  (optional, own local transform)
//! ```
//!
//! Since the tracked pose lives on `anchor` and the authored placement on
//! `model`, the two compose instead of overwriting each other.

use nalgebra::Similarity3;
use vto_core::{Geometry, NodeId, NodeIdAllocator, NodeTransform, PoseTransform, SceneNode};

/// Apply a tracker-space pose to a freshly cloned model node.
///
/// Scale replaces the node's scale, translation is added to its position and
/// the quaternion replaces its orientation. Absent components are skipped.
pub fn apply_pose(node: &mut SceneNode, pose: &PoseTransform) {
    if let Some(s) = pose.scale {
        node.transform.scale = s;
    }
    if let Some([x, y, z]) = pose.translation {
        node.transform.translation += nalgebra::Vector3::new(x, y, z);
    }
    if let Some(q) = pose.quaternion {
        node.transform.set_quaternion(q);
    }
}

/// A complete, detached anchor subtree.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorSubtree {
    pub root: SceneNode,
    pub follower: NodeId,
    pub model: NodeId,
    pub occluder: Option<NodeId>,
    /// The model could not be loaded and a placeholder is shown instead.
    pub placeholder: bool,
}

impl AnchorSubtree {
    fn model_node(&self) -> Option<&SceneNode> {
        self.root.find(self.model)
    }
}

/// Per-frame outcome of [`SceneBinder::apply_frame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameState {
    /// An anchor subtree is attached.
    pub anchored: bool,
    /// The tracker reported a pose this frame.
    pub tracked: bool,
    /// World transform of the model node, when both of the above hold.
    pub model_world: Option<Similarity3<f32>>,
}

/// Owns the (at most one) attached anchor subtree.
#[derive(Debug, Default)]
pub struct SceneBinder {
    ids: NodeIdAllocator,
    anchor: Option<AnchorSubtree>,
}

impl SceneBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id source shared by everything placed under the anchor.
    #[inline]
    pub fn ids_mut(&mut self) -> &mut NodeIdAllocator {
        &mut self.ids
    }

    /// Unit cube shown in place of a model that failed to load.
    pub fn placeholder_model(&mut self) -> SceneNode {
        SceneNode::new(
            self.ids.alloc(),
            "placeholder",
            Geometry::DebugCube { size: 1.0 },
        )
    }

    /// Assemble a detached subtree around `model` (already cloned) and `occluder`.
    pub fn build_subtree(
        &mut self,
        mut model: SceneNode,
        pose: &PoseTransform,
        occluder: Option<SceneNode>,
        placeholder: bool,
    ) -> AnchorSubtree {
        apply_pose(&mut model, pose);
        let model_id = model.id;
        let occluder_id = occluder.as_ref().map(|o| o.id);

        let mut content = SceneNode::group(self.ids.alloc(), "content").with_child(model);
        if let Some(occluder) = occluder {
            content.children.push(occluder);
        }
        let follower = SceneNode::group(self.ids.alloc(), "follower").with_child(content);
        let follower_id = follower.id;
        let root = SceneNode::group(self.ids.alloc(), "anchor").with_child(follower);

        AnchorSubtree {
            root,
            follower: follower_id,
            model: model_id,
            occluder: occluder_id,
            placeholder,
        }
    }

    /// Attach `subtree`, detaching the current one first.
    ///
    /// Returns the `(parent, child)` pair to register as tracker follower.
    pub fn attach(&mut self, subtree: AnchorSubtree) -> (NodeId, NodeId) {
        self.detach();
        let pair = (subtree.root.id, subtree.follower);
        self.anchor = Some(subtree);
        pair
    }

    pub fn detach(&mut self) -> Option<AnchorSubtree> {
        self.anchor.take()
    }

    #[inline]
    pub fn anchor(&self) -> Option<&AnchorSubtree> {
        self.anchor.as_ref()
    }

    #[inline]
    pub fn anchor_count(&self) -> usize {
        usize::from(self.anchor.is_some())
    }

    /// Write this frame's tracked pose onto the anchor node.
    pub fn apply_frame(&mut self, tracked: Option<Similarity3<f32>>) -> FrameState {
        let Some(anchor) = self.anchor.as_mut() else {
            return FrameState {
                anchored: false,
                tracked: tracked.is_some(),
                model_world: None,
            };
        };

        let Some(pose) = tracked else {
            return FrameState {
                anchored: true,
                tracked: false,
                model_world: None,
            };
        };

        anchor.root.transform = NodeTransform {
            translation: pose.isometry.translation.vector,
            rotation: pose.isometry.rotation,
            scale: pose.scaling(),
        };
        let model_world = anchor
            .model_node()
            .and_then(|m| m.transform.to_similarity())
            .map(|local| pose * local);

        FrameState {
            anchored: true,
            tracked: true,
            model_world,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Translation3, UnitQuaternion, Vector3};
    use vto_core::NodeMetadata;

    fn mesh(binder: &mut SceneBinder, name: &str) -> SceneNode {
        let id = binder.ids_mut().alloc();
        SceneNode::new(
            id,
            name,
            Geometry::Mesh {
                source: format!("{name}.glb"),
            },
        )
    }

    #[test]
    fn apply_pose_composes_like_the_renderer() {
        let mut ids = NodeIdAllocator::new();
        let mut node = SceneNode::group(ids.alloc(), "m");
        node.transform.translation = Vector3::new(1.0, 0.0, 0.0);
        node.transform.scale = 4.0;

        apply_pose(
            &mut node,
            &PoseTransform {
                translation: Some([0.5, 1.0, -2.0]),
                quaternion: None,
                scale: Some(2.0),
            },
        );
        assert_eq!(node.transform.translation, Vector3::new(1.5, 1.0, -2.0));
        assert_eq!(node.transform.scale, 2.0);
        assert_eq!(node.transform.rotation, UnitQuaternion::identity());
    }

    #[test]
    fn attach_replaces_previous_subtree() {
        let mut binder = SceneBinder::new();
        let first_model = mesh(&mut binder, "watch");
        let first = binder.build_subtree(first_model, &PoseTransform::default(), None, false);
        let (parent, child) = binder.attach(first);
        assert_eq!(binder.anchor_count(), 1);
        assert_eq!(binder.anchor().map(|a| a.root.id), Some(parent));
        assert_eq!(binder.anchor().map(|a| a.follower), Some(child));

        let mut occluder = mesh(&mut binder, "occluder");
        occluder.metadata = NodeMetadata::occluder();
        let second_model = mesh(&mut binder, "ring");
        let second =
            binder.build_subtree(second_model, &PoseTransform::default(), Some(occluder), false);
        let (parent2, _) = binder.attach(second);

        assert_ne!(parent, parent2);
        assert_eq!(binder.anchor_count(), 1);
        let anchor = binder.anchor().expect("anchor");
        assert!(anchor.root.find(parent).is_none());
        assert!(anchor.root.contains_occluder());

        assert!(binder.detach().is_some());
        assert_eq!(binder.anchor_count(), 0);
    }

    #[test]
    fn tracked_pose_and_authored_pose_compose() {
        let mut binder = SceneBinder::new();
        let model = mesh(&mut binder, "watch");
        let pose = PoseTransform {
            translation: Some([0.0, 0.0, 1.0]),
            quaternion: None,
            scale: Some(2.0),
        };
        let subtree = binder.build_subtree(model, &pose, None, false);
        binder.attach(subtree);

        let tracked = Similarity3::from_parts(
            Translation3::new(10.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2),
            1.0,
        );
        let frame = binder.apply_frame(Some(tracked));
        assert!(frame.anchored && frame.tracked);

        let world = frame.model_world.expect("world transform");
        // Model origin: pushed 1 along local z, rotated +90deg about y -> +x.
        let origin = world.transform_point(&Point3::origin());
        assert_relative_eq!(origin, Point3::new(11.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(world.scaling(), 2.0, epsilon = 1e-6);

        let anchor = binder.anchor().expect("anchor");
        assert_relative_eq!(
            anchor.root.transform.translation,
            Vector3::new(10.0, 0.0, 0.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn untracked_frame_leaves_content_unplaced() {
        let mut binder = SceneBinder::new();
        assert_eq!(
            binder.apply_frame(None),
            FrameState {
                anchored: false,
                tracked: false,
                model_world: None,
            }
        );

        let model = binder.placeholder_model();
        let subtree = binder.build_subtree(model, &PoseTransform::default(), None, true);
        binder.attach(subtree);
        let frame = binder.apply_frame(None);
        assert!(frame.anchored);
        assert!(!frame.tracked);
        assert!(binder.anchor().expect("anchor").placeholder);
    }
}
