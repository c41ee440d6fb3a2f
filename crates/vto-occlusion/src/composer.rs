use log::debug;
use vto_core::{
    AssetRef, Geometry, NodeIdAllocator, NodeMetadata, NodeTransform, OccluderSpec, SceneNode,
};

use crate::loader::{AssetLoader, LoadError};

#[cfg(feature = "tracing")]
use tracing::instrument;

pub const CYLINDER_RADIAL_SEGMENTS: u32 = 32;
pub const CYLINDER_HEIGHT_SEGMENTS: u32 = 1;

/// Errors raised while building an occluder.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OcclusionError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("occluder asset {0} has no child under its scene root")]
    EmptyScene(AssetRef),
}

/// Build the occluder node for a mode's [`OccluderSpec`].
///
/// Returns `Ok(None)` for [`OccluderSpec::None`]. Only the `Model` variant
/// touches the loader, and its failures are returned as-is (no retry).
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(loader, ids)))]
pub fn build_occluder<L: AssetLoader + ?Sized>(
    spec: &OccluderSpec,
    loader: &mut L,
    ids: &mut NodeIdAllocator,
) -> Result<Option<SceneNode>, OcclusionError> {
    match spec {
        OccluderSpec::None => Ok(None),
        OccluderSpec::SoftCylinder {
            radius_range,
            height,
            offset,
            quaternion,
        } => Ok(Some(soft_cylinder(
            *radius_range,
            *height,
            *offset,
            *quaternion,
            ids,
        ))),
        OccluderSpec::Model { asset, scale } => {
            let scene = loader.load(asset)?;
            let first = scene
                .first_child()
                .ok_or_else(|| OcclusionError::EmptyScene(asset.clone()))?;
            let mut node = first.clone_with_ids(ids);
            node.transform.scale *= *scale;
            node.metadata = NodeMetadata::occluder();
            debug!("occluder mesh {asset} loaded ({} nodes)", node.node_count());
            Ok(Some(node))
        }
    }
}

fn soft_cylinder(
    radius_range: [f32; 2],
    height: f32,
    offset: [f32; 3],
    quaternion: [f32; 4],
    ids: &mut NodeIdAllocator,
) -> SceneNode {
    let [inner, outer] = radius_range;
    let mut transform = NodeTransform::from_translation(offset);
    transform.set_quaternion(quaternion);

    let mut node = SceneNode::new(
        ids.alloc(),
        "softOccluder",
        Geometry::Cylinder {
            radius_top: outer,
            radius_bottom: outer,
            height,
            radial_segments: CYLINDER_RADIAL_SEGMENTS,
            height_segments: CYLINDER_HEIGHT_SEGMENTS,
            open_ended: true,
        },
    );
    node.transform = transform;
    node.metadata = NodeMetadata {
        is_occluder: true,
        is_soft_occluder: true,
        soft_occluder_radius: Some(outer),
        soft_occluder_dr: Some(outer - inner),
    };
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryLoader, LoadedScene};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn wrist_cylinder() -> OccluderSpec {
        OccluderSpec::SoftCylinder {
            radius_range: [3.5, 4.5],
            height: 48.0,
            offset: [0.0, 0.0, 0.0],
            quaternion: [0.707, 0.0, 0.0, 0.707],
        }
    }

    fn ring_scene(ids: &mut NodeIdAllocator) -> LoadedScene {
        let mut mesh = SceneNode::new(
            ids.alloc(),
            "ringOccluder",
            Geometry::Mesh {
                source: "ringOccluder2.glb#0".to_string(),
            },
        );
        mesh.transform.scale = 2.0;
        LoadedScene::new(SceneNode::group(ids.alloc(), "Scene").with_child(mesh))
    }

    #[test]
    fn none_builds_nothing() {
        let mut loader = InMemoryLoader::new();
        let mut ids = NodeIdAllocator::new();
        let out = build_occluder(&OccluderSpec::None, &mut loader, &mut ids).expect("build");
        assert!(out.is_none());
        assert_eq!(loader.load_count(), 0);
    }

    #[test]
    fn soft_cylinder_carries_fade_metadata() {
        let mut loader = InMemoryLoader::new();
        let mut ids = NodeIdAllocator::new();
        let node = build_occluder(&wrist_cylinder(), &mut loader, &mut ids)
            .expect("build")
            .expect("occluder");

        assert!(node.metadata.is_occluder);
        assert!(node.metadata.is_soft_occluder);
        assert_eq!(node.metadata.soft_occluder_radius, Some(4.5));
        assert_eq!(node.metadata.soft_occluder_dr, Some(1.0));
        assert_eq!(
            node.geometry,
            Geometry::Cylinder {
                radius_top: 4.5,
                radius_bottom: 4.5,
                height: 48.0,
                radial_segments: 32,
                height_segments: 1,
                open_ended: true,
            }
        );
        assert_relative_eq!(
            node.transform.rotation.angle(),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-3
        );
        assert_eq!(loader.load_count(), 0);
    }

    #[test]
    fn soft_cylinder_is_placed_at_offset() {
        let mut loader = InMemoryLoader::new();
        let mut ids = NodeIdAllocator::new();
        let spec = OccluderSpec::SoftCylinder {
            radius_range: [1.0, 3.0],
            height: 10.0,
            offset: [0.5, -1.0, 2.0],
            quaternion: [0.0, 0.0, 0.0, 1.0],
        };
        let node = build_occluder(&spec, &mut loader, &mut ids)
            .expect("build")
            .expect("occluder");
        assert_eq!(node.transform.translation, Vector3::new(0.5, -1.0, 2.0));
        assert_eq!(node.metadata.soft_occluder_dr, Some(2.0));
    }

    #[test]
    fn model_occluder_is_cloned_scaled_and_tagged() {
        let mut ids = NodeIdAllocator::new();
        let asset = AssetRef::new("ringOccluder2.glb");
        let scene = ring_scene(&mut ids);
        let source_id = scene.first_child().expect("child").id;
        let mut loader = InMemoryLoader::new().with_scene(asset.clone(), scene);

        let spec = OccluderSpec::Model { asset, scale: 1.5 };
        let node = build_occluder(&spec, &mut loader, &mut ids)
            .expect("build")
            .expect("occluder");

        assert_ne!(node.id, source_id);
        assert_eq!(node.transform.scale, 3.0);
        assert!(node.metadata.is_occluder);
        assert!(!node.metadata.is_soft_occluder);
        assert_eq!(loader.load_count(), 1);
    }

    #[test]
    fn model_occluder_load_failure_propagates() {
        let mut loader = InMemoryLoader::new();
        let mut ids = NodeIdAllocator::new();
        let asset = AssetRef::new("missing.glb");
        let err = build_occluder(
            &OccluderSpec::Model {
                asset: asset.clone(),
                scale: 1.0,
            },
            &mut loader,
            &mut ids,
        )
        .expect_err("missing asset");
        assert_eq!(err, OcclusionError::Load(LoadError::NotFound(asset)));
        assert_eq!(loader.load_count(), 1);
    }

    #[test]
    fn model_occluder_needs_a_child() {
        let mut ids = NodeIdAllocator::new();
        let asset = AssetRef::new("empty.glb");
        let mut loader = InMemoryLoader::new().with_scene(
            asset.clone(),
            LoadedScene::new(SceneNode::group(ids.alloc(), "Scene")),
        );
        let err = build_occluder(
            &OccluderSpec::Model {
                asset: asset.clone(),
                scale: 1.0,
            },
            &mut loader,
            &mut ids,
        )
        .expect_err("empty scene");
        assert_eq!(err, OcclusionError::EmptyScene(asset));
    }
}
