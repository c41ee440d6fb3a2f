//! Model, mode and occluder descriptors.
//!
//! All vectors here are plain arrays in *authoring* space; conversion into
//! tracker space happens only in [`crate::compute_pose`].

use serde::{Deserialize, Serialize};
use std::fmt;

const LOCAL_BLOB_PREFIX: &str = "blob:";

/// Reference to a 3D asset: a URL/path, or a local blob produced by a file upload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Reference to a user-provided blob (e.g. an uploaded `.glb`).
    pub fn local_blob(id: impl fmt::Display) -> Self {
        Self(format!("{LOCAL_BLOB_PREFIX}{id}"))
    }

    #[inline]
    pub fn is_local_blob(&self) -> bool {
        self.0.starts_with(LOCAL_BLOB_PREFIX)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a landmark-detection neural network understood by the tracker.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeuralNetRef(String);

impl NeuralNetRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A placeable 3D asset and its authored placement.
///
/// Descriptors are never mutated once built; a model swap always produces a
/// new descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Key of the tracking mode this model is designed for.
    pub mode: String,
    pub asset: AssetRef,
    #[serde(default)]
    pub scale: Option<f32>,
    /// Authoring-space offset (Y-up).
    #[serde(default)]
    pub translation: Option<[f32; 3]>,
    /// Authoring-space orientation, `[x, y, z, w]`.
    #[serde(default)]
    pub quaternion: Option<[f32; 4]>,
}

impl ModelDescriptor {
    pub fn new(mode: impl Into<String>, asset: AssetRef) -> Self {
        Self {
            mode: mode.into(),
            asset,
            scale: None,
            translation: None,
            quaternion: None,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_translation(mut self, translation: [f32; 3]) -> Self {
        self.translation = Some(translation);
        self
    }

    pub fn with_quaternion(mut self, quaternion: [f32; 4]) -> Self {
        self.quaternion = Some(quaternion);
        self
    }
}

/// One-euro landmark stabilizer tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StabilizerSpec {
    pub min_cut_off: f32,
    pub beta: f32,
}

/// Occlusion geometry attached next to the model in the anchor subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OccluderSpec {
    #[default]
    None,
    /// Open-ended cylinder whose occlusion fades between the two radii.
    SoftCylinder {
        /// `[inner, outer]` radius; the shell is built at the outer radius.
        radius_range: [f32; 2],
        height: f32,
        #[serde(default)]
        offset: [f32; 3],
        #[serde(default = "identity_quaternion")]
        quaternion: [f32; 4],
    },
    /// Bespoke occluder mesh loaded from an asset.
    Model {
        asset: AssetRef,
        #[serde(default = "unit_scale")]
        scale: f32,
    },
}

fn identity_quaternion() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> f32 {
    1.0
}

/// Tracking mode ("wrist", "ring", ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeDescriptor {
    /// Detection sensitivity in `[0, 1]`.
    pub threshold: f32,
    pub nets: Vec<NeuralNetRef>,
    /// Expected landmark labels, in the order the nets emit them.
    pub landmark_labels: Vec<String>,
    /// Whether the flip-rejecting pose filter is applied.
    #[serde(default)]
    pub pose_filter: bool,
    #[serde(default)]
    pub occluder: OccluderSpec,
    pub stabilizer: StabilizerSpec,
    #[serde(default = "unit_factors")]
    pub object_points_position_factors: [f32; 3],
}

fn unit_factors() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
