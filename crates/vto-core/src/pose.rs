use serde::{Deserialize, Serialize};

use crate::ModelDescriptor;

/// Model placement in tracker space.
///
/// Each component is independently optional: whatever the descriptor leaves
/// out stays absent and the renderer keeps the node's own default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseTransform {
    pub translation: Option<[f32; 3]>,
    /// `[x, y, z, w]`.
    pub quaternion: Option<[f32; 4]>,
    pub scale: Option<f32>,
}

/// Convert an authored (Y-up) placement into the tracker's camera-relative frame.
///
/// `(tx, ty, tz) -> (tx, tz, -ty)` and `(qx, qy, qz, qw) -> (qx, qz, -qy, qw)`;
/// scale is passed through. Every change of rendering space must go through
/// here.
pub fn compute_pose(descriptor: &ModelDescriptor) -> PoseTransform {
    PoseTransform {
        translation: descriptor.translation.map(|[x, y, z]| [x, z, -y]),
        quaternion: descriptor.quaternion.map(|[x, y, z, w]| [x, z, -y, w]),
        scale: descriptor.scale,
    }
}
