use serde::Serialize;
use std::fmt;
use vto_core::{ModeDescriptor, ModelDescriptor, PoseTransform, ViewportGeometry};

use crate::tracker::{FacingMode, RequestId};

/// Tracker lifecycle phase.
///
/// ```text
/// Uninitialized -> Initializing -> Ready <-> ModeSwitching
///                       |           ^  <-> CameraFlipping
///                       v           |
///                     Failed        any non-terminal -> Destroying -> Destroyed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecyclePhase {
    Uninitialized,
    Initializing,
    Ready,
    ModeSwitching,
    CameraFlipping,
    /// Tracker startup failed; only `destroy` is accepted.
    Failed,
    Destroying,
    Destroyed,
}

impl LifecyclePhase {
    /// Phases in which a tracker handle is alive.
    #[inline]
    pub fn has_tracker(self) -> bool {
        matches!(
            self,
            Self::Ready | Self::ModeSwitching | Self::CameraFlipping
        )
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self == Self::Destroyed
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::ModeSwitching => "switching mode",
            Self::CameraFlipping => "flipping camera",
            Self::Failed => "failed",
            Self::Destroying => "destroying",
            Self::Destroyed => "destroyed",
        })
    }
}

/// Proof that the tracker finished starting up. Exactly one exists while the
/// phase has a tracker, and it is consumed on teardown.
#[derive(Debug, PartialEq, Eq)]
pub struct TrackerHandle {
    started_by: RequestId,
}

impl TrackerHandle {
    pub(crate) fn new(started_by: RequestId) -> Self {
        Self { started_by }
    }

    /// The init request that produced this handle.
    #[inline]
    pub fn started_by(&self) -> RequestId {
        self.started_by
    }
}

/// Authoritative session snapshot. Only the controller writes it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionState {
    pub model_key: String,
    pub model: ModelDescriptor,
    pub pose: PoseTransform,
    pub mode_key: String,
    pub mode: ModeDescriptor,
    /// Mode that was current before the last applied mode switch.
    pub previous_mode: Option<String>,
    /// Display is mirrored (front camera).
    pub mirrored: bool,
    pub facing: FacingMode,
    pub viewport: ViewportGeometry,
    pub phase: LifecyclePhase,
}
