//! Interface of the external hand/wrist tracking engine.
//!
//! The engine is asynchronous: `init`, `update` and `update_video_settings`
//! return immediately and their outcome is delivered later to
//! [`crate::SessionController::handle_tracker_event`] as a [`TrackerEvent`]
//! carrying the same [`RequestId`]. The remaining calls are synchronous.

use nalgebra::{Isometry3, Similarity3};
use serde::{Deserialize, Serialize};
use vto_core::{ModeDescriptor, NeuralNetRef, NodeId, StabilizerSpec, ViewportGeometry};

use crate::config::TrackerSettings;

/// Correlates an asynchronous tracker call with its completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Opaque handle to the canvas the tracker captures video into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasHandle(pub u64);

/// Pose filter the tracker should apply to raw landmark poses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseFilter {
    /// Rejects sudden front/back flips of the wrist pose.
    Flip,
}

impl PoseFilter {
    pub fn for_mode(mode: &ModeDescriptor) -> Option<Self> {
        mode.pose_filter.then_some(PoseFilter::Flip)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front (selfie) camera.
    User,
    /// Rear camera.
    Environment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSettings {
    pub facing_mode: FacingMode,
}

/// Everything the tracker needs to start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerInitConfig {
    pub threshold: f32,
    pub landmark_labels: Vec<String>,
    pub nets: Vec<NeuralNetRef>,
    pub pose_filter: Option<PoseFilter>,
    pub stabilizer: StabilizerSpec,
    pub canvas: CanvasHandle,
    pub object_points_position_factors: [f32; 3],
    pub max_hands_detected: u32,
    pub enable_flip_object: bool,
    pub camera_zoom: f32,
    pub switch_nn_error_threshold: f32,
    pub translation_scaling_factors: [f32; 3],
    pub debug_display_landmarks: bool,
}

impl TrackerInitConfig {
    pub fn new(mode: &ModeDescriptor, settings: &TrackerSettings, canvas: CanvasHandle) -> Self {
        Self {
            threshold: mode.threshold,
            landmark_labels: mode.landmark_labels.clone(),
            nets: mode.nets.clone(),
            pose_filter: PoseFilter::for_mode(mode),
            stabilizer: mode.stabilizer,
            canvas,
            object_points_position_factors: mode.object_points_position_factors,
            max_hands_detected: settings.max_hands_detected,
            enable_flip_object: settings.enable_flip_object,
            camera_zoom: settings.camera_zoom,
            switch_nn_error_threshold: settings.switch_nn_error_threshold,
            translation_scaling_factors: settings.translation_scaling_factors,
            debug_display_landmarks: settings.debug_display_landmarks,
        }
    }
}

/// Detection parameters swapped in on a mode change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerUpdate {
    pub threshold: f32,
    pub landmark_labels: Vec<String>,
    pub nets: Vec<NeuralNetRef>,
    pub pose_filter: Option<PoseFilter>,
    pub stabilizer: StabilizerSpec,
    pub object_points_position_factors: [f32; 3],
}

impl TrackerUpdate {
    pub fn for_mode(mode: &ModeDescriptor) -> Self {
        Self {
            threshold: mode.threshold,
            landmark_labels: mode.landmark_labels.clone(),
            nets: mode.nets.clone(),
            pose_filter: PoseFilter::for_mode(mode),
            stabilizer: mode.stabilizer,
            object_points_position_factors: mode.object_points_position_factors,
        }
    }
}

/// Failure reported by the tracking engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TrackerError(pub String);

impl TrackerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Completion of an asynchronous tracker call.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerEvent {
    Initialized {
        request: RequestId,
        result: Result<(), TrackerError>,
    },
    Reconfigured {
        request: RequestId,
        result: Result<(), TrackerError>,
    },
    VideoSettingsApplied {
        request: RequestId,
        result: Result<(), TrackerError>,
    },
}

impl TrackerEvent {
    #[inline]
    pub fn request(&self) -> RequestId {
        match self {
            Self::Initialized { request, .. }
            | Self::Reconfigured { request, .. }
            | Self::VideoSettingsApplied { request, .. } => *request,
        }
    }
}

/// Camera used by the renderer; the tracker drives its projection and pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderCamera {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub pose: Isometry3<f32>,
}

impl Default for RenderCamera {
    fn default() -> Self {
        Self {
            fov_y_deg: 40.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            pose: Isometry3::identity(),
        }
    }
}

/// The tracking engine.
pub trait Tracker {
    /// Start tracking. Completes with [`TrackerEvent::Initialized`].
    fn init(&mut self, request: RequestId, config: TrackerInitConfig);

    /// Reconfigure detection without tearing the session down.
    /// Completes with [`TrackerEvent::Reconfigured`].
    fn update(&mut self, request: RequestId, update: TrackerUpdate);

    /// Completes with [`TrackerEvent::VideoSettingsApplied`].
    fn update_video_settings(&mut self, request: RequestId, settings: VideoSettings);

    fn resize(&mut self);

    fn destroy(&mut self);

    /// Register which node receives the tracked transform.
    fn set_anchor_follower(&mut self, parent: NodeId, child: NodeId);

    /// Forget the currently followed nodes.
    fn clear_tracked_objects(&mut self, dispose: bool);

    /// Per-frame hook: fit the render camera to the capture viewport.
    fn update_camera(&mut self, viewport: &ViewportGeometry, camera: &mut RenderCamera);

    /// Latest tracked anchor pose, `None` while no hand is detected.
    fn anchor_pose(&self) -> Option<Similarity3<f32>>;
}
