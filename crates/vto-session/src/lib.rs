//! Try-on session engine.
//!
//! Ties a hand/wrist tracker (see [`Tracker`]) to a render graph: the
//! [`SessionController`] owns the tracker lifecycle, serialises asynchronous
//! tracker completions through request ids, and keeps exactly one anchor
//! subtree (model + occluder) attached through the [`SceneBinder`].
//!
//! ## Quickstart
//!
//! ```ignore
//! use vto_session::{CanvasHandle, SessionController, VtoConfig};
//! use vto_core::WindowSize;
//!
//! let config = VtoConfig::builtin();
//! let mut session = SessionController::new(
//!     &config,
//!     my_tracker,
//!     my_loader,
//!     None,
//!     WindowSize { width: 1920, height: 1080 },
//! )?;
//! session.initialize(CanvasHandle(1))?;
//! // later, from the tracker callback:
//! session.handle_tracker_event(event)?;
//! ```

mod binder;
mod config;
mod controller;
mod tracker;

pub use binder::{apply_pose, AnchorSubtree, FrameState, SceneBinder};
pub use config::{
    ConfigError, ConfigIoError, CustomUploadSpec, TrackerSettings, VtoConfig, CUSTOM_MODEL_KEY,
};
pub use controller::{
    LifecyclePhase, SessionController, SessionError, SessionState, Severity, TrackerHandle,
    ViewportEvent,
};
pub use tracker::{
    CanvasHandle, FacingMode, PoseFilter, RenderCamera, RequestId, Tracker, TrackerError,
    TrackerEvent, TrackerInitConfig, TrackerUpdate, VideoSettings,
};
