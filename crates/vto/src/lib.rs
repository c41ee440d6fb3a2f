//! High-level facade crate for the `vto-*` workspace.
//!
//! This crate provides stable re-exports of the underlying crates and, behind
//! the default `cli` feature, the `vto` binary for inspecting configuration.
//!
//! ## API map
//! - `vto::core`: descriptors, pose conversion, viewport sizing and debounce,
//!   scene nodes, logger.
//! - `vto::occlusion`: asset loader interface and occluder construction.
//! - `vto::session`: configuration registry, tracker interface, scene binder
//!   and the session controller.
//!
//! ## Quickstart
//!
//! ```
//! use vto::core::compute_pose;
//! use vto::session::VtoConfig;
//!
//! let config = VtoConfig::builtin();
//! let (key, model) = config.resolve_initial(None).expect("builtin initial model");
//! let pose = compute_pose(model);
//! assert_eq!(key, "wristDemo");
//! assert!(pose.translation.is_some());
//! ```

pub use vto_core as core;
pub use vto_occlusion as occlusion;
pub use vto_session as session;

pub use vto_core::{compute_pose, compute_sizing, ModelDescriptor, PoseTransform, WindowSize};
pub use vto_session::{SessionController, SessionError, Tracker, VtoConfig};
