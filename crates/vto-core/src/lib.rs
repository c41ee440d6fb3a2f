//! Core types for the virtual try-on session engine.
//!
//! This crate knows nothing about the tracker, the renderer or asset loading.
//! It holds the data model shared by the other crates and the pure pieces of
//! the pipeline:
//! - model / mode / occluder descriptors (serde-friendly),
//! - the authoring-space to tracker-space pose conversion,
//! - canvas sizing and the resize debounce primitive,
//! - the minimal scene node type the anchor subtree is built from.

mod descriptor;
mod logger;
mod pose;
mod scene;
mod viewport;

pub use descriptor::{
    AssetRef, ModeDescriptor, ModelDescriptor, NeuralNetRef, OccluderSpec, StabilizerSpec,
};
pub use pose::{compute_pose, PoseTransform};
pub use scene::{Geometry, NodeId, NodeIdAllocator, NodeMetadata, NodeTransform, SceneNode};
pub use viewport::{
    compute_sizing, Debouncer, ViewportGeometry, ViewportManager, WindowSize,
    RESIZE_QUIET_PERIOD,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
