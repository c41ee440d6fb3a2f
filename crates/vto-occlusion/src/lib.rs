//! Occlusion geometry for the try-on anchor.
//!
//! Two occluder flavours exist because body parts differ: a wrist is close
//! enough to a cylinder that a procedural shell with a soft radial fade works,
//! while a finger wearing a ring needs a bespoke mesh.
//!
//! Asset decoding is external; this crate only sees it through [`AssetLoader`].

mod composer;
mod loader;

pub use composer::{
    build_occluder, OcclusionError, CYLINDER_HEIGHT_SEGMENTS, CYLINDER_RADIAL_SEGMENTS,
};
pub use loader::{AssetLoader, InMemoryLoader, LoadError, LoadedScene};
