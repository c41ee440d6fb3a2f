use std::collections::HashMap;

use vto_core::{AssetRef, SceneNode};

/// Asset loading failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("asset not found: {0}")]
    NotFound(AssetRef),
    #[error("failed to decode {reference}: {message}")]
    Decode { reference: AssetRef, message: String },
}

/// A decoded asset: the root of its scene.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedScene {
    pub root: SceneNode,
}

impl LoadedScene {
    pub fn new(root: SceneNode) -> Self {
        Self { root }
    }

    /// The first child of the scene root, which is where exported models
    /// keep their mesh hierarchy.
    #[inline]
    pub fn first_child(&self) -> Option<&SceneNode> {
        self.root.children.first()
    }
}

/// Loads 3D assets (glTF or otherwise) into scene nodes.
///
/// Implementations are free to cache; the session only ever clones what is
/// returned.
pub trait AssetLoader {
    fn load(&mut self, reference: &AssetRef) -> Result<LoadedScene, LoadError>;
}

impl<L: AssetLoader + ?Sized> AssetLoader for &mut L {
    fn load(&mut self, reference: &AssetRef) -> Result<LoadedScene, LoadError> {
        (**self).load(reference)
    }
}

/// Loader backed by pre-decoded scenes.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLoader {
    scenes: HashMap<AssetRef, LoadedScene>,
    loads: usize,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: AssetRef, scene: LoadedScene) {
        self.scenes.insert(reference, scene);
    }

    pub fn with_scene(mut self, reference: AssetRef, scene: LoadedScene) -> Self {
        self.insert(reference, scene);
        self
    }

    /// Number of `load` calls served so far, successful or not.
    #[inline]
    pub fn load_count(&self) -> usize {
        self.loads
    }
}

impl AssetLoader for InMemoryLoader {
    fn load(&mut self, reference: &AssetRef) -> Result<LoadedScene, LoadError> {
        self.loads += 1;
        self.scenes
            .get(reference)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(reference.clone()))
    }
}
