//! Mode/model registry and its JSON form.
//!
//! A [`VtoConfig`] is built (or loaded) once at startup, validated, and then
//! only ever borrowed. Lookups return typed not-found errors.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use vto_core::{
    AssetRef, ModeDescriptor, ModelDescriptor, NeuralNetRef, OccluderSpec, StabilizerSpec,
};

/// Key under which an uploaded model is selectable.
pub const CUSTOM_MODEL_KEY: &str = "custom";

/// Registry lookup and validation failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown tracking mode `{0}`")]
    UnknownMode(String),
    #[error("unknown model `{0}`")]
    UnknownModel(String),
    #[error("mode `{mode}`: threshold {threshold} is outside [0, 1]")]
    InvalidThreshold { mode: String, threshold: f32 },
    #[error("mode `{0}` lists no neural nets")]
    NoNets(String),
    #[error("mode `{0}` lists no landmark labels")]
    NoLandmarks(String),
    #[error("mode `{0}`: soft occluder radius range must satisfy 0 <= min <= max, max > 0")]
    InvalidRadiusRange(String),
    #[error("mode `{0}`: soft occluder height must be > 0")]
    InvalidOccluderHeight(String),
    #[error("model `{model}` refers to unknown mode `{mode}`")]
    ModelModeMissing { model: String, mode: String },
    #[error("model `{0}`: scale must be finite")]
    InvalidScale(String),
}

impl ConfigError {
    /// Whether this is a key lookup miss rather than a malformed table.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownMode(_) | Self::UnknownModel(_))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Tracker startup settings that do not depend on the mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub max_hands_detected: u32,
    /// Let the tracker flip the object when the hand turns over.
    pub enable_flip_object: bool,
    pub camera_zoom: f32,
    /// NN switching hysteresis of the stabilizer.
    pub switch_nn_error_threshold: f32,
    pub translation_scaling_factors: [f32; 3],
    pub debug_display_landmarks: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            max_hands_detected: 1,
            enable_flip_object: true,
            camera_zoom: 1.0,
            switch_nn_error_threshold: 0.5,
            translation_scaling_factors: [0.3, 0.3, 1.0],
            debug_display_landmarks: false,
        }
    }
}

/// Placement applied to a user-uploaded model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomUploadSpec {
    pub mode: String,
    pub scale: f32,
    pub translation: [f32; 3],
    pub quaternion: [f32; 4],
}

impl Default for CustomUploadSpec {
    fn default() -> Self {
        Self {
            mode: "ring".to_string(),
            scale: 0.09,
            translation: RING_TRANSLATION,
            quaternion: RING_QUATERNION,
        }
    }
}

impl CustomUploadSpec {
    pub fn descriptor(&self, asset: AssetRef) -> ModelDescriptor {
        ModelDescriptor::new(self.mode.clone(), asset)
            .with_scale(self.scale)
            .with_translation(self.translation)
            .with_quaternion(self.quaternion)
    }
}

const RING_TRANSLATION: [f32; 3] = [-1.66, -11.91, 0.26];
const RING_QUATERNION: [f32; 4] = [0.258, 0.016, -0.005, 0.966];

/// Immutable registry of tracking modes and placeable models.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VtoConfig {
    pub modes: BTreeMap<String, ModeDescriptor>,
    pub models: BTreeMap<String, ModelDescriptor>,
    pub initial_model: String,
    #[serde(default)]
    pub custom_upload: CustomUploadSpec,
    #[serde(default)]
    pub tracker: TrackerSettings,
}

impl VtoConfig {
    /// Validate and build a registry.
    pub fn new(
        modes: BTreeMap<String, ModeDescriptor>,
        models: BTreeMap<String, ModelDescriptor>,
        initial_model: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let cfg = Self {
            modes,
            models,
            initial_model: initial_model.into(),
            custom_upload: CustomUploadSpec::default(),
            tracker: TrackerSettings::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// The shipped wrist (watch) and ring tables.
    pub fn builtin() -> Self {
        let mut modes = BTreeMap::new();
        modes.insert("wrist".to_string(), wrist_mode());
        modes.insert("ring".to_string(), ring_mode());

        let ring_asset = AssetRef::new("assets/VTO/ringPlaceHolder2.glb");
        let ring_demo = ModelDescriptor::new("ring", ring_asset)
            .with_scale(0.421)
            .with_translation(RING_TRANSLATION)
            .with_quaternion(RING_QUATERNION);

        let mut models = BTreeMap::new();
        models.insert(
            "wristDemo".to_string(),
            ModelDescriptor::new("wrist", AssetRef::new("assets/VTO/New_Watch.glb"))
                .with_scale(1.35 * 1.462)
                .with_translation([0.076, -0.916, -0.504])
                .with_quaternion([0.0, 0.0, 0.0, 1.0]),
        );
        models.insert(CUSTOM_MODEL_KEY.to_string(), ring_demo.clone());
        models.insert("ringDemo".to_string(), ring_demo);

        Self {
            modes,
            models,
            initial_model: "wristDemo".to_string(),
            custom_upload: CustomUploadSpec::default(),
            tracker: TrackerSettings::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, mode) in &self.modes {
            validate_mode(key, mode)?;
        }
        for (key, model) in &self.models {
            if !self.modes.contains_key(&model.mode) {
                return Err(ConfigError::ModelModeMissing {
                    model: key.clone(),
                    mode: model.mode.clone(),
                });
            }
            if model.scale.is_some_and(|s| !s.is_finite()) {
                return Err(ConfigError::InvalidScale(key.clone()));
            }
        }
        if !self.modes.contains_key(&self.custom_upload.mode) {
            return Err(ConfigError::ModelModeMissing {
                model: CUSTOM_MODEL_KEY.to_string(),
                mode: self.custom_upload.mode.clone(),
            });
        }
        self.model(&self.initial_model)?;
        Ok(())
    }

    pub fn mode(&self, key: &str) -> Result<&ModeDescriptor, ConfigError> {
        self.modes
            .get(key)
            .ok_or_else(|| ConfigError::UnknownMode(key.to_string()))
    }

    pub fn model(&self, key: &str) -> Result<&ModelDescriptor, ConfigError> {
        self.models
            .get(key)
            .ok_or_else(|| ConfigError::UnknownModel(key.to_string()))
    }

    /// Resolve the starting model from an optional route parameter.
    pub fn resolve_initial(
        &self,
        route: Option<&str>,
    ) -> Result<(&str, &ModelDescriptor), ConfigError> {
        let key = route.unwrap_or(self.initial_model.as_str());
        let (key, model) = self
            .models
            .get_key_value(key)
            .ok_or_else(|| ConfigError::UnknownModel(key.to_string()))?;
        Ok((key.as_str(), model))
    }

    /// Load and validate a JSON config.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write this config as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn validate_mode(key: &str, mode: &ModeDescriptor) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&mode.threshold) {
        return Err(ConfigError::InvalidThreshold {
            mode: key.to_string(),
            threshold: mode.threshold,
        });
    }
    if mode.nets.is_empty() {
        return Err(ConfigError::NoNets(key.to_string()));
    }
    if mode.landmark_labels.is_empty() {
        return Err(ConfigError::NoLandmarks(key.to_string()));
    }
    if let OccluderSpec::SoftCylinder {
        radius_range: [min, max],
        height,
        ..
    } = mode.occluder
    {
        if !(min >= 0.0 && min <= max && max > 0.0) {
            return Err(ConfigError::InvalidRadiusRange(key.to_string()));
        }
        if height.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
            return Err(ConfigError::InvalidOccluderHeight(key.to_string()));
        }
    }
    Ok(())
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn wrist_mode() -> ModeDescriptor {
    ModeDescriptor {
        threshold: 0.92,
        nets: vec![NeuralNetRef::new("NN_WRIST_27")],
        landmark_labels: labels(&[
            "wristBack",
            "wristLeft",
            "wristRight",
            "wristPalm",
            "wristPalmTop",
            "wristBackTop",
            "wristRightBottom",
            "wristLeftBottom",
        ]),
        pose_filter: true,
        occluder: OccluderSpec::SoftCylinder {
            radius_range: [3.5, 4.5],
            height: 48.0,
            offset: [0.0, 0.0, 0.0],
            quaternion: [0.707, 0.0, 0.0, 0.707],
        },
        stabilizer: StabilizerSpec {
            min_cut_off: 0.001,
            beta: 3.0,
        },
        object_points_position_factors: [1.0, 1.3, 1.0],
    }
}

fn ring_mode() -> ModeDescriptor {
    ModeDescriptor {
        threshold: 0.9,
        nets: vec![NeuralNetRef::new("NN_RING_13")],
        landmark_labels: labels(&[
            "ringBack",
            "ringLeft",
            "ringRight",
            "ringPalm",
            "ringPalmTop",
            "ringBackTop",
            "ringBase0",
            "ringBase1",
            "ringMiddleFinger",
            "ringPinkyFinger",
            "ringBasePalm",
        ]),
        pose_filter: false,
        occluder: OccluderSpec::Model {
            asset: AssetRef::new("assets/VTO/ringOccluder2.glb"),
            scale: 1.0,
        },
        stabilizer: StabilizerSpec {
            min_cut_off: 0.001,
            beta: 30.0,
        },
        object_points_position_factors: [1.0, 1.0, 1.0],
    }
}
