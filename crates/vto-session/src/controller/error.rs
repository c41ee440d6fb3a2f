use vto_core::AssetRef;
use vto_occlusion::{LoadError, OcclusionError};

use super::LifecyclePhase;
use crate::config::ConfigError;
use crate::tracker::TrackerError;

/// How a [`SessionError`] affects the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// The session cannot be used; must be surfaced, never retried.
    Fatal,
    /// The previous state stays active.
    Recoverable,
    /// A requested mode or model key does not exist.
    Configuration,
    /// The call is not allowed in the current lifecycle phase.
    Rejected,
}

/// Errors surfaced at the session controller boundary.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("tracker startup failed: {0}")]
    TrackerStartup(TrackerError),
    #[error("mode reconfiguration failed: {0}")]
    Reconfigure(TrackerError),
    #[error("camera flip failed: {0}")]
    CameraFlip(TrackerError),
    #[error("failed to load model {asset}: {source}")]
    ModelLoad { asset: AssetRef, source: LoadError },
    #[error("model asset {0} has no child under its scene root")]
    EmptyModel(AssetRef),
    #[error("failed to build occluder: {0}")]
    Occluder(#[from] OcclusionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no custom model has been uploaded")]
    NoCustomModel,
    #[error("cannot {operation} while {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: LifecyclePhase,
    },
}

impl SessionError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::TrackerStartup(_) => Severity::Fatal,
            Self::Reconfigure(_)
            | Self::CameraFlip(_)
            | Self::ModelLoad { .. }
            | Self::EmptyModel(_)
            | Self::Occluder(_) => Severity::Recoverable,
            Self::Config(_) | Self::NoCustomModel => Severity::Configuration,
            Self::InvalidPhase { .. } => Severity::Rejected,
        }
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_not_a_load_failure() {
        let missing = SessionError::from(ConfigError::UnknownModel("x".to_string()));
        assert_eq!(missing.severity(), Severity::Configuration);

        let load = SessionError::ModelLoad {
            asset: AssetRef::new("x.glb"),
            source: LoadError::NotFound(AssetRef::new("x.glb")),
        };
        assert_eq!(load.severity(), Severity::Recoverable);
        assert!(!load.is_fatal());
        assert!(SessionError::TrackerStartup(TrackerError::new("no camera")).is_fatal());
    }

    #[test]
    fn phase_errors_read_naturally() {
        let err = SessionError::InvalidPhase {
            operation: "flip the camera",
            phase: LifecyclePhase::ModeSwitching,
        };
        assert_eq!(err.to_string(), "cannot flip the camera while switching mode");
    }
}
