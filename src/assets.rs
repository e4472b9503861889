//! On-disk model asset layout and precondition checks.
//!
//! All voices share one synthesis configuration file; each voice brings its
//! own weights file. Both live in the models directory and must exist before
//! an engine may be constructed. The check is pure and re-run on every
//! dispatch, so assets deleted at runtime are reported instead of crashing
//! the engine constructor.

use std::path::{Path, PathBuf};

use crate::catalog::VoiceDescriptor;

/// Which asset a failed check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// The shared synthesis configuration file.
    Config,
    /// A voice's model weights file.
    Model,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Config => write!(f, "config"),
            AssetKind::Model => write!(f, "model"),
        }
    }
}

/// A required asset that is absent from disk.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} file not found at {}", .path.display())]
pub struct MissingAsset {
    pub kind: AssetKind,
    pub path: PathBuf,
}

/// Resolves asset paths under the models directory.
#[derive(Debug, Clone)]
pub struct AssetLayout {
    models_dir: PathBuf,
    config_path: PathBuf,
}

impl AssetLayout {
    /// Layout with the shared configuration at `models_dir/config.json`.
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self::with_config_file(models_dir, "config.json")
    }

    /// Layout with a custom shared configuration file name.
    pub fn with_config_file(models_dir: impl Into<PathBuf>, config_file: &str) -> Self {
        let models_dir = models_dir.into();
        let config_path = models_dir.join(config_file);
        Self {
            models_dir,
            config_path,
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Path of the shared synthesis configuration file.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Path of a voice's model weights file.
    pub fn model_path(&self, voice: &VoiceDescriptor) -> PathBuf {
        self.models_dir.join(&voice.model)
    }

    /// Check that the shared configuration and the voice's weights exist.
    ///
    /// The configuration is checked first; the first missing path is
    /// reported and no recovery is attempted.
    pub fn validate(&self, voice: &VoiceDescriptor) -> Result<(), MissingAsset> {
        if !self.config_path.exists() {
            return Err(MissingAsset {
                kind: AssetKind::Config,
                path: self.config_path.clone(),
            });
        }

        let model_path = self.model_path(voice);
        if !model_path.exists() {
            return Err(MissingAsset {
                kind: AssetKind::Model,
                path: model_path,
            });
        }

        Ok(())
    }
}
