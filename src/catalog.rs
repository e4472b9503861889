//! Voice manifest loading and lookup.
//!
//! The manifest is a JSON document listing the available voices and their
//! model file references:
//!
//! ```json
//! {
//!   "voices": [
//!     { "name": "david", "model": "david.onnx" },
//!     { "name": "maria", "model": "maria.onnx", "display_name": "María" }
//!   ]
//! }
//! ```
//!
//! The catalog is loaded once at startup and is read-only afterwards, so it
//! can be shared freely across threads.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Errors raised while loading a voice manifest.
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate voice name '{0}' in manifest")]
    DuplicateVoice(String),
    #[error("voice entry {0} has an empty name")]
    EmptyVoiceName(usize),
    #[error("voice '{0}' has an empty model reference")]
    EmptyModelFile(String),
}

/// One voice as declared in the manifest.
///
/// Immutable once loaded; the `name` is the unique key callers select by.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VoiceDescriptor {
    /// Unique voice name, used as the selection key.
    pub name: String,
    /// File name of the voice's model weights, relative to the models directory.
    pub model: String,
    /// Optional human-facing label; falls back to `name`.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl VoiceDescriptor {
    /// Label to show in a UI.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    voices: Vec<VoiceDescriptor>,
}

/// The set of available voices, in manifest order.
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    voices: Vec<VoiceDescriptor>,
    // name -> position in `voices`
    index: HashMap<String, usize>,
}

impl VoiceCatalog {
    /// Load a catalog from a manifest file on disk.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        log::info!(
            "Loaded {} voices from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse a catalog from manifest JSON.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_str(json)?;

        let mut index = HashMap::with_capacity(manifest.voices.len());
        for (pos, voice) in manifest.voices.iter().enumerate() {
            if voice.name.is_empty() {
                return Err(ManifestError::EmptyVoiceName(pos));
            }
            if voice.model.is_empty() {
                return Err(ManifestError::EmptyModelFile(voice.name.clone()));
            }
            if index.insert(voice.name.clone(), pos).is_some() {
                return Err(ManifestError::DuplicateVoice(voice.name.clone()));
            }
        }

        Ok(Self {
            voices: manifest.voices,
            index,
        })
    }

    /// Look up a voice by name.
    pub fn get(&self, name: &str) -> Option<&VoiceDescriptor> {
        self.index.get(name).map(|&pos| &self.voices[pos])
    }

    /// Voice names in manifest order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.voices.iter().map(|v| v.name.as_str())
    }

    /// All descriptors in manifest order.
    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
