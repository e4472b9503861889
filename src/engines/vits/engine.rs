use std::path::Path;

use crate::{BoxError, EngineFactory, SpeechEngine};

use super::model::{VitsError, VitsModel};

/// VITS text-to-speech engine bound to one voice's weights.
///
/// Construction loads the weights into memory and parses the shared
/// configuration; synthesis is comparatively cheap and may be called
/// repeatedly.
pub struct VitsEngine {
    model: VitsModel,
}

impl VitsEngine {
    /// Load an engine from the shared configuration and a voice's weights.
    pub fn load(
        config_path: &Path,
        model_path: &Path,
        num_threads: Option<usize>,
    ) -> Result<Self, VitsError> {
        Ok(Self {
            model: VitsModel::load(config_path, model_path, num_threads)?,
        })
    }

    /// Sample rate the loaded voice was trained at.
    pub fn sample_rate(&self) -> u32 {
        self.model.sample_rate()
    }
}

impl SpeechEngine for VitsEngine {
    fn synthesize(&mut self, text: &str) -> Result<Vec<f32>, BoxError> {
        Ok(self.model.synthesize_text(text)?)
    }
}

/// Builds [`VitsEngine`] instances for the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct VitsFactory {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
}

impl VitsFactory {
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }
}

impl EngineFactory for VitsFactory {
    type Engine = VitsEngine;

    fn construct(&self, config_path: &Path, model_path: &Path) -> Result<VitsEngine, BoxError> {
        Ok(VitsEngine::load(config_path, model_path, self.num_threads)?)
    }
}
