//! # polyvox
//!
//! A Rust library for multi-voice text-to-speech synthesis.
//!
//! Voices are declared in a JSON manifest, each backed by its own trained
//! model file. The dispatcher resolves a voice name, checks its assets on
//! disk, lazily builds and caches one inference engine per voice, and writes
//! the synthesized audio to a WAV artifact.
//!
//! ## Features
//!
//! - **Named voices**: a manifest maps voice names to per-voice model files
//! - **Lazy engine caching**: engines load on first use and are reused for
//!   the life of the process, with single-flight construction under
//!   concurrent first use
//! - **Pluggable backends**: anything implementing [`SpeechEngine`] and
//!   [`EngineFactory`] can be dispatched; a VITS/ONNX backend ships behind
//!   the `vits` feature
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! polyvox = { version = "0.1", features = ["vits"] }
//! ```
//!
//! ```ignore
//! use std::path::PathBuf;
//! use polyvox::{
//!     catalog::VoiceCatalog,
//!     dispatcher::{DispatcherConfigBuilder, SynthesisDispatcher, SynthesisRequest},
//!     engines::vits::VitsFactory,
//! };
//!
//! let catalog = VoiceCatalog::load(&PathBuf::from("models/voices.json"))?;
//! let config = DispatcherConfigBuilder::default()
//!     .models_dir("models")
//!     .output_dir("output")
//!     .build()?;
//! let dispatcher = SynthesisDispatcher::new(config, catalog, VitsFactory::default());
//!
//! let path = dispatcher.synthesize(&SynthesisRequest::new("Hello, world!", "david"))?;
//! println!("wrote {}", path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assets;
pub mod cache;
pub mod catalog;
pub mod dispatcher;
pub mod engines;

use std::path::Path;

/// Boxed error type used at the engine boundary.
///
/// Engines come from external synthesis libraries with their own error
/// types; the dispatcher carries them as trait objects and wraps them into
/// its structured error variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Sample rate used for artifacts unless configured otherwise.
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// A clip of synthesized audio.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio
    pub sample_rate: u32,
}

impl AudioClip {
    /// Write the audio to a 32-bit float WAV file, replacing any existing file.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// A constructed, stateful inference engine bound to one voice.
///
/// Expensive to construct (weights are loaded into memory), cheap to invoke
/// repeatedly. Engines are owned by the dispatcher's cache and invoked behind
/// a per-voice lock, so implementations may keep mutable scratch state.
pub trait SpeechEngine {
    /// Convert text into raw audio samples.
    fn synthesize(&mut self, text: &str) -> Result<Vec<f32>, BoxError>;
}

/// Builds [`SpeechEngine`] instances from on-disk assets.
///
/// Implementations wrap an underlying speech-synthesis library. `construct`
/// is called at most once per voice for the life of the process when it
/// succeeds; a failed construction is reported to the caller and retried on
/// the next request for that voice.
pub trait EngineFactory {
    type Engine: SpeechEngine;

    /// Construct an engine from the shared synthesis configuration and the
    /// voice's model weights file.
    fn construct(&self, config_path: &Path, model_path: &Path) -> Result<Self::Engine, BoxError>;
}
