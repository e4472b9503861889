//! Synthesis dispatch.
//!
//! [`SynthesisDispatcher`] is the public entry point: given text and a voice
//! name it resolves the voice, checks its assets, obtains (or lazily builds)
//! the cached engine, runs inference, and writes the result to a
//! deterministic WAV path in the output directory.
//!
//! Each request is one synchronous, blocking call chain. Errors are terminal
//! for the request and reported as structured [`SynthesisError`] values;
//! nothing is retried automatically.

use std::fs;
use std::path::PathBuf;

use derive_builder::Builder;

use crate::assets::{AssetLayout, MissingAsset};
use crate::cache::EngineCache;
use crate::catalog::VoiceCatalog;
use crate::{AudioClip, BoxError, EngineFactory, SpeechEngine, DEFAULT_SAMPLE_RATE};

/// Errors a synthesis request can end with.
#[derive(thiserror::Error, Debug)]
pub enum SynthesisError {
    /// The requested voice is not in the catalog. No side effects occurred.
    #[error("unknown voice '{0}'")]
    UnknownVoice(String),
    /// A required asset is absent. Reported before any engine work; the
    /// underlying cause needs operator action (e.g. fetching the file).
    #[error(transparent)]
    AssetMissing(#[from] MissingAsset),
    /// The underlying engine failed to initialize. Nothing is cached, so the
    /// next request for this voice retries construction.
    #[error("failed to construct engine for voice '{voice}': {source}")]
    EngineConstruction {
        voice: String,
        #[source]
        source: BoxError,
    },
    /// The engine raised an error during inference. No artifact is written.
    #[error("synthesis failed for voice '{voice}': {source}")]
    Synthesis {
        voice: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to prepare output directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode artifact: {0}")]
    Wav(#[from] hound::Error),
}

/// Dispatcher settings.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DispatcherConfig {
    /// Directory holding the shared configuration and per-voice weights.
    pub models_dir: PathBuf,
    /// File name of the shared synthesis configuration inside `models_dir`.
    #[builder(default = "\"config.json\".to_string()")]
    pub config_file_name: String,
    /// Directory artifacts are written to; created on first use.
    pub output_dir: PathBuf,
    /// Sample rate artifacts are encoded at.
    #[builder(default = "DEFAULT_SAMPLE_RATE")]
    pub sample_rate: u32,
}

/// One synthesis request.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Text to synthesize. Not validated here; an empty string yields an
    /// empty artifact.
    pub text: String,
    /// Name of the voice to synthesize with.
    pub voice: String,
    /// Artifact file stem override. `None` uses the voice-keyed default
    /// `output-{voice}`, which repeated requests for the same voice
    /// overwrite. Callers that need one artifact per request put a request
    /// id or timestamp here.
    pub file_stem: Option<String>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            file_stem: None,
        }
    }

    /// Use a request-scoped artifact name instead of the voice-keyed default.
    pub fn with_file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = Some(stem.into());
        self
    }
}

/// Maps voice names to cached engines and turns requests into artifacts.
pub struct SynthesisDispatcher<F: EngineFactory> {
    catalog: VoiceCatalog,
    layout: AssetLayout,
    cache: EngineCache<F::Engine>,
    factory: F,
    output_dir: PathBuf,
    sample_rate: u32,
}

impl<F: EngineFactory> SynthesisDispatcher<F> {
    pub fn new(config: DispatcherConfig, catalog: VoiceCatalog, factory: F) -> Self {
        let layout = AssetLayout::with_config_file(config.models_dir, &config.config_file_name);
        Self {
            catalog,
            layout,
            cache: EngineCache::new(),
            factory,
            output_dir: config.output_dir,
            sample_rate: config.sample_rate,
        }
    }

    /// Synthesize `request.text` with `request.voice` and return the path of
    /// the written WAV artifact.
    pub fn synthesize(&self, request: &SynthesisRequest) -> Result<PathBuf, SynthesisError> {
        let voice = self
            .catalog
            .get(&request.voice)
            .ok_or_else(|| SynthesisError::UnknownVoice(request.voice.clone()))?;

        // Assets are re-checked on every request, cached engine or not, so
        // files removed at runtime surface as a structured error.
        self.layout.validate(voice)?;

        let engine = self
            .cache
            .get_or_create(&voice.name, || {
                log::info!(
                    "Constructing engine for voice '{}' from {}",
                    voice.name,
                    self.layout.model_path(voice).display()
                );
                self.factory
                    .construct(self.layout.config_path(), &self.layout.model_path(voice))
            })
            .map_err(|source| SynthesisError::EngineConstruction {
                voice: voice.name.clone(),
                source,
            })?;

        log::debug!(
            "Synthesizing {} chars with voice '{}'",
            request.text.chars().count(),
            voice.name
        );
        let samples = engine
            .lock()
            .synthesize(&request.text)
            .map_err(|source| SynthesisError::Synthesis {
                voice: voice.name.clone(),
                source,
            })?;
        if samples.is_empty() {
            log::warn!("Voice '{}' produced no audio for the given text", voice.name);
        }

        fs::create_dir_all(&self.output_dir)?;
        let stem = match &request.file_stem {
            Some(stem) => stem.clone(),
            None => format!("output-{}", voice.name),
        };
        let path = self.output_dir.join(format!("{stem}.wav"));

        let clip = AudioClip {
            samples,
            sample_rate: self.sample_rate,
        };
        clip.write_wav(&path)?;
        log::info!(
            "Wrote {:.2}s artifact to {}",
            clip.duration_secs(),
            path.display()
        );

        Ok(path)
    }

    /// Voice names available for dispatch, in manifest order.
    pub fn voices(&self) -> impl Iterator<Item = &str> {
        self.catalog.names()
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    /// Whether an engine has been constructed and cached for `voice`.
    pub fn has_cached_engine(&self, voice: &str) -> bool {
        self.cache.contains(voice)
    }
}

#[cfg(test)]
mod tests {
    use super::{DispatcherConfigBuilder, SynthesisDispatcher, SynthesisError, SynthesisRequest};
    use crate::assets::AssetKind;
    use crate::catalog::VoiceCatalog;
    use crate::{BoxError, EngineFactory, SpeechEngine};

    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Deterministic stand-in for a real engine: one sample per input byte.
    struct TextToneEngine;

    fn tones(text: &str) -> Vec<f32> {
        text.bytes().map(|b| b as f32 / 255.0).collect()
    }

    impl SpeechEngine for TextToneEngine {
        fn synthesize(&mut self, text: &str) -> Result<Vec<f32>, BoxError> {
            Ok(tones(text))
        }
    }

    /// Factory that counts constructions and can fail the first N attempts.
    struct CountingFactory {
        constructions: Arc<AtomicUsize>,
        fail_first: usize,
        build_delay: Option<Duration>,
    }

    impl CountingFactory {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let constructions = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    constructions: constructions.clone(),
                    fail_first: 0,
                    build_delay: None,
                },
                constructions,
            )
        }
    }

    impl EngineFactory for CountingFactory {
        type Engine = TextToneEngine;

        fn construct(&self, _config: &Path, _model: &Path) -> Result<TextToneEngine, BoxError> {
            let attempt = self.constructions.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.build_delay {
                std::thread::sleep(delay);
            }
            if attempt < self.fail_first {
                return Err("incompatible weights".into());
            }
            Ok(TextToneEngine)
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        models_dir: PathBuf,
        output_dir: PathBuf,
    }

    /// Models dir with a shared config and weights for the given voices.
    fn fixture(voices_on_disk: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let models_dir = dir.path().join("models");
        std::fs::create_dir(&models_dir).unwrap();
        std::fs::write(models_dir.join("config.json"), "{}").unwrap();
        for voice in voices_on_disk {
            std::fs::write(models_dir.join(format!("{voice}.onnx")), b"weights").unwrap();
        }
        let output_dir = dir.path().join("output");
        Fixture {
            models_dir,
            output_dir,
            _dir: dir,
        }
    }

    fn catalog(names: &[&str]) -> VoiceCatalog {
        let voices: Vec<String> = names
            .iter()
            .map(|n| format!(r#"{{"name": "{n}", "model": "{n}.onnx"}}"#))
            .collect();
        VoiceCatalog::from_json(&format!(r#"{{"voices": [{}]}}"#, voices.join(","))).unwrap()
    }

    fn dispatcher(
        fx: &Fixture,
        catalog: VoiceCatalog,
        factory: CountingFactory,
    ) -> SynthesisDispatcher<CountingFactory> {
        let config = DispatcherConfigBuilder::default()
            .models_dir(fx.models_dir.clone())
            .output_dir(fx.output_dir.clone())
            .build()
            .unwrap();
        SynthesisDispatcher::new(config, catalog, factory)
    }

    fn read_samples(path: &Path) -> (Vec<f32>, u32) {
        let mut reader = hound::WavReader::open(path).unwrap();
        let rate = reader.spec().sample_rate;
        let samples = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        (samples, rate)
    }

    #[test]
    fn unknown_voice_has_no_side_effects() {
        let fx = fixture(&["david"]);
        let (factory, constructions) = CountingFactory::new();
        let dispatcher = dispatcher(&fx, catalog(&["david"]), factory);

        let err = dispatcher
            .synthesize(&SynthesisRequest::new("hi", "ghost"))
            .unwrap_err();

        assert!(matches!(err, SynthesisError::UnknownVoice(name) if name == "ghost"));
        assert_eq!(constructions.load(Ordering::SeqCst), 0);
        assert!(!fx.output_dir.exists(), "no artifact directory is created");
    }

    #[test]
    fn missing_model_reports_exact_path_and_leaves_cache_cold() {
        let fx = fixture(&["david"]);
        let (factory, constructions) = CountingFactory::new();
        let dispatcher = dispatcher(&fx, catalog(&["david", "maria"]), factory);

        let err = dispatcher
            .synthesize(&SynthesisRequest::new("hi", "maria"))
            .unwrap_err();

        match err {
            SynthesisError::AssetMissing(missing) => {
                assert_eq!(missing.kind, AssetKind::Model);
                assert_eq!(missing.path, fx.models_dir.join("maria.onnx"));
            }
            other => panic!("expected AssetMissing, got {other:?}"),
        }
        assert_eq!(constructions.load(Ordering::SeqCst), 0);
        assert!(!dispatcher.has_cached_engine("maria"));
    }

    #[test]
    fn missing_config_is_reported_before_the_model() {
        let fx = fixture(&["david"]);
        std::fs::remove_file(fx.models_dir.join("config.json")).unwrap();
        let (factory, _) = CountingFactory::new();
        let dispatcher = dispatcher(&fx, catalog(&["david"]), factory);

        let err = dispatcher
            .synthesize(&SynthesisRequest::new("hi", "david"))
            .unwrap_err();
        match err {
            SynthesisError::AssetMissing(missing) => {
                assert_eq!(missing.kind, AssetKind::Config);
                assert_eq!(missing.path, fx.models_dir.join("config.json"));
            }
            other => panic!("expected AssetMissing, got {other:?}"),
        }
    }

    #[test]
    fn sequential_requests_construct_the_engine_once() {
        let fx = fixture(&["david"]);
        let (factory, constructions) = CountingFactory::new();
        let dispatcher = dispatcher(&fx, catalog(&["david"]), factory);

        dispatcher
            .synthesize(&SynthesisRequest::new("first", "david"))
            .unwrap();
        dispatcher
            .synthesize(&SynthesisRequest::new("second", "david"))
            .unwrap();

        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        assert!(dispatcher.has_cached_engine("david"));
    }

    #[test]
    fn artifact_path_is_voice_keyed_and_overwritten() {
        let fx = fixture(&["david"]);
        let (factory, _) = CountingFactory::new();
        let dispatcher = dispatcher(&fx, catalog(&["david"]), factory);

        let first = dispatcher
            .synthesize(&SynthesisRequest::new("a longer first take", "david"))
            .unwrap();
        let second = dispatcher
            .synthesize(&SynthesisRequest::new("short", "david"))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first, fx.output_dir.join("output-david.wav"));

        // The second take replaced the first.
        let (samples, _) = read_samples(&second);
        assert_eq!(samples, tones("short"));
    }

    #[test]
    fn file_stem_override_avoids_clobbering() {
        let fx = fixture(&["david"]);
        let (factory, _) = CountingFactory::new();
        let dispatcher = dispatcher(&fx, catalog(&["david"]), factory);

        let first = dispatcher
            .synthesize(&SynthesisRequest::new("one", "david").with_file_stem("take-1"))
            .unwrap();
        let second = dispatcher
            .synthesize(&SynthesisRequest::new("two", "david").with_file_stem("take-2"))
            .unwrap();

        assert_eq!(first, fx.output_dir.join("take-1.wav"));
        assert_eq!(second, fx.output_dir.join("take-2.wav"));
        assert!(first.exists() && second.exists());
    }

    #[test]
    fn artifact_round_trips_engine_output_at_configured_rate() {
        let fx = fixture(&["david"]);
        let (factory, _) = CountingFactory::new();
        let dispatcher = dispatcher(&fx, catalog(&["david"]), factory);

        let path = dispatcher
            .synthesize(&SynthesisRequest::new("hello", "david"))
            .unwrap();

        let (samples, rate) = read_samples(&path);
        assert_eq!(samples, tones("hello"));
        assert_eq!(rate, crate::DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn empty_text_yields_an_empty_artifact() {
        let fx = fixture(&["david"]);
        let (factory, _) = CountingFactory::new();
        let dispatcher = dispatcher(&fx, catalog(&["david"]), factory);

        let path = dispatcher
            .synthesize(&SynthesisRequest::new("", "david"))
            .unwrap();

        let (samples, _) = read_samples(&path);
        assert!(samples.is_empty());
    }

    #[test]
    fn two_voice_scenario_with_one_model_on_disk() {
        let fx = fixture(&["david"]);
        let (factory, _) = CountingFactory::new();
        let dispatcher = dispatcher(&fx, catalog(&["david", "maria"]), factory);

        let err = dispatcher
            .synthesize(&SynthesisRequest::new("hi", "maria"))
            .unwrap_err();
        assert!(matches!(err, SynthesisError::AssetMissing(_)));

        let path = dispatcher
            .synthesize(&SynthesisRequest::new("hi", "david"))
            .unwrap();
        assert_eq!(path, fx.output_dir.join("output-david.wav"));
        let (samples, _) = read_samples(&path);
        assert!(!samples.is_empty());
    }

    #[test]
    fn failed_construction_is_retried_and_can_succeed() {
        let fx = fixture(&["david"]);
        let constructions = Arc::new(AtomicUsize::new(0));
        let factory = CountingFactory {
            constructions: constructions.clone(),
            fail_first: 1,
            build_delay: None,
        };
        let dispatcher = dispatcher(&fx, catalog(&["david"]), factory);

        let err = dispatcher
            .synthesize(&SynthesisRequest::new("hi", "david"))
            .unwrap_err();
        assert!(matches!(err, SynthesisError::EngineConstruction { .. }));
        assert!(!dispatcher.has_cached_engine("david"));

        dispatcher
            .synthesize(&SynthesisRequest::new("hi", "david"))
            .unwrap();
        assert_eq!(constructions.load(Ordering::SeqCst), 2);
        assert!(dispatcher.has_cached_engine("david"));
    }

    #[test]
    fn concurrent_first_use_collapses_into_one_construction() {
        let fx = fixture(&["david"]);
        let constructions = Arc::new(AtomicUsize::new(0));
        let factory = CountingFactory {
            constructions: constructions.clone(),
            fail_first: 0,
            build_delay: Some(Duration::from_millis(20)),
        };
        let dispatcher = Arc::new(dispatcher(&fx, catalog(&["david"]), factory));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                std::thread::spawn(move || {
                    dispatcher
                        .synthesize(&SynthesisRequest::new("hi", "david"))
                        .unwrap()
                })
            })
            .collect();

        for thread in threads {
            assert_eq!(thread.join().unwrap(), fx.output_dir.join("output-david.wav"));
        }
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }
}
