use std::path::Path;

use ndarray::Array2;
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use super::text::{Tokenizer, VitsConfig};

#[derive(thiserror::Error, Debug)]
pub enum VitsError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Invalid synthesis config: {0}")]
    Config(String),
}

/// Internal VITS ONNX model state for one voice.
pub struct VitsModel {
    session: Session,
    tokenizer: Tokenizer,
    // noise_scale, length_scale, noise_w
    scales: [f32; 3],
    sample_rate: u32,
}

impl VitsModel {
    /// Load a voice model from its weights file and the shared configuration.
    pub fn load(
        config_path: &Path,
        model_path: &Path,
        num_threads: Option<usize>,
    ) -> Result<Self, VitsError> {
        let config = VitsConfig::load(config_path)?;
        let tokenizer = Tokenizer::from_config(&config)?;

        log::info!("Loading VITS weights from {}", model_path.display());
        let session = init_session(model_path, num_threads)?;

        Ok(Self {
            session,
            tokenizer,
            scales: [
                config.inference.noise_scale,
                config.inference.length_scale,
                config.inference.noise_w,
            ],
            sample_rate: config.audio.sample_rate,
        })
    }

    /// Sample rate the model was trained at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Synthesize audio samples from text.
    pub fn synthesize_text(&mut self, text: &str) -> Result<Vec<f32>, VitsError> {
        let ids = self.tokenizer.tokenize(text);
        if ids.is_empty() {
            log::warn!("No tokens produced for text: {text:?}");
            return Ok(vec![]);
        }

        let seq_len = ids.len();
        let tokens = Array2::from_shape_vec((1, seq_len), ids)?;
        let lengths = ndarray::arr1(&[seq_len as i64]);
        let scales = ndarray::arr1(&self.scales);

        let inputs = inputs![
            "input" => TensorRef::from_array_view(tokens.view())?,
            "input_lengths" => TensorRef::from_array_view(lengths.view())?,
            "scales" => TensorRef::from_array_view(scales.view())?,
        ];
        let output = self.session.run(inputs)?;

        // First output is the waveform
        let first_output = output
            .iter()
            .next()
            .ok_or_else(|| VitsError::Ort(ort::Error::new("No output from model")))?;
        let waveform = first_output.1.try_extract_array::<f32>()?;

        Ok(waveform.as_slice().unwrap_or(&[]).to_vec())
    }
}

/// Initialize an ONNX session for a voice's weights.
fn init_session(model_path: &Path, num_threads: Option<usize>) -> Result<Session, VitsError> {
    let providers = vec![CPUExecutionProvider::default().build()];

    let mut builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_execution_providers(providers)?
        .with_parallel_execution(true)?;

    if let Some(threads) = num_threads {
        builder = builder
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?;
    }

    Ok(builder.commit_from_file(model_path)?)
}
