//! Single-speaker VITS text-to-speech engine implementation.
//!
//! Each voice is a standalone VITS model exported to ONNX. All voices in a
//! models directory share one `config.json` describing the character tables,
//! inference scales, and audio sample rate; each voice brings its own
//! weights file.
//!
//! # Model Directory Layout
//!
//! ```text
//! models/
//! ├── config.json      # shared synthesis configuration
//! ├── david.onnx       # one weights file per voice
//! └── maria.onnx
//! ```
//!
//! # Configuration Schema
//!
//! ```json
//! {
//!   "audio": { "sample_rate": 22050 },
//!   "characters": {
//!     "pad": "_",
//!     "punctuations": "!'(),-.:;? ",
//!     "characters": "abcdefghijklmnopqrstuvwxyz"
//!   },
//!   "add_blank": true,
//!   "inference": { "noise_scale": 0.667, "length_scale": 1.0, "noise_w": 0.8 }
//! }
//! ```
//!
//! Every field except `characters` has a default; models exported with the
//! standard VITS settings work with a minimal config.
//!
//! # Inference Contract
//!
//! The ONNX graph takes `input` (token ids, int64 `[1, N]`), `input_lengths`
//! (int64 `[1]`), and `scales` (float32 `[3]`: noise, length, noise-w) and
//! produces the waveform as its first float32 output.
//!
//! # Example
//!
//! ```rust,no_run
//! use polyvox::engines::vits::VitsEngine;
//! use polyvox::SpeechEngine;
//! use std::path::Path;
//!
//! let mut engine = VitsEngine::load(
//!     Path::new("models/config.json"),
//!     Path::new("models/david.onnx"),
//!     None,
//! )?;
//! let samples = engine.synthesize("Hello, world!")?;
//! println!("{} samples at {} Hz", samples.len(), engine.sample_rate());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod model;
pub mod text;

pub use engine::{VitsEngine, VitsFactory};
pub use model::VitsError;
pub use text::VitsConfig;
