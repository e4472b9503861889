//! Speech synthesis engines.
//!
//! This module contains implementations of text-to-speech engines.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `vits` - single-speaker VITS voices (ONNX format)

#[cfg(feature = "vits")]
pub mod vits;
