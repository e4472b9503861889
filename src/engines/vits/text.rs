use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::model::VitsError;

/// Shared synthesis configuration for all voices in a models directory.
#[derive(Debug, Clone, Deserialize)]
pub struct VitsConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    pub characters: CharacterTable,
    /// Interleave a blank token between every input token, as standard VITS
    /// training does.
    #[serde(default = "default_add_blank")]
    pub add_blank: bool,
    #[serde(default)]
    pub inference: InferenceDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
        }
    }
}

/// Character tables defining the model's input vocabulary.
///
/// Ids are assigned in table order: the pad character gets id 0, then the
/// punctuation characters, then the letters.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterTable {
    #[serde(default = "default_pad")]
    pub pad: String,
    #[serde(default)]
    pub punctuations: String,
    pub characters: String,
}

/// Scale inputs fed to the ONNX graph alongside the token ids.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceDefaults {
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f32,
    #[serde(default = "default_length_scale")]
    pub length_scale: f32,
    #[serde(default = "default_noise_w")]
    pub noise_w: f32,
}

impl Default for InferenceDefaults {
    fn default() -> Self {
        Self {
            noise_scale: default_noise_scale(),
            length_scale: default_length_scale(),
            noise_w: default_noise_w(),
        }
    }
}

fn default_add_blank() -> bool {
    true
}

fn default_sample_rate() -> u32 {
    crate::DEFAULT_SAMPLE_RATE
}

fn default_pad() -> String {
    "_".to_string()
}

fn default_noise_scale() -> f32 {
    0.667
}

fn default_length_scale() -> f32 {
    1.0
}

fn default_noise_w() -> f32 {
    0.8
}

impl VitsConfig {
    /// Load and parse the shared configuration file.
    pub fn load(path: &Path) -> Result<Self, VitsError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| VitsError::Config(format!("failed to parse {}: {e}", path.display())))
    }
}

/// Maps text characters to model token ids per the config tables.
pub struct Tokenizer {
    ids: HashMap<char, i64>,
    blank_id: Option<i64>,
}

impl Tokenizer {
    pub fn from_config(config: &VitsConfig) -> Result<Self, VitsError> {
        let table = &config.characters;
        let mut ids = HashMap::new();

        let all = table
            .pad
            .chars()
            .take(1)
            .chain(table.punctuations.chars())
            .chain(table.characters.chars());
        for (id, ch) in all.enumerate() {
            if ids.insert(ch, id as i64).is_some() {
                return Err(VitsError::Config(format!(
                    "character {ch:?} appears twice in the character tables"
                )));
            }
        }

        if ids.is_empty() {
            return Err(VitsError::Config("character tables are empty".to_string()));
        }

        // Blank interleaving reuses the pad id, as the standard export does.
        let blank_id = config.add_blank.then_some(0);
        Ok(Self { ids, blank_id })
    }

    /// Convert text to token ids.
    ///
    /// Characters missing from the tables fall back to their lowercase form
    /// and are otherwise silently dropped, matching the behavior of the
    /// upstream text cleaners.
    pub fn tokenize(&self, text: &str) -> Vec<i64> {
        let mut ids = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let id = self.ids.get(&ch).copied().or_else(|| {
                ch.to_lowercase()
                    .next()
                    .and_then(|lower| self.ids.get(&lower).copied())
            });
            if let Some(id) = id {
                ids.push(id);
            }
        }

        match self.blank_id {
            Some(blank) if !ids.is_empty() => intersperse(&ids, blank),
            _ => ids,
        }
    }
}

/// `[t0, t1]` becomes `[b, t0, b, t1, b]`.
fn intersperse(ids: &[i64], blank: i64) -> Vec<i64> {
    let mut out = Vec::with_capacity(ids.len() * 2 + 1);
    out.push(blank);
    for &id in ids {
        out.push(id);
        out.push(blank);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{Tokenizer, VitsConfig};

    fn config(json: &str) -> VitsConfig {
        serde_json::from_str(json).unwrap()
    }

    fn minimal() -> VitsConfig {
        config(
            r#"{
                "characters": {
                    "pad": "_",
                    "punctuations": "!? ",
                    "characters": "abcdehlo"
                },
                "add_blank": false
            }"#,
        )
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = config(r#"{"characters": {"characters": "ab"}}"#);
        assert_eq!(cfg.audio.sample_rate, crate::DEFAULT_SAMPLE_RATE);
        assert!(cfg.add_blank);
        assert_eq!(cfg.characters.pad, "_");
        assert!((cfg.inference.noise_scale - 0.667).abs() < f32::EPSILON);
        assert!((cfg.inference.length_scale - 1.0).abs() < f32::EPSILON);
        assert!((cfg.inference.noise_w - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn ids_follow_table_order() {
        let tok = Tokenizer::from_config(&minimal()).unwrap();
        // pad=0, '!'=1, '?'=2, ' '=3, then letters from 4
        assert_eq!(tok.tokenize("a"), vec![4]);
        assert_eq!(tok.tokenize("hello!"), vec![9, 8, 10, 10, 11, 1]);
    }

    #[test]
    fn unknown_characters_are_dropped() {
        let tok = Tokenizer::from_config(&minimal()).unwrap();
        assert_eq!(tok.tokenize("a#b"), tok.tokenize("ab"));
        assert!(tok.tokenize("#@%").is_empty());
    }

    #[test]
    fn uppercase_falls_back_to_lowercase() {
        let tok = Tokenizer::from_config(&minimal()).unwrap();
        assert_eq!(tok.tokenize("Hello"), tok.tokenize("hello"));
    }

    #[test]
    fn blank_interleaving_wraps_every_token() {
        let mut cfg = minimal();
        cfg.add_blank = true;
        let tok = Tokenizer::from_config(&cfg).unwrap();
        assert_eq!(tok.tokenize("ab"), vec![0, 4, 0, 5, 0]);
        // Empty input never yields a lone blank.
        assert!(tok.tokenize("").is_empty());
    }

    #[test]
    fn duplicate_table_characters_are_rejected() {
        let cfg = config(
            r#"{"characters": {"pad": "_", "punctuations": "a", "characters": "ab"}}"#,
        );
        assert!(Tokenizer::from_config(&cfg).is_err());
    }
}
