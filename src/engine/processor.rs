use std::collections::HashMap;
use std::path::Path;

use super::model::VibeVoiceError;
use super::prompt::VoicePrompt;

/// Token ids and speaker conditioning prepared for one generation pass.
#[derive(Debug)]
pub struct ModelInputs<'a> {
    pub input_ids: Vec<i64>,
    pub speaker: &'a [f32],
}

/// Text front-end for the VibeVoice model.
///
/// Tokenizes input text against the vocabulary shipped in the model
/// directory's `config.json` (`"vocab"` object, single-character keys).
/// When the file or the field is absent, falls back to byte-level ids so
/// generation still works with minimal exports.
pub struct VibeVoiceProcessor {
    tokenizer: Tokenizer,
}

enum Tokenizer {
    Vocab(HashMap<char, i64>),
    ByteLevel,
}

impl VibeVoiceProcessor {
    /// Load the processor companion for the model in `model_dir`.
    ///
    /// A present-but-malformed `config.json` is fatal; a missing file or
    /// missing `"vocab"` field only downgrades to byte-level tokenization.
    pub fn from_pretrained(model_dir: &Path) -> Result<Self, VibeVoiceError> {
        let config_path = model_dir.join("config.json");
        if !config_path.exists() {
            log::warn!("config.json not found, using byte-level tokenization");
            return Ok(Self {
                tokenizer: Tokenizer::ByteLevel,
            });
        }

        let content = std::fs::read_to_string(&config_path)?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| VibeVoiceError::Config(format!("Failed to parse JSON: {e}")))?;

        let Some(vocab_value) = json.get("vocab") else {
            log::warn!("config.json has no 'vocab' field, using byte-level tokenization");
            return Ok(Self {
                tokenizer: Tokenizer::ByteLevel,
            });
        };

        let vocab_obj = vocab_value
            .as_object()
            .ok_or_else(|| VibeVoiceError::Config("'vocab' must be an object".to_string()))?;

        let mut vocab = HashMap::new();
        for (k, v) in vocab_obj {
            let ch = k
                .chars()
                .next()
                .ok_or_else(|| VibeVoiceError::Config(format!("Empty key in vocab: {k:?}")))?;
            let id = v.as_i64().ok_or_else(|| {
                VibeVoiceError::Config(format!("Non-integer vocab value for key {k:?}"))
            })?;
            vocab.insert(ch, id);
        }

        log::info!("Loaded vocab with {} entries", vocab.len());
        Ok(Self {
            tokenizer: Tokenizer::Vocab(vocab),
        })
    }

    /// Tokenize `text` into model input ids.
    ///
    /// With a vocab tokenizer, characters outside the vocabulary are
    /// silently dropped (matching the reference processor). Byte-level
    /// tokenization never drops anything.
    pub fn tokenize(&self, text: &str) -> Vec<i64> {
        match &self.tokenizer {
            Tokenizer::Vocab(vocab) => text.chars().filter_map(|ch| vocab.get(&ch).copied()).collect(),
            Tokenizer::ByteLevel => text.bytes().map(i64::from).collect(),
        }
    }

    /// Combine tokenized text with a voice prompt into model inputs.
    pub fn prepare<'a>(&self, text: &str, prompt: &'a VoicePrompt) -> ModelInputs<'a> {
        ModelInputs {
            input_ids: self.tokenize(text),
            speaker: &prompt.embedding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VibeVoiceProcessor;

    fn write_config(dir: &std::path::Path, content: &str) {
        std::fs::write(dir.join("config.json"), content).expect("write config");
    }

    #[test]
    fn tokenizes_with_config_vocab_and_drops_unknown_chars() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_config(dir.path(), r#"{"vocab": {"h": 1, "i": 2, " ": 3}}"#);

        let processor = VibeVoiceProcessor::from_pretrained(dir.path()).expect("load");
        assert_eq!(processor.tokenize("hi hi!"), vec![1, 2, 3, 1, 2]);
    }

    #[test]
    fn missing_config_falls_back_to_byte_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        let processor = VibeVoiceProcessor::from_pretrained(dir.path()).expect("load");
        assert_eq!(processor.tokenize("AB"), vec![65, 66]);
    }

    #[test]
    fn missing_vocab_field_falls_back_to_byte_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_config(dir.path(), r#"{"model_type": "vibevoice"}"#);

        let processor = VibeVoiceProcessor::from_pretrained(dir.path()).expect("load");
        assert_eq!(processor.tokenize("a"), vec![97]);
    }

    #[test]
    fn malformed_config_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_config(dir.path(), "{not json");
        assert!(VibeVoiceProcessor::from_pretrained(dir.path()).is_err());
    }

    #[test]
    fn non_integer_vocab_value_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_config(dir.path(), r#"{"vocab": {"a": "one"}}"#);
        assert!(VibeVoiceProcessor::from_pretrained(dir.path()).is_err());
    }
}
