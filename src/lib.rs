//! # vibevoice-tts
//!
//! Text-to-speech using the VibeVoice-Realtime model exported to ONNX.
//!
//! ## Features
//!
//! - **Fuzzy voice selection**: bare names like `"Emma"` resolve against
//!   discovered voice-prompt files like `en-emma_woman.pt`
//! - **Automatic device selection**: CUDA (fp16, fused attention), CoreML
//!   or CPU, probed at startup
//! - **WAV and OGG Opus output**: OGG via an external ffmpeg transcode
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use vibevoice_tts::{generate, GenerationRequestBuilder};
//!
//! let request = GenerationRequestBuilder::default()
//!     .text("Hello world".to_string())
//!     .voice_path(PathBuf::from("voices/en-emma_woman.pt"))
//!     .model_dir(PathBuf::from("models/vibevoice"))
//!     .output_path(PathBuf::from("hello.wav"))
//!     .build()?;
//!
//! let result = generate(&request)?;
//! println!("{}", serde_json::to_string(&result)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audio;
pub mod engine;
pub mod text;
pub mod voices;

use std::path::PathBuf;
use std::time::Instant;

use derive_builder::Builder;
use serde::Serialize;

pub use engine::VibeVoiceError;
use engine::{VibeVoiceModel, VibeVoiceProcessor, VoicePrompt, SAMPLE_RATE};

/// Output audio container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Wav,
    Ogg,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Ogg => "ogg",
        }
    }
}

/// One synthesis request, immutable once built.
#[derive(Debug, Clone, Builder)]
pub struct GenerationRequest {
    /// Text to synthesize.
    pub text: String,
    /// Resolved path to the voice-prompt `.pt` file.
    pub voice_path: PathBuf,
    /// Directory containing the exported model.
    pub model_dir: PathBuf,
    /// Destination file.
    pub output_path: PathBuf,
    /// Classifier-free guidance scale.
    #[builder(default = "1.5")]
    pub cfg_scale: f32,
    #[builder(default = "OutputFormat::Wav")]
    pub format: OutputFormat,
}

/// Metadata for a completed generation, printed as JSON on stdout.
#[derive(Debug, Serialize)]
pub struct GenerationResult {
    pub output_path: String,
    pub format: String,
    pub voice: String,
    pub duration_seconds: f64,
    pub generation_seconds: f64,
    /// Real-time factor: generation wall-clock time divided by audio
    /// duration. Below 1.0 means faster than real time.
    pub rtf: f64,
    pub device: String,
}

/// Run the full synthesis pipeline for one request.
///
/// Loads the voice prompt, processor and model, generates the waveform
/// and persists it in the requested format. The output file is only
/// written after generation has produced a non-empty waveform, so a
/// failed run never leaves a partial file at the destination.
pub fn generate(request: &GenerationRequest) -> Result<GenerationResult, VibeVoiceError> {
    let device = engine::select_device();
    let prompt = VoicePrompt::load(&request.voice_path)?;
    let voice = voice_basename(&request.voice_path);
    log::info!("Device: {}, Voice: {}", device.device.as_str(), voice);

    let processor = VibeVoiceProcessor::from_pretrained(&request.model_dir)?;
    let mut model = VibeVoiceModel::load(&request.model_dir, &device)?;

    let clean_text = text::normalize_quotes(&request.text);
    let inputs = processor.prepare(&clean_text, &prompt);

    let start = Instant::now();
    let samples = model.generate(&inputs, request.cfg_scale)?;
    let generation_seconds = start.elapsed().as_secs_f64();

    if samples.is_empty() {
        return Err(VibeVoiceError::NoAudioOutput);
    }

    let duration_seconds = samples.len() as f64 / SAMPLE_RATE as f64;
    audio::save(&samples, SAMPLE_RATE, &request.output_path, request.format)?;

    Ok(GenerationResult {
        output_path: request.output_path.display().to_string(),
        format: request.format.as_str().to_string(),
        voice,
        duration_seconds: round2(duration_seconds),
        generation_seconds: round2(generation_seconds),
        rtf: if duration_seconds > 0.0 {
            round2(generation_seconds / duration_seconds)
        } else {
            0.0
        },
        device: model.device_config().device.as_str().to_string(),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Voice identifier reported in the result: the prompt file's name with
/// extension and original casing, e.g. `En-Emma_woman.pt`.
fn voice_basename(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::{round2, voice_basename, GenerationRequestBuilder, OutputFormat};
    use std::path::{Path, PathBuf};

    #[test]
    fn request_builder_applies_defaults() {
        let request = GenerationRequestBuilder::default()
            .text("hi".to_string())
            .voice_path(PathBuf::from("/v/emma.pt"))
            .model_dir(PathBuf::from("models/vibevoice"))
            .output_path(PathBuf::from("/tmp/out.wav"))
            .build()
            .expect("build");

        assert_eq!(request.cfg_scale, 1.5);
        assert_eq!(request.format, OutputFormat::Wav);
    }

    #[test]
    fn request_builder_requires_text() {
        let result = GenerationRequestBuilder::default()
            .voice_path(PathBuf::from("/v/emma.pt"))
            .model_dir(PathBuf::from("models/vibevoice"))
            .output_path(PathBuf::from("/tmp/out.wav"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn voice_id_keeps_file_name_casing_and_extension() {
        assert_eq!(
            voice_basename(Path::new("/voices/En-Emma_woman.pt")),
            "En-Emma_woman.pt"
        );
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(0.12345), 0.12);
        assert_eq!(round2(1.5), 1.5);
        assert_eq!(round2(2.71828), 2.72);
        assert_eq!(round2(0.0), 0.0);
    }
}
