use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::inputs;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::TensorRef;

use super::device::{execution_providers, AttentionKernel, DeviceConfig, Precision};
use super::processor::ModelInputs;

/// Output sample rate of the VibeVoice acoustic decoder.
pub const SAMPLE_RATE: u32 = 24000;

/// Number of diffusion refinement steps per generation. Fixed; the
/// realtime checkpoint is tuned for exactly this step count.
pub const DDPM_STEPS: i64 = 5;

#[derive(thiserror::Error, Debug)]
pub enum VibeVoiceError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
    #[error("No .onnx model file found in {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("Invalid config.json: {0}")]
    Config(String),
    #[error("Failed to parse voice prompt: {0}")]
    VoicePromptParse(String),
    #[error("No audio output generated")]
    NoAudioOutput,
    #[error(
        "ffmpeg not found. Install: Linux: `sudo apt-get install ffmpeg`, \
         macOS: `brew install ffmpeg`, Windows: https://ffmpeg.org/download.html"
    )]
    FfmpegNotFound,
    #[error("ffmpeg conversion failed: {0}")]
    Transcode(String),
}

/// VibeVoice ONNX model state.
pub struct VibeVoiceModel {
    session: Session,
    config: DeviceConfig,
}

impl VibeVoiceModel {
    /// Load the model from a directory containing the exported `.onnx`
    /// graph (precision variants are picked per [`DeviceConfig`]).
    ///
    /// When the fused attention kernel is selected and session
    /// construction fails, one retry with the generic kernel is made on
    /// the same device and precision. Any failure on the retry path
    /// propagates.
    pub fn load(model_dir: &Path, config: &DeviceConfig) -> Result<Self, VibeVoiceError> {
        let onnx_path = find_model_file(model_dir, config.precision)?;
        log::info!("Loading VibeVoice model from {}", onnx_path.display());

        let (session, attention) = match init_session(&onnx_path, config, config.attention) {
            Ok(session) => (session, config.attention),
            Err(e) if config.attention == AttentionKernel::Fused => {
                log::warn!("Fused attention kernel failed ({e}), falling back to generic kernel");
                let session = init_session(&onnx_path, config, AttentionKernel::Generic)?;
                (session, AttentionKernel::Generic)
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            session,
            config: DeviceConfig {
                attention,
                ..*config
            },
        })
    }

    /// Device configuration the session was actually built with.
    pub fn device_config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Run one deterministic generation pass and return the waveform
    /// samples at [`SAMPLE_RATE`].
    pub fn generate(
        &mut self,
        inputs: &ModelInputs<'_>,
        cfg_scale: f32,
    ) -> Result<Vec<f32>, VibeVoiceError> {
        if inputs.input_ids.is_empty() {
            log::warn!("No tokens produced from input text");
            return Ok(Vec::new());
        }

        let tokens_arr =
            Array2::from_shape_vec((1, inputs.input_ids.len()), inputs.input_ids.clone())?;
        let speaker_view =
            ndarray::ArrayView2::from_shape((1, inputs.speaker.len()), inputs.speaker)?;
        let cfg_arr = ndarray::arr1(&[cfg_scale]);
        let steps_arr = ndarray::arr1(&[DDPM_STEPS]);

        let output = self.session.run(inputs![
            "input_ids" => TensorRef::from_array_view(tokens_arr.view())?,
            "speaker_prompt" => TensorRef::from_array_view(speaker_view)?,
            "cfg_scale" => TensorRef::from_array_view(cfg_arr.view())?,
            "num_steps" => TensorRef::from_array_view(steps_arr.view())?,
        ])?;

        // First output is the waveform.
        let first_output = output.iter().next().ok_or(VibeVoiceError::NoAudioOutput)?;
        let waveform = first_output.1.try_extract_array::<f32>()?;

        Ok(waveform.as_slice().unwrap_or(&[]).to_vec())
    }
}

/// Find the ONNX graph in the model directory.
///
/// Prefers the precision-matched variant (`model_fp16.onnx` under fp16,
/// `model.onnx` otherwise), then falls back to the first `.onnx` file
/// found.
fn find_model_file(model_dir: &Path, precision: Precision) -> Result<PathBuf, VibeVoiceError> {
    let preferred = match precision {
        Precision::Fp16 => model_dir.join("model_fp16.onnx"),
        Precision::Fp32 => model_dir.join("model.onnx"),
    };
    if preferred.exists() {
        return Ok(preferred);
    }

    // Scan for any .onnx file
    for entry in std::fs::read_dir(model_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("onnx") {
            log::info!("Using ONNX file: {}", path.display());
            return Ok(path);
        }
    }

    Err(VibeVoiceError::ModelNotFound(model_dir.to_path_buf()))
}

/// Build the ONNX session for the chosen device and attention kernel.
fn init_session(
    onnx_path: &Path,
    config: &DeviceConfig,
    attention: AttentionKernel,
) -> Result<Session, VibeVoiceError> {
    let builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_execution_providers(execution_providers(config.device))?
        .with_parallel_execution(true)?;
    let builder = apply_attention_kernel(builder, attention)?;

    Ok(builder.commit_from_file(onnx_path)?)
}

fn apply_attention_kernel(
    builder: SessionBuilder,
    attention: AttentionKernel,
) -> Result<SessionBuilder, VibeVoiceError> {
    let disable = match attention {
        AttentionKernel::Fused => "0",
        AttentionKernel::Generic => "1",
    };
    Ok(builder.with_config_entry("session.disable_fused_attention", disable)?)
}

#[cfg(test)]
mod tests {
    use super::find_model_file;
    use crate::engine::device::Precision;

    #[test]
    fn prefers_precision_matched_graph() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("model.onnx"), b"x").expect("write");
        std::fs::write(dir.path().join("model_fp16.onnx"), b"x").expect("write");

        let fp32 = find_model_file(dir.path(), Precision::Fp32).expect("fp32");
        assert_eq!(fp32.file_name().and_then(|n| n.to_str()), Some("model.onnx"));

        let fp16 = find_model_file(dir.path(), Precision::Fp16).expect("fp16");
        assert_eq!(
            fp16.file_name().and_then(|n| n.to_str()),
            Some("model_fp16.onnx")
        );
    }

    #[test]
    fn falls_back_to_any_onnx_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("exported.onnx"), b"x").expect("write");

        let found = find_model_file(dir.path(), Precision::Fp32).expect("fallback");
        assert_eq!(
            found.file_name().and_then(|n| n.to_str()),
            Some("exported.onnx")
        );
    }

    #[test]
    fn missing_graph_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(find_model_file(dir.path(), Precision::Fp32).is_err());
    }
}
