//! VibeVoice inference engine.
//!
//! Wraps the ONNX-exported VibeVoice-Realtime model: device and precision
//! selection, session construction with a one-shot fused-attention
//! fallback, text tokenization, voice-prompt loading and the generation
//! call itself.
//!
//! # Model Directory Layout
//!
//! ```text
//! models/vibevoice/
//! ├── model.onnx           # fp32 graph (model_fp16.onnx used on CUDA)
//! ├── config.json          # optional tokenizer vocabulary
//! └── voices/
//!     └── streaming_model/
//!         ├── en-emma_woman.pt
//!         └── ...
//! ```
//!
//! Voice prompts are torch `.pt` checkpoints; their names follow the
//! pattern `{lang}-{name}_{gender}`, e.g. `en-emma_woman` or
//! `de-spk0_man`.

pub mod device;
pub mod model;
pub mod processor;
pub mod prompt;

pub use device::{select_device, AttentionKernel, Device, DeviceConfig, Precision};
pub use model::{VibeVoiceError, VibeVoiceModel, DDPM_STEPS, SAMPLE_RATE};
pub use processor::{ModelInputs, VibeVoiceProcessor};
pub use prompt::VoicePrompt;
