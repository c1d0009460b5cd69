//! VibeVoice TTS CLI — converts text to a speech audio file.
//!
//! One-shot invocation: discovers voice prompts on disk, fuzzy-resolves
//! the requested voice name, runs generation and writes WAV or OGG Opus.
//! On success a single JSON result object is printed to stdout; all
//! diagnostics go to stderr.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use vibevoice_tts::voices::{discover_voices, resolve_voice};
use vibevoice_tts::{generate, GenerationRequestBuilder, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Wav,
    Ogg,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Wav => OutputFormat::Wav,
            FormatArg::Ogg => OutputFormat::Ogg,
        }
    }
}

/// VibeVoice TTS — text to speech
#[derive(Parser, Debug)]
#[command(name = "vibevoice-tts", version)]
#[command(about = "VibeVoice TTS — text to speech")]
struct Args {
    /// Text to synthesize
    #[arg(long, required_unless_present = "list_voices")]
    text: Option<String>,

    /// Output file path
    #[arg(long, required_unless_present = "list_voices")]
    output: Option<PathBuf>,

    /// Voice name, fuzzy-matched against discovered voices
    #[arg(long, default_value = "Emma")]
    voice: String,

    /// Output format (ogg is Telegram-compatible voice format)
    #[arg(long, value_enum, default_value = "wav")]
    format: FormatArg,

    /// Classifier-free guidance scale
    #[arg(long, default_value_t = 1.5)]
    cfg_scale: f32,

    /// Directory containing the exported VibeVoice model
    #[arg(long, default_value = "models/vibevoice")]
    model_dir: PathBuf,

    /// Directory scanned recursively for voice-prompt .pt files
    #[arg(long, default_value = "models/vibevoice/voices")]
    voices_dir: PathBuf,

    /// List available voices and exit
    #[arg(long)]
    list_voices: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let voices = discover_voices(&args.voices_dir);

    if args.list_voices {
        for name in voices.keys() {
            println!("{name}");
        }
        return Ok(());
    }

    if voices.is_empty() {
        bail!("no voice files found in {}", args.voices_dir.display());
    }

    let text = args.text.context("--text is required")?;
    let output = args.output.context("--output is required")?;
    let voice_path = resolve_voice(&args.voice, &voices)
        .context("voice registry is empty")?
        .to_path_buf();

    let request = GenerationRequestBuilder::default()
        .text(text)
        .voice_path(voice_path)
        .model_dir(args.model_dir)
        .output_path(output)
        .cfg_scale(args.cfg_scale)
        .format(args.format.into())
        .build()
        .context("invalid generation request")?;

    let result = generate(&request)?;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
