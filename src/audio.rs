use std::path::Path;
use std::process::Command;

use crate::engine::model::VibeVoiceError;
use crate::OutputFormat;

/// Maximum number of ffmpeg stderr characters surfaced in an error.
const FFMPEG_STDERR_LIMIT: usize = 500;

/// Write samples to a 32-bit float mono WAV file.
pub fn write_wav(samples: &[f32], sample_rate: u32, path: &Path) -> Result<(), VibeVoiceError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Persist the waveform at `output_path` in the requested format.
///
/// The parent directory is created if absent. WAV is written directly;
/// OGG goes through a scoped temporary WAV that ffmpeg transcodes to
/// Opus. The temp file is removed on drop, so it never outlives this
/// call, whether transcoding succeeds or fails.
pub fn save(
    samples: &[f32],
    sample_rate: u32,
    output_path: &Path,
    format: OutputFormat,
) -> Result<(), VibeVoiceError> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match format {
        OutputFormat::Wav => write_wav(samples, sample_rate, output_path),
        OutputFormat::Ogg => {
            let tmp = tempfile::Builder::new()
                .prefix("vibevoice-")
                .suffix(".wav")
                .tempfile()?;
            write_wav(samples, sample_rate, tmp.path())?;
            wav_to_ogg_opus(tmp.path(), output_path)
        }
    }
}

/// Convert a WAV file to OGG Opus via ffmpeg (Telegram-compatible voice
/// format: mono, 48 kHz, 64 kbit/s).
pub fn wav_to_ogg_opus(wav_path: &Path, ogg_path: &Path) -> Result<(), VibeVoiceError> {
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(wav_path)
        .args(["-c:a", "libopus", "-b:a", "64k", "-ar", "48000", "-ac", "1"])
        .arg(ogg_path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VibeVoiceError::FfmpegNotFound
            } else {
                VibeVoiceError::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VibeVoiceError::Transcode(truncate_chars(
            &stderr,
            FFMPEG_STDERR_LIMIT,
        )));
    }

    Ok(())
}

fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}
