use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::VibeVoiceError;

/// A reference voice's conditioning vector, loaded from a `.pt` file.
///
/// Modern torch checkpoints are zip archives whose `data/N` entries hold
/// raw little-endian tensor storages. The prompt is reconstructed by
/// concatenating those storages as f32 in numeric entry order; the pickle
/// metadata is not needed to recover the conditioning values.
pub struct VoicePrompt {
    pub embedding: Vec<f32>,
}

impl VoicePrompt {
    pub fn load(path: &Path) -> Result<Self, VibeVoiceError> {
        let file = File::open(path)?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| {
            VibeVoiceError::VoicePromptParse(format!(
                "{}: not a torch zip archive: {e}",
                path.display()
            ))
        })?;

        // Storage entries are named "<archive>/data/<n>". Collect their
        // indices first; entry order inside the zip is not guaranteed.
        let mut storages: Vec<(u64, usize)> = Vec::new();
        for i in 0..zip.len() {
            let entry = zip.by_index(i).map_err(|e| {
                VibeVoiceError::VoicePromptParse(format!("Failed to read zip entry {i}: {e}"))
            })?;
            if let Some(idx) = storage_index(entry.name()) {
                storages.push((idx, i));
            }
        }
        storages.sort_unstable();

        let mut embedding = Vec::new();
        for (_, i) in storages {
            let mut entry = zip.by_index(i).map_err(|e| {
                VibeVoiceError::VoicePromptParse(format!("Failed to read zip entry {i}: {e}"))
            })?;
            let entry_name = entry.name().to_string();

            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(|e| {
                VibeVoiceError::VoicePromptParse(format!("Failed to read {entry_name}: {e}"))
            })?;

            if data.len() % 4 != 0 {
                return Err(VibeVoiceError::VoicePromptParse(format!(
                    "{entry_name}: storage length {} is not a multiple of 4",
                    data.len()
                )));
            }

            embedding.extend(
                data.chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            );
        }

        if embedding.is_empty() {
            return Err(VibeVoiceError::VoicePromptParse(format!(
                "{}: no tensor storage entries found",
                path.display()
            )));
        }

        log::debug!(
            "Loaded voice prompt {} ({} floats)",
            path.display(),
            embedding.len()
        );
        Ok(Self { embedding })
    }
}

/// Extract the numeric storage index from a `.../data/<n>` entry name.
fn storage_index(entry_name: &str) -> Option<u64> {
    let (parent, last) = entry_name.rsplit_once('/')?;
    if parent != "data" && !parent.ends_with("/data") {
        return None;
    }
    last.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{storage_index, VoicePrompt};
    use std::io::Write;

    fn write_pt(path: &std::path::Path, storages: &[(&str, &[f32])]) {
        let file = std::fs::File::create(path).expect("create");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        writer
            .start_file("archive/data.pkl", options)
            .expect("start pickle");
        writer.write_all(b"\x80\x02").expect("write pickle");

        for (name, values) in storages {
            writer.start_file(*name, options).expect("start storage");
            for v in *values {
                writer.write_all(&v.to_le_bytes()).expect("write f32");
            }
        }
        writer.finish().expect("finish");
    }

    #[test]
    fn loads_storages_in_numeric_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("En-Emma_woman.pt");
        write_pt(
            &path,
            &[
                ("archive/data/10", &[3.0f32][..]),
                ("archive/data/0", &[1.0f32, 2.0][..]),
            ],
        );

        let prompt = VoicePrompt::load(&path).expect("load");
        assert_eq!(prompt.embedding, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn non_zip_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("legacy.pt");
        std::fs::write(&path, b"\x80\x02not a zip").expect("write");
        assert!(VoicePrompt::load(&path).is_err());
    }

    #[test]
    fn archive_without_storages_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.pt");
        write_pt(&path, &[]);
        assert!(VoicePrompt::load(&path).is_err());
    }

    #[test]
    fn storage_index_matches_only_data_entries() {
        assert_eq!(storage_index("archive/data/3"), Some(3));
        assert_eq!(storage_index("data/0"), Some(0));
        assert_eq!(storage_index("archive/data.pkl"), None);
        assert_eq!(storage_index("archive/version"), None);
        assert_eq!(storage_index("metadata/3"), None);
        assert_eq!(storage_index("archive/data/meta"), None);
    }
}
