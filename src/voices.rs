use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Mapping from lowercase voice name to the path of its `.pt` prompt file.
///
/// Held as a `BTreeMap` so iteration order is sorted, which makes every
/// "first match" decision in [`resolve_voice`] deterministic.
pub type VoiceRegistry = BTreeMap<String, PathBuf>;

/// Recursively scan `dir` for `.pt` voice-prompt files.
///
/// Voice names are the lowercased file stems (e.g. `en-emma_woman` for
/// `En-Emma_woman.pt`). A missing or empty directory yields an empty
/// registry; callers must treat that as a fatal precondition before
/// attempting generation.
pub fn discover_voices(dir: &Path) -> VoiceRegistry {
    let mut voices = VoiceRegistry::new();
    if !dir.exists() {
        return voices;
    }
    collect_voice_files(dir, &mut voices);
    log::debug!("Discovered {} voices in {}", voices.len(), dir.display());
    voices
}

fn collect_voice_files(dir: &Path, voices: &mut VoiceRegistry) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Skipping unreadable directory {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_voice_files(&path, voices);
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("pt") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            let abs = std::fs::canonicalize(&path).unwrap_or(path.clone());
            voices.insert(stem.to_lowercase(), abs);
        }
    }
}

/// Fuzzy-match a user-supplied voice name to a registry entry.
///
/// Resolution order, first match wins:
/// 1. exact case-insensitive key match;
/// 2. convenience match against the key with its gender suffix stripped
///    (`en-emma_woman` → `en-emma`) or its language prefix also stripped
///    (`en-emma` → `emma`);
/// 3. substring match in either direction, warning when ambiguous;
/// 4. the first `en-` voice, else the first entry overall, with a warning.
///
/// Returns `None` only when the registry is empty; for any non-empty
/// registry this always resolves to *some* path.
pub fn resolve_voice<'a>(name: &str, voices: &'a VoiceRegistry) -> Option<&'a Path> {
    let lower = name.trim().to_lowercase();

    if let Some(path) = voices.get(&lower) {
        return Some(path);
    }

    // Convenience match: "emma" or "en-emma" should find "en-emma_woman".
    for (key, path) in voices {
        let base = key.split('_').next().unwrap_or(key);
        let short = match base.rsplit_once('-') {
            Some((_, last)) => last,
            None => base,
        };
        if lower == base || lower == short {
            return Some(path);
        }
    }

    // Partial match in either direction.
    let matches: Vec<(&String, &PathBuf)> = voices
        .iter()
        .filter(|(key, _)| key.contains(&lower) || lower.contains(key.as_str()))
        .collect();
    if let Some((first, path)) = matches.first() {
        if matches.len() > 1 {
            let names: Vec<&str> = matches.iter().map(|(k, _)| k.as_str()).collect();
            log::warn!("Multiple matches for '{name}': {names:?}. Using '{first}'.");
        }
        return Some(path);
    }

    // Default to the first English voice.
    for (key, path) in voices {
        if key.starts_with("en-") {
            log::warn!("No voice found for '{name}', using default: {key}");
            return Some(path);
        }
    }

    // Absolute fallback.
    let (key, path) = voices.iter().next()?;
    log::warn!("No voice found for '{name}', using: {key}");
    Some(path)
}
