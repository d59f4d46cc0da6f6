use crate::config::Config;
use crate::video::probe;
use rand::seq::SliceRandom;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Formats accepted from the audio directory.
pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "m4a"];

/// Resolve the background audio track, if any. Purely advisory: `None`
/// means the video goes out silent.
pub fn select_audio(cfg: &Config, requested: Option<&str>) -> Option<PathBuf> {
    if let Some(name) = requested {
        let path = cfg.audio_dir.join(name);
        if !path.exists() {
            warn!(
                "Specified audio file not found: {}. Place the file in {}",
                name,
                cfg.audio_dir.display()
            );
            return None;
        }
        info!("Using specified audio file: {}", path.display());
        return validated(path);
    }

    info!(
        "Looking for custom audio files in {}...",
        cfg.audio_dir.display()
    );
    let mut files = scan_audio_files(&cfg.audio_dir);
    if files.is_empty() {
        info!(
            "No custom audio files found. Place MP3, WAV, or M4A files in {}",
            cfg.audio_dir.display()
        );
        return None;
    }
    files.sort();

    let selected = files.choose(&mut rand::thread_rng())?.clone();
    info!("Selected audio file: {}", selected.display());
    validated(selected)
}

/// All files in `dir` carrying one of the accepted extensions
/// (case-insensitive). A missing directory scans as empty.
pub fn scan_audio_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect()
}

fn validated(path: PathBuf) -> Option<PathBuf> {
    if probe::probe_ok(&path) {
        info!("Audio file validation successful");
        Some(path)
    } else {
        warn!("Audio validation failed: {}", path.display());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scan_keeps_known_extensions_only() {
        let tmp = tempdir().unwrap();
        for name in ["track.mp3", "loop.WAV", "voice.m4a", "cover.png", "notes.txt"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }

        let mut names: Vec<String> = scan_audio_files(tmp.path())
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        assert_eq!(names, vec!["loop.WAV", "track.mp3", "voice.m4a"]);
    }

    #[test]
    fn missing_directory_scans_as_empty() {
        let tmp = tempdir().unwrap();
        assert!(scan_audio_files(&tmp.path().join("nope")).is_empty());
    }

    #[test]
    fn empty_directory_selects_nothing() {
        let tmp = tempdir().unwrap();
        let cfg = Config {
            audio_dir: tmp.path().to_path_buf(),
            ..Config::default()
        };
        assert_eq!(select_audio(&cfg, None), None);
    }

    #[test]
    fn missing_requested_file_selects_nothing() {
        let tmp = tempdir().unwrap();
        let cfg = Config {
            audio_dir: tmp.path().to_path_buf(),
            ..Config::default()
        };
        assert_eq!(select_audio(&cfg, Some("ghost.mp3")), None);
    }
}
