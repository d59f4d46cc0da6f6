use crate::error::Result;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Everything the pipeline stages need to know, built once in `main`
/// and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub quotes_dir: PathBuf,
    pub images_dir: PathBuf,
    pub frames_dir: PathBuf,
    pub output_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub history_file: PathBuf,

    /// Output raster size, 9:16 for Shorts.
    pub width: u32,
    pub height: u32,

    /// Character budget per wrapped quote line.
    pub max_chars_per_line: usize,
    /// Vertical advance between quote lines, in pixels.
    pub line_pitch: u32,
    pub quote_font_size: f32,
    pub title_font_size: f32,

    /// How many rounds of quote generation to try before accepting a shortfall.
    pub fetch_attempts: usize,

    pub frame_rate: u32,
    pub crf: u32,
    pub preset: String,
    pub audio_bitrate: String,

    /// Below this size a rendered background is considered suspicious.
    pub min_image_bytes: u64,
    /// Treat an undersized background as a failure instead of a warning.
    pub strict_image_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quotes_dir: PathBuf::from("./quotes"),
            images_dir: PathBuf::from("./images"),
            frames_dir: PathBuf::from("./frames"),
            output_dir: PathBuf::from("./output"),
            audio_dir: PathBuf::from("./audio"),
            history_file: PathBuf::from("./quotes_history.txt"),
            width: 1080,
            height: 1920,
            max_chars_per_line: 25,
            line_pitch: 100,
            quote_font_size: 60.0,
            title_font_size: 48.0,
            fetch_attempts: 5,
            frame_rate: 30,
            crf: 23,
            preset: "medium".to_string(),
            audio_bitrate: "192k".to_string(),
            min_image_bytes: 1000,
            strict_image_check: false,
        }
    }
}

impl Config {
    /// Create the working directories and drop quote files left over from
    /// a previous run, so every run starts from fresh quotes.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.quotes_dir,
            &self.images_dir,
            &self.frames_dir,
            &self.output_dir,
            &self.audio_dir,
        ] {
            fs::create_dir_all(dir)?;
        }

        if let Ok(entries) = fs::read_dir(&self.quotes_dir) {
            for entry in entries.filter_map(|e| e.ok()) {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with("quote_") && name.ends_with(".txt") {
                    fs::remove_file(entry.path())?;
                    info!("Removed old quote file: {}", entry.path().display());
                }
            }
        }

        Ok(())
    }
}
