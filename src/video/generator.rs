use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::video::probe;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

pub struct VideoGenerator<'a> {
    cfg: &'a Config,
}

impl<'a> VideoGenerator<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Self { cfg }
    }

    /// Assemble frames into the final video. The silent encode is the one
    /// unrecoverable step; audio muxing degrades to the silent cut.
    pub fn assemble(
        &self,
        frames: &[PathBuf],
        output: &Path,
        audio: Option<&Path>,
        seconds_per_frame: u32,
    ) -> Result<PathBuf> {
        if frames.is_empty() {
            return Err(PipelineError::Ffmpeg("no frames to assemble".to_string()));
        }
        info!(
            "Creating video with {} frames, duration: {}s each",
            frames.len(),
            seconds_per_frame
        );

        let work_dir = self.cfg.output_dir.join(".work");
        fs::create_dir_all(&work_dir)?;
        let manifest_path = work_dir.join("frames.txt");
        write_concat_manifest(frames, seconds_per_frame, &manifest_path)?;

        let silent_path = work_dir.join("silent_video.mp4");
        self.encode_silent(&manifest_path, &silent_path)?;

        let mut muxed = false;
        if let Some(audio_path) = audio {
            if probe::probe_ok(audio_path) {
                match self.mux_audio(&silent_path, audio_path, output) {
                    Ok(()) => {
                        muxed = true;
                        if probe::has_audio_stream(output) {
                            info!("Output video contains audio");
                        } else {
                            warn!("Output video does not contain an audio stream");
                        }
                    }
                    Err(e) => {
                        warn!("Error adding audio: {}", e);
                        warn!("Using silent video as fallback");
                    }
                }
            } else {
                warn!("Audio file failed validation, producing silent video");
            }
        } else {
            info!("No valid audio - using silent video");
        }

        if !muxed {
            fs::copy(&silent_path, output)?;
        }

        // Best-effort cleanup of the intermediates.
        if let Err(e) = fs::remove_dir_all(&work_dir) {
            warn!("Error cleaning up temp files: {}", e);
        }

        let size = fs::metadata(output).map(|meta| meta.len()).unwrap_or(0);
        if size == 0 {
            return Err(PipelineError::Ffmpeg(format!(
                "final video missing or empty: {}",
                output.display()
            )));
        }
        info!("Final video created at {}, size: {} bytes", output.display(), size);
        Ok(output.to_path_buf())
    }

    fn encode_silent(&self, manifest: &Path, output: &Path) -> Result<()> {
        info!("Creating silent video from frames...");
        let out = Command::new("ffmpeg")
            .arg("-y")
            .args(["-f", "concat", "-safe", "0"])
            .arg("-i")
            .arg(manifest)
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg("-preset")
            .arg(&self.cfg.preset)
            .arg("-crf")
            .arg(self.cfg.crf.to_string())
            .arg("-r")
            .arg(self.cfg.frame_rate.to_string())
            .arg(output)
            .output()
            .map_err(|e| PipelineError::Ffmpeg(format!("Failed to run FFmpeg: {}", e)))?;

        if !out.status.success() {
            return Err(PipelineError::Ffmpeg(format!(
                "Silent video encode failed: {}",
                String::from_utf8_lossy(&out.stderr)
            )));
        }
        info!("Silent video created: {}", output.display());
        Ok(())
    }

    /// Mux the audio track into the silent video: video stream copied,
    /// audio re-encoded to AAC, truncated to the shorter stream.
    fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        info!("Adding custom audio to video...");
        let out = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-c:v", "copy", "-c:a", "aac"])
            .arg("-b:a")
            .arg(&self.cfg.audio_bitrate)
            .arg("-shortest")
            .arg(output)
            .output()
            .map_err(|e| PipelineError::Ffmpeg(format!("Failed to run FFmpeg: {}", e)))?;

        if !out.status.success() {
            return Err(PipelineError::Ffmpeg(format!(
                "Audio mux failed: {}",
                String::from_utf8_lossy(&out.stderr)
            )));
        }
        info!("Audio added successfully");
        Ok(())
    }
}

/// Concat-demuxer manifest: each frame with its display duration, then
/// the last frame repeated without one (the demuxer requires it).
pub fn write_concat_manifest(
    frames: &[PathBuf],
    seconds_per_frame: u32,
    path: &Path,
) -> Result<()> {
    let mut manifest = String::new();
    for frame in frames {
        let abs = absolute(frame)?;
        manifest.push_str(&format!("file '{}'\n", abs.display()));
        manifest.push_str(&format!("duration {}\n", seconds_per_frame));
    }
    if let Some(last) = frames.last() {
        manifest.push_str(&format!("file '{}'\n", absolute(last)?.display()));
    }
    fs::write(path, manifest)?;
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn manifest_pairs_every_frame_with_a_duration() {
        let tmp = tempdir().unwrap();
        let frames: Vec<PathBuf> = (1..=3)
            .map(|i| tmp.path().join(format!("frame_{}.png", i)))
            .collect();

        let manifest_path = tmp.path().join("frames.txt");
        write_concat_manifest(&frames, 5, &manifest_path).unwrap();

        let contents = fs::read_to_string(&manifest_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        // 3 file/duration pairs plus the repeated last frame.
        assert_eq!(lines.len(), 7);
        assert_eq!(lines.iter().filter(|l| l.starts_with("file '")).count(), 4);
        assert_eq!(lines.iter().filter(|l| **l == "duration 5").count(), 3);
        assert!(lines[6].starts_with("file '"));
        assert!(lines[6].ends_with("frame_3.png'"));
        assert_eq!(lines[5], "duration 5");
    }

    #[test]
    fn manifest_for_one_frame_repeats_it_once() {
        let tmp = tempdir().unwrap();
        let frames = vec![tmp.path().join("only.png")];
        let manifest_path = tmp.path().join("frames.txt");
        write_concat_manifest(&frames, 10, &manifest_path).unwrap();

        let contents = fs::read_to_string(&manifest_path).unwrap();
        let file_lines: Vec<&str> = contents
            .lines()
            .filter(|l| l.starts_with("file '"))
            .collect();
        assert_eq!(file_lines.len(), 2);
        assert_eq!(file_lines[0], file_lines[1]);
    }

    #[test]
    fn assembling_nothing_is_an_error() {
        let cfg = Config::default();
        let generator = VideoGenerator::new(&cfg);
        let result = generator.assemble(&[], Path::new("out.mp4"), None, 5);
        assert!(matches!(result, Err(PipelineError::Ffmpeg(_))));
    }
}
