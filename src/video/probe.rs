use std::path::Path;
use std::process::Command;
use tracing::warn;

/// ffprobe exit status as a validity check. A missing binary counts as
/// a failed probe.
pub fn probe_ok(path: &Path) -> bool {
    match Command::new("ffprobe")
        .args(["-v", "error", "-i"])
        .arg(path)
        .output()
    {
        Ok(out) => {
            if !out.status.success() {
                warn!(
                    "ffprobe rejected {}: {}",
                    path.display(),
                    String::from_utf8_lossy(&out.stderr)
                );
            }
            out.status.success()
        }
        Err(e) => {
            warn!("Failed to run ffprobe: {}", e);
            false
        }
    }
}

/// Whether the container's first audio stream exists.
pub fn has_audio_stream(path: &Path) -> bool {
    match Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "a:0",
            "-show_entries",
            "stream=codec_type",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
    {
        Ok(out) => String::from_utf8_lossy(&out.stdout).contains("audio"),
        Err(e) => {
            warn!("Failed to run ffprobe: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_rejects_a_nonexistent_file() {
        // Holds whether ffprobe is installed (exit != 0) or missing
        // (spawn error); both count as a failed probe.
        assert!(!probe_ok(Path::new("/definitely/not/here.mp3")));
    }
}
