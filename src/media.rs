use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::MediaConfig;
use crate::error::{PipelineError, Result};

/// Thin wrapper around the ffmpeg/ffprobe command-line tools.
///
/// Every operation is a single external-process invocation that writes its
/// destination file; a non-zero exit aborts with no retry.
#[derive(Debug, Clone)]
pub struct MediaToolkit {
    ffmpeg: String,
    ffprobe: String,
}

impl MediaToolkit {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_bin.clone(),
            ffprobe: config.ffprobe_bin.clone(),
        }
    }

    /// Query a media file's duration in seconds via ffprobe
    pub async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Probe {
                path: path.display().to_string(),
                reason: format!("{} ({})", output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration: f64 = stdout.trim().parse().map_err(|_| PipelineError::Probe {
            path: path.display().to_string(),
            reason: format!("unparseable duration {:?}", stdout.trim()),
        })?;

        debug!("Probed {}: {:.3}s", path.display(), duration);
        Ok(duration)
    }

    /// Copy the audio stream slice `[start, start + duration)` without
    /// re-encoding
    pub async fn extract_audio_segment(
        &self,
        src: &Path,
        dst: &Path,
        start: f64,
        duration: f64,
    ) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .args(["-ss", &format!("{:.6}", start)])
            .args(["-t", &format!("{:.6}", duration)])
            .arg("-i")
            .arg(src)
            .args(["-acodec", "copy"])
            .arg(dst);

        self.run_ffmpeg(cmd, "extract_audio_segment").await
    }

    /// Repeat the source video enough times that the re-encoded output is
    /// at least `target_duration` seconds long
    pub async fn loop_video_to_duration(
        &self,
        src: &Path,
        dst: &Path,
        target_duration: f64,
        source_duration: f64,
    ) -> Result<()> {
        let loops = loop_count(target_duration, source_duration);

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .args(["-stream_loop", &(loops - 1).to_string()])
            .arg("-i")
            .arg(src)
            .args(["-vcodec", "libx264", "-pix_fmt", "yuv420p"])
            .arg(dst);

        self.run_ffmpeg(cmd, "loop_video_to_duration").await
    }

    /// Truncate a video to exactly `duration` seconds from its start
    pub async fn trim_video(&self, src: &Path, dst: &Path, duration: f64) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .args(["-ss", "0"])
            .args(["-t", &format!("{:.6}", duration)])
            .arg("-i")
            .arg(src)
            .args(["-vcodec", "libx264", "-pix_fmt", "yuv420p"])
            .arg(dst);

        self.run_ffmpeg(cmd, "trim_video").await
    }

    /// Combine a video's image stream with a separate audio stream.
    /// Output duration follows the shorter input.
    pub async fn mux_audio_video(
        &self,
        video_src: &Path,
        audio_src: &Path,
        dst: &Path,
    ) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-i")
            .arg(video_src)
            .arg("-i")
            .arg(audio_src)
            .args(["-c:v", "libx264", "-c:a", "aac"])
            .args(["-pix_fmt", "yuv420p"])
            .arg("-shortest")
            .arg(dst);

        self.run_ffmpeg(cmd, "mux_audio_video").await
    }

    /// Render an SRT file into the video image; the audio stream is copied
    /// unchanged
    pub async fn burn_subtitles(&self, video_src: &Path, srt_path: &Path, dst: &Path) -> Result<()> {
        let subtitles_filter = format!("subtitles={}", srt_path.display());

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-i")
            .arg(video_src)
            .args(["-vf", &subtitles_filter])
            .args(["-c:v", "libx264", "-c:a", "copy"])
            .args(["-pix_fmt", "yuv420p"])
            .arg(dst);

        self.run_ffmpeg(cmd, "burn_subtitles").await
    }

    async fn run_ffmpeg(&self, mut cmd: Command, op: &'static str) -> Result<()> {
        debug!("Executing {}: {:?}", op, cmd);

        let output = cmd.stdin(Stdio::null()).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            warn!("{} failed ({}): {}", op, output.status, tail);

            return Err(PipelineError::Transform {
                op,
                reason: output.status.to_string(),
            });
        }

        info!("✅ {} completed", op);
        Ok(())
    }
}

/// Number of source repetitions needed to cover `target_duration`
fn loop_count(target_duration: f64, source_duration: f64) -> u32 {
    ((target_duration / source_duration).ceil() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_count_exact_multiple() {
        assert_eq!(loop_count(10.0, 5.0), 2);
    }

    #[test]
    fn test_loop_count_rounds_up() {
        assert_eq!(loop_count(10.0, 3.0), 4);
        assert_eq!(loop_count(0.5, 3.0), 1);
    }

    #[test]
    fn test_loop_count_never_zero() {
        assert_eq!(loop_count(0.0, 3.0), 1);
    }

    #[test]
    fn test_loop_count_source_longer_than_target() {
        assert_eq!(loop_count(2.0, 60.0), 1);
    }
}
