use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{error, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::media::MediaToolkit;
use crate::progress::ProgressTracker;
use crate::transcription::{Language, WhisperTranscriber};

pub const MIN_PARTS: u32 = 1;
pub const MAX_PARTS: u32 = 30;

/// Reject part counts outside `[MIN_PARTS, MAX_PARTS]` before any media
/// work happens
pub fn validate_parts(parts: i64) -> Result<u32> {
    if parts < MIN_PARTS as i64 || parts > MAX_PARTS as i64 {
        return Err(PipelineError::Validation(format!(
            "parts must be between {} and {}",
            MIN_PARTS, MAX_PARTS
        )));
    }
    Ok(parts as u32)
}

/// One `[start, end)` slice of the source audio assigned to an output clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWindow {
    /// Zero-based index
    pub index: u32,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl SegmentWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Degenerate windows are skipped without touching progress. Only
    /// reachable through floating-point edge cases near the final segment.
    pub fn is_degenerate(&self) -> bool {
        self.duration() <= 0.0
    }
}

/// Compute the contiguous segment windows covering `[0, total_duration)`
pub fn segment_windows(total_duration: f64, parts: u32) -> Vec<SegmentWindow> {
    let segment_duration = total_duration / parts as f64;

    (0..parts)
        .map(|i| {
            let start = segment_duration * i as f64;
            // The final end is pinned to the exact total to absorb
            // floating-point drift in the multiplication
            let end = if i + 1 == parts {
                total_duration
            } else {
                (segment_duration * (i + 1) as f64).min(total_duration)
            };
            SegmentWindow { index: i, start, end }
        })
        .collect()
}

/// An uploaded media file: raw bytes plus the client-supplied filename
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    pub fn new(filename: Option<String>, bytes: Vec<u8>) -> Self {
        Self { filename, bytes }
    }

    /// Name used inside the scratch directory. Only the final path
    /// component of the client-supplied name is kept.
    fn stored_name(&self, fallback: &str) -> String {
        self.filename
            .as_deref()
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// In-memory zip accumulating one deflated entry per finished clip
struct SegmentArchive {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl SegmentArchive {
    fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Add a clip under its zero-padded 1-based entry name
    fn add_clip(&mut self, index: u32, bytes: &[u8]) -> Result<()> {
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer.start_file(entry_name(index), options)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        Ok(self.writer.finish()?.into_inner())
    }
}

/// Archive entry name for a zero-based segment index
fn entry_name(index: u32) -> String {
    format!("segment_{:02}.mp4", index + 1)
}

/// Drives the per-segment media chain: slice audio, loop and trim video,
/// mux, transcribe, burn subtitles, archive.
pub struct SegmentPipeline {
    media: MediaToolkit,
    transcriber: WhisperTranscriber,
    progress: Arc<ProgressTracker>,
}

impl SegmentPipeline {
    pub fn new(config: &Config, progress: Arc<ProgressTracker>) -> Self {
        Self {
            media: MediaToolkit::new(&config.media),
            transcriber: WhisperTranscriber::new(&config.transcription),
            progress,
        }
    }

    /// Split the uploaded audio into `parts` equal windows, render one
    /// subtitled clip per window, and return the zip archive bytes.
    ///
    /// The first failing step aborts the whole request; no partial archive
    /// is ever returned. The scratch directory is removed on every exit
    /// path when the `TempDir` drops.
    pub async fn run(
        &self,
        audio: MediaUpload,
        video: MediaUpload,
        parts: u32,
        language: Language,
    ) -> Result<Vec<u8>> {
        let parts = validate_parts(parts as i64)?;

        let scratch = TempDir::new()?;
        let dir = scratch.path();

        let audio_name = audio.stored_name("audio.mp3");
        let mut video_name = video.stored_name("video.mp4");
        if video_name == audio_name {
            // Identical client filenames would make the second write
            // clobber the first
            video_name = format!("src_{}", video_name);
        }

        let audio_path = dir.join(&audio_name);
        let video_path = dir.join(&video_name);

        info!("Saving uploaded files to scratch dir: {}", dir.display());
        tokio::fs::write(&audio_path, &audio.bytes).await?;
        tokio::fs::write(&video_path, &video.bytes).await?;

        self.progress.reset(parts);

        let total_duration = match self.media.probe_duration(&audio_path).await {
            Ok(duration) => duration,
            Err(e) => {
                error!("Failed to probe audio duration: {}", e);
                return Err(PipelineError::InvalidMedia("Invalid audio file".to_string()));
            }
        };
        if total_duration <= 0.0 {
            return Err(PipelineError::InvalidMedia(
                "Audio has invalid duration".to_string(),
            ));
        }
        info!("Audio duration: {:.3}s", total_duration);

        let video_duration = match self.media.probe_duration(&video_path).await {
            Ok(duration) => duration,
            Err(e) => {
                error!("Failed to probe video duration: {}", e);
                return Err(PipelineError::InvalidMedia("Invalid video file".to_string()));
            }
        };
        if video_duration <= 0.0 {
            return Err(PipelineError::InvalidMedia(
                "Video has invalid duration".to_string(),
            ));
        }
        info!("Video duration: {:.3}s", video_duration);

        info!("Segment duration: {:.3}s", total_duration / parts as f64);

        let mut archive = SegmentArchive::new();

        for window in segment_windows(total_duration, parts) {
            if window.is_degenerate() {
                warn!(
                    "Skipping empty segment {} (start={:.3}, end={:.3})",
                    window.index + 1,
                    window.start,
                    window.end
                );
                continue;
            }

            info!(
                "✂️ Processing segment {}/{}: start={:.3}, end={:.3}, dur={:.3}",
                window.index + 1,
                parts,
                window.start,
                window.end,
                window.duration()
            );

            let clip_path = self
                .render_clip(dir, &audio_path, &video_path, video_duration, &window, language)
                .await?;

            let clip_bytes = tokio::fs::read(&clip_path).await?;
            archive.add_clip(window.index, &clip_bytes)?;

            self.progress.set_completed(window.index + 1);
        }

        let archive_bytes = archive.finish()?;
        self.progress.finish();
        info!("🎉 All segments packed into zip ({} bytes)", archive_bytes.len());

        Ok(archive_bytes)
    }

    /// Run the per-window media chain in strict sequence and return the
    /// path of the final subtitled clip
    async fn render_clip(
        &self,
        dir: &Path,
        audio_path: &Path,
        video_path: &Path,
        video_duration: f64,
        window: &SegmentWindow,
        language: Language,
    ) -> Result<PathBuf> {
        let n = window.index + 1;
        let seg_dur = window.duration();

        let slice_ext = audio_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_else(|| "mp3".to_string());

        let audio_slice = dir.join(format!("audio_{:02}.{}", n, slice_ext));
        self.media
            .extract_audio_segment(audio_path, &audio_slice, window.start, seg_dur)
            .await?;
        info!("Audio segment written: {}", audio_slice.display());

        let looped_video = dir.join(format!("video_loop_{:02}.mp4", n));
        self.media
            .loop_video_to_duration(video_path, &looped_video, seg_dur, video_duration)
            .await?;
        info!("Looped video written: {}", looped_video.display());

        let trimmed_video = dir.join(format!("video_trim_{:02}.mp4", n));
        self.media
            .trim_video(&looped_video, &trimmed_video, seg_dur)
            .await?;
        info!("Trimmed video written: {}", trimmed_video.display());

        let muxed_video = dir.join(format!("segment_{:02}_nosubs.mp4", n));
        self.media
            .mux_audio_video(&trimmed_video, &audio_slice, &muxed_video)
            .await?;
        info!("Muxed segment ready: {}", muxed_video.display());

        let srt_path = dir.join(format!("segment_{:02}.srt", n));
        self.transcriber
            .generate_srt(&audio_slice, &srt_path, language, dir)
            .await?;

        let final_path = dir.join(entry_name(window.index));
        self.media
            .burn_subtitles(&muxed_video, &srt_path, &final_path)
            .await?;
        info!("Final subtitled segment ready: {}", final_path.display());

        Ok(final_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_windows_cover_total_duration() {
        for parts in 1..=MAX_PARTS {
            let total = 127.37;
            let windows = segment_windows(total, parts);
            assert_eq!(windows.len(), parts as usize);

            let sum: f64 = windows
                .iter()
                .filter(|w| !w.is_degenerate())
                .map(|w| w.duration())
                .sum();
            assert!(
                (sum - total).abs() < EPSILON,
                "parts={}: sum {} != total {}",
                parts,
                sum,
                total
            );
        }
    }

    #[test]
    fn test_windows_are_contiguous() {
        let windows = segment_windows(100.0, 7);
        assert!((windows[0].start - 0.0).abs() < EPSILON);
        for pair in windows.windows(2) {
            assert!((pair[0].end - pair[1].start).abs() < EPSILON);
        }
    }

    #[test]
    fn test_single_part_spans_everything() {
        let windows = segment_windows(42.5, 1);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, 0.0);
        assert_eq!(windows[0].end, 42.5);
    }

    #[test]
    fn test_ten_seconds_in_three_parts() {
        let windows = segment_windows(10.0, 3);

        assert!((windows[0].start - 0.0).abs() < EPSILON);
        assert!((windows[0].end - 10.0 / 3.0).abs() < EPSILON);
        assert!((windows[1].end - 20.0 / 3.0).abs() < EPSILON);
        // The last end is exactly the total, not a float product
        assert_eq!(windows[2].end, 10.0);
    }

    #[test]
    fn test_degenerate_window_detection() {
        let window = SegmentWindow {
            index: 2,
            start: 5.0,
            end: 5.0,
        };
        assert!(window.is_degenerate());

        let window = SegmentWindow {
            index: 0,
            start: 0.0,
            end: 0.1,
        };
        assert!(!window.is_degenerate());
    }

    #[test]
    fn test_validate_parts_bounds() {
        assert!(validate_parts(0).is_err());
        assert!(validate_parts(-3).is_err());
        assert!(validate_parts(31).is_err());
        assert_eq!(validate_parts(1).unwrap(), 1);
        assert_eq!(validate_parts(30).unwrap(), 30);
    }

    #[test]
    fn test_validate_parts_message() {
        let err = validate_parts(99).unwrap_err();
        assert_eq!(err.detail(), "parts must be between 1 and 30");
    }

    #[test]
    fn test_stored_name_uses_final_component() {
        let upload = MediaUpload::new(Some("../../etc/passwd".to_string()), vec![]);
        assert_eq!(upload.stored_name("audio.mp3"), "passwd");
    }

    #[test]
    fn test_stored_name_fallback() {
        let upload = MediaUpload::new(None, vec![]);
        assert_eq!(upload.stored_name("audio.mp3"), "audio.mp3");

        let upload = MediaUpload::new(Some("".to_string()), vec![]);
        assert_eq!(upload.stored_name("video.mp4"), "video.mp4");
    }

    #[test]
    fn test_archive_entry_names() {
        let mut archive = SegmentArchive::new();
        archive.add_clip(0, b"first clip").unwrap();
        archive.add_clip(1, b"second clip").unwrap();
        let bytes = archive.finish().unwrap();

        let reader = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = reader.file_names().collect();
        assert!(names.contains(&"segment_01.mp4"));
        assert!(names.contains(&"segment_02.mp4"));
        assert_eq!(names.len(), 2);
    }
}
