/// subclip - segmented subtitled-clip generation service
///
/// Splits an uploaded audio/video pair into equal-duration segments,
/// renders each as a standalone clip with burned-in subtitles, and
/// returns the set as a zip archive over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod progress;
pub mod transcription;

// Re-export main types for easy access
pub use crate::config::Config;
pub use crate::error::PipelineError;
pub use crate::media::MediaToolkit;
pub use crate::pipeline::{segment_windows, MediaUpload, SegmentPipeline, SegmentWindow};
pub use crate::progress::{ProgressSnapshot, ProgressTracker};
pub use crate::transcription::{Language, SrtFile, TranscriptSegment, WhisperTranscriber};
