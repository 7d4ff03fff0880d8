pub mod whisper;
pub mod srt;

pub use whisper::{WhisperTranscriber, TranscriptSegment, Language};
pub use srt::{SrtFile, SrtEntry, format_timestamp};
