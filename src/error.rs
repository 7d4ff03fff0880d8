use thiserror::Error;

/// Main error type for the clip generation service
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A request parameter was rejected before any media work started
    #[error("{0}")]
    Validation(String),

    /// An uploaded file could not be probed or has a non-positive duration
    #[error("{0}")]
    InvalidMedia(String),

    /// ffprobe exited non-zero or produced unparseable output
    #[error("probe failed for {path}: {reason}")]
    Probe { path: String, reason: String },

    /// ffmpeg exited non-zero for one of the transform operations
    #[error("{op} failed: {reason}")]
    Transform { op: &'static str, reason: String },

    /// The transcription backend failed or produced unusable output
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// An error occurred while writing the result archive
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether the error is the client's fault (maps to HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(_) | PipelineError::InvalidMedia(_)
        )
    }

    /// Client-facing message. Validation and invalid-media errors carry
    /// their full text; internal failures are reported generically and
    /// logged server-side with full context.
    pub fn detail(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "internal media processing error".to_string()
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = PipelineError::Validation("parts must be between 1 and 30".to_string());
        assert!(err.is_client_error());
        assert_eq!(err.detail(), "parts must be between 1 and 30");
    }

    #[test]
    fn test_internal_errors_are_sanitized() {
        let err = PipelineError::Transform {
            op: "mux_audio_video",
            reason: "/tmp/scratch123/segment_01_nosubs.mp4: exit status 1".to_string(),
        };
        assert!(!err.is_client_error());
        assert_eq!(err.detail(), "internal media processing error");
        assert!(!err.detail().contains("/tmp"));
    }
}
