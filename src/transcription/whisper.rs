use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::TranscriptionConfig;
use crate::error::{PipelineError, Result};
use super::srt::SrtFile;

/// Subtitle output language selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    /// Transcribe in the audio's spoken language (default)
    #[default]
    French,
    /// Translate the speech to English
    English,
}

impl Language {
    /// Parse a request value. Anything other than the literal `"en"` is
    /// silently coerced to French.
    pub fn parse(value: &str) -> Self {
        if value == "en" {
            Language::English
        } else {
            Language::French
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::French => "fr",
            Language::English => "en",
        }
    }
}

/// A timestamped text segment returned by the transcription backend
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    /// Sequential number, starting at 1
    pub index: u32,
    /// Start time in seconds, relative to the transcribed file
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Transcribed text
    pub text: String,
}

/// Available Whisper command-line backends, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WhisperBackend {
    /// whisper.cpp via Homebrew
    WhisperCli,
    /// whisper.cpp
    WhisperCpp,
    /// Python OpenAI Whisper (fallback)
    PythonWhisper,
}

impl WhisperBackend {
    fn command(&self) -> &'static str {
        match self {
            WhisperBackend::WhisperCli => "whisper-cli",
            WhisperBackend::WhisperCpp => "whisper-cpp",
            WhisperBackend::PythonWhisper => "whisper",
        }
    }

    fn is_cpp(&self) -> bool {
        !matches!(self, WhisperBackend::PythonWhisper)
    }
}

/// Resolved backend, detected once on first use and reused for the life
/// of the process.
static BACKEND: OnceCell<WhisperBackend> = OnceCell::const_new();

async fn resolve_backend() -> Result<WhisperBackend> {
    BACKEND
        .get_or_try_init(|| async {
            let candidates = [
                WhisperBackend::WhisperCli,
                WhisperBackend::WhisperCpp,
                WhisperBackend::PythonWhisper,
            ];

            for backend in candidates {
                if check_command_available(backend.command()).await {
                    info!("✅ Using {} backend for transcription", backend.command());
                    return Ok(backend);
                }
                debug!("{} not available", backend.command());
            }

            Err(PipelineError::Transcription(
                "no whisper backend found; install whisper.cpp or openai-whisper".to_string(),
            ))
        })
        .await
        .copied()
}

async fn check_command_available(cmd_name: &str) -> bool {
    Command::new(cmd_name)
        .arg("--help")
        .stdin(Stdio::null())
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Speech-to-text transcriber shelling out to a Whisper CLI
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    /// Whisper model name
    model: String,
    /// Beam size for backends that accept it
    beam_size: u32,
}

impl WhisperTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Self {
        Self {
            model: config.model.clone(),
            beam_size: config.beam_size,
        }
    }

    /// Transcribe an audio file into ordered, timestamped text segments.
    ///
    /// `work_dir` receives the backend's JSON output file; the caller owns
    /// its cleanup.
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        language: Language,
        work_dir: &Path,
    ) -> Result<Vec<TranscriptSegment>> {
        let backend = resolve_backend().await?;

        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        info!(
            "🎤 Transcribing {} (lang={}, model={})",
            audio_path.display(),
            language.as_str(),
            self.model
        );

        let cmd = if backend.is_cpp() {
            self.whisper_cpp_command(backend, audio_path, work_dir, &stem, language)
        } else {
            self.python_whisper_command(audio_path, work_dir, language)
        };

        self.run_backend(cmd, backend).await?;

        let json_path = work_dir.join(format!("{}.json", stem));
        let json_content = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            PipelineError::Transcription(format!(
                "missing JSON output {}: {}",
                json_path.display(),
                e
            ))
        })?;

        let segments = parse_whisper_output(&json_content)?;
        info!("Transcription produced {} segments", segments.len());
        Ok(segments)
    }

    /// Transcribe an audio file and write the result as an SRT file.
    /// Returns the number of subtitle entries written.
    pub async fn generate_srt(
        &self,
        audio_path: &Path,
        srt_path: &Path,
        language: Language,
        work_dir: &Path,
    ) -> Result<usize> {
        let segments = self.transcribe(audio_path, language, work_dir).await?;

        let mut srt = SrtFile::new();
        for segment in &segments {
            srt.push(segment.start, segment.end, &segment.text);
        }
        srt.save(srt_path).await?;

        info!("💾 SRT written: {} ({} entries)", srt_path.display(), srt.len());
        Ok(srt.len())
    }

    fn whisper_cpp_command(
        &self,
        backend: WhisperBackend,
        audio_path: &Path,
        work_dir: &Path,
        stem: &str,
        language: Language,
    ) -> Command {
        let output_base = work_dir.join(stem);

        let mut cmd = Command::new(backend.command());
        cmd.arg("-f")
            .arg(audio_path)
            .arg("-oj")
            .arg("-of")
            .arg(&output_base)
            .args(["-bs", &self.beam_size.to_string()])
            .args(["-tp", "0.0"])
            .args(["-l", "auto"]);

        if language == Language::English {
            cmd.arg("-tr");
        }

        if let Some(model_path) = self.find_cpp_model() {
            cmd.arg("-m").arg(model_path);
        } else {
            warn!("No ggml model file found for {:?}, using backend default", self.model);
        }

        cmd
    }

    fn python_whisper_command(
        &self,
        audio_path: &Path,
        work_dir: &Path,
        language: Language,
    ) -> Command {
        let task = match language {
            Language::English => "translate",
            Language::French => "transcribe",
        };

        let mut cmd = Command::new(WhisperBackend::PythonWhisper.command());
        cmd.arg(audio_path)
            .args(["--model", &self.model])
            .arg("--output_dir")
            .arg(work_dir)
            .args(["--output_format", "json"])
            .args(["--task", task])
            .args(["--beam_size", &self.beam_size.to_string()])
            .args(["--temperature", "0.0"])
            .args(["--verbose", "False"])
            .args(["--fp16", "False"]);

        cmd
    }

    /// Look for a ggml model file in the conventional locations
    fn find_cpp_model(&self) -> Option<PathBuf> {
        let candidates = [
            format!("models/ggml-{}.bin", self.model),
            format!("/usr/local/share/whisper-cpp/ggml-{}.bin", self.model),
            format!("/opt/homebrew/share/whisper-cpp/ggml-{}.bin", self.model),
        ];

        candidates
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    async fn run_backend(&self, mut cmd: Command, backend: WhisperBackend) -> Result<()> {
        debug!("Executing {}: {:?}", backend.command(), cmd);

        let output = cmd.stdin(Stdio::null()).output().await.map_err(|e| {
            PipelineError::Transcription(format!("failed to spawn {}: {}", backend.command(), e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "{} failed ({}): {}",
                backend.command(),
                output.status,
                stderr.trim()
            );
            return Err(PipelineError::Transcription(format!(
                "{} exited with {}",
                backend.command(),
                output.status
            )));
        }

        Ok(())
    }
}

/// Whisper JSON output, covering both the whisper.cpp `transcription`
/// array and the Python whisper `segments` array
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    transcription: Vec<CppSegment>,
    #[serde(default)]
    segments: Vec<PySegment>,
}

#[derive(Debug, Deserialize)]
struct CppSegment {
    offsets: CppOffsets,
    text: String,
}

/// Millisecond offsets from the start of the file
#[derive(Debug, Deserialize)]
struct CppOffsets {
    from: u64,
    to: u64,
}

#[derive(Debug, Deserialize)]
struct PySegment {
    start: f64,
    end: f64,
    text: String,
}

fn parse_whisper_output(json_content: &str) -> Result<Vec<TranscriptSegment>> {
    let output: WhisperOutput = serde_json::from_str(json_content)
        .map_err(|e| PipelineError::Transcription(format!("unparseable JSON output: {}", e)))?;

    let segments: Vec<TranscriptSegment> = if !output.transcription.is_empty() {
        output
            .transcription
            .into_iter()
            .enumerate()
            .map(|(i, seg)| TranscriptSegment {
                index: i as u32 + 1,
                start: seg.offsets.from as f64 / 1000.0,
                end: seg.offsets.to as f64 / 1000.0,
                text: seg.text.trim().to_string(),
            })
            .collect()
    } else {
        output
            .segments
            .into_iter()
            .enumerate()
            .map(|(i, seg)| TranscriptSegment {
                index: i as u32 + 1,
                start: seg.start,
                end: seg.end,
                text: seg.text.trim().to_string(),
            })
            .collect()
    };

    Ok(segments)
}
