use std::fmt;
use std::path::Path;

use crate::error::Result;

/// SRT (SubRip Subtitle) entry
#[derive(Debug, Clone, PartialEq)]
pub struct SrtEntry {
    /// Sequential number, starting at 1
    pub index: u32,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Subtitle text
    pub text: String,
}

impl SrtEntry {
    pub fn new(index: u32, start: f64, end: f64, text: String) -> Self {
        Self {
            index,
            start,
            end,
            text: text.trim().to_string(),
        }
    }
}

impl fmt::Display for SrtEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{} --> {}\n{}\n",
            self.index,
            format_timestamp(self.start),
            format_timestamp(self.end),
            self.text
        )
    }
}

/// Accumulates subtitle entries and renders them as an SRT file
#[derive(Debug, Clone, Default)]
pub struct SrtFile {
    entries: Vec<SrtEntry>,
}

impl SrtFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subtitle spanning `[start, end)`, auto-numbered from 1.
    /// Entries with empty text are dropped.
    pub fn push(&mut self, start: f64, end: f64, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let index = self.entries.len() as u32 + 1;
        self.entries.push(SrtEntry::new(index, start, end, text.to_string()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SrtEntry] {
        &self.entries
    }

    /// Render the full SRT document
    pub fn render(&self) -> String {
        let mut content = String::new();
        for entry in &self.entries {
            content.push_str(&entry.to_string());
            content.push('\n');
        }
        content
    }

    /// Write the rendered document to disk
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        tokio::fs::write(path.as_ref(), self.render()).await?;
        Ok(())
    }
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm), rounding to the
/// nearest millisecond
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round().max(0.0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
