//! Transcription source seam.
//!
//! The engine only ever sees [`SourceEvent`]s; where they come from (a live
//! STT engine, a file replay) sits behind the [`TranscriptionSource`] trait.
//!
//! ## Contract
//! - `start()` begins delivery; a fatal [`SourceError`] means no input is
//!   possible for this call attempt
//! - `stop()` pauses delivery without tearing the source down; a later
//!   `start()` resumes
//! - `Stopped` is only emitted for spontaneous termination, never for an
//!   explicit `stop()`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod replay;

#[allow(unused_imports)]
pub use replay::ReplaySource;

// ── Errors ────────────────────────────────────────────────────────

/// Failure modes of a transcription source.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The user or platform denied microphone access.
    #[error("audio input permission denied")]
    PermissionDenied,
    /// No usable input device or recognition backend.
    #[error("audio input unavailable: {0}")]
    Unavailable(String),
    /// Nothing was heard for a while. Transient; callers ignore it.
    #[error("no speech detected")]
    NoSpeech,
    /// Transport or device I/O failure.
    #[error("transcription I/O failure: {0}")]
    Io(String),
}

impl SourceError {
    /// Whether this error ends the call attempt rather than being noise.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::Unavailable(_))
    }
}

// ── Events ────────────────────────────────────────────────────────

/// A single transcribed utterance.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Transcribed text.
    pub text: String,
    /// Whether the recognizer considers this utterance complete. Interim
    /// utterances are display-only and never scored or logged.
    pub is_final: bool,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
}

impl Utterance {
    /// A final utterance stamped now.
    pub fn final_now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            timestamp: Utc::now(),
        }
    }

    /// An interim (still in progress) utterance stamped now.
    pub fn interim_now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            timestamp: Utc::now(),
        }
    }
}

/// Events delivered by a transcription source.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// A transcribed utterance (interim or final).
    Utterance(Utterance),
    /// The source stopped on its own (end of stream, recognizer gave up).
    Stopped,
    /// The source failed mid-stream.
    Failed(SourceError),
}

// ── Source trait ──────────────────────────────────────────────────

/// A stream of transcribed utterances for one call.
#[async_trait]
pub trait TranscriptionSource: Send + Sync {
    /// Begin (or resume) delivering events.
    async fn start(&self) -> Result<(), SourceError>;

    /// Pause delivery. Does not emit `Stopped`.
    async fn stop(&self);

    /// Receive the next event. `None` means the source is permanently done
    /// and its channel is closed.
    async fn next_event(&self) -> Option<SourceEvent>;
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(SourceError::PermissionDenied.is_fatal());
        assert!(SourceError::Unavailable("no device".into()).is_fatal());
        assert!(!SourceError::NoSpeech.is_fatal());
        assert!(!SourceError::Io("hiccup".into()).is_fatal());
    }

    #[test]
    fn utterance_constructors() {
        let utterance = Utterance::final_now("hello");
        assert!(utterance.is_final);
        assert_eq!(utterance.text, "hello");

        let interim = Utterance::interim_now("hel");
        assert!(!interim.is_final);
    }
}
