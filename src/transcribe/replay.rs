//! Fixed-cadence transcript replay.
//!
//! Feeds lines from a prepared transcript through the live pipeline as
//! final utterances, one per cadence tick. `stop()` pauses mid-transcript
//! and a later `start()` resumes from the next unsent line, so hold
//! semantics behave exactly as they do against a live recognizer.

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{SourceError, SourceEvent, TranscriptionSource, Utterance};

/// Feeder state guarded by a short lock.
struct ReplayState {
    /// Index of the next unsent line.
    cursor: usize,
    /// Cancellation handle of the running feeder, if any.
    feeder: Option<CancellationToken>,
}

/// Replays a transcript at a fixed cadence.
pub struct ReplaySource {
    lines: Arc<Vec<String>>,
    cadence: Duration,
    state: Arc<Mutex<ReplayState>>,
    event_tx: mpsc::Sender<SourceEvent>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<SourceEvent>>,
}

impl ReplaySource {
    /// Build from explicit transcript lines.
    pub fn from_lines(lines: Vec<String>, cadence: Duration) -> Self {
        let (event_tx, event_rx) = mpsc::channel(64);
        Self {
            lines: Arc::new(lines),
            cadence,
            state: Arc::new(Mutex::new(ReplayState {
                cursor: 0,
                feeder: None,
            })),
            event_tx,
            event_rx: tokio::sync::Mutex::new(event_rx),
        }
    }

    /// Build from a transcript file, one utterance per non-blank line.
    pub fn from_file(path: &Path, cadence: Duration) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript {}", path.display()))?;
        let lines: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Ok(Self::from_lines(lines, cadence))
    }

    /// A source with nothing to say; `start()` always fails.
    pub fn empty() -> Self {
        Self::from_lines(Vec::new(), Duration::from_millis(100))
    }

    /// Total number of transcript lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[async_trait]
impl TranscriptionSource for ReplaySource {
    async fn start(&self) -> Result<(), SourceError> {
        let token = {
            let mut state = self.state.lock();
            if state.feeder.is_some() {
                // Already running; starting twice must not double-feed.
                return Ok(());
            }
            if state.cursor >= self.lines.len() {
                return Err(SourceError::Unavailable(
                    "transcript replay exhausted".into(),
                ));
            }
            let token = CancellationToken::new();
            state.feeder = Some(token.clone());
            token
        };

        let lines = Arc::clone(&self.lines);
        let state = Arc::clone(&self.state);
        let tx = self.event_tx.clone();
        let cadence = self.cadence;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(cadence) => {}
                }

                // Claim the next line; the cursor advances before the send
                // so a pause never re-delivers a line.
                let claimed = {
                    let mut s = state.lock();
                    if token.is_cancelled() {
                        return;
                    }
                    let line = lines.get(s.cursor).cloned();
                    if line.is_some() {
                        s.cursor += 1;
                    } else {
                        s.feeder = None;
                    }
                    line
                };

                match claimed {
                    Some(text) => {
                        let event = SourceEvent::Utterance(Utterance::final_now(text));
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    None => {
                        // End of transcript: spontaneous stop.
                        let _ = tx.send(SourceEvent::Stopped).await;
                        return;
                    }
                }
            }
        });

        Ok(())
    }

    async fn stop(&self) {
        let token = {
            let mut state = self.state.lock();
            state.feeder.take()
        };
        if let Some(token) = token {
            token.cancel();
        }
    }

    async fn next_event(&self) -> Option<SourceEvent> {
        self.event_rx.lock().await.recv().await
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lines(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("line {i}")).collect()
    }

    #[tokio::test]
    async fn feeds_all_lines_then_stops() {
        let source = ReplaySource::from_lines(lines(3), Duration::from_millis(10));
        source.start().await.unwrap();

        for i in 1..=3 {
            match source.next_event().await {
                Some(SourceEvent::Utterance(u)) => {
                    assert_eq!(u.text, format!("line {i}"));
                    assert!(u.is_final);
                }
                other => panic!("expected utterance, got {other:?}"),
            }
        }
        assert!(matches!(source.next_event().await, Some(SourceEvent::Stopped)));
    }

    #[tokio::test]
    async fn pause_resumes_where_it_left_off() {
        let source = ReplaySource::from_lines(lines(4), Duration::from_millis(25));
        source.start().await.unwrap();

        assert!(matches!(
            source.next_event().await,
            Some(SourceEvent::Utterance(_))
        ));
        source.stop().await;

        // Paused: nothing arrives.
        let quiet =
            tokio::time::timeout(Duration::from_millis(80), source.next_event()).await;
        assert!(quiet.is_err());

        source.start().await.unwrap();
        let mut texts = Vec::new();
        loop {
            match source.next_event().await {
                Some(SourceEvent::Utterance(u)) => texts.push(u.text),
                Some(SourceEvent::Stopped) => break,
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(texts, vec!["line 2", "line 3", "line 4"]);
    }

    #[tokio::test]
    async fn exhausted_source_cannot_restart() {
        let source = ReplaySource::from_lines(lines(1), Duration::from_millis(5));
        source.start().await.unwrap();
        assert!(matches!(
            source.next_event().await,
            Some(SourceEvent::Utterance(_))
        ));
        assert!(matches!(source.next_event().await, Some(SourceEvent::Stopped)));

        let err = source.start().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn double_start_feeds_each_line_once() {
        let source = ReplaySource::from_lines(lines(2), Duration::from_millis(10));
        source.start().await.unwrap();
        source.start().await.unwrap();

        let mut utterances = 0;
        loop {
            match source.next_event().await {
                Some(SourceEvent::Utterance(_)) => utterances += 1,
                Some(SourceEvent::Stopped) => break,
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(utterances, 2);
    }

    #[tokio::test]
    async fn file_replay_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hello there").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "verify your password").unwrap();

        let source = ReplaySource::from_file(file.path(), Duration::from_millis(5)).unwrap();
        assert_eq!(source.len(), 2);
    }

    #[tokio::test]
    async fn empty_source_start_fails() {
        let source = ReplaySource::empty();
        assert!(source.start().await.is_err());
    }
}
