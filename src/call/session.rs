//! Per-call session state.
//!
//! A [`CallSession`] is the aggregate for one phone call: lifecycle state,
//! the orthogonal mute flag, the risk accumulator, and the transcript log.
//! Sessions are created fresh per call and mutated only by the call
//! machine; nothing survives into the next call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ScoringConfig;
use crate::detect::RiskAccumulator;
use crate::transcribe::Utterance;

// ── Call state ────────────────────────────────────────────────────

/// Lifecycle state of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    /// No call in progress.
    Idle,
    /// Live call, transcription running.
    Active,
    /// Live call with transcription paused.
    ActiveOnHold,
    /// Call finished; session kept for inspection until the next start.
    Ended,
}

impl CallState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::ActiveOnHold => "active_on_hold",
            Self::Ended => "ended",
        }
    }

    /// Whether the call is live (on hold still counts).
    pub fn is_live(self) -> bool {
        matches!(self, Self::Active | Self::ActiveOnHold)
    }
}

/// How the session is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Utterances arrive from the transcription source.
    Live,
    /// Utterances arrive from scheduled demo steps; the source stays idle.
    Demo,
}

// ── Session ───────────────────────────────────────────────────────

/// Aggregate state for one phone call.
#[derive(Debug)]
pub struct CallSession {
    /// Unique session identifier.
    pub id: String,
    /// Lifecycle state.
    pub state: CallState,
    /// Orthogonal mute flag; does not affect transcription or scoring.
    pub muted: bool,
    /// Live or demo driven.
    pub mode: CallMode,
    /// Risk score, detection latch, and matched terms.
    pub risk: RiskAccumulator,
    /// Final utterances in arrival order.
    pub transcript: Vec<Utterance>,
    /// Call start time.
    pub started_at: DateTime<Utc>,
    /// Call end time, set once.
    pub ended_at: Option<DateTime<Utc>>,
}

impl CallSession {
    /// Fresh session in the given mode.
    pub fn new(mode: CallMode, scoring: &ScoringConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: CallState::Active,
            muted: false,
            mode,
            risk: RiskAccumulator::new(scoring),
            transcript: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Seconds from start to end, or to now while the call is live.
    pub fn duration_secs(&self) -> i64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds().max(0)
    }

    /// Transcript joined with single spaces, chronological.
    pub fn full_transcript(&self) -> String {
        self.transcript
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the detection summary. `None` when nothing was detected.
    pub fn detection_summary(&self) -> Option<DetectionSummary> {
        let detection = self.risk.detection()?;
        Some(DetectionSummary {
            pattern: detection.pattern_name.clone(),
            confidence: self.risk.score(),
            transcript: self.full_transcript(),
            matched_phrases: detection.matched_terms.clone(),
        })
    }
}

// ── Detection summary ─────────────────────────────────────────────

/// Handed to the post-call explanation generator when a call ends with a
/// detection. Built exactly once, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummary {
    /// Name of the detected pattern.
    pub pattern: String,
    /// Final risk score, read as percent confidence.
    pub confidence: u32,
    /// All final utterances joined with single spaces.
    pub transcript: String,
    /// Terms credited to the detection, keywords first.
    pub matched_phrases: Vec<String>,
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PatternCatalog;
    use crate::detect::match_utterance;

    fn session() -> CallSession {
        CallSession::new(CallMode::Live, &ScoringConfig::default())
    }

    #[test]
    fn fresh_session_is_clean() {
        let s = session();
        assert_eq!(s.state, CallState::Active);
        assert!(!s.muted);
        assert_eq!(s.risk.score(), 0);
        assert!(!s.risk.is_detected());
        assert!(s.transcript.is_empty());
        assert!(s.ended_at.is_none());
    }

    #[test]
    fn sessions_have_distinct_ids() {
        assert_ne!(session().id, session().id);
    }

    #[test]
    fn transcript_joins_with_single_spaces() {
        let mut s = session();
        s.transcript.push(Utterance::final_now("hello there."));
        s.transcript.push(Utterance::final_now("verify your password"));
        assert_eq!(s.full_transcript(), "hello there. verify your password");
    }

    #[test]
    fn no_summary_without_detection() {
        let mut s = session();
        s.transcript.push(Utterance::final_now("nice weather"));
        assert!(s.detection_summary().is_none());
    }

    #[test]
    fn summary_reflects_latch_and_final_score() {
        let mut s = session();
        let scoring = ScoringConfig::default();
        let catalog = PatternCatalog::builtin();

        let text = "I need you to verify your password right now";
        s.transcript.push(Utterance::final_now(text));
        let m = match_utterance(text, &catalog, &scoring).unwrap();
        s.risk.apply(&m);

        // Score keeps rising after the latch; the summary reads the final
        // score but the latched terms.
        let text2 = "this is urgent";
        s.transcript.push(Utterance::final_now(text2));
        let m2 = match_utterance(text2, &catalog, &scoring).unwrap();
        s.risk.apply(&m2);

        let summary = s.detection_summary().unwrap();
        assert_eq!(summary.pattern, "IT Support Credential Harvesting");
        assert!(summary.confidence > 55);
        assert_eq!(summary.transcript, format!("{text} {text2}"));
        assert_eq!(summary.matched_phrases, vec!["password", "verify your password"]);
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = DetectionSummary {
            pattern: "Tech Support Scam".into(),
            confidence: 60,
            transcript: "detected a virus".into(),
            matched_phrases: vec!["virus".into()],
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("matchedPhrases"));
        assert!(json.contains("\"confidence\":60"));
    }

    #[test]
    fn live_states() {
        assert!(CallState::Active.is_live());
        assert!(CallState::ActiveOnHold.is_live());
        assert!(!CallState::Idle.is_live());
        assert!(!CallState::Ended.is_live());
    }
}
