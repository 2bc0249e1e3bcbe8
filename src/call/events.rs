//! Events published by the call machine.
//!
//! Every observable change (call lifecycle, transcript growth, risk
//! movement, the detection latch) is emitted exactly once on an mpsc
//! channel so a front-end can render the call without polling. Events are
//! serde-tagged for JSON transport.
//!
//! ## Wire shape
//!
//! ```json
//! {"type": "risk_updated", "callId": "…", "score": 55, "level": "elevated", "delta": 55}
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::Severity;
use crate::detect::RiskLevel;

use super::session::DetectionSummary;

/// Events emitted by the call machine, tagged for JSON transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CallEvent {
    /// A new call session began.
    #[serde(rename = "call_started")]
    CallStarted {
        #[serde(rename = "callId")]
        call_id: String,
        /// Whether this is a scripted demo call.
        demo: bool,
    },

    /// In-progress recognition text. Display-only: never logged, never
    /// scored, may still change.
    #[serde(rename = "interim_transcript")]
    InterimTranscript {
        #[serde(rename = "callId")]
        call_id: String,
        text: String,
    },

    /// A final utterance was appended to the transcript log.
    #[serde(rename = "utterance_logged")]
    UtteranceLogged {
        #[serde(rename = "callId")]
        call_id: String,
        text: String,
        /// Capture time, milliseconds since the Unix epoch.
        ts: i64,
    },

    /// The risk score rose.
    #[serde(rename = "risk_updated")]
    RiskUpdated {
        #[serde(rename = "callId")]
        call_id: String,
        score: u32,
        level: RiskLevel,
        /// Points contributed by the triggering utterance.
        delta: u32,
    },

    /// The detection latch fired. Emitted at most once per call.
    #[serde(rename = "scam_detected")]
    ScamDetected {
        #[serde(rename = "callId")]
        call_id: String,
        #[serde(rename = "patternId")]
        pattern_id: String,
        #[serde(rename = "patternName")]
        pattern_name: String,
        severity: Severity,
        #[serde(rename = "riskScore")]
        risk_score: u32,
        #[serde(rename = "matchedPhrases")]
        matched_phrases: Vec<String>,
        /// The machine recommends putting the caller on hold.
        #[serde(rename = "holdAdvised")]
        hold_advised: bool,
    },

    /// Hold state flipped.
    #[serde(rename = "hold_changed")]
    HoldChanged {
        #[serde(rename = "callId")]
        call_id: String,
        #[serde(rename = "onHold")]
        on_hold: bool,
    },

    /// Mute state flipped.
    #[serde(rename = "mute_changed")]
    MuteChanged {
        #[serde(rename = "callId")]
        call_id: String,
        muted: bool,
    },

    /// The transcription input failed for the rest of the call attempt.
    #[serde(rename = "input_error")]
    InputError {
        #[serde(rename = "callId")]
        call_id: String,
        message: String,
    },

    /// The call ended.
    #[serde(rename = "call_ended")]
    CallEnded {
        #[serde(rename = "callId")]
        call_id: String,
        #[serde(rename = "durationSecs")]
        duration_secs: i64,
        #[serde(rename = "riskScore")]
        risk_score: u32,
        /// Present iff the call ended with a detection.
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<DetectionSummary>,
    },
}

impl CallEvent {
    /// Session id this event belongs to.
    pub fn call_id(&self) -> &str {
        match self {
            Self::CallStarted { call_id, .. }
            | Self::InterimTranscript { call_id, .. }
            | Self::UtteranceLogged { call_id, .. }
            | Self::RiskUpdated { call_id, .. }
            | Self::ScamDetected { call_id, .. }
            | Self::HoldChanged { call_id, .. }
            | Self::MuteChanged { call_id, .. }
            | Self::InputError { call_id, .. }
            | Self::CallEnded { call_id, .. } => call_id,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
