//! Call-level risk state.
//!
//! Folds per-utterance match scores into a monotonically non-decreasing
//! risk score and latches the first detection. Once latched, the pattern
//! and its matched terms are fixed for the remainder of the call no matter
//! what is said afterwards.

use serde::{Deserialize, Serialize};

use super::matcher::MatchResult;
use crate::catalog::{PatternDefinition, Severity};
use crate::config::ScoringConfig;

// ── Risk level banding ────────────────────────────────────────────

/// Display banding for the 0-100 risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score 0-40.
    Low,
    /// Score 41-70.
    Elevated,
    /// Score above 70.
    Critical,
}

impl RiskLevel {
    /// Band a score.
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=40 => Self::Low,
            41..=70 => Self::Elevated,
            _ => Self::Critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Elevated => "elevated",
            Self::Critical => "critical",
        }
    }
}

// ── Detection latch ───────────────────────────────────────────────

/// The latched detection, fixed from the moment the threshold is crossed.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Id of the pattern that triggered the latch.
    pub pattern_id: String,
    /// Name of the pattern that triggered the latch.
    pub pattern_name: String,
    /// Severity of the latched pattern.
    pub severity: Severity,
    /// Terms credited to the detection, keywords first.
    pub matched_terms: Vec<String>,
}

/// Outcome of applying one match to the accumulator.
#[derive(Debug, Clone, Copy)]
pub struct RiskUpdate {
    /// Score gained by this utterance after capping.
    pub delta: u32,
    /// Accumulated score after this utterance.
    pub score: u32,
    /// Band of the accumulated score.
    pub level: RiskLevel,
    /// True exactly when this utterance latched the detection.
    pub newly_detected: bool,
}

// ── Accumulator ───────────────────────────────────────────────────

/// Per-call risk accumulator with a one-way detection latch.
#[derive(Debug, Clone)]
pub struct RiskAccumulator {
    score: u32,
    risk_cap: u32,
    detection_threshold: u32,
    detection: Option<Detection>,
    matched_terms: Vec<String>,
}

impl RiskAccumulator {
    /// Fresh accumulator for a new call.
    pub fn new(scoring: &ScoringConfig) -> Self {
        Self {
            score: 0,
            risk_cap: scoring.risk_cap,
            detection_threshold: scoring.detection_threshold,
            detection: None,
            matched_terms: Vec::new(),
        }
    }

    /// Fold one utterance match into the call state.
    ///
    /// The score rises by the match score, capped at `risk_cap`; it never
    /// decreases. The first match scoring strictly above the detection
    /// threshold latches: the pattern is recorded and the displayed terms
    /// are overwritten with that match's terms. Sub-threshold matches
    /// append their terms (no de-duplication) until a latch happens; after
    /// the latch the term list is frozen.
    pub fn apply(&mut self, m: &MatchResult) -> RiskUpdate {
        let before = self.score;
        self.score = self.score.saturating_add(m.score).min(self.risk_cap);

        let mut newly_detected = false;
        if self.detection.is_none() {
            if m.score > self.detection_threshold {
                self.matched_terms = m.matched_terms();
                self.detection = Some(Detection {
                    pattern_id: m.pattern_id.clone(),
                    pattern_name: m.pattern_name.clone(),
                    severity: m.severity,
                    matched_terms: self.matched_terms.clone(),
                });
                newly_detected = true;
            } else {
                self.matched_terms.extend(m.matched_terms());
            }
        }

        RiskUpdate {
            delta: self.score - before,
            score: self.score,
            level: self.level(),
            newly_detected,
        }
    }

    /// Force the latch with a scripted detection (demo path).
    ///
    /// The score jumps to at least `score` (capped, never lowered) and the
    /// latch takes the given pattern and term list verbatim. An existing
    /// latch wins; forcing is then a no-op.
    pub fn force_detection(
        &mut self,
        pattern: &PatternDefinition,
        matched_terms: Vec<String>,
        score: u32,
    ) -> RiskUpdate {
        if self.detection.is_some() {
            return RiskUpdate {
                delta: 0,
                score: self.score,
                level: self.level(),
                newly_detected: false,
            };
        }

        let before = self.score;
        self.score = self.score.max(score).min(self.risk_cap);
        self.matched_terms = matched_terms.clone();
        self.detection = Some(Detection {
            pattern_id: pattern.id.clone(),
            pattern_name: pattern.name.clone(),
            severity: pattern.severity,
            matched_terms,
        });

        RiskUpdate {
            delta: self.score - before,
            score: self.score,
            level: self.level(),
            newly_detected: true,
        }
    }

    /// Accumulated risk score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Band of the accumulated score.
    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.score)
    }

    /// The latched detection, if any.
    pub fn detection(&self) -> Option<&Detection> {
        self.detection.as_ref()
    }

    /// Whether the detection latch has fired.
    pub fn is_detected(&self) -> bool {
        self.detection.is_some()
    }

    /// Terms currently on display: the running accumulation before a latch,
    /// the frozen detection list after.
    pub fn matched_terms(&self) -> &[String] {
        &self.matched_terms
    }
}

// ── Tests ──────────────────────────────────────────────────────────
