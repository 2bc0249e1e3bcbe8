//! Scripted demo calls.
//!
//! A [`DemoScript`] drives the full call surface without a microphone:
//! transcript lines appear at fixed delays from call start, then a
//! detection is forced at a later delay, bypassing the matcher so the
//! outcome is identical on every run.

use std::time::Duration;

/// One scripted transcript line.
#[derive(Debug, Clone)]
pub struct DemoLine {
    /// Delay from call start.
    pub delay: Duration,
    /// Line text, appended as a final utterance.
    pub text: String,
}

/// The scripted detection step.
#[derive(Debug, Clone)]
pub struct DemoDetection {
    /// Delay from call start.
    pub delay: Duration,
    /// Catalog id of the pattern to latch.
    pub pattern_id: String,
    /// Name fallback when the id is absent from the loaded catalog.
    pub pattern_name: String,
    /// Terms to credit, verbatim and in this order.
    pub matched_terms: Vec<String>,
    /// Risk score to force (never lowers an already higher score).
    pub risk_score: u32,
}

/// A complete demo script: transcript lines plus one forced detection.
#[derive(Debug, Clone)]
pub struct DemoScript {
    pub lines: Vec<DemoLine>,
    pub detection: DemoDetection,
}

impl DemoScript {
    /// The stock IT-support credential harvesting call.
    pub fn credential_harvesting() -> Self {
        let line = |ms, text: &str| DemoLine {
            delay: Duration::from_millis(ms),
            text: text.to_string(),
        };
        Self {
            lines: vec![
                line(500, "Hello, this is John from IT support."),
                line(1500, "We've detected unusual activity on your account."),
                line(2500, "For security purposes, I need to verify your password."),
            ],
            detection: DemoDetection {
                delay: Duration::from_millis(3000),
                pattern_id: "2".into(),
                pattern_name: "IT Support Credential Harvesting".into(),
                matched_terms: vec![
                    "password".into(),
                    "verify your password".into(),
                    "IT support".into(),
                    "unusual activity".into(),
                ],
                risk_score: 85,
            },
        }
    }

    /// Delay of the last scheduled step.
    pub fn total_duration(&self) -> Duration {
        self.lines
            .iter()
            .map(|l| l.delay)
            .max()
            .unwrap_or_default()
            .max(self.detection.delay)
    }
}

// ── Tests ──────────────────────────────────────────────────────────
