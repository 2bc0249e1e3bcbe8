//! Post-call analysis collaborators.
//!
//! When a call ends with a detection, the [`DetectionSummary`] is handed to
//! an [`ExplanationGenerator`] that produces a callee-facing explanation of
//! the scam. The HTTP client talks to the analysis service; the local
//! explainer renders the same shape offline and doubles as the degradation
//! path when the service is unreachable.

pub mod http;

#[allow(unused_imports)]
pub use http::HttpAnalysisClient;

use async_trait::async_trait;

use crate::call::DetectionSummary;

// ── Explanation ───────────────────────────────────────────────────

/// A generated post-call explanation.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Callee-facing explanation text.
    pub text: String,
    /// Optional synthesized speech rendering of the text.
    pub audio: Option<Vec<u8>>,
    /// Which context store the generator drew on ("local" for offline).
    pub context_used: String,
    /// Pattern name echoed back by the generator.
    pub pattern: String,
    /// Confidence echoed back by the generator.
    pub confidence: u32,
    /// Whether the generator considers the explanation complete.
    pub success: bool,
}

/// Produces the post-call explanation for a detection.
#[async_trait]
pub trait ExplanationGenerator: Send + Sync {
    async fn explain(&self, summary: &DetectionSummary) -> anyhow::Result<Explanation>;
}

// ── Local explainer ───────────────────────────────────────────────

/// Offline explanation renderer.
///
/// Produces the canned explanation used when the analysis service is
/// disabled or unreachable: what was flagged, the leading matched phrases,
/// and per-pattern guidance.
#[derive(Debug, Clone, Default)]
pub struct LocalExplainer;

impl LocalExplainer {
    /// Render the explanation synchronously. Cannot fail.
    pub fn render(&self, summary: &DetectionSummary) -> Explanation {
        let leading_phrases = summary
            .matched_phrases
            .iter()
            .take(3)
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(", ");

        let text = format!(
            "This call was flagged as a potential {} scam with {}% confidence.\n\n\
             The system detected several suspicious indicators including phrases like {}.\n\n\
             These are common tactics used by social engineering attackers to create urgency \
             and pressure victims into providing sensitive information or taking risky actions.\n\n\
             {}\n\n\
             Remember: legitimate IT, HR, or finance personnel will never ask you to verify \
             passwords, social security numbers, or other sensitive credentials over the phone. \
             Always verify requests through official channels before taking action.",
            summary.pattern.to_lowercase(),
            summary.confidence,
            leading_phrases,
            pattern_guidance(&summary.pattern),
        );

        Explanation {
            text,
            audio: None,
            context_used: "local".into(),
            pattern: summary.pattern.clone(),
            confidence: summary.confidence,
            success: true,
        }
    }
}

#[async_trait]
impl ExplanationGenerator for LocalExplainer {
    async fn explain(&self, summary: &DetectionSummary) -> anyhow::Result<Explanation> {
        Ok(self.render(summary))
    }
}

/// Per-pattern advice appended to the explanation.
fn pattern_guidance(pattern: &str) -> &'static str {
    match pattern {
        "CEO Fraud / Executive Impersonation" => {
            "Attackers often impersonate executives to create authority and urgency. Always \
             verify wire transfers or sensitive requests through a second channel, even if they \
             appear to come from leadership."
        }
        "IT Support Credential Harvesting" => {
            "Real IT support will never ask for your password. They have administrative tools \
             to reset credentials without needing your current password."
        }
        "Urgent Account Verification" => {
            "Legitimate companies do not ask customers to verify accounts through unsolicited \
             phone calls. This is a red flag for phishing attempts."
        }
        "Tax/IRS Impersonation" => {
            "The IRS and tax authorities communicate primarily through mail, not phone calls. \
             They will never demand immediate payment or threaten arrest."
        }
        "Tech Support Scam" => {
            "Unsolicited tech support calls are almost always scams. Microsoft, Apple, and \
             other tech companies do not make cold calls about viruses or security issues."
        }
        "HR/Benefits Verification" => {
            "HR departments already have your information and will not call asking you to \
             verify it. Be especially cautious during open enrollment periods."
        }
        _ => {
            "Always verify unexpected requests through official channels before providing \
             information or taking action."
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> DetectionSummary {
        DetectionSummary {
            pattern: "IT Support Credential Harvesting".into(),
            confidence: 85,
            transcript: "hello this is john from it support".into(),
            matched_phrases: vec![
                "password".into(),
                "verify your password".into(),
                "IT support".into(),
                "unusual activity".into(),
            ],
        }
    }

    #[tokio::test]
    async fn local_explanation_content() {
        let explanation = LocalExplainer.explain(&summary()).await.unwrap();

        assert!(explanation.text.contains("it support credential harvesting"));
        assert!(explanation.text.contains("85% confidence"));
        // Only the first three phrases are quoted.
        assert!(explanation.text.contains("\"password\", \"verify your password\", \"IT support\""));
        assert!(!explanation.text.contains("\"unusual activity\""));
        // Pattern-specific guidance.
        assert!(explanation.text.contains("Real IT support will never ask for your password"));

        assert!(explanation.success);
        assert!(explanation.audio.is_none());
        assert_eq!(explanation.context_used, "local");
        assert_eq!(explanation.pattern, "IT Support Credential Harvesting");
        assert_eq!(explanation.confidence, 85);
    }

    #[test]
    fn unknown_pattern_gets_generic_guidance() {
        let mut s = summary();
        s.pattern = "Brand New Scheme".into();
        let explanation = LocalExplainer.render(&s);
        assert!(explanation
            .text
            .contains("Always verify unexpected requests through official channels"));
    }

    #[test]
    fn renders_with_no_matched_phrases() {
        let mut s = summary();
        s.matched_phrases.clear();
        let explanation = LocalExplainer.render(&s);
        assert!(explanation.success);
    }
}
