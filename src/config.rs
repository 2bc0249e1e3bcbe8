//! Configuration for the CallGuard engine.
//!
//! TOML file at `~/.callguard/config.toml` by default; every section is
//! optional and falls back to the documented defaults, so a missing file is
//! equivalent to an all-default configuration. Loaded values are validated
//! before the engine starts because the risk accumulator cannot run with a
//! threshold at or above its cap.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Top level ─────────────────────────────────────────────────────

/// Top-level CallGuard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallGuardConfig {
    pub scoring: ScoringConfig,
    pub analysis: AnalysisConfig,
    pub catalog: CatalogConfig,
}

// ── Sections ──────────────────────────────────────────────────────

/// Scoring weights and thresholds for the risk engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points per distinct keyword found in an utterance.
    pub keyword_weight: u32,
    /// Points per distinct phrase found in an utterance.
    pub phrase_weight: u32,
    /// A single utterance scoring strictly above this latches a detection.
    pub detection_threshold: u32,
    /// Upper bound for the accumulated risk score.
    pub risk_cap: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            keyword_weight: 20,
            phrase_weight: 35,
            detection_threshold: 50,
            risk_cap: 100,
        }
    }
}

/// Post-call analysis collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Base URL of the analysis service.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// When false, the offline explainer is used instead of the service.
    pub enabled: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            timeout_secs: 15,
            enabled: true,
        }
    }
}

/// Pattern catalog source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to a JSON pattern file; `None` selects the built-in catalog.
    pub path: Option<PathBuf>,
}

// ── Loading ───────────────────────────────────────────────────────

impl CallGuardConfig {
    /// Default config file location (`~/.callguard/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".callguard").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// With an explicit path the file must exist and parse. Without one, the
    /// default location is used when present and defaults apply otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(p) => Self::parse_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::parse_file(&p)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Reject configurations the risk engine cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let s = &self.scoring;
        if s.keyword_weight == 0 || s.phrase_weight == 0 {
            bail!("scoring weights must be positive");
        }
        if s.risk_cap == 0 || s.risk_cap > 100 {
            bail!("risk_cap must be within 1..=100, got {}", s.risk_cap);
        }
        if s.detection_threshold >= s.risk_cap {
            bail!(
                "detection_threshold ({}) must be below risk_cap ({})",
                s.detection_threshold,
                s.risk_cap
            );
        }
        if self.analysis.timeout_secs == 0 {
            bail!("analysis timeout_secs must be positive");
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_documented_constants() {
        let config = CallGuardConfig::default();
        assert_eq!(config.scoring.keyword_weight, 20);
        assert_eq!(config.scoring.phrase_weight, 35);
        assert_eq!(config.scoring.detection_threshold, 50);
        assert_eq!(config.scoring.risk_cap, 100);
        assert_eq!(config.analysis.base_url, "http://localhost:5000");
        assert_eq!(config.analysis.timeout_secs, 15);
        assert!(config.analysis.enabled);
        assert!(config.catalog.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults_elsewhere() {
        let config: CallGuardConfig = toml::from_str(
            r#"
            [scoring]
            keyword_weight = 10

            [analysis]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.scoring.keyword_weight, 10);
        assert_eq!(config.scoring.phrase_weight, 35);
        assert!(!config.analysis.enabled);
        assert_eq!(config.analysis.timeout_secs, 15);
    }

    #[test]
    fn zero_weight_rejected() {
        let mut config = CallGuardConfig::default();
        config.scoring.phrase_weight = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_at_or_above_cap_rejected() {
        let mut config = CallGuardConfig::default();
        config.scoring.detection_threshold = 100;
        assert!(config.validate().is_err());

        config.scoring.detection_threshold = 120;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_cap_rejected() {
        let mut config = CallGuardConfig::default();
        config.scoring.risk_cap = 250;
        assert!(config.validate().is_err());
    }
}
