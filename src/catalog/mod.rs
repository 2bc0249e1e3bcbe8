//! Scam pattern catalog.
//!
//! A catalog is the full set of [`PatternDefinition`]s a call is scored
//! against. It is loaded once, validated, and shared read-only for the
//! duration of a call; nothing in the engine mutates patterns mid-call.
//!
//! ## Design
//! - Built-in catalog of eight enterprise vishing patterns ([`builtin`])
//! - Optional JSON file override for custom deployments
//! - Pattern order is significant: earlier patterns win score ties and
//!   matched terms are reported in definition order

pub mod builtin;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ── Severity ──────────────────────────────────────────────────────

/// Severity classification of a scam pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational pattern, rarely harmful on its own.
    Low,
    /// Suspicious but commonly benign in legitimate calls.
    Medium,
    /// Strong indicator of social engineering.
    High,
    /// Direct attempt at credentials, payment, or PII.
    Critical,
}

impl Severity {
    /// Lowercase identifier used in events and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

// ── Pattern definition ────────────────────────────────────────────

/// A single scam pattern: identity, classification, and its term lists.
///
/// Matching is case-insensitive substring containment over the keyword and
/// phrase lists. Keywords are single terms, phrases multi-word expressions;
/// the distinction only affects scoring weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDefinition {
    /// Unique id within the catalog.
    pub id: String,
    /// Human-readable pattern name.
    pub name: String,
    /// One-sentence description of the fraud scheme.
    pub description: String,
    /// Severity classification.
    pub severity: Severity,
    /// Single terms, weighted lower than phrases.
    pub keywords: Vec<String>,
    /// Multi-word expressions, weighted higher than keywords.
    pub phrases: Vec<String>,
}

// ── Catalog ───────────────────────────────────────────────────────

/// An ordered, validated set of scam patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternCatalog {
    patterns: Vec<PatternDefinition>,
}

impl PatternCatalog {
    /// The built-in catalog of eight enterprise vishing patterns.
    pub fn builtin() -> Self {
        Self {
            patterns: builtin::patterns(),
        }
    }

    /// Build a catalog from an explicit pattern list.
    pub fn new(patterns: Vec<PatternDefinition>) -> anyhow::Result<Self> {
        let catalog = Self { patterns };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file containing an array of patterns.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pattern file {}", path.display()))?;
        let patterns: Vec<PatternDefinition> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid pattern file {}", path.display()))?;
        Self::new(patterns)
    }

    /// Catalog integrity: non-empty, unique non-blank ids, named patterns.
    /// A pattern with no terms at all can never match; that is tolerated
    /// with a warning rather than rejected.
    fn validate(&self) -> anyhow::Result<()> {
        if self.patterns.is_empty() {
            bail!("pattern catalog is empty");
        }
        let mut seen = HashSet::new();
        for pattern in &self.patterns {
            if pattern.id.trim().is_empty() {
                bail!("pattern with blank id (name: {:?})", pattern.name);
            }
            if pattern.name.trim().is_empty() {
                bail!("pattern {} has a blank name", pattern.id);
            }
            if !seen.insert(pattern.id.as_str()) {
                bail!("duplicate pattern id {}", pattern.id);
            }
            if pattern.keywords.is_empty() && pattern.phrases.is_empty() {
                tracing::warn!(
                    pattern_id = %pattern.id,
                    "pattern has no keywords or phrases and can never match"
                );
            }
        }
        Ok(())
    }

    /// Look up a pattern by id.
    pub fn get(&self, id: &str) -> Option<&PatternDefinition> {
        self.patterns.iter().find(|p| p.id == id)
    }

    /// Look up a pattern by exact name.
    pub fn find_by_name(&self, name: &str) -> Option<&PatternDefinition> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Iterate patterns in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &PatternDefinition> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

// ── Tests ──────────────────────────────────────────────────────────
