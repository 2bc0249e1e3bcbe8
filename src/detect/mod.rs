//! Utterance scoring: pattern matching and risk accumulation.
//!
//! [`match_utterance`] scores a single utterance against the catalog and
//! picks the best pattern; [`RiskAccumulator`] folds those scores into the
//! call-level risk state with a one-way detection latch.

pub mod matcher;
pub mod risk;

#[allow(unused_imports)]
pub use matcher::{match_utterance, MatchResult};
#[allow(unused_imports)]
pub use risk::{Detection, RiskAccumulator, RiskLevel, RiskUpdate};
