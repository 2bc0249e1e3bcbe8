//! CallGuard: real-time scam-call risk scoring and call lifecycle engine.
//!
//! Ingests transcribed utterances from a live call, matches them against a
//! catalog of known social-engineering patterns, and maintains a monotonic
//! 0-100 risk score with a one-way detection latch. When a call ends with a
//! detection, a summary is handed to a post-call analysis collaborator that
//! explains the scam to the callee.
//!
//! ## Pipeline
//!
//! ```text
//! TranscriptionSource ──▸ CallMachine ──▸ match_utterance ──▸ RiskAccumulator
//!   (mic / replay)            │                                     │
//!                             ├── CallEvent stream ◂────────────────┘
//!                             │   (transcript, risk, detection)
//!                             └── end_call ──▸ DetectionSummary ──▸ ExplanationGenerator
//!                                                                   (HTTP / local)
//! ```
//!
//! ## Design
//! - Pattern matching is plain case-insensitive substring containment,
//!   weighted per distinct keyword/phrase hit (no regexes, no word boundaries)
//! - Risk only ever rises during a call; detection latches the first pattern
//!   to clear the threshold and never re-evaluates
//! - One event-pump task owns all session mutation; scheduled demo steps are
//!   generation-guarded so steps from a previous call never fire
//! - The demo script player drives the same machine surface with scripted
//!   lines and a forced detection, bypassing the matcher entirely

pub mod analysis;
pub mod call;
pub mod catalog;
pub mod config;
pub mod detect;
pub mod transcribe;

pub use call::{CallEvent, CallMachine, CallState, DetectionSummary};
pub use catalog::{PatternCatalog, PatternDefinition, Severity};
pub use config::CallGuardConfig;
pub use detect::{MatchResult, RiskAccumulator, RiskLevel};
