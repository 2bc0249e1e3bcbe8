//! The call state machine.
//!
//! One machine drives one call at a time through
//! `Idle -> Active <-> ActiveOnHold -> Ended`; mute is an orthogonal flag
//! that never affects transcription or scoring. All mutation funnels
//! through a single lock, utterances are scored in arrival order, and
//! every background task carries the generation of the call it was
//! spawned for so nothing left over from a previous call can touch a
//! later one.
//!
//! ## Tasks
//!
//! ```text
//! start_call ───────▸ event pump ── source events ──▸ ingest ──▸ CallEvent
//! start_demo_call ──▸ one task per scripted step ──▸ line / forced latch
//! end_call ─────────▸ cancel token ──▸ pump and steps wind down
//! ```
//!
//! The pump and the scripted steps are fire-and-forget tasks; the
//! cancellation token is cleanup, the generation check is correctness.

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analysis::{Explanation, ExplanationGenerator, LocalExplainer};
use crate::catalog::PatternCatalog;
use crate::config::ScoringConfig;
use crate::detect::{match_utterance, RiskLevel};
use crate::transcribe::{SourceError, SourceEvent, TranscriptionSource, Utterance};

use super::demo::{DemoDetection, DemoScript};
use super::events::CallEvent;
use super::session::{CallMode, CallSession, CallState, DetectionSummary};

// ── Restart policy ────────────────────────────────────────────────

/// What to do when the transcription source stops on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartPolicy {
    /// Re-issue `start()` while the call is active and not on hold.
    /// Restart failures are logged and swallowed.
    #[default]
    RestartWhileActive,
    /// Leave the source stopped; the call continues without input.
    LeaveStopped,
}

// ── Report and snapshot ───────────────────────────────────────────

/// What [`CallMachine::end_call`] returns when the call latched a
/// detection.
#[derive(Debug, Clone)]
pub struct CallReport {
    /// The summary handed to the explanation generator.
    pub summary: DetectionSummary,
    /// The generated (or locally rendered) explanation.
    pub explanation: Explanation,
}

/// Point-in-time view of the current session, for display.
#[derive(Debug, Clone)]
pub struct CallSnapshot {
    pub call_id: String,
    pub state: CallState,
    pub muted: bool,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub detected: bool,
    pub matched_phrases: Vec<String>,
    pub transcript_len: usize,
}

// ── Machine ───────────────────────────────────────────────────────

struct MachineCore {
    session: Option<CallSession>,
    /// Bumped on every start; background tasks check it before touching
    /// the session.
    generation: u64,
    /// Cancelled on end; winds down the pump and scripted steps.
    cancel: CancellationToken,
}

/// Drives one call at a time and publishes [`CallEvent`]s.
///
/// Cheap to clone; clones share the same call.
#[derive(Clone)]
pub struct CallMachine {
    core: Arc<Mutex<MachineCore>>,
    catalog: Arc<PatternCatalog>,
    scoring: ScoringConfig,
    source: Arc<dyn TranscriptionSource>,
    explainer: Arc<dyn ExplanationGenerator>,
    restart_policy: RestartPolicy,
    event_tx: mpsc::Sender<CallEvent>,
}

impl CallMachine {
    /// Build a machine and the event stream it publishes on.
    pub fn new(
        catalog: Arc<PatternCatalog>,
        scoring: ScoringConfig,
        source: Arc<dyn TranscriptionSource>,
        explainer: Arc<dyn ExplanationGenerator>,
    ) -> (Self, mpsc::Receiver<CallEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let machine = Self {
            core: Arc::new(Mutex::new(MachineCore {
                session: None,
                generation: 0,
                cancel: CancellationToken::new(),
            })),
            catalog,
            scoring,
            source,
            explainer,
            restart_policy: RestartPolicy::default(),
            event_tx,
        };
        (machine, event_rx)
    }

    /// Override the source restart policy.
    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = policy;
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    /// Start a live call.
    ///
    /// A no-op returning the current id while a call is already live. If
    /// the transcription source refuses to start the machine returns to
    /// idle, emits [`CallEvent::InputError`], and surfaces the error.
    pub async fn start_call(&self) -> Result<String> {
        let (call_id, generation, cancel) = {
            let mut core = self.core.lock().await;
            if let Some(session) = &core.session {
                if session.state.is_live() {
                    debug!(call_id = %session.id, "start ignored, call already live");
                    return Ok(session.id.clone());
                }
            }
            self.begin_session(&mut core, CallMode::Live)
        };

        self.emit(CallEvent::CallStarted { call_id: call_id.clone(), demo: false }).await;
        info!(call_id = %call_id, "call started");

        if let Err(err) = self.source.start().await {
            warn!(call_id = %call_id, error = %err, "transcription source failed to start");
            {
                let mut core = self.core.lock().await;
                if core.generation == generation {
                    core.session = None;
                    core.cancel.cancel();
                }
            }
            self.emit(CallEvent::InputError { call_id, message: err.to_string() }).await;
            return Err(err.into());
        }

        self.spawn_pump(generation, cancel);
        Ok(call_id)
    }

    /// Start a scripted demo call.
    ///
    /// The transcription source stays idle; transcript lines and the
    /// forced detection fire at their scripted delays, each guarded by
    /// the call generation.
    pub async fn start_demo_call(&self, script: DemoScript) -> Result<String> {
        let (call_id, generation, cancel) = {
            let mut core = self.core.lock().await;
            if let Some(session) = &core.session {
                if session.state.is_live() {
                    bail!("a call is already in progress");
                }
            }
            self.begin_session(&mut core, CallMode::Demo)
        };

        self.emit(CallEvent::CallStarted { call_id: call_id.clone(), demo: true }).await;
        info!(call_id = %call_id, steps = script.lines.len() + 1, "demo call started");

        for line in script.lines {
            let this = self.clone();
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(line.delay) => {
                        this.apply_demo_line(generation, line.text).await;
                    }
                }
            });
        }

        let detection = script.detection;
        let this = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(detection.delay) => {
                    this.apply_demo_detection(generation, detection).await;
                }
            }
        });

        Ok(call_id)
    }

    /// End the call.
    ///
    /// Stops the source, cancels scheduled work, and when the call latched
    /// a detection hands the summary to the explanation generator.
    /// Generator failures degrade to the locally rendered explanation.
    /// Idempotent: ending an already ended (or never started) machine
    /// returns `Ok(None)` quietly.
    pub async fn end_call(&self) -> Result<Option<CallReport>> {
        let (call_id, mode, summary, event) = {
            let mut core = self.core.lock().await;
            let core = &mut *core;
            let Some(session) = core.session.as_mut() else {
                return Ok(None);
            };
            if session.state == CallState::Ended {
                return Ok(None);
            }

            session.state = CallState::Ended;
            session.ended_at = Some(Utc::now());
            core.cancel.cancel();

            let summary = session.detection_summary();
            let event = CallEvent::CallEnded {
                call_id: session.id.clone(),
                duration_secs: session.duration_secs(),
                risk_score: session.risk.score(),
                summary: summary.clone(),
            };
            (session.id.clone(), session.mode, summary, event)
        };

        if mode == CallMode::Live {
            self.source.stop().await;
        }
        self.emit(event).await;

        let Some(summary) = summary else {
            info!(call_id = %call_id, "call ended, no detection");
            return Ok(None);
        };

        info!(
            call_id = %call_id,
            pattern = %summary.pattern,
            confidence = summary.confidence,
            "call ended with detection"
        );
        let explanation = match self.explainer.explain(&summary).await {
            Ok(explanation) => explanation,
            Err(err) => {
                warn!(call_id = %call_id, error = %err, "explanation generator failed, rendering locally");
                LocalExplainer.render(&summary)
            }
        };

        Ok(Some(CallReport { summary, explanation }))
    }

    // ── Hold and mute ─────────────────────────────────────────────

    /// Toggle hold. Hold pauses the transcription source and suppresses
    /// ingestion; resume restarts the source. Risk and detection state
    /// are untouched either way. Returns the resulting hold flag; a
    /// machine without a live call returns `false` unchanged.
    pub async fn toggle_hold(&self) -> bool {
        let (on_hold, mode, event) = {
            let mut core = self.core.lock().await;
            let Some(session) = core.session.as_mut() else {
                return false;
            };
            match session.state {
                CallState::Active => {
                    session.state = CallState::ActiveOnHold;
                    (true, session.mode, CallEvent::HoldChanged {
                        call_id: session.id.clone(),
                        on_hold: true,
                    })
                }
                CallState::ActiveOnHold => {
                    session.state = CallState::Active;
                    (false, session.mode, CallEvent::HoldChanged {
                        call_id: session.id.clone(),
                        on_hold: false,
                    })
                }
                _ => return false,
            }
        };
        self.emit(event).await;

        if mode == CallMode::Live {
            if on_hold {
                self.source.stop().await;
                info!("call on hold, transcription paused");
            } else {
                match self.source.start().await {
                    Ok(()) => info!("call resumed, transcription running"),
                    Err(err) => {
                        // The call stays live; it just runs without input.
                        warn!(error = %err, "failed to resume transcription after hold");
                    }
                }
            }
        }
        on_hold
    }

    /// Toggle mute. Display-level only: transcription, scoring, and the
    /// transcript log all continue while muted. Returns the resulting
    /// mute flag.
    pub async fn toggle_mute(&self) -> bool {
        let (muted, event) = {
            let mut core = self.core.lock().await;
            let Some(session) = core.session.as_mut() else {
                return false;
            };
            if !session.state.is_live() {
                return session.muted;
            }
            session.muted = !session.muted;
            (session.muted, CallEvent::MuteChanged {
                call_id: session.id.clone(),
                muted: session.muted,
            })
        };
        self.emit(event).await;
        muted
    }

    // ── Ingestion ─────────────────────────────────────────────────

    /// Feed one utterance into the current call.
    ///
    /// Interim text is surfaced for display but never logged or scored.
    /// Anything arriving while the call is not `Active` (on hold, ended,
    /// idle) is discarded.
    pub async fn ingest(&self, utterance: Utterance) {
        let generation = self.core.lock().await.generation;
        self.ingest_guarded(generation, utterance).await;
    }

    async fn ingest_guarded(&self, generation: u64, utterance: Utterance) {
        let events = {
            let mut core = self.core.lock().await;
            if core.generation != generation {
                return;
            }
            let Some(session) = core.session.as_mut() else {
                return;
            };
            if session.state != CallState::Active {
                return;
            }

            let call_id = session.id.clone();
            if !utterance.is_final {
                vec![CallEvent::InterimTranscript { call_id, text: utterance.text }]
            } else {
                let mut events = Vec::with_capacity(3);
                events.push(CallEvent::UtteranceLogged {
                    call_id: call_id.clone(),
                    text: utterance.text.clone(),
                    ts: utterance.timestamp.timestamp_millis(),
                });
                debug!(call_id = %call_id, text = %utterance.text, "utterance logged");

                let matched = match_utterance(&utterance.text, &self.catalog, &self.scoring);
                session.transcript.push(utterance);

                if let Some(m) = matched {
                    let update = session.risk.apply(&m);
                    info!(
                        call_id = %call_id,
                        pattern = %m.pattern_name,
                        utterance_score = m.score,
                        risk_score = update.score,
                        "utterance matched pattern"
                    );
                    events.push(CallEvent::RiskUpdated {
                        call_id: call_id.clone(),
                        score: update.score,
                        level: update.level,
                        delta: update.delta,
                    });
                    if update.newly_detected {
                        warn!(
                            call_id = %call_id,
                            pattern = %m.pattern_name,
                            score = update.score,
                            "scam detected"
                        );
                        events.push(CallEvent::ScamDetected {
                            call_id,
                            pattern_id: m.pattern_id.clone(),
                            pattern_name: m.pattern_name.clone(),
                            severity: m.severity,
                            risk_score: update.score,
                            matched_phrases: m.matched_terms(),
                            hold_advised: true,
                        });
                    }
                }
                events
            }
        };

        for event in events {
            self.emit(event).await;
        }
    }

    // ── Inspection ────────────────────────────────────────────────

    /// Current lifecycle state.
    pub async fn state(&self) -> CallState {
        let core = self.core.lock().await;
        core.session.as_ref().map_or(CallState::Idle, |s| s.state)
    }

    /// Point-in-time view of the current session, `None` while idle.
    pub async fn snapshot(&self) -> Option<CallSnapshot> {
        let core = self.core.lock().await;
        core.session.as_ref().map(|session| CallSnapshot {
            call_id: session.id.clone(),
            state: session.state,
            muted: session.muted,
            risk_score: session.risk.score(),
            risk_level: session.risk.level(),
            detected: session.risk.is_detected(),
            matched_phrases: session.risk.matched_terms().to_vec(),
            transcript_len: session.transcript.len(),
        })
    }

    // ── Internals ─────────────────────────────────────────────────

    /// Reset per-call state under the lock. Returns the new session id,
    /// generation, and cancellation token.
    fn begin_session(
        &self,
        core: &mut MachineCore,
        mode: CallMode,
    ) -> (String, u64, CancellationToken) {
        core.cancel.cancel();
        core.cancel = CancellationToken::new();
        core.generation += 1;
        let session = CallSession::new(mode, &self.scoring);
        let id = session.id.clone();
        core.session = Some(session);
        (id, core.generation, core.cancel.clone())
    }

    fn spawn_pump(&self, generation: u64, cancel: CancellationToken) {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = this.source.next_event() => event,
                };
                match event {
                    Some(SourceEvent::Utterance(utterance)) => {
                        this.ingest_guarded(generation, utterance).await;
                    }
                    Some(SourceEvent::Stopped) => {
                        this.handle_source_stopped(generation).await;
                    }
                    Some(SourceEvent::Failed(err)) => {
                        if this.handle_source_failure(generation, err).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            debug!("event pump stopped");
        });
    }

    /// Spontaneous source stop: restart per policy, best-effort.
    async fn handle_source_stopped(&self, generation: u64) {
        let should_restart = {
            let core = self.core.lock().await;
            core.generation == generation
                && self.restart_policy == RestartPolicy::RestartWhileActive
                && core
                    .session
                    .as_ref()
                    .is_some_and(|s| s.state == CallState::Active)
        };
        if !should_restart {
            return;
        }
        match self.source.start().await {
            Ok(()) => debug!("transcription source restarted"),
            Err(err) => debug!(error = %err, "source restart failed, continuing without input"),
        }
    }

    /// Mid-stream source failure. Transient noise is ignored; a fatal
    /// error abandons the call and returns the machine to idle. Returns
    /// `true` when the pump should exit.
    async fn handle_source_failure(&self, generation: u64, err: SourceError) -> bool {
        if matches!(err, SourceError::NoSpeech) {
            // Routine on quiet lines.
            return false;
        }
        if !err.is_fatal() {
            warn!(error = %err, "transcription source error");
            return false;
        }

        let call_id = {
            let mut core = self.core.lock().await;
            if core.generation != generation {
                return true;
            }
            let Some(session) = core.session.take() else {
                return true;
            };
            core.cancel.cancel();
            session.id
        };
        warn!(call_id = %call_id, error = %err, "fatal input failure, call abandoned");
        self.emit(CallEvent::InputError { call_id, message: err.to_string() }).await;
        true
    }

    /// Append a scripted line as a final utterance. Scripted lines bypass
    /// the matcher (the script forces its own detection) and keep flowing
    /// while on hold; only an ended or replaced call swallows them.
    async fn apply_demo_line(&self, generation: u64, text: String) {
        let event = {
            let mut core = self.core.lock().await;
            if core.generation != generation {
                debug!("stale demo line dropped");
                return;
            }
            let Some(session) = core.session.as_mut() else {
                return;
            };
            if session.state == CallState::Ended {
                return;
            }
            let utterance = Utterance::final_now(text);
            let event = CallEvent::UtteranceLogged {
                call_id: session.id.clone(),
                text: utterance.text.clone(),
                ts: utterance.timestamp.timestamp_millis(),
            };
            session.transcript.push(utterance);
            event
        };
        self.emit(event).await;
    }

    /// Force the scripted detection. The pattern is resolved by id first,
    /// then by name; an unknown pattern drops the step with a warning.
    async fn apply_demo_detection(&self, generation: u64, detection: DemoDetection) {
        let pattern = match self
            .catalog
            .get(&detection.pattern_id)
            .or_else(|| self.catalog.find_by_name(&detection.pattern_name))
        {
            Some(p) => p.clone(),
            None => {
                warn!(
                    pattern_id = %detection.pattern_id,
                    "demo detection references an unknown pattern, skipped"
                );
                return;
            }
        };

        let events = {
            let mut core = self.core.lock().await;
            if core.generation != generation {
                debug!("stale demo detection dropped");
                return;
            }
            let Some(session) = core.session.as_mut() else {
                return;
            };
            if session.state == CallState::Ended {
                return;
            }

            let update = session.risk.force_detection(
                &pattern,
                detection.matched_terms.clone(),
                detection.risk_score,
            );
            if !update.newly_detected {
                return;
            }
            let call_id = session.id.clone();
            info!(
                call_id = %call_id,
                pattern = %pattern.name,
                score = update.score,
                "scripted detection latched"
            );
            vec![
                CallEvent::RiskUpdated {
                    call_id: call_id.clone(),
                    score: update.score,
                    level: update.level,
                    delta: update.delta,
                },
                CallEvent::ScamDetected {
                    call_id,
                    pattern_id: pattern.id.clone(),
                    pattern_name: pattern.name.clone(),
                    severity: pattern.severity,
                    risk_score: update.score,
                    matched_phrases: detection.matched_terms,
                    hold_advised: true,
                },
            ]
        };
        for event in events {
            self.emit(event).await;
        }
    }

    async fn emit(&self, event: CallEvent) {
        if self.event_tx.send(event).await.is_err() {
            debug!("event receiver dropped");
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
