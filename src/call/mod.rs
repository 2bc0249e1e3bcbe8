//! Call lifecycle: sessions, events, the state machine, and the scripted
//! demo player.
//!
//! ## State machine
//!
//! ```text
//!          start_call / start_demo_call        toggle_hold
//! Idle ──────────────────────────▸ Active ◂──────────────▸ ActiveOnHold
//!   ▲                                │                          │
//!   │ fatal input error              │ end_call                 │ end_call
//!   └────────────────────────────────┴──────▸ Ended ◂───────────┘
//!                        (the next start begins a fresh session)
//! ```
//!
//! Mute is orthogonal to the states above; it never pauses transcription
//! or scoring. Ending a detected call produces a [`DetectionSummary`] for
//! the post-call explanation generator.

pub mod demo;
pub mod events;
pub mod machine;
pub mod session;

#[allow(unused_imports)]
pub use demo::{DemoDetection, DemoLine, DemoScript};
#[allow(unused_imports)]
pub use events::CallEvent;
#[allow(unused_imports)]
pub use machine::{CallMachine, CallReport, CallSnapshot, RestartPolicy};
#[allow(unused_imports)]
pub use session::{CallMode, CallSession, CallState, DetectionSummary};
