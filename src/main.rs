//! CallGuard command line interface.
//!
//! `demo` plays the scripted scam call end to end, `replay` feeds a
//! transcript file through the live-call path, `analyze` scores a single
//! utterance, and `patterns` lists the loaded catalog. Events are rendered
//! to stdout as they arrive; operational logging goes through `tracing`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use callguard::analysis::{ExplanationGenerator, HttpAnalysisClient, LocalExplainer};
use callguard::call::{CallEvent, CallMachine, CallReport, DemoScript};
use callguard::catalog::PatternCatalog;
use callguard::config::CallGuardConfig;
use callguard::detect::match_utterance;
use callguard::transcribe::ReplaySource;

#[derive(Parser, Debug)]
#[command(name = "callguard", version, about = "Real-time scam call detection")]
struct Cli {
    /// Configuration file path (defaults to ~/.callguard/config.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the scripted demo call end to end.
    Demo,
    /// Replay a transcript file as a live call, one utterance per line.
    Replay {
        /// Transcript file.
        file: PathBuf,
        /// Milliseconds between utterances.
        #[arg(long, default_value_t = 800)]
        cadence_ms: u64,
    },
    /// Score a single utterance against the pattern catalog.
    Analyze {
        /// The utterance text.
        text: String,
    },
    /// List the loaded pattern catalog.
    Patterns,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = CallGuardConfig::load(cli.config.as_deref())?;
    let catalog = Arc::new(load_catalog(&config)?);

    match cli.command {
        Command::Demo => run_demo(&config, catalog).await,
        Command::Replay { file, cadence_ms } => {
            run_replay(&config, catalog, &file, cadence_ms).await
        }
        Command::Analyze { text } => {
            analyze(&text, &catalog, &config);
            Ok(())
        }
        Command::Patterns => {
            list_patterns(&catalog);
            Ok(())
        }
    }
}

// ── Subcommands ───────────────────────────────────────────────────

async fn run_demo(config: &CallGuardConfig, catalog: Arc<PatternCatalog>) -> Result<()> {
    let (machine, mut events) = CallMachine::new(
        catalog,
        config.scoring.clone(),
        Arc::new(ReplaySource::empty()),
        build_explainer(config)?,
    );

    let script = DemoScript::credential_harvesting();
    let play_out = script.total_duration() + Duration::from_millis(500);
    machine.start_demo_call(script).await?;

    // Render events until the script has fully played out.
    let done = tokio::time::sleep(play_out);
    tokio::pin!(done);
    loop {
        tokio::select! {
            _ = &mut done => break,
            event = events.recv() => match event {
                Some(event) => render_event(&event),
                None => break,
            },
        }
    }

    // Honor the hold advice the way an operator would, then hang up.
    machine.toggle_hold().await;
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let report = machine.end_call().await?;

    while let Ok(event) = events.try_recv() {
        render_event(&event);
    }
    if let Some(report) = report {
        print_report(&report);
    }
    Ok(())
}

async fn run_replay(
    config: &CallGuardConfig,
    catalog: Arc<PatternCatalog>,
    file: &std::path::Path,
    cadence_ms: u64,
) -> Result<()> {
    let cadence = Duration::from_millis(cadence_ms);
    let source = Arc::new(ReplaySource::from_file(file, cadence)?);
    info!(file = %file.display(), lines = source.len(), "replaying transcript");

    let (machine, mut events) = CallMachine::new(
        catalog,
        config.scoring.clone(),
        source,
        build_explainer(config)?,
    );
    machine.start_call().await?;

    // The replay is done once the feed stays quiet for a few cadences.
    let idle = cadence * 3 + Duration::from_millis(200);
    loop {
        match tokio::time::timeout(idle, events.recv()).await {
            Ok(Some(event)) => render_event(&event),
            Ok(None) | Err(_) => break,
        }
    }

    let report = machine.end_call().await?;
    while let Ok(event) = events.try_recv() {
        render_event(&event);
    }
    match report {
        Some(report) => print_report(&report),
        None => println!("\nNo scam indicators crossed the detection threshold."),
    }
    Ok(())
}

fn analyze(text: &str, catalog: &PatternCatalog, config: &CallGuardConfig) {
    match match_utterance(text, catalog, &config.scoring) {
        Some(m) => {
            println!("pattern  : {} (id {}, {})", m.pattern_name, m.pattern_id, m.severity.as_str());
            println!("score    : +{}", m.score);
            println!("keywords : {}", m.matched_keywords.join(", "));
            println!("phrases  : {}", m.matched_phrases.join(", "));
            if m.score > config.scoring.detection_threshold {
                println!("verdict  : this utterance alone would latch a detection");
            }
        }
        None => println!("no pattern matched"),
    }
}

fn list_patterns(catalog: &PatternCatalog) {
    println!("{} patterns loaded\n", catalog.len());
    for p in catalog.iter() {
        println!("[{}] {} ({})", p.id, p.name, p.severity.as_str());
        println!("    {}", p.description);
        println!("    keywords: {}", p.keywords.join(", "));
        println!("    phrases : {}", p.phrases.join(", "));
    }
}

// ── Helpers ───────────────────────────────────────────────────────

fn load_catalog(config: &CallGuardConfig) -> Result<PatternCatalog> {
    match &config.catalog.path {
        Some(path) => {
            let catalog = PatternCatalog::from_json_file(path)?;
            info!(path = %path.display(), patterns = catalog.len(), "loaded pattern catalog");
            Ok(catalog)
        }
        None => Ok(PatternCatalog::builtin()),
    }
}

fn build_explainer(config: &CallGuardConfig) -> Result<Arc<dyn ExplanationGenerator>> {
    if config.analysis.enabled {
        Ok(Arc::new(HttpAnalysisClient::new(&config.analysis)?))
    } else {
        info!("analysis service disabled, explanations render locally");
        Ok(Arc::new(LocalExplainer))
    }
}

fn render_event(event: &CallEvent) {
    match event {
        CallEvent::CallStarted { call_id, demo } => {
            let kind = if *demo { "demo call" } else { "call" };
            println!("{kind} started ({call_id})");
        }
        CallEvent::InterimTranscript { text, .. } => {
            println!("  ... {text}");
        }
        CallEvent::UtteranceLogged { text, .. } => {
            println!("  caller: {text}");
        }
        CallEvent::RiskUpdated { score, level, delta, .. } => {
            println!("  risk {score}/100 [{}] (+{delta})", level.as_str());
        }
        CallEvent::ScamDetected { pattern_name, severity, risk_score, matched_phrases, .. } => {
            println!();
            println!("  SCAM DETECTED: {pattern_name} [{}]", severity.as_str());
            println!("  risk {risk_score}/100; matched: {}", matched_phrases.join(", "));
            println!("  recommendation: place the caller on hold");
            println!();
        }
        CallEvent::HoldChanged { on_hold, .. } => {
            let msg = if *on_hold { "caller placed on hold" } else { "caller taken off hold" };
            println!("  {msg}");
        }
        CallEvent::MuteChanged { muted, .. } => {
            let msg = if *muted { "microphone muted" } else { "microphone unmuted" };
            println!("  {msg}");
        }
        CallEvent::InputError { message, .. } => {
            println!("  input error: {message}");
        }
        CallEvent::CallEnded { duration_secs, risk_score, .. } => {
            println!("call ended after {duration_secs}s, final risk {risk_score}/100");
        }
    }
}

fn print_report(report: &CallReport) {
    println!("\n── Post-call analysis ──────────────────────────────────");
    println!("pattern    : {}", report.summary.pattern);
    println!("confidence : {}%", report.summary.confidence);
    println!("matched    : {}", report.summary.matched_phrases.join(", "));
    if let Some(audio) = &report.explanation.audio {
        println!("audio      : {} bytes of synthesized speech", audio.len());
    }
    println!("\n{}", report.explanation.text);
}
