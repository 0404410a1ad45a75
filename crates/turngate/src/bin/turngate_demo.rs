//! # TURNGATE Demo Driver
//!
//! Runs one configured pool of readers and writers over the gate and
//! prints what the run looked like.
//!
//! Usage:
//!
//! ```text
//! turngate_demo [config.toml]
//! ```
//!
//! Without an argument the built-in defaults run (5 readers, 1 writer,
//! 20 rounds). Set `RUST_LOG=turngate=debug,turngate_core=trace` to watch
//! every admission decision.

use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use turngate::{AccessKind, EventBus, HarnessConfig, Role, WorkerPool};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("turngate_demo: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("=============================================");
    println!(" TURNGATE - access alternation demo");
    println!("=============================================");
    println!(
        " readers: {}  writers: {}  rounds: {}",
        config.readers, config.writers, config.rounds
    );

    let bus = EventBus::new(config.event_capacity);
    let receiver = bus.receiver();

    let report = match WorkerPool::run(&config, bus.sender()) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("turngate_demo: {err}");
            return ExitCode::FAILURE;
        }
    };

    let events = receiver.drain();
    let reader_entries = events
        .iter()
        .filter(|e| e.role == Role::Reader && e.kind == AccessKind::Entered)
        .count();
    let writer_entries = events
        .iter()
        .filter(|e| e.role == Role::Writer && e.kind == AccessKind::Entered)
        .count();
    let peak_readers = events.iter().map(|e| e.active_readers).max().unwrap_or(0);

    println!("---------------------------------------------");
    println!(" read sections:   {}", report.reads_completed);
    println!(" write sections:  {}", report.writes_completed);
    println!(" final revision:  {}", report.final_revision);
    println!(" peak readers:    {peak_readers}");
    println!(
        " events captured: {} ({} reader / {} writer entries)",
        events.len(),
        reader_entries,
        writer_entries
    );
    println!(
        " final gate:      phase={}, quiescent={}",
        report.final_snapshot.phase,
        report.final_snapshot.is_quiescent()
    );
    println!("=============================================");

    ExitCode::SUCCESS
}

fn load_config() -> turngate::HarnessResult<HarnessConfig> {
    match std::env::args().nth(1) {
        Some(path) => HarnessConfig::load(Path::new(&path)),
        None => Ok(HarnessConfig::default()),
    }
}
