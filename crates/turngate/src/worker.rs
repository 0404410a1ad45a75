//! # Worker Pool
//!
//! Reader and writer threads driving one [`TurnLock`].
//!
//! ## Termination under strict alternation
//!
//! The turn-based policy has no idle state: a drained read generation
//! parks the turn on the writers' side whether or not a writer is waiting.
//! A finite run therefore needs choreography:
//!
//! - Readers run a fixed number of sections; the last reader to retire
//!   raises `readers_done` BEFORE its final exit, so the flag is already
//!   visible when that exit hands the turn to the writers.
//! - Writers serve phases until `readers_done`, then retire.
//! - A writer that was already committed to waiting when the flag went up
//!   is unblocked by the pool, which restages the `Write` phase until
//!   every writer thread has retired.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use turngate_core::{GateSnapshot, Phase, TurnLock};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::events::{AccessEvent, AccessKind, EventSender};

/// Mixing constant for the ledger checksum (splitmix64 finalizer multiplier).
const CHECKSUM_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// The role a worker is assigned at creation. Immutable for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Shares the resource with every other active reader.
    Reader,
    /// Owns the resource exclusively for one section per `Write` phase.
    Writer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reader => f.write_str("reader"),
            Self::Writer => f.write_str("writer"),
        }
    }
}

/// Immutable identity of one worker: role plus numeric id.
///
/// Used only for observability (events, logs, thread names). Correctness
/// never depends on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerIdentity {
    /// Numeric id, unique within a pool per role.
    pub id: u32,
    /// Assigned role.
    pub role: Role,
}

impl WorkerIdentity {
    /// Thread name for this worker, e.g. `reader-3`.
    #[must_use]
    pub fn thread_name(&self) -> String {
        format!("{}-{}", self.role, self.id)
    }
}

/// The demo shared resource.
///
/// Writers bump `revision` and recompute `checksum` as two separate stores;
/// readers verify the pair. Any interleaving that breaks mutual exclusion
/// shows up as a torn ledger and fails fast.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Completed write sections.
    revision: u64,
    /// Mixed image of `revision`, updated last.
    checksum: u64,
}

impl Ledger {
    /// Fresh ledger at revision zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            revision: 0,
            checksum: 0,
        }
    }

    /// Current revision.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Records one write section: bump, then recompute.
    pub fn record_write(&mut self) {
        self.revision += 1;
        self.checksum = Self::mix(self.revision);
    }

    /// Verifies the revision/checksum pair is coherent.
    ///
    /// # Panics
    ///
    /// Panics on a torn ledger - a reader overlapped a writer's section,
    /// which means the exclusion invariant broke.
    pub fn verify(&self) {
        assert!(
            self.checksum == Self::mix(self.revision),
            "torn ledger at revision {}! a reader overlapped a write section",
            self.revision
        );
    }

    const fn mix(revision: u64) -> u64 {
        revision.wrapping_mul(CHECKSUM_MIX)
    }
}

/// What a finished pool run looked like.
#[derive(Debug)]
pub struct PoolReport {
    /// Read sections completed across all readers.
    pub reads_completed: u64,
    /// Write sections completed across all writers.
    pub writes_completed: u64,
    /// Final ledger revision (equals `writes_completed`).
    pub final_revision: u64,
    /// Gate state after every worker retired. Always quiescent.
    pub final_snapshot: GateSnapshot,
}

/// Shared context handed to every worker thread.
struct PoolContext {
    lock: TurnLock<Ledger>,
    events: EventSender,
    readers_remaining: AtomicU32,
    readers_done: AtomicBool,
    reads_completed: AtomicU64,
    writes_completed: AtomicU64,
}

impl PoolContext {
    fn emit(&self, identity: WorkerIdentity, kind: AccessKind) {
        let snapshot = self.lock.snapshot();
        self.events.send(AccessEvent {
            id: identity.id,
            role: identity.role,
            kind,
            phase: snapshot.phase,
            active_readers: snapshot.active_readers,
        });
    }
}

/// Spawns, runs and joins one configured pool of readers and writers.
pub struct WorkerPool;

impl WorkerPool {
    /// Runs a full pool to completion and reports what happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unrunnable, a worker
    /// thread cannot be spawned, or a worker panics (torn ledger, broken
    /// gate contract).
    pub fn run(config: &HarnessConfig, events: EventSender) -> HarnessResult<PoolReport> {
        config.validate()?;

        let context = Arc::new(PoolContext {
            lock: TurnLock::new(Ledger::new()),
            events,
            readers_remaining: AtomicU32::new(config.readers),
            readers_done: AtomicBool::new(false),
            reads_completed: AtomicU64::new(0),
            writes_completed: AtomicU64::new(0),
        });

        let readers = Self::spawn_role(config, &context, Role::Reader, config.readers)?;
        let writers = Self::spawn_role(config, &context, Role::Writer, config.writers)?;

        let readers_result = Self::join_all(readers);
        if readers_result.is_err() {
            // A dead reader never reached its retirement decrement, so the
            // flag the writers are watching would stay down forever. Raise
            // it here so the wind-down below can still reach them.
            context.readers_done.store(true, Ordering::SeqCst);
        }
        let writers_result = Self::wind_down_writers(&context, writers);
        readers_result?;
        writers_result?;

        let final_snapshot = context.lock.snapshot();
        context.lock.shutdown();

        tracing::info!(
            reads = context.reads_completed.load(Ordering::SeqCst),
            writes = context.writes_completed.load(Ordering::SeqCst),
            "pool retired"
        );

        let context = Arc::into_inner(context)
            .expect("all workers joined, no other context handles exist");
        let final_revision = context.lock.into_inner().revision();

        Ok(PoolReport {
            reads_completed: context.reads_completed.into_inner(),
            writes_completed: context.writes_completed.into_inner(),
            final_revision,
            final_snapshot,
        })
    }

    fn spawn_role(
        config: &HarnessConfig,
        context: &Arc<PoolContext>,
        role: Role,
        count: u32,
    ) -> HarnessResult<Vec<(WorkerIdentity, JoinHandle<()>)>> {
        let mut handles = Vec::with_capacity(count as usize);
        for id in 0..count {
            let identity = WorkerIdentity { id, role };
            let context = Arc::clone(context);
            let config = config.clone();
            let handle = thread::Builder::new()
                .name(identity.thread_name())
                .spawn(move || match role {
                    Role::Reader => Self::reader_main(&context, &config, identity),
                    Role::Writer => Self::writer_main(&context, &config, identity),
                })?;
            handles.push((identity, handle));
        }
        Ok(handles)
    }

    fn reader_main(context: &PoolContext, config: &HarnessConfig, identity: WorkerIdentity) {
        for round in 1..=config.rounds {
            let guard = context.lock.read();
            context.emit(identity, AccessKind::Entered);

            guard.verify();
            dwell(config.reader_hold_us);
            context.reads_completed.fetch_add(1, Ordering::SeqCst);

            // Raise the retirement flag while still registered, so the exit
            // below can safely be the one that hands the turn over.
            if round == config.rounds
                && context.readers_remaining.fetch_sub(1, Ordering::SeqCst) == 1
            {
                context.readers_done.store(true, Ordering::SeqCst);
                tracing::debug!(id = identity.id, "last reader retiring");
            }

            drop(guard);
            context.emit(identity, AccessKind::Exited);
        }
    }

    fn writer_main(context: &PoolContext, config: &HarnessConfig, identity: WorkerIdentity) {
        while !context.readers_done.load(Ordering::SeqCst) {
            let mut guard = context.lock.write();
            context.emit(identity, AccessKind::Entered);

            guard.record_write();
            dwell(config.writer_hold_us);
            context.writes_completed.fetch_add(1, Ordering::SeqCst);

            drop(guard);
            context.emit(identity, AccessKind::Exited);
        }
        tracing::debug!(id = identity.id, "writer retiring");
    }

    /// Unblocks and joins writers once `readers_done` is up.
    ///
    /// A writer that committed to waiting before the flag went up sits in
    /// its enter call until the `Write` phase comes around; restaging the
    /// phase is idempotent, so hammering it while a straggler finishes its
    /// section is harmless. This runs on the error path too, so a reader
    /// panic never strands writer threads on a parked turn.
    fn wind_down_writers(
        context: &PoolContext,
        writers: Vec<(WorkerIdentity, JoinHandle<()>)>,
    ) -> HarnessResult<()> {
        while writers.iter().any(|(_, handle)| !handle.is_finished()) {
            context.lock.request_transition(Phase::Write);
            thread::sleep(Duration::from_millis(1));
        }
        Self::join_all(writers)
    }

    fn join_all(handles: Vec<(WorkerIdentity, JoinHandle<()>)>) -> HarnessResult<()> {
        for (identity, handle) in handles {
            handle
                .join()
                .map_err(|_| HarnessError::WorkerPanicked { id: identity.id })?;
        }
        Ok(())
    }
}

fn dwell(micros: u64) {
    if micros > 0 {
        thread::sleep(Duration::from_micros(micros));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;

    #[test]
    fn test_wind_down_reaches_writers_when_readers_never_retire() {
        // The situation after a reader dies mid-run: the retirement
        // decrement never happened and no reader will ever cycle the turn.
        // Raising the flag and winding down must still reach every writer.
        let config = HarnessConfig {
            readers: 1,
            writers: 2,
            rounds: 1,
            reader_hold_us: 0,
            writer_hold_us: 0,
            event_capacity: 64,
        };
        let bus = EventBus::new(config.event_capacity);
        let context = Arc::new(PoolContext {
            lock: TurnLock::new(Ledger::new()),
            events: bus.sender(),
            readers_remaining: AtomicU32::new(config.readers),
            readers_done: AtomicBool::new(false),
            reads_completed: AtomicU64::new(0),
            writes_completed: AtomicU64::new(0),
        });

        let writers = WorkerPool::spawn_role(&config, &context, Role::Writer, config.writers)
            .expect("failed to spawn writers");
        // Let both writers commit to waiting on a turn that will never
        // arrive on its own.
        thread::sleep(Duration::from_millis(20));

        context.readers_done.store(true, Ordering::SeqCst);
        WorkerPool::wind_down_writers(&context, writers).expect("writers failed to wind down");
        assert!(context.lock.snapshot().is_quiescent());
    }

    #[test]
    fn test_identity_thread_name() {
        let identity = WorkerIdentity {
            id: 3,
            role: Role::Reader,
        };
        assert_eq!(identity.thread_name(), "reader-3");
    }

    #[test]
    fn test_ledger_round_trip() {
        let mut ledger = Ledger::new();
        ledger.verify();
        ledger.record_write();
        ledger.record_write();
        assert_eq!(ledger.revision(), 2);
        ledger.verify();
    }

    #[test]
    #[should_panic(expected = "torn ledger")]
    fn test_torn_ledger_detected() {
        let ledger = Ledger {
            revision: 5,
            checksum: 1,
        };
        ledger.verify();
    }
}
