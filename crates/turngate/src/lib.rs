//! # TURNGATE Worker Harness
//!
//! Drives pools of reader and writer threads over the core gate:
//! - Roles and identities are assigned once at creation and used only for
//!   observability
//! - Every section entry/exit emits an access event over a bounded bus
//! - Pool termination choreography keeps the strict-alternation policy
//!   from wedging a finite run
//!
//! The arbitration itself lives in `turngate_core`; nothing in this crate
//! touches gate state except through its public operations.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod events;
pub mod worker;

pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use events::{AccessEvent, AccessKind, EventBus, EventReceiver, EventSender};
pub use worker::{Ledger, PoolReport, Role, WorkerIdentity, WorkerPool};
