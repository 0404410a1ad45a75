//! # Harness Error Types
//!
//! All errors that can occur while driving worker pools.
//!
//! Gate contract violations are NOT here: those are programming errors and
//! fail fast inside `turngate_core` with a panic naming the broken
//! invariant.

use thiserror::Error;

/// Errors that can occur in the worker harness.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML.
    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but describes an unrunnable pool.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A worker thread panicked; its section state is unrecoverable.
    #[error("worker {id} panicked mid-section")]
    WorkerPanicked {
        /// Numeric id of the worker that died.
        id: u32,
    },
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
