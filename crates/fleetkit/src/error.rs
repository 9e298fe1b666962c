//! Error types for fleet provisioning.
//!
//! Errors follow the run's failure taxonomy: inventory problems abort before
//! any work starts, per-host provisioning failures are never errors (they are
//! [`Classification`](crate::Classification)s), and infrastructure faults
//! escalate out of the pool.

use std::path::PathBuf;
use thiserror::Error;

use crate::aggregate::Buckets;
use crate::types::Host;

/// Errors raised while loading and validating a host inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Inventory file could not be read
    #[error("could not read inventory {path}: {source}")]
    Read {
        /// Path of the inventory file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Row has fewer than the four required columns
    #[error("line {line}: expected 4 tab-separated fields, found {found}")]
    MissingColumns {
        /// Line number (1-indexed)
        line: usize,
        /// Number of fields present on the line
        found: usize,
    },

    /// Row has an empty or whitespace-only field
    #[error("line {line}: please ensure the entry contains a {field}: {row:?}")]
    EmptyField {
        /// Line number (1-indexed)
        line: usize,
        /// Human-readable field name
        field: &'static str,
        /// The raw row, for the operator to locate it
        row: String,
    },
}

/// Errors raised by the task queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was sealed before the host was enqueued
    #[error("task queue is closed, cannot enqueue {hostname}")]
    Closed {
        /// Host that was rejected
        hostname: String,
    },

    /// Host has an empty required field
    #[error("host {hostname:?} is missing a {field}")]
    InvalidHost {
        /// Hostname as given (may itself be empty)
        hostname: String,
        /// Name of the empty field
        field: &'static str,
    },
}

/// Errors raised by a [`CommandRunner`](crate::CommandRunner).
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The subprocess could not be started or waited on
    #[error("failed to execute `{program}`: {source}")]
    Spawn {
        /// The program that failed to launch
        program: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Other runner failure
    #[error("{0}")]
    Other(String),
}

/// Errors that end a pool run early.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The rayon pool could not be built
    #[error("failed to create worker pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),

    /// A runner could not even start the provisioning tool
    #[error("infrastructure failure on {}: {source} ({} hosts not attempted)", .host.hostname, .abandoned.len())]
    Infrastructure {
        /// Host whose command could not be started
        host: Host,
        /// The runner error
        #[source]
        source: RunnerError,
        /// Hosts removed from the queue without an attempt
        abandoned: Vec<Host>,
        /// Outcomes recorded before the pool stopped
        partial: Buckets,
    },
}

/// Result type for fleet operations.
pub type Result<T, E = PoolError> = std::result::Result<T, E>;
