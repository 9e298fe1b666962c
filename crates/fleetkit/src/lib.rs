//! # Fleetkit
//!
//! Concurrent provisioning of a host fleet with `knife bootstrap`.
//!
//! ## Core Concepts
//!
//! - **Host**: one machine plus its Chef environment and run list
//! - **TaskQueue**: FIFO of hosts, each delivered to exactly one worker
//! - **WorkerPool**: fixed set of workers draining the queue
//! - **Classification**: why a bootstrap failed (or that it didn't)
//! - **Aggregator**: classified hosts, written concurrently by workers
//! - **Report**: failure buckets, built once after every worker has finished
//!
//! ## Example
//!
//! ```ignore
//! use fleetkit::{inventory, KnifeBootstrap, NoObserver, Report, ShellRunner, TaskQueue, WorkerPool};
//!
//! let hosts = inventory::load("hosts.tsv".as_ref())?;
//! let queue = TaskQueue::from_hosts(hosts)?;
//!
//! let buckets = WorkerPool::default().run(
//!     &queue,
//!     &KnifeBootstrap::default(),
//!     &ShellRunner::new(),
//!     &NoObserver,
//! )?;
//!
//! if let Some(report) = Report::build(&buckets) {
//!     println!("{}", report.to_json_pretty()?);
//! }
//! ```
//!
//! ## Provider Traits
//!
//! - [`CommandBuilder`]: renders the command for a host
//! - [`CommandRunner`]: executes it and reports output plus exit code
//! - [`RunObserver`]: receives per-host events (logs, progress)

pub mod aggregate;
pub mod classify;
pub mod command;
pub mod error;
pub mod inventory;
pub mod pool;
pub mod queue;
pub mod report;
pub mod runner;
pub mod types;

// Re-export main types at crate root
pub use aggregate::{Aggregator, Buckets, RunSummary};
pub use classify::classify;
pub use command::{CommandBuilder, Credentials, KnifeBootstrap};
pub use error::{InventoryError, PoolError, QueueError, Result, RunnerError};
pub use pool::{NoObserver, PoolOptions, RunObserver, WorkerPool};
pub use queue::TaskQueue;
pub use report::Report;
pub use runner::{CommandRunner, ShellRunner};
pub use types::{Classification, CommandOutput, Host, Outcome};
