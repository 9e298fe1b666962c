//! Classified outcome collection.
//!
//! All buckets live in one [`Buckets`] value behind one mutex, so a reader
//! never observes a half-recorded run.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::types::{Classification, Host, Outcome};

/// Hosts grouped by classification, in completion order per bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    buckets: BTreeMap<Classification, Vec<Host>>,
}

impl Buckets {
    pub fn push(&mut self, outcome: Outcome) {
        self.buckets
            .entry(outcome.classification)
            .or_default()
            .push(outcome.host);
    }

    /// Hosts that received `classification` (empty slice if none).
    pub fn get(&self, classification: Classification) -> &[Host] {
        self.buckets
            .get(&classification)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.get(classification).len()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Check if any non-success bucket holds a host
    pub fn has_failures(&self) -> bool {
        self.buckets
            .iter()
            .any(|(classification, hosts)| !classification.is_success() && !hosts.is_empty())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            succeeded: self.count(Classification::Success),
            dns: self.count(Classification::DnsFailure),
            auth: self.count(Classification::AuthFailure),
            timeout: self.count(Classification::TimeoutFailure),
            general: self.count(Classification::GeneralFailure),
            tool: self.count(Classification::ToolFailure),
        }
    }
}

/// Per-classification counts for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub dns: usize,
    pub auth: usize,
    pub timeout: usize,
    pub general: usize,
    pub tool: usize,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.dns + self.auth + self.timeout + self.general + self.tool
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Thread-safe recorder written concurrently by workers.
#[derive(Debug, Default)]
pub struct Aggregator {
    inner: Mutex<Buckets>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: Outcome) {
        self.lock().push(outcome);
    }

    /// Number of outcomes recorded so far
    pub fn recorded(&self) -> usize {
        self.lock().total()
    }

    /// Consume the aggregator once every worker has finished.
    pub fn into_buckets(self) -> Buckets {
        match self.inner.into_inner() {
            Ok(buckets) => buckets,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // A worker that panicked mid-run cannot leave a partial push behind,
    // so a poisoned lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, Buckets> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
