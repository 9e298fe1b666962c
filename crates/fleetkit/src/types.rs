//! Core types for fleet provisioning

use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Output;

/// A host to bootstrap, plus its configuration parameters.
///
/// Immutable once queued; shared between threads by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Host {
    pub hostname: String,
    pub domain: String,
    #[serde(rename = "chefenv")]
    pub environment: String,
    #[serde(rename = "runlist")]
    pub run_list: String,
}

impl Host {
    pub fn new(
        hostname: impl Into<String>,
        domain: impl Into<String>,
        environment: impl Into<String>,
        run_list: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            domain: domain.into(),
            environment: environment.into(),
            run_list: run_list.into(),
        }
    }

    /// Name of the first empty or whitespace-only field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("hostname", &self.hostname),
            ("domain", &self.domain),
            ("chef environment", &self.environment),
            ("run list", &self.run_list),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }

    /// Fully qualified domain name (`hostname.domain`)
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.hostname, self.domain)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqdn())
    }
}

/// Outcome category of one provisioning attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Classification {
    Success,
    DnsFailure,
    AuthFailure,
    TimeoutFailure,
    GeneralFailure,
    ToolFailure,
}

impl Classification {
    /// Every classification, in report order.
    pub const ALL: [Self; 6] = [
        Self::Success,
        Self::DnsFailure,
        Self::AuthFailure,
        Self::TimeoutFailure,
        Self::GeneralFailure,
        Self::ToolFailure,
    ];

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Get a user-friendly description of this classification.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Success => "Bootstrapped",
            Self::DnsFailure => "Name resolution failed",
            Self::AuthFailure => "Authentication failed",
            Self::TimeoutFailure => "Connection timed out",
            Self::GeneralFailure => "Bootstrap failed",
            Self::ToolFailure => "knife exited with a tool error",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A classified host, produced once per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub host: Host,
    pub classification: Classification,
}

impl Outcome {
    pub fn new(host: Host, classification: Classification) -> Self {
        Self {
            host,
            classification,
        }
    }
}

/// Combined output and portable exit code of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// stderr followed by stdout
    pub combined: Vec<u8>,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(combined: impl Into<Vec<u8>>, exit_code: i32) -> Self {
        Self {
            combined: combined.into(),
            exit_code,
        }
    }

    /// Get the combined output as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.combined).to_string()
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        let mut combined = output.stderr;
        combined.extend_from_slice(&output.stdout);
        Self {
            combined,
            exit_code: crate::runner::exit_code(output.status),
        }
    }
}
