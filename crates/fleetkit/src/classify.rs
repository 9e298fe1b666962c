//! Outcome classification for bootstrap runs.
//!
//! Markers are checked in priority order (most specific first) against the
//! decoded combined output, then the exit code decides between the generic
//! and tool-specific failures. Matching is case-sensitive and exact.

use crate::types::Classification;

/// Printed by knife when the SSH credentials are rejected.
pub const AUTH_MARKER: &str = "Authentication failed";

/// Printed by knife when the SSH connection cannot be established in time.
pub const TIMEOUT_MARKER: &str = "ConnectionTimeout";

/// Printed by the resolver when the FQDN does not resolve.
pub const DNS_MARKER: &str = "nodename nor servname provided";

/// Generic failure exit code.
pub const GENERAL_FAILURE_EXIT: i32 = 1;

/// knife's own non-zero exit, distinct from a generic failure.
pub const TOOL_FAILURE_EXIT: i32 = 100;

/// Classify one command result. First match wins.
pub fn classify(output: &[u8], exit_code: i32) -> Classification {
    let text = String::from_utf8_lossy(output);

    if text.contains(AUTH_MARKER) {
        return Classification::AuthFailure;
    }
    if text.contains(TIMEOUT_MARKER) {
        return Classification::TimeoutFailure;
    }
    if text.contains(DNS_MARKER) {
        return Classification::DnsFailure;
    }

    match exit_code {
        GENERAL_FAILURE_EXIT => Classification::GeneralFailure,
        TOOL_FAILURE_EXIT => Classification::ToolFailure,
        _ => Classification::Success,
    }
}
