//! Failure report built once a run has finished.

use serde::{Deserialize, Serialize};

use crate::aggregate::Buckets;
use crate::types::{Classification, Host};

/// Hosts grouped by failure cause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "dns_hosts")]
    pub dns: Vec<Host>,
    #[serde(rename = "auth_hosts")]
    pub auth: Vec<Host>,
    #[serde(rename = "timeout_hosts")]
    pub timeout: Vec<Host>,
    #[serde(rename = "general_hosts")]
    pub general: Vec<Host>,
    #[serde(rename = "knife_hosts")]
    pub tool: Vec<Host>,
}

impl Report {
    /// Build the report, or `None` when every host succeeded.
    pub fn build(buckets: &Buckets) -> Option<Self> {
        if !buckets.has_failures() {
            return None;
        }

        let hosts = |c| buckets.get(c).to_vec();
        Some(Self {
            dns: hosts(Classification::DnsFailure),
            auth: hosts(Classification::AuthFailure),
            timeout: hosts(Classification::TimeoutFailure),
            general: hosts(Classification::GeneralFailure),
            tool: hosts(Classification::ToolFailure),
        })
    }

    /// Hosts for one failure classification (`Success` has none).
    pub fn hosts(&self, classification: Classification) -> &[Host] {
        match classification {
            Classification::Success => &[],
            Classification::DnsFailure => &self.dns,
            Classification::AuthFailure => &self.auth,
            Classification::TimeoutFailure => &self.timeout,
            Classification::GeneralFailure => &self.general,
            Classification::ToolFailure => &self.tool,
        }
    }

    pub fn total(&self) -> usize {
        self.dns.len() + self.auth.len() + self.timeout.len() + self.general.len() + self.tool.len()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    fn host(name: &str) -> Host {
        Host::new(name, "example.com", "prod", "role[web]")
    }

    #[test]
    fn test_no_report_when_all_succeed() {
        let mut buckets = Buckets::default();
        buckets.push(Outcome::new(host("a"), Classification::Success));
        buckets.push(Outcome::new(host("b"), Classification::Success));
        assert_eq!(Report::build(&buckets), None);
        assert_eq!(Report::build(&Buckets::default()), None);
    }

    #[test]
    fn test_report_groups_failures() {
        let mut buckets = Buckets::default();
        buckets.push(Outcome::new(host("ok"), Classification::Success));
        buckets.push(Outcome::new(host("dns"), Classification::DnsFailure));
        buckets.push(Outcome::new(host("knife"), Classification::ToolFailure));

        let report = Report::build(&buckets).expect("failures present");
        assert_eq!(report.total(), 2);
        assert_eq!(report.hosts(Classification::DnsFailure), &[host("dns")]);
        assert_eq!(report.hosts(Classification::ToolFailure), &[host("knife")]);
        assert!(report.hosts(Classification::Success).is_empty());
    }

    #[test]
    fn test_report_json_keys() {
        let mut buckets = Buckets::default();
        buckets.push(Outcome::new(host("web01"), Classification::AuthFailure));
        let report = Report::build(&buckets).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["auth_hosts"][0]["hostname"], "web01");
        assert_eq!(json["auth_hosts"][0]["chefenv"], "prod");
        for key in ["dns_hosts", "timeout_hosts", "general_hosts", "knife_hosts"] {
            assert_eq!(json[key], serde_json::json!([]), "{key}");
        }
    }
}
