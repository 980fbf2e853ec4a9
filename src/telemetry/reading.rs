use chrono::{DateTime, Local};
use std::fmt;

/// Text shown in place of the current DNS servers when resolution failed and
/// the report carried no server list.
pub const DNS_FAILED_SENTINEL: &str = "N/A (DNS Failed)";

/// Outcome of the DNS resolution check reported by a site.
///
/// A report without the failure marker counts as `Pass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionStatus {
    #[default]
    Pass,
    Fail,
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResolutionStatus::Pass => write!(f, "PASS"),
            ResolutionStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Result of the pools resolution test, `NotApplicable` when the report
/// does not mention it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolsTest {
    Pass,
    Fail,
    #[default]
    NotApplicable,
}

impl PoolsTest {
    /// Maps the literal captured after the pools label.
    pub fn from_literal(value: &str) -> Self {
        match value {
            "PASS" => PoolsTest::Pass,
            "FAIL" => PoolsTest::Fail,
            _ => PoolsTest::NotApplicable,
        }
    }
}

impl fmt::Display for PoolsTest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PoolsTest::Pass => write!(f, "PASS"),
            PoolsTest::Fail => write!(f, "FAIL"),
            PoolsTest::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Structured view of one network status report.
///
/// Optional fields stay `None` when their label was not found in the report.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkReading {
    pub current_dns_server: Option<String>,
    pub ping: Option<String>,
    pub download: Option<String>,
    pub upload: Option<String>,
    pub primary_dns: Option<String>,
    pub secondary_dns: Option<String>,
    pub pools_resolution_test: PoolsTest,
    pub dns_resolution_status: ResolutionStatus,
    pub captured_at: DateTime<Local>,
}

impl NetworkReading {
    /// Empty reading captured at the given time.
    pub fn empty(captured_at: DateTime<Local>) -> Self {
        Self {
            current_dns_server: None,
            ping: None,
            download: None,
            upload: None,
            primary_dns: None,
            secondary_dns: None,
            pools_resolution_test: PoolsTest::NotApplicable,
            dns_resolution_status: ResolutionStatus::Pass,
            captured_at,
        }
    }

    /// Capture time as shown on the site card.
    pub fn timestamp(&self) -> String {
        self.captured_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
