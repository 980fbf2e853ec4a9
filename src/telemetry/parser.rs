//! Field extraction for site status reports.
//!
//! Every rule is matched independently against the whole payload. A rule that
//! does not match leaves its field empty, so parsing never fails.

use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use super::reading::{
    NetworkReading, PoolsTest, ResolutionStatus, DNS_FAILED_SENTINEL,
};

/// Marker that flags a failed DNS resolution in the report.
pub const DNS_FAILURE_MARKER: &str = "DNS Resolution: FAILED:";

/// Reading field filled by an extraction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CurrentDnsServer,
    Ping,
    Download,
    Upload,
    PrimaryDns,
    SecondaryDns,
    PoolsResolutionTest,
}

/// A label plus the value pattern captured right after it.
pub struct ExtractionRule {
    pub field: Field,
    pattern: Regex,
}

impl ExtractionRule {
    fn new(field: Field, pattern: &str) -> Self {
        // Patterns are compile-time literals covered by the tests below.
        let pattern = Regex::new(pattern).expect("extraction pattern must compile");
        Self { field, pattern }
    }

    /// First capture of this rule in `raw`, if any.
    pub fn extract<'a>(&self, raw: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

static RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new(Field::CurrentDnsServer, r"Current DNS Servers in use:([0-9.]+)"),
        ExtractionRule::new(Field::Ping, r"Ping: ([0-9.]+ ms)"),
        ExtractionRule::new(Field::Download, r"Download: ([0-9.]+ Mbit/s)"),
        ExtractionRule::new(Field::Upload, r"Upload: ([0-9.]+ Mbit/s)"),
        ExtractionRule::new(Field::PrimaryDns, r"Primary: ([0-9.]+)"),
        ExtractionRule::new(Field::SecondaryDns, r"Secondary: ([0-9.]+)"),
        ExtractionRule::new(Field::PoolsResolutionTest, r"Pools Resolution Test: (PASS|FAIL)"),
    ]
});

/// The fixed rule table, in application order.
pub fn rules() -> &'static [ExtractionRule] {
    &RULES
}

/// Parses a raw report, stamping it with the current local time.
pub fn parse(raw: &str) -> NetworkReading {
    parse_at(raw, Local::now())
}

/// Parses a raw report with an explicit capture time.
pub fn parse_at(raw: &str, captured_at: DateTime<Local>) -> NetworkReading {
    let mut reading = NetworkReading::empty(captured_at);

    if raw.contains(DNS_FAILURE_MARKER) {
        reading.dns_resolution_status = ResolutionStatus::Fail;
    }

    for rule in rules() {
        let Some(value) = rule.extract(raw) else {
            continue;
        };
        trace!("Rule {:?} matched '{}'", rule.field, value);
        let value = value.to_string();
        match rule.field {
            Field::CurrentDnsServer => reading.current_dns_server = Some(value),
            Field::Ping => reading.ping = Some(value),
            Field::Download => reading.download = Some(value),
            Field::Upload => reading.upload = Some(value),
            Field::PrimaryDns => reading.primary_dns = Some(value),
            Field::SecondaryDns => reading.secondary_dns = Some(value),
            Field::PoolsResolutionTest => {
                reading.pools_resolution_test = PoolsTest::from_literal(&value)
            }
        }
    }

    if reading.current_dns_server.is_none()
        && reading.dns_resolution_status == ResolutionStatus::Fail
    {
        reading.current_dns_server = Some(DNS_FAILED_SENTINEL.to_string());
    }

    reading
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(field: Field) -> &'static ExtractionRule {
        rules()
            .iter()
            .find(|r| r.field == field)
            .expect("rule exists")
    }

    #[test]
    fn speed_report_fills_speed_fields() {
        let reading = parse("Ping: 23.4 ms Download: 88.1 Mbit/s Upload: 12.0 Mbit/s");

        assert_eq!(reading.ping.as_deref(), Some("23.4 ms"));
        assert_eq!(reading.download.as_deref(), Some("88.1 Mbit/s"));
        assert_eq!(reading.upload.as_deref(), Some("12.0 Mbit/s"));
        assert_eq!(reading.dns_resolution_status, ResolutionStatus::Pass);
        assert_eq!(reading.pools_resolution_test, PoolsTest::NotApplicable);
        assert_eq!(reading.current_dns_server, None);
    }

    #[test]
    fn failure_marker_sets_fail_and_sentinel() {
        let reading = parse("DNS Resolution: FAILED: timeout");

        assert_eq!(reading.dns_resolution_status, ResolutionStatus::Fail);
        assert_eq!(reading.current_dns_server.as_deref(), Some(DNS_FAILED_SENTINEL));
        assert_eq!(reading.ping, None);
        assert_eq!(reading.download, None);
        assert_eq!(reading.upload, None);
        assert_eq!(reading.primary_dns, None);
        assert_eq!(reading.secondary_dns, None);
        assert_eq!(reading.pools_resolution_test, PoolsTest::NotApplicable);
    }

    #[test]
    fn dns_report_fills_dns_fields() {
        let reading = parse(
            "Current DNS Servers in use:8.8.8.8 Primary: 8.8.8.8 Secondary: 8.8.4.4 Pools Resolution Test: PASS",
        );

        assert_eq!(reading.current_dns_server.as_deref(), Some("8.8.8.8"));
        assert_eq!(reading.primary_dns.as_deref(), Some("8.8.8.8"));
        assert_eq!(reading.secondary_dns.as_deref(), Some("8.8.4.4"));
        assert_eq!(reading.pools_resolution_test, PoolsTest::Pass);
        assert_eq!(reading.dns_resolution_status, ResolutionStatus::Pass);
    }

    #[test]
    fn server_list_wins_over_sentinel() {
        let reading =
            parse("Current DNS Servers in use:1.1.1.1\nDNS Resolution: FAILED: pools unreachable");

        assert_eq!(reading.dns_resolution_status, ResolutionStatus::Fail);
        assert_eq!(reading.current_dns_server.as_deref(), Some("1.1.1.1"));
    }

    #[test]
    fn unrecognised_text_yields_defaults() {
        let at = Local::now();
        for raw in ["", "hello world", "ping: 5 ms", "Ping: fast", "\u{1F600}\0\n\t"] {
            let reading = parse_at(raw, at);
            assert_eq!(reading, NetworkReading::empty(at), "input {:?}", raw);
        }
    }

    #[test]
    fn truncated_input_does_not_panic() {
        let full = "Current DNS Servers in use:8.8.8.8 Ping: 23.4 ms Download: 88.1 Mbit/s Pools Resolution Test: FAIL DNS Resolution: FAILED: x";
        for end in 0..=full.len() {
            let _ = parse(&full[..end]);
        }
    }

    #[test]
    fn failure_status_tracks_marker_only() {
        assert_eq!(
            parse("prefix DNS Resolution: FAILED: suffix").dns_resolution_status,
            ResolutionStatus::Fail
        );
        assert_eq!(
            parse("DNS Resolution: FAILED").dns_resolution_status,
            ResolutionStatus::Pass
        );
        assert_eq!(
            parse("dns resolution: failed: lower").dns_resolution_status,
            ResolutionStatus::Pass
        );
    }

    #[test]
    fn pools_rule_reads_fail() {
        let reading = parse("Pools Resolution Test: FAIL");
        assert_eq!(reading.pools_resolution_test, PoolsTest::Fail);

        let reading = parse("Pools Resolution Test: SKIPPED");
        assert_eq!(reading.pools_resolution_test, PoolsTest::NotApplicable);
    }

    #[test]
    fn server_capture_stops_at_first_other_character() {
        let r = rule(Field::CurrentDnsServer);
        assert_eq!(r.extract("Current DNS Servers in use:10.0.0.1,8.8.8.8"), Some("10.0.0.1"));
        assert_eq!(r.extract("Current DNS Servers in use:10.0.0.18.8.8.8"), Some("10.0.0.18.8.8.8"));
        assert_eq!(r.extract("Current DNS Servers in use: 10.0.0.1"), None);
    }

    #[test]
    fn speed_rules_require_units() {
        assert_eq!(rule(Field::Ping).extract("Ping: 12 ms"), Some("12 ms"));
        assert_eq!(rule(Field::Ping).extract("Ping: 12ms"), None);
        assert_eq!(rule(Field::Download).extract("Download: 5 Mbit/s"), Some("5 Mbit/s"));
        assert_eq!(rule(Field::Download).extract("Download: 5 MB/s"), None);
        assert_eq!(rule(Field::Upload).extract("Upload: 0.5 Mbit/s"), Some("0.5 Mbit/s"));
    }

    #[test]
    fn resolver_rules_take_first_occurrence() {
        let raw = "Primary: 9.9.9.9 Secondary: 1.0.0.1 Primary: 8.8.8.8";
        assert_eq!(rule(Field::PrimaryDns).extract(raw), Some("9.9.9.9"));
        assert_eq!(rule(Field::SecondaryDns).extract(raw), Some("1.0.0.1"));
    }

    #[test]
    fn multi_line_report() {
        let raw = "Site check\nPing: 41.0 ms\nDownload: 120.55 Mbit/s\nUpload: 30.1 Mbit/s\nPrimary: 1.1.1.1\nSecondary: 1.0.0.1\nPools Resolution Test: PASS\n";
        let reading = parse(raw);

        assert_eq!(reading.ping.as_deref(), Some("41.0 ms"));
        assert_eq!(reading.download.as_deref(), Some("120.55 Mbit/s"));
        assert_eq!(reading.upload.as_deref(), Some("30.1 Mbit/s"));
        assert_eq!(reading.primary_dns.as_deref(), Some("1.1.1.1"));
        assert_eq!(reading.secondary_dns.as_deref(), Some("1.0.0.1"));
        assert_eq!(reading.pools_resolution_test, PoolsTest::Pass);
        assert_eq!(reading.current_dns_server, None);
    }

    #[test]
    fn capture_time_is_kept() {
        let at = Local::now();
        let reading = parse_at("Ping: 1 ms", at);
        assert_eq!(reading.captured_at, at);
        assert_eq!(reading.timestamp(), at.format("%Y-%m-%d %H:%M:%S").to_string());
    }
}
