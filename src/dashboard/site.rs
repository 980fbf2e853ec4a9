use std::fmt;

use crate::config::SitesConfig;
use crate::telemetry::NetworkReading;

/// Per-site indicator shown on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStatus {
    Loading,
    Connected,
    NoData,
    Error,
}

impl SiteStatus {
    /// Card subtitle used until the site has reported.
    pub fn label(&self) -> &'static str {
        match self {
            SiteStatus::Connected => "Online",
            SiteStatus::Loading => "Connecting...",
            SiteStatus::NoData => "No Data Yet",
            SiteStatus::Error => "Error",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One configured topic and the latest reading received on it.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteChannel {
    pub topic: String,
    pub display_name: String,
    pub latest: Option<NetworkReading>,
    pub status: SiteStatus,
    /// Why the last subscribe attempt for this topic failed, if it did
    pub subscribe_error: Option<String>,
}

impl SiteChannel {
    pub fn new(topic: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            display_name: display_name.into(),
            latest: None,
            status: SiteStatus::NoData,
            subscribe_error: None,
        }
    }

    /// Replaces the previous reading wholesale.
    pub fn record(&mut self, reading: NetworkReading) {
        self.latest = Some(reading);
        self.status = SiteStatus::Connected;
        self.subscribe_error = None;
    }
}

/// Display name for `topic`: direct mapping, then alias, then the topic
/// without its suffix.
pub fn resolve_display_name(sites: &SitesConfig, topic: &str) -> String {
    if let Some(name) = sites.display_names.get(topic) {
        return name.clone();
    }
    if let Some(name) = sites
        .aliases
        .get(topic)
        .and_then(|target| sites.display_names.get(target))
    {
        return name.clone();
    }
    topic
        .strip_suffix(sites.topic_suffix.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(topic)
        .to_string()
}
