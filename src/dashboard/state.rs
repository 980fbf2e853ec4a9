use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::site::{resolve_display_name, SiteChannel, SiteStatus};
use crate::config::SitesConfig;
use crate::mqtt::mqtt_handler::ordered_topics;
use crate::mqtt::LinkEvent;
use crate::telemetry;

/// Broker connection banner shown above the site grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrokerBanner {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl BrokerBanner {
    pub fn title(&self) -> &'static str {
        match self {
            BrokerBanner::Connecting => "Connecting",
            BrokerBanner::Connected => "Connected",
            BrokerBanner::Disconnected => "Disconnected",
            BrokerBanner::Error => "Connection Error",
        }
    }

    pub fn description(&self, broker_url: &str) -> String {
        match self {
            BrokerBanner::Connecting => {
                format!("Attempting to connect to the MQTT broker at {}...", broker_url)
            }
            BrokerBanner::Connected => {
                "Successfully connected to the MQTT broker. Waiting for data updates.".to_string()
            }
            BrokerBanner::Disconnected => {
                "Disconnected from the MQTT broker. Attempting to reconnect...".to_string()
            }
            BrokerBanner::Error => format!(
                "Failed to connect to the MQTT broker at {}. Please check the broker status or your network connection.",
                broker_url
            ),
        }
    }
}

/// Latest-value view of every configured site, owned by the UI thread.
pub struct DashboardState {
    broker_url: String,
    sites: Vec<SiteChannel>,
    index: HashMap<String, usize>,
    not_ready: Vec<String>,
    banner: BrokerBanner,
    last_error: Option<String>,
}

impl DashboardState {
    pub fn from_config(config: &SitesConfig, broker_url: &str) -> Self {
        let sites: Vec<SiteChannel> = ordered_topics(config.topics.iter().cloned())
            .into_iter()
            .map(|topic| {
                let name = resolve_display_name(config, &topic);
                SiteChannel::new(topic, name)
            })
            .collect();
        let index = sites
            .iter()
            .enumerate()
            .map(|(i, site)| (site.topic.clone(), i))
            .collect();

        Self {
            broker_url: broker_url.to_string(),
            sites,
            index,
            not_ready: config.not_ready.clone(),
            banner: BrokerBanner::default(),
            last_error: None,
        }
    }

    pub fn apply(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Connected => {
                self.banner = BrokerBanner::Connected;
                self.last_error = None;
            }
            LinkEvent::Message { topic, payload } => {
                self.apply_message(&topic, &payload);
            }
            LinkEvent::Error(cause) => {
                warn!("MQTT connection error: {}", cause);
                self.banner = BrokerBanner::Error;
                self.last_error = Some(cause);
            }
            LinkEvent::Closed => {
                // The close that follows an error keeps the error visible
                if self.banner != BrokerBanner::Error {
                    self.banner = BrokerBanner::Disconnected;
                }
            }
            LinkEvent::SubscribeFailed { topic, reason } => {
                match self.index.get(&topic) {
                    Some(&i) => self.sites[i].subscribe_error = Some(reason),
                    None => debug!("Subscribe failure for unknown topic {}", topic),
                }
            }
        }
    }

    /// Parses `payload` into the site for `topic`. Returns `false` for
    /// topics that are not configured.
    pub fn apply_message(&mut self, topic: &str, payload: &str) -> bool {
        let Some(&i) = self.index.get(topic) else {
            debug!("Ignoring message for unconfigured topic {}", topic);
            return false;
        };
        let reading = telemetry::parse(payload);
        debug!("New reading for {}", topic);
        self.sites[i].record(reading);
        true
    }

    /// Applies everything currently queued on `events`.
    pub fn drain(&mut self, events: &mut mpsc::UnboundedReceiver<LinkEvent>) -> usize {
        let mut applied = 0;
        while let Ok(event) = events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        if applied > 0 {
            debug!("Applied {} broker events", applied);
        }
        applied
    }

    pub fn banner(&self) -> BrokerBanner {
        self.banner
    }

    pub fn banner_description(&self) -> String {
        self.banner.description(&self.broker_url)
    }

    pub fn broker_url(&self) -> &str {
        &self.broker_url
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn site(&self, topic: &str) -> Option<&SiteChannel> {
        self.index.get(topic).map(|&i| &self.sites[i])
    }

    /// Status shown for a site: its own once it has reported, otherwise
    /// derived from the broker connection.
    pub fn effective_status(&self, site: &SiteChannel) -> SiteStatus {
        if site.status == SiteStatus::Connected {
            return SiteStatus::Connected;
        }
        match self.banner {
            BrokerBanner::Connecting => SiteStatus::Loading,
            BrokerBanner::Error => SiteStatus::Error,
            BrokerBanner::Connected | BrokerBanner::Disconnected => site.status,
        }
    }

    /// Sites ordered by case-insensitive display name, ties in config order.
    pub fn sorted_sites(&self) -> Vec<&SiteChannel> {
        let mut sites: Vec<&SiteChannel> = self.sites.iter().collect();
        sites.sort_by_cached_key(|site| site.display_name.to_lowercase());
        sites
    }

    pub fn not_ready_sites(&self) -> &[String] {
        &self.not_ready
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn reporting_count(&self) -> usize {
        self.sites.iter().filter(|s| s.latest.is_some()).count()
    }
}
