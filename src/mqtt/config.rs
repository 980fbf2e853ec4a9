use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::error::MqttError;

pub const DEFAULT_BROKER_URL: &str = "mqtt://64.227.163.97:8083";
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Broker connection settings, stored in the `[mqtt]` section of the dashboard config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker URI, e.g. `mqtt://broker.local:1883`
    pub broker_url: String,
    pub client_id: String,
    pub keep_alive_secs: u64,
    /// Capacity of the request queue between client and event loop
    pub channel_capacity: usize,
    /// Let the transport re-establish the connection after it closes
    pub auto_reconnect: bool,
    pub reconnect_delay_ms: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_url: DEFAULT_BROKER_URL.to_string(),
            client_id: format!("sitewatch-{}", std::process::id()),
            keep_alive_secs: 60,
            channel_capacity: 100,
            auto_reconnect: true,
            reconnect_delay_ms: 1000,
        }
    }
}

impl MqttConfig {
    pub fn endpoint(&self) -> Result<BrokerEndpoint, MqttError> {
        BrokerEndpoint::parse(&self.broker_url)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Host and port extracted from a broker URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

impl BrokerEndpoint {
    /// Accepts `mqtt://host:port`, `tcp://host:port` or a bare `host[:port]`.
    pub fn parse(url: &str) -> Result<Self, MqttError> {
        let invalid = |reason: &str| MqttError::InvalidBrokerUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let rest = match url.trim().split_once("://") {
            Some(("mqtt" | "tcp", rest)) => rest,
            Some((scheme, _)) => return Err(invalid(&format!("unsupported scheme '{}'", scheme))),
            None => url.trim(),
        };
        let rest = rest.trim_end_matches('/');

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| invalid(&format!("bad port '{}': {}", port, e)))?;
                (host, port)
            }
            None => (rest, DEFAULT_MQTT_PORT),
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
