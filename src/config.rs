//! Dashboard configuration.
//!
//! Loaded once at startup from `~/.config/sitewatch/dashboard.toml` (or the
//! file named by `SITEWATCH_CONFIG`). A missing file is created with the
//! built-in defaults so the dashboard always starts.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::mqtt::MqttConfig;

const CONFIG_DIR: &str = ".config/sitewatch";
const CONFIG_FILE: &str = "dashboard.toml";
pub const CONFIG_ENV: &str = "SITEWATCH_CONFIG";

pub const DEFAULT_TOPIC_SUFFIX: &str = "/NETWORK";

const DEFAULT_TOPICS: [&str; 19] = [
    "Arad2/NETWORK",
    "Harz1/NETWORK",
    "Mafraq/NETWORK",
    "Harz3/NETWORK",
    "Arad1/NETWORK",
    "Naheel1/NETWORK",
    "Kasna/NETWORK",
    "Faqa/NETWORK",
    "Wagan1/NETWORK",
    "Hayeer/NETWORK",
    "Harz2/NETWORK",
    "BK1/NETWORK",
    "BK2/NETWORK",
    "Wagan3/NETWORK",
    "Wagan4/NETWORK",
    "Omar1/NETWORK",
    "Omar2/NETWORK",
    "Forest2/NETWORK",
    "Forest1/NETWORK",
];

const DEFAULT_DISPLAY_NAMES: [(&str, &str); 19] = [
    ("Omar1/NETWORK", "F14: Omar 1"),
    ("Omar2/NETWORK", "F15: Omar 2"),
    ("Harz1/NETWORK", "F10: Harz 1"),
    ("Harz2/NETWORK", "F11: Harz 2"),
    ("Harz3/NETWORK", "F16: Harz 3"),
    ("Faqa/NETWORK", "F21: Al Faqaa"),
    ("Naheel/NETWORK", "F26: NAHEEL"),
    ("BK1/NETWORK", "F8: BK 1"),
    ("BK2/NETWORK", "F17: BK 2"),
    ("Arad1/NETWORK", "F27: Al Arad"),
    ("Wagan/NETWORK", "F19: Wagan"),
    ("Wagan3/NETWORK", "F32: WAGAN 3"),
    ("Wagan4/NETWORK", "F33: WAGAN 4"),
    ("Arad2/NETWORK", "F34: AL ARAD 2"),
    ("Hayeer/NETWORK", "F12: Al Hayeer"),
    ("Forest1/NETWORK", "F22: Forest 1"),
    ("Mafraq/NETWORK", "F20: Mafraq"),
    ("Kasna/NETWORK", "F26: Khaznah"),
    ("Forest2/NETWORK", "F23: Forest 2"),
];

// Topics published under a different name than their display-name entry
const DEFAULT_ALIASES: [(&str, &str); 2] = [
    ("Naheel1/NETWORK", "Naheel/NETWORK"),
    ("Wagan1/NETWORK", "Wagan/NETWORK"),
];

const DEFAULT_NOT_READY: [&str; 9] = [
    "F31: NAHEEL 2",
    "F18: BK 3",
    "F30: BK 4",
    "F9: Liwa 2ZAKIR",
    "F35: PALACE",
    "F36: Hili 1",
    "F37: Hili 2",
    "F38: Al Shamkhah",
    "F39: Al Taweela",
];

/// Site list and naming tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitesConfig {
    /// Topics to subscribe to, in configuration order
    pub topics: Vec<String>,
    /// Stripped from a topic to derive a display name when no mapping exists
    pub topic_suffix: String,
    /// Sites shown as placeholders without a live data source
    pub not_ready: Vec<String>,
    pub display_names: BTreeMap<String, String>,
    /// topic -> topic whose display name it shares
    pub aliases: BTreeMap<String, String>,
}

impl Default for SitesConfig {
    fn default() -> Self {
        let pairs = |table: &[(&str, &str)]| {
            table
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            topic_suffix: DEFAULT_TOPIC_SUFFIX.to_string(),
            not_ready: DEFAULT_NOT_READY.iter().map(|s| s.to_string()).collect(),
            display_names: pairs(&DEFAULT_DISPLAY_NAMES),
            aliases: pairs(&DEFAULT_ALIASES),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub fullscreen: bool,
    /// Repaint interval while idle
    pub refresh_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            refresh_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub mqtt: MqttConfig,
    pub sites: SitesConfig,
    pub ui: UiConfig,
}

impl DashboardConfig {
    /// Location of the config file, honouring `SITEWATCH_CONFIG`.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    /// Writes the defaults to `path` unless a file already exists there.
    pub async fn ensure_default_config(path: &Path) -> Result<()> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check config file {}: {}", path.display(), e))?
        {
            debug!("Using existing config {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = Self::default().to_toml()?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write default config file: {}", e))?;
        info!("Wrote default config to {}", path.display());
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        Self::from_toml(&content)
            .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
    }

    /// Resolves the config path, creates the defaults if needed and loads it.
    pub async fn load_or_init() -> Result<Self> {
        let path = Self::config_path();
        Self::ensure_default_config(&path).await?;
        let config = Self::load(&path).await?;

        if config.sites.topics.is_empty() {
            warn!("No topics configured, the dashboard will stay empty");
        }
        info!(
            "Loaded config: {} topics, broker {}",
            config.sites.topics.len(),
            config.mqtt.broker_url
        );
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| eyre!("Failed to parse config: {}", e))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| eyre!("Failed to serialize config: {}", e))
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_topic() {
        let sites = SitesConfig::default();

        assert_eq!(sites.topics.len(), 19);
        assert_eq!(sites.not_ready.len(), 9);
        for topic in &sites.topics {
            let direct = sites.display_names.contains_key(topic);
            let aliased = sites
                .aliases
                .get(topic)
                .is_some_and(|target| sites.display_names.contains_key(target));
            assert!(direct || aliased, "no display name for {}", topic);
        }
    }

    #[test]
    fn default_config_survives_toml() {
        let config = DashboardConfig::default();
        let text = config.to_toml().unwrap();

        assert!(text.contains("[mqtt]"));
        assert!(text.contains("[sites.display_names]"));
        assert_eq!(DashboardConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config = DashboardConfig::from_toml(
            r#"
            [mqtt]
            broker_url = "mqtt://broker.local:1884"
            auto_reconnect = false

            [sites]
            topics = ["Lab/NETWORK"]
            "#,
        )
        .unwrap();

        assert_eq!(config.mqtt.broker_url, "mqtt://broker.local:1884");
        assert!(!config.mqtt.auto_reconnect);
        assert_eq!(config.mqtt.keep_alive_secs, 60);
        assert_eq!(config.sites.topics, vec!["Lab/NETWORK"]);
        assert_eq!(config.sites.topic_suffix, DEFAULT_TOPIC_SUFFIX);
        assert_eq!(config.ui, UiConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(DashboardConfig::from_toml("[mqtt\nbroker_url = 1").is_err());
        assert!(DashboardConfig::from_toml("[ui]\nrefresh_ms = \"fast\"").is_err());
    }

    #[tokio::test]
    async fn default_file_is_created_once() {
        let dir = std::env::temp_dir().join(format!("sitewatch-config-{}", std::process::id()));
        let path = dir.join("dashboard.toml");
        let _ = tokio::fs::remove_dir_all(&dir).await;

        DashboardConfig::ensure_default_config(&path).await.unwrap();
        let first = DashboardConfig::load(&path).await.unwrap();
        assert_eq!(first.sites, SitesConfig::default());

        tokio::fs::write(&path, "[ui]\nfullscreen = true\n").await.unwrap();
        DashboardConfig::ensure_default_config(&path).await.unwrap();
        let second = DashboardConfig::load(&path).await.unwrap();
        assert!(second.ui.fullscreen);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
