pub mod config;
pub mod dashboard;
pub mod mqtt;
pub mod telemetry;
pub mod ui;

use crate::config::DashboardConfig;
use crate::dashboard::DashboardState;
use crate::mqtt::{ChannelObserver, SubscriptionManager};
use crate::ui::{DashboardUI, APP_TITLE};
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = DashboardConfig::load_or_init().await?;

    let (observer, events) = ChannelObserver::channel();
    let subscription =
        SubscriptionManager::open(&config.mqtt, config.sites.topics.iter().cloned(), observer)
            .map_err(|e| eyre!("Failed to open MQTT subscription: {}", e))?;

    let state = DashboardState::from_config(&config.sites, &config.mqtt.broker_url);

    info!("Starting dashboard UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title(APP_TITLE)
        .with_inner_size([1280.0, 860.0])
        .with_fullscreen(config.ui.fullscreen);

    let ui_config = config.ui.clone();
    let link_status = subscription.watch_status();
    let outcome = eframe::run_native(
        APP_TITLE,
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(DashboardUI::new(
                cc,
                state,
                events,
                link_status,
                &ui_config,
            )))
        }),
    );

    info!("Dashboard closed, disconnecting from broker");
    subscription.shutdown().await;

    outcome.map_err(|e| eyre!("Dashboard UI failed: {}", e))
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
