//! # Dashboard State
//!
//! The caller side of the subscription. Keeps one [`SiteChannel`] per
//! configured topic, replaces its reading whenever a report arrives and
//! tracks the broker banner. Lives on the UI thread; broker events reach it
//! through the channel filled by [`crate::mqtt::ChannelObserver`].

pub mod site;
pub mod state;

pub use site::{resolve_display_name, SiteChannel, SiteStatus};
pub use state::{BrokerBanner, DashboardState};
