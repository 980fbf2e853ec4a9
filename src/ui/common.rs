//! # UI Common Components and Utilities
//!
//! Shared colours and frame helpers for the dashboard window.
//!
//! ### Theme
//! The [`UiColors`] palette is the dark theme used throughout the dashboard.
//! Status colours follow the usual traffic-light reading: green for online or
//! passing checks, yellow while connecting, grey without data and red for
//! errors or failing checks.

use eframe::egui::{Color32, Frame, Stroke};

use crate::dashboard::{BrokerBanner, SiteStatus};

/// Placeholder for a field the latest report did not contain.
pub const MISSING_FIELD: &str = "N/A";

/// Width of a single site card in points.
pub const CARD_WIDTH: f32 = 260.0;

/// Centralized color palette for the dark theme.
///
/// Background colours go from darkest to lightest:
/// EXTREME_BG → INNER_BG → MAIN_BG.
pub struct UiColors;

impl UiColors {
    /// Primary background color for main content areas (RGB: 30, 30, 30)
    pub const MAIN_BG: Color32 = Color32::from_rgb(30, 30, 30);

    /// Secondary background color for nested components (RGB: 25, 25, 25)
    pub const INNER_BG: Color32 = Color32::from_rgb(25, 25, 25);

    /// Deepest background color, used for placeholder cards (RGB: 20, 20, 20)
    pub const EXTREME_BG: Color32 = Color32::from_rgb(20, 20, 20);

    /// Border color for component separation (RGB: 60, 60, 60)
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Online / PASS (RGB: 50, 200, 20)
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Error / FAIL (RGB: 200, 50, 20)
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);

    /// Connecting (RGB: 220, 180, 30)
    pub const PENDING: Color32 = Color32::from_rgb(220, 180, 30);

    /// No data yet (RGB: 120, 120, 120)
    pub const MUTED: Color32 = Color32::from_rgb(120, 120, 120);
}

pub fn status_color(status: SiteStatus) -> Color32 {
    match status {
        SiteStatus::Connected => UiColors::ACTIVE,
        SiteStatus::Loading => UiColors::PENDING,
        SiteStatus::NoData => UiColors::MUTED,
        SiteStatus::Error => UiColors::INACTIVE,
    }
}

pub fn banner_color(banner: BrokerBanner) -> Color32 {
    match banner {
        BrokerBanner::Connected => UiColors::ACTIVE,
        BrokerBanner::Connecting => UiColors::PENDING,
        BrokerBanner::Disconnected => UiColors::MUTED,
        BrokerBanner::Error => UiColors::INACTIVE,
    }
}

/// Standard bordered frame used for cards and the banner.
pub fn create_frame(bg_color: Color32, border_color: Color32) -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, border_color))
        .fill(bg_color)
        .inner_margin(8)
        .outer_margin(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_distinct_color() {
        let colors = [
            status_color(SiteStatus::Connected),
            status_color(SiteStatus::Loading),
            status_color(SiteStatus::NoData),
            status_color(SiteStatus::Error),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn error_banner_is_red() {
        assert_eq!(banner_color(BrokerBanner::Error), UiColors::INACTIVE);
        assert_eq!(banner_color(BrokerBanner::Connected), UiColors::ACTIVE);
    }
}
