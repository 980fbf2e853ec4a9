//! Site and placeholder cards.

use eframe::egui::{self, RichText, Ui};

use super::common::{create_frame, status_color, UiColors, CARD_WIDTH, MISSING_FIELD};
use crate::dashboard::{SiteChannel, SiteStatus};
use crate::telemetry::{NetworkReading, PoolsTest, ResolutionStatus};

/// How a field value is coloured on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTone {
    Plain,
    Good,
    Bad,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub label: &'static str,
    pub value: String,
    pub tone: FieldTone,
}

impl CardField {
    fn optional(label: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(value) => Self {
                label,
                value: value.to_string(),
                tone: FieldTone::Plain,
            },
            None => Self {
                label,
                value: MISSING_FIELD.to_string(),
                tone: FieldTone::Missing,
            },
        }
    }
}

/// The eight rows of a site card, in display order.
pub fn card_fields(reading: &NetworkReading) -> Vec<CardField> {
    let dns_tone = match reading.dns_resolution_status {
        ResolutionStatus::Pass => FieldTone::Good,
        ResolutionStatus::Fail => FieldTone::Bad,
    };
    let pools_tone = match reading.pools_resolution_test {
        PoolsTest::Pass => FieldTone::Good,
        PoolsTest::Fail => FieldTone::Bad,
        PoolsTest::NotApplicable => FieldTone::Missing,
    };

    vec![
        CardField::optional("Current DNS", reading.current_dns_server.as_deref()),
        CardField::optional("Ping", reading.ping.as_deref()),
        CardField::optional("Download", reading.download.as_deref()),
        CardField::optional("Upload", reading.upload.as_deref()),
        CardField {
            label: "DNS Resolution",
            value: reading.dns_resolution_status.to_string(),
            tone: dns_tone,
        },
        CardField::optional("Primary DNS", reading.primary_dns.as_deref()),
        CardField::optional("Secondary DNS", reading.secondary_dns.as_deref()),
        CardField {
            label: "Pools Test",
            value: reading.pools_resolution_test.to_string(),
            tone: pools_tone,
        },
    ]
}

/// Subtitle under the site name.
pub fn card_subtitle(site: &SiteChannel, status: SiteStatus) -> String {
    match &site.latest {
        Some(reading) => format!("Last updated: {}", reading.timestamp()),
        None => status.label().to_string(),
    }
}

fn field_text(field: &CardField) -> RichText {
    let text = RichText::new(&field.value);
    match field.tone {
        FieldTone::Plain => text,
        FieldTone::Good => text.color(UiColors::ACTIVE).strong(),
        FieldTone::Bad => text.color(UiColors::INACTIVE).strong(),
        FieldTone::Missing => text.color(UiColors::MUTED),
    }
}

pub fn render_site_card(ui: &mut Ui, site: &SiteChannel, status: SiteStatus) {
    create_frame(UiColors::MAIN_BG, UiColors::BORDER).show(ui, |ui| {
        ui.set_width(CARD_WIDTH);
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.colored_label(status_color(status), "\u{2B24}");
                ui.label(RichText::new(&site.display_name).strong().size(16.0));
            });
            ui.label(RichText::new(card_subtitle(site, status)).color(UiColors::MUTED));
            ui.add_space(4.0);

            match &site.latest {
                Some(reading) => {
                    egui::Grid::new(("site_fields", site.topic.as_str()))
                        .num_columns(2)
                        .spacing([12.0, 2.0])
                        .show(ui, |ui| {
                            for field in card_fields(reading) {
                                ui.label(RichText::new(field.label).strong());
                                ui.label(field_text(&field));
                                ui.end_row();
                            }
                        });
                }
                None => {
                    ui.label(RichText::new("Waiting for data...").color(UiColors::MUTED));
                }
            }

            if let Some(reason) = &site.subscribe_error {
                ui.add_space(4.0);
                ui.label(
                    RichText::new(format!("Subscribe failed: {}", reason))
                        .color(UiColors::INACTIVE)
                        .small(),
                );
            }
        });
    });
}

pub fn render_placeholder_card(ui: &mut Ui, site_name: &str) {
    create_frame(UiColors::EXTREME_BG, UiColors::BORDER).show(ui, |ui| {
        ui.set_width(CARD_WIDTH);
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.colored_label(UiColors::MUTED, "\u{1F527}");
                ui.label(RichText::new(site_name).strong().color(UiColors::MUTED));
            });
            ui.label(RichText::new("This site is currently under development.").color(UiColors::MUTED));
            ui.add_space(8.0);
            ui.label(RichText::new("Data will be available soon.").small().weak());
        });
    });
}
