//! # Dashboard User Interface
//!
//! eframe/egui window showing the broker banner, one card per active site
//! and a placeholder card for every site that has no data source yet.
//!
//! The UI owns the [`DashboardState`] and watches the link state of the
//! subscription, which stays with `main` so it can be shut down cleanly once
//! the window closes. Broker events arrive on an unbounded channel that is
//! drained at the start of every frame, so the broker task never blocks on
//! rendering.
//!
//! ## Layout
//! - **Top Panel**: title and broker banner
//! - **Central Panel**: "Active Sites" grid followed by "Under Development Sites"
//! - **Bottom Panel**: reporting count and link state

pub mod common;
pub mod site_card;

use eframe::egui::{self, RichText, ScrollArea, Ui};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::config::UiConfig;
use crate::dashboard::DashboardState;
use crate::mqtt::{ConnectionState, LinkEvent};

use self::common::{banner_color, create_frame, UiColors};
use self::site_card::{render_placeholder_card, render_site_card};

pub const APP_TITLE: &str = "MQTT Network Dashboard";

pub struct DashboardUI {
    state: DashboardState,

    /// Broker events forwarded by the channel observer
    events: mpsc::UnboundedReceiver<LinkEvent>,

    link_status: watch::Receiver<ConnectionState>,

    refresh: Duration,
}

impl DashboardUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        state: DashboardState,
        events: mpsc::UnboundedReceiver<LinkEvent>,
        link_status: watch::Receiver<ConnectionState>,
        config: &UiConfig,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        info!(
            "Dashboard UI ready with {} sites and {} placeholders",
            state.site_count(),
            state.not_ready_sites().len()
        );
        Self {
            state,
            events,
            link_status,
            refresh: Duration::from_millis(config.refresh_ms.max(16)),
        }
    }

    fn banner(&self, ui: &mut Ui) {
        let banner = self.state.banner();
        create_frame(UiColors::INNER_BG, banner_color(banner)).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                RichText::new(banner.title())
                    .strong()
                    .color(banner_color(banner)),
            );
            ui.label(self.state.banner_description());
            if let Some(cause) = self.state.last_error() {
                ui.label(RichText::new(cause).small().color(UiColors::MUTED));
            }
        });
    }

    fn active_sites(&self, ui: &mut Ui) {
        ui.heading("Active Sites");
        ui.add_space(4.0);
        ui.horizontal_wrapped(|ui| {
            for site in self.state.sorted_sites() {
                render_site_card(ui, site, self.state.effective_status(site));
            }
        });
    }

    fn under_development(&self, ui: &mut Ui) {
        ui.heading("Under Development Sites");
        ui.add_space(4.0);
        ui.horizontal_wrapped(|ui| {
            for name in self.state.not_ready_sites() {
                render_placeholder_card(ui, name);
            }
        });
    }
}

impl eframe::App for DashboardUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.drain(&mut self.events) > 0 {
            debug!("Dashboard state updated");
        }
        ctx.request_repaint_after(self.refresh);

        egui::TopBottomPanel::top("top_panel")
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.heading(RichText::new(APP_TITLE).size(26.0).strong());
                ui.add_space(4.0);
                self.banner(ui);
            });

        egui::TopBottomPanel::bottom("bottom_panel")
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(format!(
                        "{}/{} sites reporting",
                        self.state.reporting_count(),
                        self.state.site_count()
                    ));
                    ui.separator();
                    ui.label(format!(
                        "Broker {} ({:?})",
                        self.state.broker_url(),
                        *self.link_status.borrow()
                    ));
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.active_sites(ui);
                    ui.add_space(16.0);
                    self.under_development(ui);
                });
        });
    }
}
