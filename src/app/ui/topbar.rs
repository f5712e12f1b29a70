// src/app/ui/topbar.rs
use eframe::egui as eg;

use crate::app::prefs::POSTER_WIDTH_RANGE;
use crate::app::types::{Collection, FetchRequest, MediaKind};

impl crate::app::FlixApp {
    // ---------- TOP BAR ----------
    pub(crate) fn ui_render_topbar(&mut self, ui: &mut eg::Ui) {
        ui.add_space(4.0);
        ui.horizontal_wrapped(|ui| {
            // Tabs
            for kind in MediaKind::ALL {
                if ui
                    .selectable_label(self.active == kind, kind.label())
                    .clicked()
                {
                    self.switch_kind(kind);
                }
            }

            ui.separator();

            // Lists
            let kind = self.active;
            for collection in Collection::ALL {
                let on = self.ctl(kind).collection() == collection;
                if ui.selectable_label(on, collection.label()).clicked() {
                    self.request_fetch(kind, FetchRequest::Collection(collection));
                }
            }

            ui.separator();

            // Search (Enter or button)
            let resp = ui.add(
                eg::TextEdit::singleline(&mut self.search_query)
                    .hint_text(format!("Search {}…", kind.label().to_lowercase()))
                    .desired_width(180.0),
            );
            let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(eg::Key::Enter));
            if enter || ui.button("Search").clicked() {
                self.submit_search();
            }

            if let Some(req) = self.ctl(kind).in_flight() {
                ui.add(eg::Spinner::new().size(14.0));
                ui.label(eg::RichText::new(format!("Loading {}", req.describe())).weak());
            }
        });

        ui.horizontal_wrapped(|ui| {
            let kind = self.active;

            // Filters
            ui.label("Filter:");
            let mut title = self.ctl(kind).filter().title_query.clone();
            if ui
                .add(
                    eg::TextEdit::singleline(&mut title)
                        .hint_text("Title")
                        .desired_width(140.0),
                )
                .changed()
            {
                self.ctl_mut(kind).set_title_filter(title);
                self.mark_dirty();
            }

            let mut year = self.ctl(kind).filter().year_query.clone();
            if ui
                .add(
                    eg::TextEdit::singleline(&mut year)
                        .hint_text("Year")
                        .desired_width(60.0),
                )
                .changed()
            {
                self.ctl_mut(kind).set_year_filter(year);
                self.mark_dirty();
            }

            let mut min_rating = self.ctl(kind).filter().min_rating.clone();
            if ui
                .add(
                    eg::TextEdit::singleline(&mut min_rating)
                        .hint_text("Min rating")
                        .desired_width(80.0),
                )
                .changed()
            {
                self.ctl_mut(kind).set_rating_filter(min_rating);
                self.mark_dirty();
            }

            if !self.ctl(kind).filter().is_empty() && ui.small_button("Clear filters").clicked() {
                self.ctl_mut(kind).set_filter(Default::default());
                self.mark_dirty();
            }

            ui.separator();
            ui.label(format!(
                "{} of {} shown",
                self.ctl(kind).displayed().len(),
                self.ctl(kind).items().len()
            ));

            ui.separator();

            // Poster size
            ui.label("Poster:");
            if ui
                .add(eg::Slider::new(&mut self.poster_width_ui, POSTER_WIDTH_RANGE).suffix(" px"))
                .changed()
            {
                self.mark_dirty();
            }
        });

        self.ui_render_notices(ui);
        ui.add_space(2.0);
    }
}
