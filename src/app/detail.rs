// src/app/detail.rs
use eframe::egui as eg;

use crate::app::library::MAX_RATING;

enum DetailAction {
    Close,
    ToggleFavorite,
    SetRating(f32),
    SetComment(String),
    SubmitComment,
    Delete,
}

impl crate::app::FlixApp {
    pub(crate) fn ui_render_detail_panel(&mut self, ctx: &eg::Context) {
        let kind = self.active;
        let Some(id) = self.selected else {
            return;
        };
        let Some(item) = self.ctl(kind).item(id).cloned() else {
            // The list was replaced and no longer carries this title.
            self.selected = None;
            return;
        };

        let screen_w: f32 = ctx.input(|i| i.screen_rect().width());
        let max_w: f32 = (screen_w * 0.45).clamp(300.0, 520.0);
        let mut actions: Vec<DetailAction> = Vec::new();

        eg::SidePanel::right("detail_panel")
            .resizable(true)
            .default_width(360.0_f32.min(max_w))
            .min_width(260.0)
            .max_width(max_w)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    ui.heading("Details");
                    ui.with_layout(eg::Layout::right_to_left(eg::Align::Center), |ui| {
                        if ui.button("Close").clicked() {
                            actions.push(DetailAction::Close);
                        }
                    });
                });
                ui.separator();

                eg::ScrollArea::vertical()
                    .id_source(("detail", kind.as_str(), id))
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        // Poster preview
                        let avail_w = ui.available_width().clamp(120.0, 300.0);
                        let poster_size = eg::vec2(avail_w, avail_w * 1.5);
                        let mut uploads_left = 1usize;
                        let tex = self
                            .poster_url(&item.poster_path)
                            .and_then(|url| self.posters.texture(ctx, &url, &mut uploads_left));
                        match tex {
                            Some(tex) => {
                                ui.image((tex.id(), poster_size));
                            }
                            None => {
                                let (rect, _resp) =
                                    ui.allocate_exact_size(poster_size, eg::Sense::hover());
                                crate::app::ui::paint_poster_placeholder(ui.painter(), rect, &item.title);
                            }
                        }

                        ui.add_space(8.0);
                        ui.heading(crate::app::ui::title_line(&item));
                        if !item.release_date.is_empty() {
                            ui.label(eg::RichText::new(&item.release_date).weak());
                        }
                        ui.label(crate::app::ui::facts_line(&item));

                        let ctl = self.ctl(kind);
                        let favorite = ctl.is_favorite(id);
                        let fav_label = if favorite {
                            "Remove from favorites"
                        } else {
                            "Add to favorites"
                        };
                        if ui.button(fav_label).clicked() {
                            actions.push(DetailAction::ToggleFavorite);
                        }

                        ui.add_space(6.0);
                        if item.overview.is_empty() {
                            ui.label(eg::RichText::new("No overview.").weak());
                        } else {
                            ui.add(eg::Label::new(item.overview.as_str()).wrap());
                        }

                        ui.add_space(8.0);
                        ui.separator();
                        ui.label(eg::RichText::new("Your rating").strong());

                        let mut rating = ctl.library().ratings.rating(id);
                        if ui
                            .add(eg::Slider::new(&mut rating, 0.0..=MAX_RATING).step_by(0.5))
                            .changed()
                        {
                            actions.push(DetailAction::SetRating(rating));
                        }
                        match ctl.average_rating(id) {
                            Some(avg) => ui.label(format!("Average rating: {avg:.1} / {MAX_RATING:.0}")),
                            None => ui.label(eg::RichText::new("Not rated yet.").weak()),
                        };

                        ui.add_space(6.0);
                        ui.label(eg::RichText::new("Comment").strong());

                        // Enter submits; Shift+Enter falls through to the editor as a newline.
                        let edit_id = eg::Id::new(("comment_edit", kind.as_str(), id));
                        let enter_submit = ui.memory(|m| m.has_focus(edit_id))
                            && !ui.input(|i| i.modifiers.shift)
                            && ui.input_mut(|i| i.consume_key(eg::Modifiers::NONE, eg::Key::Enter));

                        let mut text = ctl.library().ratings.comment(id).to_string();
                        let resp = ui.add(
                            eg::TextEdit::multiline(&mut text)
                                .id(edit_id)
                                .desired_rows(3)
                                .desired_width(f32::INFINITY)
                                .hint_text("Write a comment (Enter to post, Shift+Enter for a new line)"),
                        );
                        if resp.changed() {
                            actions.push(DetailAction::SetComment(text));
                        }
                        ui.horizontal(|ui| {
                            if enter_submit || ui.button("Post").clicked() {
                                actions.push(DetailAction::SubmitComment);
                            }
                            if ui.button("Delete rating & comments").clicked() {
                                actions.push(DetailAction::Delete);
                            }
                        });

                        let log = ctl.library().comment_log.entries(id);
                        if !log.is_empty() {
                            ui.add_space(6.0);
                            ui.label(eg::RichText::new(format!("Comments ({})", log.len())).strong());
                            for entry in log {
                                ui.add(eg::Label::new(format!("• {entry}")).wrap());
                            }
                        }
                    });
            });

        for action in actions {
            match action {
                DetailAction::Close => self.selected = None,
                DetailAction::ToggleFavorite => self.ctl_mut(kind).toggle_favorite(id),
                DetailAction::SetRating(r) => self.ctl_mut(kind).set_rating(id, r),
                DetailAction::SetComment(text) => self.ctl_mut(kind).set_comment(id, text),
                DetailAction::SubmitComment => self.ctl_mut(kind).submit_comment(id),
                DetailAction::Delete => self.ctl_mut(kind).delete_rating_and_comment(id),
            }
        }
    }
}
