// src/app/ui/grid.rs
use eframe::egui as eg;

use crate::app::types::CatalogItem;

pub const H_SPACING: f32 = 4.0;
pub const V_SPACING: f32 = 10.0;
const TEXT_H: f32 = 64.0;
const STRIP_POSTER_W: f32 = 72.0;

fn draw_corner_badge(p: &eframe::egui::Painter, rect: eg::Rect, label: &str) {
    if label.is_empty() {
        return;
    }
    let pad = 6.0;
    let r = eg::Rect::from_min_size(
        eg::pos2(rect.left() + pad, rect.top() + pad),
        eg::vec2(40.0, 20.0),
    );

    let visuals = p.ctx().style().visuals.clone();
    let bg = visuals.extreme_bg_color.gamma_multiply(0.92);
    let fg = visuals.strong_text_color();

    p.rect_filled(r, eg::Rounding::same(6.0), bg);
    p.rect_stroke(r, eg::Rounding::same(6.0), eg::Stroke::new(1.0, fg));
    p.text(
        r.center(),
        eg::Align2::CENTER_CENTER,
        label,
        eg::FontId::monospace(12.0),
        fg,
    );
}

/// What a card needs to paint itself, copied out of the controller.
struct Card {
    id: u64,
    title: String,
    title_line: String,
    facts: String,
    poster_url: Option<String>,
    favorite: bool,
}

enum CardAction {
    Select(u64),
    ToggleFavorite(u64),
}

impl crate::app::FlixApp {
    fn card_for(&self, item: &CatalogItem) -> Card {
        Card {
            id: item.id,
            title: item.title.clone(),
            title_line: super::title_line(item),
            facts: super::facts_line(item),
            poster_url: self.poster_url(&item.poster_path),
            favorite: self.ctl(self.active).is_favorite(item.id),
        }
    }

    fn apply_card_actions(&mut self, actions: Vec<CardAction>) {
        let kind = self.active;
        for action in actions {
            match action {
                CardAction::Select(id) => {
                    self.selected = if self.selected == Some(id) { None } else { Some(id) };
                }
                CardAction::ToggleFavorite(id) => self.ctl_mut(kind).toggle_favorite(id),
            }
        }
    }

    fn ui_render_card(
        &mut self,
        ui: &mut eg::Ui,
        ctx: &eg::Context,
        card: &Card,
        card_w: f32,
        card_h: f32,
        uploads_left: &mut usize,
    ) -> Option<CardAction> {
        let mut action = None;
        ui.allocate_ui_with_layout(
            eg::vec2(card_w, card_h),
            eg::Layout::top_down(eg::Align::Min),
            |ui| {
                ui.set_min_size(eg::vec2(card_w, card_h));
                ui.set_max_width(card_w);
                let card_rect = ui.max_rect();

                let (poster_rect, poster_resp) =
                    ui.allocate_exact_size(eg::vec2(card_w, card_w * 1.5), eg::Sense::click());
                if poster_resp.clicked() {
                    action = Some(CardAction::Select(card.id));
                }

                let tex = card
                    .poster_url
                    .as_deref()
                    .and_then(|url| self.posters.texture(ctx, url, uploads_left));
                match tex {
                    Some(tex) => {
                        ui.painter().image(
                            tex.id(),
                            poster_rect,
                            eg::Rect::from_min_max(eg::pos2(0.0, 0.0), eg::pos2(1.0, 1.0)),
                            eg::Color32::WHITE,
                        );
                    }
                    None => super::paint_poster_placeholder(ui.painter(), poster_rect, &card.title),
                }
                if card.favorite {
                    draw_corner_badge(ui.painter(), poster_rect, "FAV");
                }

                ui.add(eg::Label::new(eg::RichText::new(&card.title_line).strong()).truncate());
                ui.label(eg::RichText::new(&card.facts).weak().size(12.0));
                let fav_label = if card.favorite { "Unfavorite" } else { "Favorite" };
                if ui.small_button(fav_label).clicked() {
                    action = Some(CardAction::ToggleFavorite(card.id));
                }

                // Selection stroke
                if self.selected == Some(card.id) {
                    ui.painter().rect_stroke(
                        card_rect.shrink(1.0),
                        6.0,
                        eg::Stroke::new(2.0, eg::Color32::YELLOW),
                    );
                }
            },
        );
        action
    }

    pub(crate) fn ui_render_grid(&mut self, ui: &mut eg::Ui, ctx: &eg::Context) {
        let kind = self.active;
        let total = self.ctl(kind).displayed().len();
        if total == 0 {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                if self.ctl(kind).is_loading() {
                    ui.add(eg::Spinner::new().size(18.0));
                } else if self.ctl(kind).items().is_empty() {
                    ui.label("Nothing loaded yet.");
                } else {
                    ui.label("No titles match the filters.");
                }
            });
            return;
        }

        let card_w: f32 = self.poster_width_ui;
        let card_h: f32 = card_w * 1.5 + TEXT_H;
        let avail = ui.available_width();
        let cols = ((avail + H_SPACING) / (card_w + H_SPACING))
            .floor()
            .max(1.0) as usize;
        let rows = total.div_ceil(cols);

        let mut uploads_left = super::super::MAX_UPLOADS_PER_FRAME;
        let mut actions = Vec::new();

        ui.spacing_mut().item_spacing = eg::vec2(H_SPACING, V_SPACING);
        eg::ScrollArea::vertical()
            .id_source(("grid", kind.as_str()))
            .auto_shrink([false; 2])
            .show_rows(ui, card_h, rows, |ui, row_range| {
                for row in row_range {
                    let start = row * cols;
                    let end = (start + cols).min(total);
                    let cards: Vec<Card> = self.ctl(kind).displayed()[start..end]
                        .iter()
                        .map(|item| self.card_for(item))
                        .collect();
                    ui.horizontal(|ui| {
                        for card in &cards {
                            if let Some(a) =
                                self.ui_render_card(ui, ctx, card, card_w, card_h, &mut uploads_left)
                            {
                                actions.push(a);
                            }
                        }
                    });
                }
            });

        self.apply_card_actions(actions);
    }

    /// Favorites among the displayed titles, as a thin scrolling strip.
    pub(crate) fn ui_render_favorites_strip(&mut self, ui: &mut eg::Ui, ctx: &eg::Context) {
        let kind = self.active;
        let fav_total = self.ctl(kind).library().favorites.len();
        let cards: Vec<Card> = self
            .ctl(kind)
            .favorites_view()
            .into_iter()
            .map(|item| self.card_for(item))
            .collect();

        let mut actions = Vec::new();
        let mut clear = false;
        ui.horizontal(|ui| {
            ui.label(eg::RichText::new(format!("Favorites ({fav_total})")).strong());
            if fav_total > 0 && ui.small_button("Clear").clicked() {
                clear = true;
            }
        });

        if cards.is_empty() {
            let hint = if fav_total == 0 {
                "No favorites yet."
            } else {
                "None of your favorites are in this list."
            };
            ui.label(eg::RichText::new(hint).weak());
        } else {
            let mut uploads_left = super::super::MAX_UPLOADS_PER_FRAME;
            eg::ScrollArea::horizontal()
                .id_source(("favorites", kind.as_str()))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        for card in &cards {
                            let size = eg::vec2(STRIP_POSTER_W, STRIP_POSTER_W * 1.5);
                            let (rect, resp) = ui.allocate_exact_size(size, eg::Sense::click());
                            let tex = card
                                .poster_url
                                .as_deref()
                                .and_then(|url| self.posters.texture(ctx, url, &mut uploads_left));
                            match tex {
                                Some(tex) => {
                                    ui.painter().image(
                                        tex.id(),
                                        rect,
                                        eg::Rect::from_min_max(eg::pos2(0.0, 0.0), eg::pos2(1.0, 1.0)),
                                        eg::Color32::WHITE,
                                    );
                                }
                                None => super::paint_poster_placeholder(ui.painter(), rect, &card.title),
                            }
                            if resp.on_hover_text(card.title_line.as_str()).clicked() {
                                actions.push(CardAction::Select(card.id));
                            }
                        }
                    });
                });
        }

        if clear {
            self.ctl_mut(kind).clear_favorites();
        }
        self.apply_card_actions(actions);
    }
}
