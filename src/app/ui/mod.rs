// src/app/ui/mod.rs
pub mod grid;
pub mod topbar;

use eframe::egui as eg;

use crate::app::types::CatalogItem;

/// "Title (YYYY)" when the date carries a year.
pub(crate) fn title_line(item: &CatalogItem) -> String {
    match item.year() {
        Some(y) => format!("{} ({})", item.title, y),
        None => item.title.clone(),
    }
}

/// Vendor score plus runtime (movies) or season count (shows), if known.
pub(crate) fn facts_line(item: &CatalogItem) -> String {
    let mut line = format!("{:.1}/10", item.rating_average);
    if let Some(m) = item.runtime_minutes {
        line.push_str(&format!("  •  {m} min"));
    }
    if let Some(s) = item.season_count {
        let noun = if s == 1 { "season" } else { "seasons" };
        line.push_str(&format!("  •  {s} {noun}"));
    }
    line
}

pub(crate) fn paint_poster_placeholder(p: &eg::Painter, rect: eg::Rect, title: &str) {
    p.rect_filled(rect, 6.0, eg::Color32::from_gray(40));
    let initial: String = title.chars().take(1).collect();
    p.text(
        rect.center(),
        eg::Align2::CENTER_CENTER,
        initial,
        eg::FontId::proportional(rect.width() * 0.3),
        eg::Color32::from_gray(110),
    );
}

impl crate::app::FlixApp {
    pub(crate) fn ui_render_notices(&mut self, ui: &mut eg::Ui) {
        let kind = self.active;
        if self.ctl(kind).notices().is_empty() {
            return;
        }
        let mut dismiss = false;
        ui.horizontal_wrapped(|ui| {
            for msg in self.ctl(kind).notices() {
                ui.label(eg::RichText::new(msg).color(ui.visuals().warn_fg_color));
            }
            dismiss = ui.small_button("Dismiss").clicked();
        });
        if dismiss {
            self.ctl_mut(kind).dismiss_notices();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CatalogItem {
        CatalogItem {
            id: 1,
            title: "Dark".into(),
            poster_path: String::new(),
            overview: String::new(),
            release_date: "2017-12-01".into(),
            rating_average: 8.4,
            runtime_minutes: None,
            season_count: Some(1),
        }
    }

    #[test]
    fn card_lines() {
        let item = sample();
        assert_eq!(title_line(&item), "Dark (2017)");
        assert_eq!(facts_line(&item), "8.4/10  •  1 season");

        let undated = CatalogItem {
            release_date: String::new(),
            season_count: None,
            runtime_minutes: Some(117),
            ..item
        };
        assert_eq!(title_line(&undated), "Dark");
        assert_eq!(facts_line(&undated), "8.4/10  •  117 min");
    }
}
