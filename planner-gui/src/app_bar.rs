//! Top application bar
//!
//! Translucent bar that shows a bottom border once the main content has been
//! scrolled past a small threshold. The scrolled flag is the only state.

use eframe::egui;

/// Alpha applied to the panel fill so content behind the bar shows through
const BAR_ALPHA: u8 = 220;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AppBarResponse {
    pub settings_clicked: bool,
    pub snapshot_clicked: bool,
}

#[derive(Debug, Clone)]
pub struct AppBar {
    threshold: f32,
    scrolled: bool,
}

impl AppBar {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            scrolled: false,
        }
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    /// Recomputes the scrolled flag from the content's vertical scroll offset
    pub fn update_scroll(&mut self, offset_y: f32) {
        self.scrolled = offset_y > self.threshold;
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    pub fn show(&self, ctx: &egui::Context, title: &str, status: &str) -> AppBarResponse {
        let mut response = AppBarResponse::default();

        let base = ctx.style().visuals.panel_fill;
        let fill = egui::Color32::from_rgba_unmultiplied(base.r(), base.g(), base.b(), BAR_ALPHA);
        let frame = egui::Frame::none()
            .fill(fill)
            .inner_margin(egui::Margin::symmetric(12.0, 8.0));

        let panel = egui::TopBottomPanel::top("app_bar")
            .frame(frame)
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(title);
                    ui.separator();
                    ui.label(status);

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("⚙").on_hover_text("Settings").clicked() {
                            response.settings_clicked = true;
                        }
                        if ui.button("💾").on_hover_text("Snapshot").clicked() {
                            response.snapshot_clicked = true;
                        }
                    });
                });
            });

        if self.scrolled {
            let rect = panel.response.rect;
            let stroke = ctx.style().visuals.widgets.noninteractive.bg_stroke;
            ctx.layer_painter(egui::LayerId::new(
                egui::Order::Foreground,
                egui::Id::new("app_bar_border"),
            ))
            .hline(rect.x_range(), rect.bottom(), stroke);
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unscrolled() {
        assert!(!AppBar::new(4.0).is_scrolled());
    }

    #[test]
    fn test_border_only_past_threshold() {
        let mut bar = AppBar::new(4.0);

        bar.update_scroll(4.0);
        assert!(!bar.is_scrolled());

        bar.update_scroll(4.5);
        assert!(bar.is_scrolled());

        bar.update_scroll(0.0);
        assert!(!bar.is_scrolled());
    }

    #[test]
    fn test_threshold_change_applies_on_next_scroll() {
        let mut bar = AppBar::new(4.0);
        bar.update_scroll(10.0);
        assert!(bar.is_scrolled());

        bar.set_threshold(20.0);
        bar.update_scroll(10.0);
        assert!(!bar.is_scrolled());
    }
}
