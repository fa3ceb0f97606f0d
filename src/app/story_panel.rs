//! Story side panel: one card per section, only the active one expanded.

use chrono::NaiveDate;
use eframe::egui;
use egui::RichText;

use crate::data::story::StorySection;

use super::view::ViewState;

/// Draw the sections. Returns the start date of a section whose "jump" link
/// was clicked.
pub(crate) fn show_story_panel(
    ui: &mut egui::Ui,
    headline: Option<&str>,
    sections: &[StorySection],
    view: &mut ViewState,
) -> Option<NaiveDate> {
    let scroll_to = view.take_scroll_request();
    let mut jump = None;

    egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
        if let Some(h) = headline {
            ui.heading(h);
            ui.separator();
        }
        for section in sections {
            let active = view.is_visible(&section.id);
            let frame = egui::Frame::group(ui.style()).inner_margin(8.0);
            let resp = frame
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        let date = section.starts.format("%b %Y").to_string();
                        if active {
                            ui.label(RichText::new(date).small().strong());
                        } else {
                            ui.label(RichText::new(date).small().weak());
                        }
                        if ui
                            .small_button(egui_phosphor::regular::ARROW_SQUARE_OUT)
                            .on_hover_text("Jump here")
                            .clicked()
                        {
                            jump = Some(section.starts);
                        }
                    });
                    if active {
                        ui.label(RichText::new(&section.title).heading().strong());
                        if !section.body.is_empty() {
                            ui.label(&section.body);
                        }
                    } else {
                        ui.label(RichText::new(&section.title).weak());
                    }
                })
                .response;
            if scroll_to.as_ref() == Some(&section.id) {
                resp.scroll_to_me(Some(egui::Align::TOP));
            }
            ui.add_space(6.0);
        }
    });
    jump
}
