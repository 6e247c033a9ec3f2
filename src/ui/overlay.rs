use egui::{Context, RichText};

use crate::ui::theme::*;

#[derive(Default)]
pub struct UiActions {
    pub toggle_pause: bool,
    pub restart: bool,
}

pub struct PlaybackStatus<'a> {
    pub scene_name: &'a str,
    pub description: &'a str,
    pub time: f32,
    pub duration: f32,
    pub phi_deg: f32,
    pub theta_deg: f32,
    pub fps: f32,
    pub paused: bool,
}

fn section_header(ui: &mut egui::Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

pub fn draw_playback_panel(ctx: &Context, status: &PlaybackStatus) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("playback_panel")
        .min_width(230.0)
        .default_width(250.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ui.heading(RichText::new("surfanim").strong());
            ui.add_space(4.0);
            ui.label(
                RichText::new(status.scene_name)
                    .color(ACCENT_BLUE)
                    .size(13.0),
            );
            ui.label(
                RichText::new(status.description)
                    .color(TEXT_MUTED)
                    .size(11.0)
                    .italics(),
            );
            ui.add_space(16.0);
            ui.separator();
            ui.add_space(12.0);

            section_header(ui, "PLAYBACK");
            ui.monospace(format!("{:5.2}s / {:.2}s", status.time, status.duration));
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let (text, color) = if status.paused {
                    ("Resume", ACCENT_GREEN)
                } else {
                    ("Pause", ACCENT_ORANGE)
                };
                if ui
                    .add(
                        egui::Button::new(RichText::new(text).color(BG_PURE_BLACK))
                            .fill(color)
                            .min_size(egui::vec2(80.0, 28.0)),
                    )
                    .clicked()
                {
                    actions.toggle_pause = true;
                }
                if ui.button("Restart").clicked() {
                    actions.restart = true;
                }
            });
            ui.add_space(16.0);

            section_header(ui, "CAMERA");
            ui.monospace(format!("phi   {:6.1} deg", status.phi_deg));
            ui.monospace(format!("theta {:6.1} deg", status.theta_deg));
            ui.add_space(16.0);

            section_header(ui, "STATS");
            ui.monospace(format!("{:5.1} fps", status.fps));
            ui.add_space(16.0);
            ui.separator();
            ui.add_space(12.0);

            ui.label(
                RichText::new("left-drag orbit / scroll zoom\nspace pause / R restart")
                    .color(TEXT_MUTED)
                    .size(11.0),
            );
        });

    actions
}
