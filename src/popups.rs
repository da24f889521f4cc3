//! Message popups, used to report failed edits.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::{egui, EguiContext};

/// Messages waiting to be acknowledged, shown one window each.
#[derive(Default, Resource)]
pub struct Popups {
    popups: Vec<Popup>,
}

impl Popups {
    /// Show every message for one frame and forget the ones the user dismissed.
    pub fn display_popups(&mut self, ctx: &egui::Context) {
        let mut i = 0;
        while i < self.popups.len() {
            if self.popups[i].display(i, ctx) {
                self.popups.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    pub fn add(&mut self, popup: Popup) {
        self.popups.push(popup);
    }

    pub fn len(&self) -> usize {
        self.popups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.popups.is_empty()
    }
}

/// A single message with an ok button.
pub struct Popup {
    message: String,
}

impl Popup {
    pub fn new(msg: impl Into<String>) -> Self {
        Popup {
            message: msg.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Draw the message in its own window, keyed by `id`. Any click outside the window, any key
    /// press or the ok button dismisses it, and then this returns true.
    pub fn display(&self, id: usize, ctx: &egui::Context) -> bool {
        let Some(win) = egui::Window::new("")
            .id(egui::Id::new("mapview_popup").with(id))
            .title_bar(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    ui.label(&self.message);
                    ui.vertical_centered(|ui| ui.button("ok").clicked()).inner
                })
                .inner
            })
        else {
            return true;
        };
        win.response.clicked_elsewhere()
            || ctx.input(|inp| !inp.keys_down.is_empty())
            || win.inner.unwrap_or(false)
    }
}

pub(crate) fn display_popups(
    mut contexts: Query<&mut EguiContext, With<PrimaryWindow>>,
    mut popups: ResMut<Popups>,
) {
    if popups.is_empty() {
        return;
    }
    if let Ok(mut ctx) = contexts.get_single_mut() {
        popups.display_popups(ctx.get_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(popups: &mut Popups, ctx: &egui::Context, input: egui::RawInput) {
        let _ = ctx.run(input, |ctx| popups.display_popups(ctx));
    }

    #[test]
    fn messages_stay_until_dismissed() {
        let ctx = egui::Context::default();
        let mut popups = Popups::default();
        popups.add(Popup::new("key collision"));
        popups.add(Popup::new("no default"));

        frame(&mut popups, &ctx, egui::RawInput::default());
        frame(&mut popups, &ctx, egui::RawInput::default());
        assert_eq!(popups.len(), 2);
        assert_eq!(popups.popups[0].message(), "key collision");
    }

    #[test]
    fn a_key_press_dismisses_every_message() {
        let ctx = egui::Context::default();
        let mut popups = Popups::default();
        popups.add(Popup::new("key collision"));
        frame(&mut popups, &ctx, egui::RawInput::default());

        let input = egui::RawInput {
            events: vec![egui::Event::Key {
                key: egui::Key::Escape,
                pressed: true,
                repeat: false,
                modifiers: egui::Modifiers::NONE,
            }],
            ..Default::default()
        };
        frame(&mut popups, &ctx, input);
        assert!(popups.is_empty());
    }
}
