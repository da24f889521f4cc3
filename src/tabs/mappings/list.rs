//! A reorderable list widget. The list only owns its selection, the items live in a buffer the
//! caller passes in every frame, and what the list does to them is reported through a
//! [`ListDelegate`].

use std::hash::Hash;

use bevy_egui::egui::{self, Align, Layout, Ui};

/// Callbacks used by [`ReorderableList`].
pub trait ListDelegate<T> {
    fn draw_header(&mut self, ui: &mut Ui);

    fn draw_element(&mut self, ui: &mut Ui, index: usize, item: &mut T);

    /// Scope for the widgets of an item's row. Items that keep their id keep their widget state
    /// when they move.
    fn item_id(&self, index: usize, _item: &T) -> egui::Id {
        egui::Id::new(index)
    }

    /// Height of the row for an item. Rows are never shorter than one interactive line.
    fn element_height(&mut self, index: usize, item: &T) -> f32;

    /// The add button was pressed.
    fn on_add(&mut self, items: &mut Vec<T>);

    /// The remove button was pressed with `index` selected.
    fn on_remove(&mut self, items: &mut Vec<T>, index: usize) {
        remove_selected(items, index);
    }

    /// The list moved an item. `items` is already in the new order.
    fn on_reorder(&mut self, items: &mut Vec<T>);
}

/// What the list does on remove when the delegate does not override it.
pub fn remove_selected<T>(items: &mut Vec<T>, index: usize) {
    if index < items.len() {
        items.remove(index);
    }
}

/// Move the item at `from` so it ends up at `to`, shifting the items between. Out of range
/// targets move the item to the end.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() {
        return;
    }
    let item = items.remove(from);
    items.insert(to.min(items.len()), item);
}

#[derive(Default, Clone, Debug)]
pub struct ReorderableList {
    selected: Option<usize>,
}

impl ReorderableList {
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index;
    }

    pub fn show<T>(
        &mut self,
        ui: &mut Ui,
        id_source: impl Hash,
        items: &mut Vec<T>,
        delegate: &mut impl ListDelegate<T>,
    ) -> egui::Response {
        if self.selected.is_some_and(|selected| selected >= items.len()) {
            self.selected = None;
        }

        ui.push_id(id_source, |ui| {
            egui::Frame::group(ui.style())
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    delegate.draw_header(ui);
                    ui.separator();

                    if items.is_empty() {
                        ui.weak("List is empty");
                    }

                    let line_height = ui.spacing().interact_size.y;
                    let mut moved = None;
                    for index in 0..items.len() {
                        let height = delegate.element_height(index, &items[index]).max(line_height);
                        let selected = self.selected == Some(index);
                        let last = index + 1 == items.len();

                        ui.push_id(delegate.item_id(index, &items[index]), |ui| {
                            ui.allocate_ui_with_layout(
                                egui::vec2(ui.available_width(), height),
                                Layout::left_to_right(Align::Center),
                                |ui| {
                                    if ui.selectable_label(selected, "=").clicked() {
                                        self.selected = Some(index);
                                    }
                                    if ui.add_enabled(index > 0, egui::Button::new("^").small()).clicked() {
                                        moved = Some((index, index - 1));
                                    }
                                    if ui.add_enabled(!last, egui::Button::new("v").small()).clicked() {
                                        moved = Some((index, index + 1));
                                    }
                                    ui.vertical(|ui| delegate.draw_element(ui, index, &mut items[index]));
                                },
                            );
                        });
                    }

                    if let Some((from, to)) = moved {
                        move_item(items, from, to);
                        if self.selected == Some(from) {
                            self.selected = Some(to);
                        }
                        delegate.on_reorder(items);
                    }

                    ui.separator();
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let remove = ui.add_enabled(self.selected.is_some(), egui::Button::new("-"));
                        if remove.clicked() {
                            if let Some(index) = self.selected.take() {
                                delegate.on_remove(items, index);
                                if !items.is_empty() {
                                    self.selected = Some(index.min(items.len() - 1));
                                }
                            }
                        }
                        if ui.button("+").clicked() {
                            delegate.on_add(items);
                        }
                    });
                })
                .response
        })
        .inner
    }
}
