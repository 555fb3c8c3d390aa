use eframe::egui;
use planner_core::{
    export_to_json, import_from_json, EquipmentInfoToEdit, EquipmentRequirement, InventoryForm,
    PieceInfoToEdit, PieceRequirement, RequirementMode, RequirementStore, Settings,
};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::app_bar::AppBar;

/// Form state for adding or editing a piece requirement
#[derive(Debug, Clone, PartialEq)]
struct PieceForm {
    piece_id: String,
    count: u32,
}

impl Default for PieceForm {
    fn default() -> Self {
        Self {
            piece_id: String::new(),
            count: 1,
        }
    }
}

impl PieceForm {
    fn from_requirement(req: &PieceRequirement) -> Self {
        Self {
            piece_id: req.piece_id.clone(),
            count: req.count,
        }
    }

    fn to_requirement(&self) -> Option<PieceRequirement> {
        let piece_id = self.piece_id.trim();
        if piece_id.is_empty() {
            return None;
        }
        Some(PieceRequirement::new(piece_id, self.count))
    }
}

/// Form state for adding or editing an equipment requirement
#[derive(Debug, Clone, PartialEq)]
struct EquipmentForm {
    current_equipment_id: String,
    target_equipment_id: String,
    count: u32,
    nickname: String,
}

impl Default for EquipmentForm {
    fn default() -> Self {
        Self {
            current_equipment_id: String::new(),
            target_equipment_id: String::new(),
            count: 1,
            nickname: String::new(),
        }
    }
}

impl EquipmentForm {
    fn from_requirement(req: &EquipmentRequirement) -> Self {
        Self {
            current_equipment_id: req.current_equipment_id.clone(),
            target_equipment_id: req.target_equipment_id.clone(),
            count: req.count,
            nickname: req.nickname.clone(),
        }
    }

    fn to_requirement(&self) -> Option<EquipmentRequirement> {
        let current = self.current_equipment_id.trim();
        let target = self.target_equipment_id.trim();
        if current.is_empty() || target.is_empty() {
            return None;
        }
        Some(EquipmentRequirement::new(current, target, self.count).with_nickname(self.nickname.trim()))
    }
}

pub struct PlannerApp {
    store: RequirementStore,
    settings: Settings,
    settings_path: Option<PathBuf>,
    app_bar: AppBar,

    // Requirement forms; `editing` holds the list index being edited
    piece_form: PieceForm,
    equipment_form: EquipmentForm,
    editing: Option<usize>,

    // Inventory text, keyed by piece id
    inventory_form: InventoryForm,
    new_inventory_piece: String,

    // Settings window
    show_settings: bool,
    settings_form: Settings,

    // Snapshot window
    show_snapshot: bool,
    snapshot_path: String,

    // Applied store changes since the last export
    changes: Rc<Cell<u64>>,

    // Messages
    message: Option<(String, bool)>, // (message, is_error)

    // Pending operations (to avoid borrow checker issues)
    pending_delete: Option<usize>,
    pending_edit: Option<usize>,
}

impl PlannerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = Settings::settings_path()
            .map_err(|e| log::warn!("Settings path unavailable: {}", e))
            .ok();
        let settings = Settings::load_or_default();
        Self::with_settings(settings, settings_path)
    }

    fn with_settings(settings: Settings, settings_path: Option<PathBuf>) -> Self {
        let mut store = settings.new_store();
        let changes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&changes);
        store.subscribe(move |_| counter.set(counter.get() + 1));

        let mut app = Self {
            store,
            app_bar: AppBar::new(settings.scroll_threshold),
            settings_form: settings.clone(),
            settings,
            settings_path,
            piece_form: PieceForm::default(),
            equipment_form: EquipmentForm::default(),
            editing: None,
            inventory_form: InventoryForm::new(),
            new_inventory_piece: String::new(),
            show_settings: false,
            show_snapshot: false,
            snapshot_path: String::from("planner.json"),
            changes,
            message: None,
            pending_delete: None,
            pending_edit: None,
        };
        app.refresh_inventory_form();
        app
    }

    /// Rebuilds the inventory text fields from the store: every required
    /// piece plus every piece already stocked
    fn refresh_inventory_form(&mut self) {
        let mut form = InventoryForm::new();
        for piece_id in self.store.get_all_required_piece_ids() {
            let count = self.store.in_stock_count(&piece_id);
            form.insert(piece_id, count.to_string());
        }
        for (piece_id, inventory) in self.store.pieces_inventory() {
            form.insert(piece_id.clone(), inventory.in_stock_count.to_string());
        }
        self.inventory_form = form;
    }

    fn clear_forms(&mut self) {
        self.piece_form = PieceForm::default();
        self.equipment_form = EquipmentForm::default();
        self.editing = None;
    }

    fn set_result(&mut self, applied: bool, message: &str) {
        self.message = if applied {
            Some((message.to_string(), false))
        } else {
            Some(("Entry no longer exists".to_string(), true))
        };
    }

    fn status_line(&self) -> String {
        let unsaved = self.changes.get();
        let mut status = format!(
            "{} · {} entries",
            self.store.requirement_mode(),
            self.store.active_requirement_count()
        );
        if unsaved > 0 {
            status.push_str(&format!(" · {} unsaved change(s)", unsaved));
        }
        status
    }

    // =========================================================================
    // Store actions
    // =========================================================================

    fn submit_piece_form(&mut self) {
        let Some(requirement) = self.piece_form.to_requirement() else {
            self.message = Some(("Piece ID is required".to_string(), true));
            return;
        };

        match self.editing {
            Some(index) => {
                let applied = self
                    .store
                    .update_piece_requirement(&PieceInfoToEdit::new(index, requirement));
                self.set_result(applied, "Piece requirement updated");
            }
            None => {
                self.store.add_piece_requirement(requirement);
                self.set_result(true, "Piece requirement added");
            }
        }
        self.clear_forms();
        self.refresh_inventory_form();
    }

    fn submit_equipment_form(&mut self) {
        let Some(requirement) = self.equipment_form.to_requirement() else {
            self.message = Some(("Current and target equipment are required".to_string(), true));
            return;
        };

        match self.editing {
            Some(index) => {
                let applied = self
                    .store
                    .update_equipment_requirement(&EquipmentInfoToEdit::new(index, requirement));
                self.set_result(applied, "Equipment requirement updated");
            }
            None => {
                self.store.add_equipment_requirement(requirement);
                self.set_result(true, "Equipment requirement added");
            }
        }
        self.clear_forms();
    }

    fn start_edit(&mut self, index: usize) {
        match self.store.requirement_mode() {
            RequirementMode::ByPiece => {
                if let Some(req) = self.store.requirement_by_pieces().get(index) {
                    self.piece_form = PieceForm::from_requirement(req);
                    self.editing = Some(index);
                }
            }
            RequirementMode::ByEquipment => {
                if let Some(req) = self.store.requirement_by_equipments().get(index) {
                    self.equipment_form = EquipmentForm::from_requirement(req);
                    self.editing = Some(index);
                }
            }
        }
    }

    fn delete_entry(&mut self, index: usize) {
        let applied = match self.store.requirement_mode() {
            RequirementMode::ByPiece => {
                let edit = PieceInfoToEdit {
                    index_in_store_array: index,
                    piece_id: String::new(),
                    count: 0,
                };
                self.store.delete_piece_requirement(&edit)
            }
            RequirementMode::ByEquipment => {
                let edit = EquipmentInfoToEdit {
                    index_in_store_array: index,
                    current_equipment_id: String::new(),
                    target_equipment_id: String::new(),
                    count: 0,
                    nickname: String::new(),
                };
                self.store.delete_equipment_requirement(&edit)
            }
        };
        self.set_result(applied, "Requirement deleted");
        if applied {
            match self.editing {
                Some(editing) if editing == index => self.clear_forms(),
                // Later entries shift left by one
                Some(editing) if editing > index => self.editing = Some(editing - 1),
                _ => {}
            }
        }
        self.refresh_inventory_form();
    }

    fn cancel_edit(&mut self) {
        if self.editing.is_some() {
            self.clear_forms();
        }
    }

    fn switch_mode(&mut self, mode: RequirementMode) {
        if self.store.update_requirement_mode(Some(mode)) {
            self.clear_forms();
        }
    }

    fn apply_inventory(&mut self) {
        let applied = self.store.update_inventory(&self.inventory_form);
        self.set_result(applied, "Inventory updated");
        self.refresh_inventory_form();
    }

    fn export_snapshot(&mut self) {
        match export_to_json(&self.store, &self.snapshot_path) {
            Ok(()) => {
                self.changes.set(0);
                self.message = Some((format!("Exported to {}", self.snapshot_path), false));
            }
            Err(e) => self.message = Some((format!("Export failed: {}", e), true)),
        }
    }

    fn import_snapshot(&mut self) {
        let result = import_from_json(&self.snapshot_path)
            .and_then(|snapshot| self.store.apply_snapshot(snapshot));
        match result {
            Ok(()) => {
                self.changes.set(0);
                self.clear_forms();
                self.refresh_inventory_form();
                self.message = Some((format!("Imported {}", self.snapshot_path), false));
            }
            Err(e) => self.message = Some((format!("Import failed: {}", e), true)),
        }
    }

    fn save_settings(&mut self) {
        self.settings = self.settings_form.clone();
        self.app_bar.set_threshold(self.settings.scroll_threshold);

        let Some(path) = self.settings_path.clone() else {
            self.message = Some(("No settings location available".to_string(), true));
            return;
        };
        match self.settings.save_to(&path) {
            Ok(()) => self.message = Some(("Settings saved".to_string(), false)),
            Err(e) => self.message = Some((format!("Error saving settings: {}", e), true)),
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    fn show_mode_selector(&mut self, ui: &mut egui::Ui) {
        let mut mode = self.store.requirement_mode();
        ui.horizontal(|ui| {
            ui.label("Mode:");
            ui.selectable_value(&mut mode, RequirementMode::ByEquipment, "By equipment");
            ui.selectable_value(&mut mode, RequirementMode::ByPiece, "By piece");
        });
        if mode != self.store.requirement_mode() {
            self.switch_mode(mode);
        }
    }

    fn show_piece_list(&mut self, ui: &mut egui::Ui) {
        let pieces = self.store.requirement_by_pieces();
        if pieces.is_empty() {
            ui.weak("No piece requirements yet.");
            return;
        }

        egui::Grid::new("piece_list").striped(true).show(ui, |ui| {
            ui.strong("#");
            ui.strong("Piece");
            ui.strong("Count");
            ui.end_row();

            for (idx, req) in pieces.iter().enumerate() {
                ui.label(idx.to_string());
                ui.label(&req.piece_id);
                ui.label(req.count.to_string());
                if ui.small_button("✏").on_hover_text("Edit").clicked() {
                    self.pending_edit = Some(idx);
                }
                if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                    self.pending_delete = Some(idx);
                }
                ui.end_row();
            }
        });
    }

    fn show_equipment_list(&mut self, ui: &mut egui::Ui) {
        let equipments = self.store.requirement_by_equipments();
        if equipments.is_empty() {
            ui.weak("No equipment requirements yet.");
            return;
        }

        egui::Grid::new("equipment_list").striped(true).show(ui, |ui| {
            ui.strong("#");
            ui.strong("Nickname");
            ui.strong("Current");
            ui.strong("Target");
            ui.strong("Count");
            ui.end_row();

            for (idx, req) in equipments.iter().enumerate() {
                ui.label(idx.to_string());
                ui.label(&req.nickname);
                ui.label(&req.current_equipment_id);
                ui.label(&req.target_equipment_id);
                ui.label(req.count.to_string());
                if ui.small_button("✏").on_hover_text("Edit").clicked() {
                    self.pending_edit = Some(idx);
                }
                if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                    self.pending_delete = Some(idx);
                }
                ui.end_row();
            }
        });
    }

    fn show_piece_form(&mut self, ui: &mut egui::Ui) {
        let heading = if self.editing.is_some() {
            "Edit piece requirement"
        } else {
            "Add piece requirement"
        };
        ui.strong(heading);

        let mut submit = false;
        let mut cancel = false;
        ui.horizontal(|ui| {
            ui.label("Piece ID:");
            ui.text_edit_singleline(&mut self.piece_form.piece_id);
            ui.label("Count:");
            ui.add(egui::DragValue::new(&mut self.piece_form.count).range(1..=99_999));
            submit = ui.button("Save").clicked();
            cancel = self.editing.is_some() && ui.button("Cancel").clicked();
        });
        if submit {
            self.submit_piece_form();
        } else if cancel {
            self.cancel_edit();
        }
    }

    fn show_equipment_form(&mut self, ui: &mut egui::Ui) {
        let heading = if self.editing.is_some() {
            "Edit equipment requirement"
        } else {
            "Add equipment requirement"
        };
        ui.strong(heading);

        let mut submit = false;
        egui::Grid::new("equipment_form").show(ui, |ui| {
            ui.label("Current:");
            ui.text_edit_singleline(&mut self.equipment_form.current_equipment_id);
            ui.end_row();
            ui.label("Target:");
            ui.text_edit_singleline(&mut self.equipment_form.target_equipment_id);
            ui.end_row();
            ui.label("Count:");
            ui.add(egui::DragValue::new(&mut self.equipment_form.count).range(1..=99_999));
            ui.end_row();
            ui.label("Nickname:");
            ui.text_edit_singleline(&mut self.equipment_form.nickname);
            ui.end_row();
        });
        let mut cancel = false;
        ui.horizontal(|ui| {
            submit = ui.button("Save").clicked();
            cancel = self.editing.is_some() && ui.button("Cancel").clicked();
        });
        if submit {
            self.submit_equipment_form();
        } else if cancel {
            self.cancel_edit();
        }
    }

    fn show_inventory(&mut self, ui: &mut egui::Ui) {
        ui.heading("Inventory");

        egui::Grid::new("inventory_form").striped(true).show(ui, |ui| {
            for (piece_id, count) in self.inventory_form.iter_mut() {
                ui.label(piece_id.as_str());
                ui.add(egui::TextEdit::singleline(count).desired_width(80.0));
                ui.end_row();
            }
        });

        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.new_inventory_piece);
            if ui.button("➕ Piece").clicked() {
                let piece_id = self.new_inventory_piece.trim().to_string();
                if !piece_id.is_empty() {
                    self.inventory_form.entry(piece_id).or_insert_with(|| "0".to_string());
                }
                self.new_inventory_piece.clear();
            }
        });

        if ui.button("Apply inventory").clicked() {
            self.apply_inventory();
        }

        ui.separator();
        ui.heading("Shortfall");
        let shortfalls = self.store.piece_shortfalls();
        let show_all = !self.settings.show_shortfall_only;
        egui::Grid::new("shortfall").striped(true).show(ui, |ui| {
            ui.strong("Piece");
            ui.strong("Required");
            ui.strong("In stock");
            ui.strong("Missing");
            ui.end_row();
            for s in shortfalls.iter().filter(|s| show_all || s.missing > 0) {
                ui.label(s.piece_id.as_str());
                ui.label(s.required.to_string());
                ui.label(s.in_stock.to_string());
                let color = if s.missing > 0 {
                    egui::Color32::RED
                } else {
                    egui::Color32::GREEN
                };
                ui.colored_label(color, s.missing.to_string());
                ui.end_row();
            }
        });
    }

    fn show_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        let mut save = false;
        egui::Window::new("⚙ Settings")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                egui::ComboBox::from_label("Default mode")
                    .selected_text(self.settings_form.default_mode.to_string())
                    .show_ui(ui, |ui| {
                        for mode in RequirementMode::ALL {
                            ui.selectable_value(
                                &mut self.settings_form.default_mode,
                                mode,
                                mode.to_string(),
                            );
                        }
                    });
                ui.horizontal(|ui| {
                    ui.label("Scroll threshold:");
                    ui.add(
                        egui::DragValue::new(&mut self.settings_form.scroll_threshold)
                            .range(0.0..=200.0)
                            .suffix(" pt"),
                    );
                });
                ui.checkbox(
                    &mut self.settings_form.show_shortfall_only,
                    "Only show missing pieces",
                );
                save = ui.button("Save").clicked();
            });
        self.show_settings = open && !save;
        if save {
            self.save_settings();
        }
    }

    fn show_snapshot_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_snapshot;
        let mut export = false;
        let mut import = false;
        egui::Window::new("💾 Snapshot")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("File:");
                    ui.text_edit_singleline(&mut self.snapshot_path);
                });
                ui.horizontal(|ui| {
                    export = ui.button("Export").clicked();
                    import = ui.button("Import").clicked();
                });
            });
        self.show_snapshot = open;
        if export {
            self.export_snapshot();
        }
        if import {
            self.import_snapshot();
        }
    }

    fn process_pending(&mut self) {
        if let Some(index) = self.pending_edit.take() {
            self.start_edit(index);
        }
        if let Some(index) = self.pending_delete.take() {
            self.delete_entry(index);
        }
    }
}

impl eframe::App for PlannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let status = self.status_line();
        let bar = self.app_bar.show(ctx, "Equipment Planner", &status);
        if bar.settings_clicked {
            self.settings_form = self.settings.clone();
            self.show_settings = true;
        }
        if bar.snapshot_clicked {
            self.show_snapshot = true;
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            if let Some((msg, is_error)) = &self.message {
                let color = if *is_error {
                    egui::Color32::RED
                } else {
                    egui::Color32::GREEN
                };
                ui.colored_label(color, msg);
            } else {
                ui.weak("Ready");
            }
        });

        egui::SidePanel::right("inventory_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("inventory_scroll")
                    .show(ui, |ui| self.show_inventory(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let output = egui::ScrollArea::vertical()
                .id_salt("requirements_scroll")
                .show(ui, |ui| {
                    self.show_mode_selector(ui);
                    ui.separator();
                    match self.store.requirement_mode() {
                        RequirementMode::ByPiece => {
                            self.show_piece_list(ui);
                            ui.separator();
                            self.show_piece_form(ui);
                        }
                        RequirementMode::ByEquipment => {
                            self.show_equipment_list(ui);
                            ui.separator();
                            self.show_equipment_form(ui);
                        }
                    }
                });
            self.app_bar.update_scroll(output.state.offset.y);
        });

        if self.show_settings {
            self.show_settings_window(ctx);
        }
        if self.show_snapshot {
            self.show_snapshot_window(ctx);
        }

        self.process_pending();
    }
}
