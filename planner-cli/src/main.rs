mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use inquire::{Confirm, InquireError, Select, Text};
use std::cell::Cell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use planner_core::{
    export_to_json, import_from_json, EquipmentInfoToEdit, EquipmentRequirement, PieceInfoToEdit,
    RequirementMode, RequirementStore, Settings,
};

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to load settings from {:?}", path))?,
        None => Settings::load_or_default(),
    };

    let mut store = open_store(&settings, cli.import.as_deref())?;
    if let Some(mode) = &cli.mode {
        apply_mode_arg(&mut store, mode);
    }

    match cli.command.unwrap_or(Command::Session) {
        Command::Session => run_session(&mut store, &settings)?,
        Command::List => print_requirements(&store),
        Command::Summary { all } => print_summary(&store, summary_shows_all(all, &settings)),
        Command::Export { output } => export_snapshot(&store, output.as_deref())?,
    }

    Ok(())
}

/// Builds the session store, either empty or seeded from a snapshot file
fn open_store(settings: &Settings, import: Option<&Path>) -> Result<RequirementStore> {
    let Some(path) = import else {
        return Ok(settings.new_store());
    };

    let snapshot = import_from_json(path)
        .with_context(|| format!("Failed to import snapshot from {:?}", path))?;
    let store = RequirementStore::from_snapshot(snapshot)?;
    log::info!("Imported snapshot from {:?}", path);
    Ok(store)
}

fn apply_mode_arg(store: &mut RequirementStore, mode: &str) {
    if !store.update_requirement_mode(mode.parse().ok()) {
        println!(
            "{}",
            format!(
                "Ignoring unknown mode '{}' (expected ByPiece or ByEquipment)",
                mode
            )
            .yellow()
        );
    }
}

fn export_snapshot(store: &RequirementStore, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            export_to_json(store, path)
                .with_context(|| format!("Failed to export snapshot to {:?}", path))?;
            println!("{} {}", "Snapshot written to".green(), path.display());
        }
        None => {
            let json = store.snapshot().to_json()?;
            println!("{}", json);
        }
    }
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

fn print_piece_requirements(store: &RequirementStore) {
    let pieces = store.requirement_by_pieces();
    if pieces.is_empty() {
        println!("{}", "No piece requirements.".dimmed());
        return;
    }
    for (idx, req) in pieces.iter().enumerate() {
        println!("{:>3}  {}  x{}", idx, req.piece_id.cyan(), req.count);
    }
}

fn print_equipment_requirements(store: &RequirementStore) {
    let equipments = store.requirement_by_equipments();
    if equipments.is_empty() {
        println!("{}", "No equipment requirements.".dimmed());
        return;
    }
    for (idx, req) in equipments.iter().enumerate() {
        let nickname = if req.nickname.is_empty() {
            String::new()
        } else {
            format!("  ({})", req.nickname.bold())
        };
        println!(
            "{:>3}  {} -> {}  x{}{}",
            idx,
            req.current_equipment_id.cyan(),
            req.target_equipment_id.cyan(),
            req.count,
            nickname
        );
    }
}

fn print_requirements(store: &RequirementStore) {
    let mode = store.requirement_mode();
    println!("{}", format!("Requirements ({})", mode).bold().underline());
    match mode {
        RequirementMode::ByPiece => print_piece_requirements(store),
        RequirementMode::ByEquipment => print_equipment_requirements(store),
    }
}

/// `--all` overrides the configured shortfall filter
fn summary_shows_all(all: bool, settings: &Settings) -> bool {
    all || !settings.show_shortfall_only
}

fn print_summary(store: &RequirementStore, show_all: bool) {
    let shortfalls = store.piece_shortfalls();
    if shortfalls.is_empty() {
        println!("{}", "No pieces required.".dimmed());
        return;
    }

    println!("{}", "Piece summary".bold().underline());
    println!("{:<24} {:>9} {:>9} {:>9}", "Piece", "Required", "In stock", "Missing");
    let mut shown = 0;
    for s in shortfalls.iter().filter(|s| show_all || s.missing > 0) {
        let missing = if s.missing > 0 {
            s.missing.to_string().red()
        } else {
            s.missing.to_string().green()
        };
        println!(
            "{:<24} {:>9} {:>9} {:>9}",
            s.piece_id, s.required, s.in_stock, missing
        );
        shown += 1;
    }
    if shown == 0 {
        println!("{}", "All required pieces are in stock.".green());
    }
}

// =============================================================================
// Interactive session
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionAction {
    AddPiece,
    EditPiece,
    DeletePiece,
    AddEquipment,
    EditEquipment,
    DeleteEquipment,
    UpdateInventory,
    SwitchMode,
    List,
    Summary,
    Export,
    Quit,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionAction::AddPiece => write!(f, "Add piece requirement"),
            SessionAction::EditPiece => write!(f, "Edit piece requirement"),
            SessionAction::DeletePiece => write!(f, "Delete piece requirement"),
            SessionAction::AddEquipment => write!(f, "Add equipment requirement"),
            SessionAction::EditEquipment => write!(f, "Edit equipment requirement"),
            SessionAction::DeleteEquipment => write!(f, "Delete equipment requirement"),
            SessionAction::UpdateInventory => write!(f, "Update inventory"),
            SessionAction::SwitchMode => write!(f, "Switch requirement mode"),
            SessionAction::List => write!(f, "List requirements"),
            SessionAction::Summary => write!(f, "Piece summary"),
            SessionAction::Export => write!(f, "Export snapshot"),
            SessionAction::Quit => write!(f, "Quit"),
        }
    }
}

/// Menu entries for the active mode; list edits only target that mode's list
fn actions_for(mode: RequirementMode) -> Vec<SessionAction> {
    let mut actions = match mode {
        RequirementMode::ByPiece => vec![
            SessionAction::AddPiece,
            SessionAction::EditPiece,
            SessionAction::DeletePiece,
        ],
        RequirementMode::ByEquipment => vec![
            SessionAction::AddEquipment,
            SessionAction::EditEquipment,
            SessionAction::DeleteEquipment,
        ],
    };
    actions.extend([
        SessionAction::UpdateInventory,
        SessionAction::SwitchMode,
        SessionAction::List,
        SessionAction::Summary,
        SessionAction::Export,
        SessionAction::Quit,
    ]);
    actions
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<InquireError>(),
        Some(InquireError::OperationCanceled | InquireError::OperationInterrupted)
    )
}

fn run_session(store: &mut RequirementStore, settings: &Settings) -> Result<()> {
    let dirty = Rc::new(Cell::new(false));
    let flag = Rc::clone(&dirty);
    let subscription = store.subscribe(move |_| flag.set(true));

    println!("{}", "Equipment planner - interactive session".bold());
    loop {
        let prompt = format!(
            "[{} | {} entries]",
            store.requirement_mode(),
            store.active_requirement_count()
        );
        let action = match Select::new(&prompt, actions_for(store.requirement_mode())).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                SessionAction::Quit
            }
            Err(e) => return Err(e.into()),
        };

        if action == SessionAction::Quit {
            break;
        }

        if let Err(e) = run_action(store, action, settings) {
            if !is_cancelled(&e) {
                return Err(e);
            }
            println!("{}", "Cancelled.".dimmed());
        }
    }

    store.unsubscribe(subscription);
    if dirty.get() {
        offer_export(store)?;
    }
    Ok(())
}

fn run_action(
    store: &mut RequirementStore,
    action: SessionAction,
    settings: &Settings,
) -> Result<()> {
    match action {
        SessionAction::AddPiece => {
            let requirement = prompts::prompt_piece_requirement(None)?;
            store.add_piece_requirement(requirement);
            println!("{}", "Piece requirement added.".green());
        }
        SessionAction::EditPiece => {
            let Some(index) = select_piece(store, "Edit which piece requirement?")? else {
                return Ok(());
            };
            let current = store.requirement_by_pieces()[index].clone();
            let updated = prompts::prompt_piece_requirement(Some(&current))?;
            report(
                store.update_piece_requirement(&PieceInfoToEdit::new(index, updated)),
                "Piece requirement updated.",
            );
        }
        SessionAction::DeletePiece => {
            let Some(index) = select_piece(store, "Delete which piece requirement?")? else {
                return Ok(());
            };
            let current = store.requirement_by_pieces()[index].clone();
            if confirm_delete()? {
                report(
                    store.delete_piece_requirement(&PieceInfoToEdit::new(index, current)),
                    "Piece requirement deleted.",
                );
            }
        }
        SessionAction::AddEquipment => {
            let requirement = prompts::prompt_equipment_requirement(None)?;
            store.add_equipment_requirement(requirement);
            println!("{}", "Equipment requirement added.".green());
        }
        SessionAction::EditEquipment => {
            let Some(index) = select_equipment(store, "Edit which equipment requirement?")? else {
                return Ok(());
            };
            let current = store.requirement_by_equipments()[index].clone();
            let updated = prompts::prompt_equipment_requirement(Some(&current))?;
            report(
                store.update_equipment_requirement(&EquipmentInfoToEdit::new(index, updated)),
                "Equipment requirement updated.",
            );
        }
        SessionAction::DeleteEquipment => {
            let Some(index) = select_equipment(store, "Delete which equipment requirement?")?
            else {
                return Ok(());
            };
            let current = store.requirement_by_equipments()[index].clone();
            if confirm_delete()? {
                report(
                    store.delete_equipment_requirement(&EquipmentInfoToEdit::new(index, current)),
                    "Equipment requirement deleted.",
                );
            }
        }
        SessionAction::UpdateInventory => {
            let form = prompts::prompt_inventory_form(store)?;
            report(store.update_inventory(&form), "Inventory updated.");
        }
        SessionAction::SwitchMode => {
            let mode = prompts::prompt_mode(store.requirement_mode())?;
            store.update_requirement_mode(Some(mode));
        }
        SessionAction::List => print_requirements(store),
        SessionAction::Summary => print_summary(store, summary_shows_all(false, settings)),
        SessionAction::Export => {
            let path = Text::new("Export to:").with_default("planner.json").prompt()?;
            export_snapshot(store, Some(Path::new(&path)))?;
        }
        SessionAction::Quit => {}
    }
    Ok(())
}

fn report(applied: bool, message: &str) {
    if applied {
        println!("{}", message.green());
    } else {
        println!("{}", "Nothing changed.".yellow());
    }
}

fn confirm_delete() -> Result<bool> {
    Ok(Confirm::new("Are you sure?").with_default(false).prompt()?)
}

fn select_piece(store: &RequirementStore, message: &str) -> Result<Option<usize>> {
    let labels = store
        .requirement_by_pieces()
        .iter()
        .enumerate()
        .map(|(idx, r)| format!("#{} {} x{}", idx, r.piece_id, r.count))
        .collect();
    let index = prompts::prompt_select_index(message, labels)?;
    if index.is_none() {
        println!("{}", "No piece requirements.".dimmed());
    }
    Ok(index)
}

fn select_equipment(store: &RequirementStore, message: &str) -> Result<Option<usize>> {
    let labels = store
        .requirement_by_equipments()
        .iter()
        .enumerate()
        .map(|(idx, r)| equipment_label(idx, r))
        .collect();
    let index = prompts::prompt_select_index(message, labels)?;
    if index.is_none() {
        println!("{}", "No equipment requirements.".dimmed());
    }
    Ok(index)
}

fn equipment_label(idx: usize, req: &EquipmentRequirement) -> String {
    if req.nickname.is_empty() {
        format!(
            "#{} {} -> {} x{}",
            idx, req.current_equipment_id, req.target_equipment_id, req.count
        )
    } else {
        format!(
            "#{} {} -> {} x{} ({})",
            idx, req.current_equipment_id, req.target_equipment_id, req.count, req.nickname
        )
    }
}

fn offer_export(store: &RequirementStore) -> Result<()> {
    let wants_export = match Confirm::new("Export the session before quitting?")
        .with_default(true)
        .prompt()
    {
        Ok(answer) => answer,
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => false,
        Err(e) => return Err(e.into()),
    };
    if !wants_export {
        return Ok(());
    }

    let path = Text::new("Export to:").with_default("planner.json").prompt()?;
    export_snapshot(store, Some(Path::new(&path)))
}
