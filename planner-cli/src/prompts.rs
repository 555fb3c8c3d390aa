use anyhow::Result;
use inquire::{CustomType, Select, Text};

use planner_core::{
    EquipmentRequirement, InventoryForm, PieceRequirement, RequirementMode, RequirementStore,
};

/// Prompts for a count, defaulting to `default`
fn prompt_count(default: u32) -> Result<u32> {
    let count = CustomType::<u32>::new("Count:")
        .with_default(default)
        .with_error_message("Please enter a whole number")
        .prompt()?;
    Ok(count)
}

fn prompt_required_text<'a>(message: &'a str, default: &'a str) -> Result<String> {
    let mut prompt = Text::new(message).with_validator(inquire::required!());
    if !default.is_empty() {
        prompt = prompt.with_default(default);
    }
    Ok(prompt.prompt()?.trim().to_string())
}

/// Prompts for a piece requirement, pre-filled from `current` when editing
pub fn prompt_piece_requirement(current: Option<&PieceRequirement>) -> Result<PieceRequirement> {
    let piece_id = prompt_required_text("Piece ID:", current.map_or("", |r| r.piece_id.as_str()))?;
    let count = prompt_count(current.map_or(1, |r| r.count))?;
    Ok(PieceRequirement { piece_id, count })
}

/// Prompts for an equipment requirement, pre-filled from `current` when editing
pub fn prompt_equipment_requirement(
    current: Option<&EquipmentRequirement>,
) -> Result<EquipmentRequirement> {
    let current_equipment_id = prompt_required_text(
        "Current equipment ID:",
        current.map_or("", |r| r.current_equipment_id.as_str()),
    )?;
    let target_equipment_id = prompt_required_text(
        "Target equipment ID:",
        current.map_or("", |r| r.target_equipment_id.as_str()),
    )?;
    let count = prompt_count(current.map_or(1, |r| r.count))?;
    let nickname = Text::new("Nickname (optional):")
        .with_default(current.map_or("", |r| r.nickname.as_str()))
        .prompt()?;

    Ok(EquipmentRequirement {
        current_equipment_id,
        target_equipment_id,
        count,
        nickname: nickname.trim().to_string(),
    })
}

/// Lets the user pick one entry by label. Returns its index, or None when
/// there is nothing to pick from.
pub fn prompt_select_index(message: &str, labels: Vec<String>) -> Result<Option<usize>> {
    if labels.is_empty() {
        return Ok(None);
    }
    let choice = Select::new(message, labels).raw_prompt()?;
    Ok(Some(choice.index))
}

pub fn prompt_mode(current: RequirementMode) -> Result<RequirementMode> {
    let options = RequirementMode::ALL.to_vec();
    let start = options.iter().position(|m| *m == current).unwrap_or(0);
    let mode = Select::new("Requirement mode:", options)
        .with_starting_cursor(start)
        .prompt()?;
    Ok(mode)
}

/// Prompts for the stock of every required piece. Free text is passed through
/// unparsed so the store applies its own count parsing.
pub fn prompt_inventory_form(store: &RequirementStore) -> Result<InventoryForm> {
    let mut form = InventoryForm::new();
    let mut piece_ids = store.get_all_required_piece_ids();

    let extra = Text::new("Additional piece IDs (comma separated, optional):").prompt()?;
    piece_ids.extend(
        extra
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    );

    for piece_id in piece_ids {
        let current = store.in_stock_count(&piece_id).to_string();
        let count = Text::new(&format!("In stock for {}:", piece_id))
            .with_default(&current)
            .prompt()?;
        form.insert(piece_id, count);
    }

    Ok(form)
}
