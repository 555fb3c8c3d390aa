//! Plain-data snapshots of the requirement store
//!
//! A snapshot is the serializable form of the store state. JSON is the
//! interchange format, for example handing state between the CLI session
//! and the GUI or seeding a session from a saved file.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{PlannerError, Result};
use crate::models::{EquipmentRequirement, PieceInventory, PieceRequirement, RequirementMode};
use crate::store::{RequirementStore, StoreChange};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub requirement_by_pieces: Vec<PieceRequirement>,
    #[serde(default)]
    pub requirement_by_equipments: Vec<EquipmentRequirement>,
    #[serde(default)]
    pub pieces_inventory: BTreeMap<String, PieceInventory>,
    #[serde(default)]
    pub requirement_mode: RequirementMode,
}

impl StoreSnapshot {
    /// Checks that every inventory entry is stored under its own piece id
    pub fn validate(&self) -> Result<()> {
        for (key, inventory) in &self.pieces_inventory {
            if *key != inventory.piece_id {
                return Err(PlannerError::InvalidSnapshot(format!(
                    "inventory key '{}' does not match piece id '{}'",
                    key, inventory.piece_id
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: StoreSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

impl RequirementStore {
    /// Copies the current state out as plain data
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            requirement_by_pieces: self.requirement_by_pieces.clone(),
            requirement_by_equipments: self.requirement_by_equipments.clone(),
            pieces_inventory: self.pieces_inventory.clone(),
            requirement_mode: self.requirement_mode,
        }
    }

    /// Builds a fresh store from a snapshot. List order is taken as given.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        let mut store = RequirementStore::new();
        store.load_snapshot(snapshot)?;
        Ok(store)
    }

    /// Replaces all state with the snapshot's, keeping subscribers
    pub fn apply_snapshot(&mut self, snapshot: StoreSnapshot) -> Result<()> {
        self.load_snapshot(snapshot)?;
        self.notify(StoreChange::Restored);
        Ok(())
    }

    fn load_snapshot(&mut self, snapshot: StoreSnapshot) -> Result<()> {
        snapshot.validate()?;
        debug!(
            "Loading snapshot: {} piece, {} equipment requirement(s), {} inventory entries",
            snapshot.requirement_by_pieces.len(),
            snapshot.requirement_by_equipments.len(),
            snapshot.pieces_inventory.len()
        );
        self.requirement_by_pieces = snapshot.requirement_by_pieces;
        self.requirement_by_equipments = snapshot.requirement_by_equipments;
        self.pieces_inventory = snapshot.pieces_inventory;
        self.requirement_mode = snapshot.requirement_mode;
        Ok(())
    }
}

/// Writes the store's snapshot to a JSON file
pub fn export_to_json<P: AsRef<Path>>(store: &RequirementStore, json_path: P) -> Result<()> {
    let json = store.snapshot().to_json()?;
    std::fs::write(json_path.as_ref(), json)
        .map_err(|e| PlannerError::io(json_path.as_ref(), e))?;
    Ok(())
}

/// Reads a snapshot from a JSON file
pub fn import_from_json<P: AsRef<Path>>(json_path: P) -> Result<StoreSnapshot> {
    let json = std::fs::read_to_string(json_path.as_ref())
        .map_err(|e| PlannerError::io(json_path.as_ref(), e))?;
    StoreSnapshot::from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn populated_store() -> RequirementStore {
        let mut store = RequirementStore::new();
        store.add_piece_requirement(PieceRequirement::new("gear", 3));
        store.add_equipment_requirement(
            EquipmentRequirement::new("hat_t1", "hat_t4", 2).with_nickname("Hats"),
        );
        store.update_inventory([("gear", "10")]);
        store.update_requirement_mode(Some(RequirementMode::ByPiece));
        store
    }

    #[test]
    fn test_snapshot_uses_camel_case_field_names() {
        let json = populated_store().snapshot().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["requirementMode"], "ByPiece");
        assert_eq!(value["requirementByPieces"][0]["pieceId"], "gear");
        assert_eq!(value["requirementByEquipments"][0]["currentEquipmentId"], "hat_t1");
        assert_eq!(value["requirementByEquipments"][0]["nickname"], "Hats");
        assert_eq!(value["piecesInventory"]["gear"]["inStockCount"], 10);
    }

    #[test]
    fn test_from_snapshot_restores_state() {
        let original = populated_store();
        let restored = RequirementStore::from_snapshot(original.snapshot()).unwrap();

        assert_eq!(restored.snapshot(), original.snapshot());
        assert_eq!(restored.requirement_mode(), RequirementMode::ByPiece);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let snapshot = StoreSnapshot::from_json("{}").unwrap();
        assert_eq!(snapshot.requirement_mode, RequirementMode::ByEquipment);
        assert!(snapshot.requirement_by_pieces.is_empty());
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result = StoreSnapshot::from_json(r#"{"requirementMode":"ByColor"}"#);
        assert!(matches!(result, Err(PlannerError::Json(_))));
    }

    #[test]
    fn test_mismatched_inventory_key_is_rejected() {
        let json = r#"{"piecesInventory":{"gear":{"pieceId":"bolt","inStockCount":1}}}"#;
        let err = StoreSnapshot::from_json(json).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_apply_snapshot_notifies_restored() {
        let mut store = RequirementStore::new();
        let restored = Rc::new(Cell::new(false));
        let flag = Rc::clone(&restored);
        store.subscribe(move |change| {
            if *change == StoreChange::Restored {
                flag.set(true);
            }
        });

        store.apply_snapshot(populated_store().snapshot()).unwrap();
        assert!(restored.get());
        assert_eq!(store.requirement_by_pieces().len(), 1);
    }

    #[test]
    fn test_export_and_import_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("planner.json");

        let store = populated_store();
        export_to_json(&store, &path).unwrap();
        let snapshot = import_from_json(&path).unwrap();

        assert_eq!(snapshot, store.snapshot());
    }

    #[test]
    fn test_import_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = import_from_json(dir.path().join("missing.json"));
        assert!(matches!(result, Err(PlannerError::Io { .. })));
    }
}
