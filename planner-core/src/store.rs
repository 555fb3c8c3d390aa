//! In-memory requirement store
//!
//! Holds the piece requirements, the equipment requirements, the piece
//! inventory and the active requirement mode. Every mutation goes through one
//! of the action methods below; each returns whether it applied, and applied
//! actions notify the subscribers.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::models::{
    parse_stock_count, EquipmentInfoToEdit, EquipmentRequirement, PieceInfoToEdit,
    PieceInventory, PieceRequirement, PieceShortfall, RequirementMode,
};

/// What an applied action changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    PiecesChanged,
    EquipmentsChanged,
    InventoryChanged,
    ModeChanged(RequirementMode),
    /// The whole state was replaced from a snapshot
    Restored,
}

/// Handle returned by [`RequirementStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreChange)>;

pub struct RequirementStore {
    pub(crate) requirement_by_pieces: Vec<PieceRequirement>,
    pub(crate) requirement_by_equipments: Vec<EquipmentRequirement>,
    pub(crate) pieces_inventory: BTreeMap<String, PieceInventory>,
    pub(crate) requirement_mode: RequirementMode,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription_id: u64,
}

impl RequirementStore {
    /// Creates an empty store in the default mode
    pub fn new() -> Self {
        Self::with_mode(RequirementMode::default())
    }

    /// Creates an empty store starting in `mode`
    pub fn with_mode(mode: RequirementMode) -> Self {
        Self {
            requirement_by_pieces: Vec::new(),
            requirement_by_equipments: Vec::new(),
            pieces_inventory: BTreeMap::new(),
            requirement_mode: mode,
            listeners: Vec::new(),
            next_subscription_id: 1,
        }
    }

    pub fn requirement_by_pieces(&self) -> &[PieceRequirement] {
        &self.requirement_by_pieces
    }

    pub fn requirement_by_equipments(&self) -> &[EquipmentRequirement] {
        &self.requirement_by_equipments
    }

    pub fn pieces_inventory(&self) -> &BTreeMap<String, PieceInventory> {
        &self.pieces_inventory
    }

    pub fn requirement_mode(&self) -> RequirementMode {
        self.requirement_mode
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Registers a listener called after every applied action
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreChange) + 'static,
    {
        let id = SubscriptionId(self.next_subscription_id);
        self.next_subscription_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let original_len = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != original_len
    }

    pub(crate) fn notify(&mut self, change: StoreChange) {
        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }

    // =========================================================================
    // Piece requirements
    // =========================================================================

    /// Appends a piece requirement. Entries for the same piece are additive.
    pub fn add_piece_requirement(&mut self, requirement: PieceRequirement) -> bool {
        debug!(
            "Adding piece requirement {} x{}",
            requirement.piece_id, requirement.count
        );
        self.requirement_by_pieces.push(requirement);
        self.notify(StoreChange::PiecesChanged);
        true
    }

    /// Replaces the piece requirement at `edit.index_in_store_array`
    pub fn update_piece_requirement(&mut self, edit: &PieceInfoToEdit) -> bool {
        let Some(slot) = self.requirement_by_pieces.get_mut(edit.index_in_store_array) else {
            return false;
        };
        *slot = edit.to_requirement();
        debug!(
            "Updated piece requirement #{} to {} x{}",
            edit.index_in_store_array, edit.piece_id, edit.count
        );
        self.notify(StoreChange::PiecesChanged);
        true
    }

    /// Removes the piece requirement at `edit.index_in_store_array`
    pub fn delete_piece_requirement(&mut self, edit: &PieceInfoToEdit) -> bool {
        if edit.index_in_store_array >= self.requirement_by_pieces.len() {
            return false;
        }
        let removed = self.requirement_by_pieces.remove(edit.index_in_store_array);
        debug!(
            "Deleted piece requirement #{} ({})",
            edit.index_in_store_array, removed.piece_id
        );
        self.notify(StoreChange::PiecesChanged);
        true
    }

    // =========================================================================
    // Equipment requirements
    // =========================================================================

    /// Descending by nickname. Stable, so equal nicknames keep their order.
    fn sort_equipments_by_nickname(&mut self) {
        self.requirement_by_equipments
            .sort_by(|a, b| b.nickname.cmp(&a.nickname));
    }

    /// Appends an equipment requirement, re-sorting if it carries a nickname
    pub fn add_equipment_requirement(&mut self, requirement: EquipmentRequirement) -> bool {
        debug!(
            "Adding equipment requirement {} -> {} x{}",
            requirement.current_equipment_id, requirement.target_equipment_id, requirement.count
        );
        let sort = !requirement.nickname.is_empty();
        self.requirement_by_equipments.push(requirement);
        if sort {
            self.sort_equipments_by_nickname();
        }
        self.notify(StoreChange::EquipmentsChanged);
        true
    }

    /// Replaces the equipment requirement at `edit.index_in_store_array`,
    /// re-sorting if the new nickname is non-empty
    pub fn update_equipment_requirement(&mut self, edit: &EquipmentInfoToEdit) -> bool {
        let Some(slot) = self
            .requirement_by_equipments
            .get_mut(edit.index_in_store_array)
        else {
            return false;
        };
        *slot = edit.to_requirement();
        if !edit.nickname.is_empty() {
            self.sort_equipments_by_nickname();
        }
        debug!(
            "Updated equipment requirement #{} to {} -> {} x{}",
            edit.index_in_store_array,
            edit.current_equipment_id,
            edit.target_equipment_id,
            edit.count
        );
        self.notify(StoreChange::EquipmentsChanged);
        true
    }

    /// Removes the equipment requirement at `edit.index_in_store_array`.
    /// Survivors keep their relative order, so no re-sort.
    pub fn delete_equipment_requirement(&mut self, edit: &EquipmentInfoToEdit) -> bool {
        if edit.index_in_store_array >= self.requirement_by_equipments.len() {
            return false;
        }
        self.requirement_by_equipments
            .remove(edit.index_in_store_array);
        debug!("Deleted equipment requirement #{}", edit.index_in_store_array);
        self.notify(StoreChange::EquipmentsChanged);
        true
    }

    // =========================================================================
    // Mode and inventory
    // =========================================================================

    /// Sets the active mode. `None` (an empty or unrecognised mode) is ignored.
    pub fn update_requirement_mode(&mut self, mode: Option<RequirementMode>) -> bool {
        let Some(mode) = mode else {
            return false;
        };
        self.requirement_mode = mode;
        debug!("Requirement mode set to {}", mode);
        self.notify(StoreChange::ModeChanged(mode));
        true
    }

    /// Upserts the stock count of every piece in `form`.
    ///
    /// Counts are parsed with [`parse_stock_count`], so non-numeric text
    /// stores 0. Returns false only when the form is empty.
    pub fn update_inventory<I, K, V>(&mut self, form: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut updated = 0usize;
        for (piece_id, count) in form {
            let piece_id = piece_id.into();
            let in_stock_count = parse_stock_count(count.as_ref());
            self.pieces_inventory.insert(
                piece_id.clone(),
                PieceInventory {
                    piece_id,
                    in_stock_count,
                },
            );
            updated += 1;
        }

        if updated == 0 {
            return false;
        }
        debug!("Updated inventory for {} piece(s)", updated);
        self.notify(StoreChange::InventoryChanged);
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Distinct piece ids named by the piece requirements
    pub fn get_all_required_piece_ids(&self) -> BTreeSet<String> {
        self.requirement_by_pieces
            .iter()
            .map(|r| r.piece_id.clone())
            .collect()
    }

    /// Total required count per piece id
    pub fn required_piece_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for req in &self.requirement_by_pieces {
            *counts.entry(req.piece_id.clone()).or_insert(0u64) += u64::from(req.count);
        }
        counts
    }

    /// Stocked count for a piece, 0 if it has no inventory entry
    pub fn in_stock_count(&self, piece_id: &str) -> i64 {
        self.pieces_inventory
            .get(piece_id)
            .map(|inv| inv.in_stock_count)
            .unwrap_or(0)
    }

    /// Required versus stocked amounts for every required piece, by piece id
    pub fn piece_shortfalls(&self) -> Vec<PieceShortfall> {
        self.required_piece_counts()
            .into_iter()
            .map(|(piece_id, required)| {
                let in_stock = self.in_stock_count(&piece_id);
                let missing = i128::from(required) - i128::from(in_stock);
                PieceShortfall {
                    piece_id,
                    required,
                    in_stock,
                    missing: u64::try_from(missing.max(0)).unwrap_or(u64::MAX),
                }
            })
            .collect()
    }

    /// Number of entries in the list selected by the current mode
    pub fn active_requirement_count(&self) -> usize {
        match self.requirement_mode {
            RequirementMode::ByPiece => self.requirement_by_pieces.len(),
            RequirementMode::ByEquipment => self.requirement_by_equipments.len(),
        }
    }
}

impl Default for RequirementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequirementStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequirementStore")
            .field("requirement_by_pieces", &self.requirement_by_pieces)
            .field("requirement_by_equipments", &self.requirement_by_equipments)
            .field("pieces_inventory", &self.pieces_inventory)
            .field("requirement_mode", &self.requirement_mode)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn nicknames(store: &RequirementStore) -> Vec<&str> {
        store
            .requirement_by_equipments()
            .iter()
            .map(|r| r.nickname.as_str())
            .collect()
    }

    fn equipment(nickname: &str) -> EquipmentRequirement {
        EquipmentRequirement::new("hat_t1", "hat_t5", 1).with_nickname(nickname)
    }

    #[test]
    fn test_new_store_is_empty_with_default_mode() {
        let store = RequirementStore::new();
        assert!(store.requirement_by_pieces().is_empty());
        assert!(store.requirement_by_equipments().is_empty());
        assert!(store.pieces_inventory().is_empty());
        assert_eq!(store.requirement_mode(), RequirementMode::ByEquipment);
    }

    #[test]
    fn test_add_piece_requirements_keeps_insertion_order() {
        let mut store = RequirementStore::new();
        for (id, count) in [("c", 3), ("a", 1), ("b", 2), ("a", 5)] {
            assert!(store.add_piece_requirement(PieceRequirement::new(id, count)));
        }

        let ids: Vec<&str> = store
            .requirement_by_pieces()
            .iter()
            .map(|r| r.piece_id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "a", "b", "a"]);
        assert_eq!(store.requirement_by_pieces()[3].count, 5);
    }

    #[test]
    fn test_get_all_required_piece_ids_is_distinct() {
        let mut store = RequirementStore::new();
        store.add_piece_requirement(PieceRequirement::new("a", 1));
        store.add_piece_requirement(PieceRequirement::new("a", 2));
        store.add_piece_requirement(PieceRequirement::new("b", 1));
        store.add_equipment_requirement(EquipmentRequirement::new("x", "y", 1));

        let ids = store.get_all_required_piece_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("a"));
        assert!(ids.contains("b"));
    }

    #[test]
    fn test_update_piece_requirement() {
        let mut store = RequirementStore::new();
        store.add_piece_requirement(PieceRequirement::new("a", 1));
        store.add_piece_requirement(PieceRequirement::new("b", 2));

        let edit = PieceInfoToEdit::new(1, PieceRequirement::new("z", 9));
        assert!(store.update_piece_requirement(&edit));
        assert_eq!(store.requirement_by_pieces()[1], PieceRequirement::new("z", 9));
        assert_eq!(store.requirement_by_pieces()[0], PieceRequirement::new("a", 1));
    }

    #[test]
    fn test_update_piece_requirement_out_of_range_is_noop() {
        let mut store = RequirementStore::new();
        store.add_piece_requirement(PieceRequirement::new("a", 1));

        let edit = PieceInfoToEdit::new(1, PieceRequirement::new("z", 9));
        assert!(!store.update_piece_requirement(&edit));
        assert_eq!(store.requirement_by_pieces(), &[PieceRequirement::new("a", 1)]);
    }

    #[test]
    fn test_delete_piece_requirement() {
        let mut store = RequirementStore::new();
        for id in ["a", "b", "c"] {
            store.add_piece_requirement(PieceRequirement::new(id, 1));
        }

        let out_of_range = PieceInfoToEdit::new(3, PieceRequirement::new("c", 1));
        assert!(!store.delete_piece_requirement(&out_of_range));
        assert_eq!(store.requirement_by_pieces().len(), 3);

        let edit = PieceInfoToEdit::new(1, PieceRequirement::new("b", 1));
        assert!(store.delete_piece_requirement(&edit));
        let ids: Vec<&str> = store
            .requirement_by_pieces()
            .iter()
            .map(|r| r.piece_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_add_equipment_sorts_descending_by_nickname() {
        let mut store = RequirementStore::new();
        store.add_equipment_requirement(equipment("Bravo"));
        store.add_equipment_requirement(equipment("Alpha"));
        store.add_equipment_requirement(equipment("Charlie"));

        assert_eq!(nicknames(&store), vec!["Charlie", "Bravo", "Alpha"]);
    }

    #[test]
    fn test_sort_is_case_sensitive() {
        let mut store = RequirementStore::new();
        store.add_equipment_requirement(equipment("apple"));
        store.add_equipment_requirement(equipment("Banana"));

        // Lowercase letters sort after uppercase, so "apple" comes first descending
        assert_eq!(nicknames(&store), vec!["apple", "Banana"]);
    }

    #[test]
    fn test_add_without_nickname_does_not_sort() {
        let mut store = RequirementStore::new();
        store.add_equipment_requirement(equipment("Alpha"));
        store.add_equipment_requirement(equipment("Bravo"));
        assert_eq!(nicknames(&store), vec!["Bravo", "Alpha"]);

        store.add_equipment_requirement(equipment(""));
        assert_eq!(nicknames(&store), vec!["Bravo", "Alpha", ""]);

        // Next nickname event sorts the unnamed entry to the end
        store.add_equipment_requirement(equipment("Zulu"));
        assert_eq!(nicknames(&store), vec!["Zulu", "Bravo", "Alpha", ""]);
    }

    #[test]
    fn test_unnamed_entry_stays_in_place_until_sort() {
        let mut store = RequirementStore::new();
        store.add_equipment_requirement(equipment(""));
        store.add_equipment_requirement(EquipmentRequirement::new("a", "b", 1));
        store.add_equipment_requirement(EquipmentRequirement::new("c", "d", 1));

        let edit = EquipmentInfoToEdit::new(0, EquipmentRequirement::new("e", "f", 4));
        assert!(store.update_equipment_requirement(&edit));
        assert_eq!(store.requirement_by_equipments()[0].current_equipment_id, "e");
        assert_eq!(store.requirement_by_equipments()[1].current_equipment_id, "a");
    }

    #[test]
    fn test_update_equipment_with_nickname_resorts() {
        let mut store = RequirementStore::new();
        store.add_equipment_requirement(equipment("Bravo"));
        store.add_equipment_requirement(equipment("Alpha"));
        assert_eq!(nicknames(&store), vec!["Bravo", "Alpha"]);

        let edit = EquipmentInfoToEdit::new(1, equipment("Delta"));
        assert!(store.update_equipment_requirement(&edit));
        assert_eq!(nicknames(&store), vec!["Delta", "Bravo"]);
    }

    #[test]
    fn test_update_equipment_adding_nickname_resorts() {
        let mut store = RequirementStore::new();
        store.add_equipment_requirement(equipment("Charlie"));
        store.add_equipment_requirement(equipment(""));
        assert_eq!(nicknames(&store), vec!["Charlie", ""]);

        let edit = EquipmentInfoToEdit::new(1, equipment("Delta"));
        assert!(store.update_equipment_requirement(&edit));
        assert_eq!(nicknames(&store), vec!["Delta", "Charlie"]);
    }

    #[test]
    fn test_update_equipment_out_of_range_is_noop() {
        let mut store = RequirementStore::new();
        store.add_equipment_requirement(equipment("Bravo"));
        store.add_equipment_requirement(equipment("Alpha"));

        let len = store.requirement_by_equipments().len();
        let edit = EquipmentInfoToEdit::new(len, equipment("Zulu"));
        assert!(!store.update_equipment_requirement(&edit));
        assert_eq!(nicknames(&store), vec!["Bravo", "Alpha"]);
    }

    #[test]
    fn test_delete_equipment_requirement() {
        let mut store = RequirementStore::new();
        for name in ["Charlie", "Bravo", "Alpha"] {
            store.add_equipment_requirement(equipment(name));
        }

        let out_of_range = EquipmentInfoToEdit::new(7, equipment(""));
        assert!(!store.delete_equipment_requirement(&out_of_range));
        assert_eq!(store.requirement_by_equipments().len(), 3);

        let edit = EquipmentInfoToEdit::new(1, equipment("Bravo"));
        assert!(store.delete_equipment_requirement(&edit));
        assert_eq!(nicknames(&store), vec!["Charlie", "Alpha"]);
    }

    #[test]
    fn test_update_requirement_mode() {
        let mut store = RequirementStore::new();

        assert!(!store.update_requirement_mode("".parse().ok()));
        assert_eq!(store.requirement_mode(), RequirementMode::ByEquipment);

        assert!(!store.update_requirement_mode(None));
        assert_eq!(store.requirement_mode(), RequirementMode::ByEquipment);

        assert!(store.update_requirement_mode("ByPiece".parse().ok()));
        assert_eq!(store.requirement_mode(), RequirementMode::ByPiece);
    }

    #[test]
    fn test_update_inventory() {
        let mut store = RequirementStore::new();
        assert!(store.update_inventory([("p1", "5"), ("p2", "abc")]));

        assert_eq!(
            store.pieces_inventory().get("p1"),
            Some(&PieceInventory {
                piece_id: "p1".to_string(),
                in_stock_count: 5
            })
        );
        // Non-numeric counts are stored as 0
        assert_eq!(store.in_stock_count("p2"), 0);
        assert!(store.pieces_inventory().contains_key("p2"));
    }

    #[test]
    fn test_update_inventory_overwrites_existing() {
        let mut store = RequirementStore::new();
        store.update_inventory([("p1", "5")]);
        store.update_inventory([("p1", "12")]);

        assert_eq!(store.pieces_inventory().len(), 1);
        assert_eq!(store.in_stock_count("p1"), 12);
    }

    #[test]
    fn test_update_inventory_empty_form() {
        let mut store = RequirementStore::new();
        let form: Vec<(String, String)> = Vec::new();
        assert!(!store.update_inventory(form));
    }

    #[test]
    fn test_piece_shortfalls() {
        let mut store = RequirementStore::new();
        store.add_piece_requirement(PieceRequirement::new("gear", 4));
        store.add_piece_requirement(PieceRequirement::new("bolt", 2));
        store.add_piece_requirement(PieceRequirement::new("gear", 6));
        store.update_inventory([("gear", "3"), ("bolt", "8"), ("spare", "1")]);

        let shortfalls = store.piece_shortfalls();
        assert_eq!(
            shortfalls,
            vec![
                PieceShortfall {
                    piece_id: "bolt".to_string(),
                    required: 2,
                    in_stock: 8,
                    missing: 0,
                },
                PieceShortfall {
                    piece_id: "gear".to_string(),
                    required: 10,
                    in_stock: 3,
                    missing: 7,
                },
            ]
        );
    }

    #[test]
    fn test_negative_stock_counts_as_missing() {
        let mut store = RequirementStore::new();
        store.add_piece_requirement(PieceRequirement::new("gear", 2));
        store.update_inventory([("gear", "-1")]);

        assert_eq!(store.piece_shortfalls()[0].missing, 3);
    }

    #[test]
    fn test_active_requirement_count_follows_mode() {
        let mut store = RequirementStore::new();
        store.add_piece_requirement(PieceRequirement::new("a", 1));
        store.add_equipment_requirement(equipment("x"));
        store.add_equipment_requirement(equipment("y"));

        assert_eq!(store.active_requirement_count(), 2);
        store.update_requirement_mode(Some(RequirementMode::ByPiece));
        assert_eq!(store.active_requirement_count(), 1);
    }

    #[test]
    fn test_subscribers_see_applied_changes_only() {
        let mut store = RequirementStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |change| sink.borrow_mut().push(*change));

        store.add_piece_requirement(PieceRequirement::new("a", 1));
        store.delete_piece_requirement(&PieceInfoToEdit::new(5, PieceRequirement::new("a", 1)));
        store.update_requirement_mode(None);
        store.update_requirement_mode(Some(RequirementMode::ByPiece));
        store.update_inventory([("a", "1")]);
        store.add_equipment_requirement(equipment(""));

        assert_eq!(
            *seen.borrow(),
            vec![
                StoreChange::PiecesChanged,
                StoreChange::ModeChanged(RequirementMode::ByPiece),
                StoreChange::InventoryChanged,
                StoreChange::EquipmentsChanged,
            ]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = RequirementStore::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = store.subscribe(move |_| *sink.borrow_mut() += 1);

        store.add_piece_requirement(PieceRequirement::new("a", 1));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add_piece_requirement(PieceRequirement::new("b", 1));

        assert_eq!(*count.borrow(), 1);
    }
}
