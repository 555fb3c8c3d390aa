use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;

/// Selects which requirement list the front-end currently operates on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum RequirementMode {
    ByPiece,
    #[default]
    ByEquipment,
}

impl RequirementMode {
    pub const ALL: [RequirementMode; 2] = [RequirementMode::ByPiece, RequirementMode::ByEquipment];
}

impl fmt::Display for RequirementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementMode::ByPiece => write!(f, "ByPiece"),
            RequirementMode::ByEquipment => write!(f, "ByEquipment"),
        }
    }
}

impl FromStr for RequirementMode {
    type Err = PlannerError;

    /// Only the two exact variant names are accepted. Anything else, including
    /// the empty string, is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ByPiece" => Ok(RequirementMode::ByPiece),
            "ByEquipment" => Ok(RequirementMode::ByEquipment),
            _ => Err(PlannerError::InvalidMode(s.to_string())),
        }
    }
}

/// A need for `count` units of a single piece
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PieceRequirement {
    pub piece_id: String,
    pub count: u32,
}

impl PieceRequirement {
    pub fn new(piece_id: impl Into<String>, count: u32) -> Self {
        Self {
            piece_id: piece_id.into(),
            count,
        }
    }
}

/// A swap of `count` units of one equipment for another
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentRequirement {
    pub current_equipment_id: String,
    pub target_equipment_id: String,
    pub count: u32,
    /// Optional label, used for ordering the equipment list
    #[serde(default)]
    pub nickname: String,
}

impl EquipmentRequirement {
    pub fn new(
        current_equipment_id: impl Into<String>,
        target_equipment_id: impl Into<String>,
        count: u32,
    ) -> Self {
        Self {
            current_equipment_id: current_equipment_id.into(),
            target_equipment_id: target_equipment_id.into(),
            count,
            nickname: String::new(),
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }
}

/// Current stock of a piece. `piece_id` doubles as the inventory map key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PieceInventory {
    pub piece_id: String,
    pub in_stock_count: i64,
}

/// Edit request for a piece requirement, addressed by list position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PieceInfoToEdit {
    pub index_in_store_array: usize,
    pub piece_id: String,
    pub count: u32,
}

impl PieceInfoToEdit {
    pub fn new(index_in_store_array: usize, requirement: PieceRequirement) -> Self {
        Self {
            index_in_store_array,
            piece_id: requirement.piece_id,
            count: requirement.count,
        }
    }

    pub fn to_requirement(&self) -> PieceRequirement {
        PieceRequirement {
            piece_id: self.piece_id.clone(),
            count: self.count,
        }
    }
}

/// Edit request for an equipment requirement, addressed by list position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentInfoToEdit {
    pub index_in_store_array: usize,
    pub current_equipment_id: String,
    pub target_equipment_id: String,
    pub count: u32,
    #[serde(default)]
    pub nickname: String,
}

impl EquipmentInfoToEdit {
    pub fn new(index_in_store_array: usize, requirement: EquipmentRequirement) -> Self {
        Self {
            index_in_store_array,
            current_equipment_id: requirement.current_equipment_id,
            target_equipment_id: requirement.target_equipment_id,
            count: requirement.count,
            nickname: requirement.nickname,
        }
    }

    pub fn to_requirement(&self) -> EquipmentRequirement {
        EquipmentRequirement {
            current_equipment_id: self.current_equipment_id.clone(),
            target_equipment_id: self.target_equipment_id.clone(),
            count: self.count,
            nickname: self.nickname.clone(),
        }
    }
}

/// Inventory form as submitted by a front-end: piece id -> free-text count
pub type InventoryForm = BTreeMap<String, String>;

/// Required versus stocked amount for one piece
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PieceShortfall {
    pub piece_id: String,
    pub required: u64,
    pub in_stock: i64,
    pub missing: u64,
}

/// Parses a free-text stock count.
///
/// Reads an optional sign followed by the leading decimal digits, ignoring
/// leading whitespace and anything after the digits (`"12abc"` is 12, `"3.9"`
/// is 3). Input without leading digits yields 0. Values beyond `i64` saturate.
pub fn parse_stock_count(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            let digit = i64::from(b - b'0');
            if negative {
                acc.saturating_mul(10).saturating_sub(digit)
            } else {
                acc.saturating_mul(10).saturating_add(digit)
            }
        })
}
