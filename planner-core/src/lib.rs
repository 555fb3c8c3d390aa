pub mod error;
pub mod models;
pub mod settings;
pub mod snapshot;
pub mod store;

// Re-export commonly used types
pub use error::{PlannerError, Result};
pub use models::{
    parse_stock_count, EquipmentInfoToEdit, EquipmentRequirement, InventoryForm, PieceInfoToEdit,
    PieceInventory, PieceRequirement, PieceShortfall, RequirementMode,
};
pub use settings::{Settings, CONFIG_ENV_VAR};
pub use snapshot::{export_to_json, import_from_json, StoreSnapshot};
pub use store::{RequirementStore, StoreChange, SubscriptionId};
