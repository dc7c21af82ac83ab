pub mod enums;
pub mod error;
pub mod structs;
pub mod validation;

// Re-export the core types to provide a clean public API.
pub use enums::EntityKind;
pub use error::CoreError;
pub use structs::{Campaign, CampaignCategory, Channel, ChannelCategory, Company, Named};
pub use validation::{check_money, ensure_unique_name, normalize_name, MAX_NAME_LEN, MONEY_SCALE};
