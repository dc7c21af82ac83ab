use crate::enums::EntityKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("A {entity} named '{name}' already exists")]
    DuplicateName { entity: EntityKind, name: String },
}
