//! Application-level checks run before anything is written.
//!
//! Name uniqueness is not backed by a database constraint, so callers list the
//! existing records and check the candidate here before inserting.

use crate::enums::EntityKind;
use crate::error::CoreError;
use rust_decimal::Decimal;

/// Longest name accepted for any entity.
pub const MAX_NAME_LEN: usize = 100;

/// Decimal places stored for money amounts (`NUMERIC(12,2)`).
pub const MONEY_SCALE: u32 = 2;

/// Amounts must stay strictly below this in absolute value (10^10).
const MONEY_LIMIT: i64 = 10_000_000_000;

/// Trims a user-supplied name and checks it is usable.
pub fn normalize_name(raw: &str, entity: EntityKind) -> Result<String, CoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidInput(
            format!("{} name", entity),
            "must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::InvalidInput(
            format!("{} name", entity),
            format!("must be at most {} characters", MAX_NAME_LEN),
        ));
    }
    Ok(name.to_string())
}

/// Checks that `amount` is stored exactly: no more than [`MONEY_SCALE`]
/// significant decimal places and an absolute value below 10^10.
pub fn check_money(field: &str, amount: Decimal) -> Result<(), CoreError> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(CoreError::InvalidInput(
            field.to_string(),
            format!("{} has more than {} decimal places", amount, MONEY_SCALE),
        ));
    }
    if amount.abs() >= Decimal::from(MONEY_LIMIT) {
        return Err(CoreError::InvalidInput(
            field.to_string(),
            format!("{} is too large; amounts must be below {}", amount, MONEY_LIMIT),
        ));
    }
    Ok(())
}

/// Rejects `candidate` if it matches any of `existing`, ignoring case and
/// surrounding whitespace.
pub fn ensure_unique_name<'a, I>(
    existing: I,
    candidate: &str,
    entity: EntityKind,
) -> Result<(), CoreError>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = candidate.trim().to_lowercase();
    if existing
        .into_iter()
        .any(|name| name.trim().to_lowercase() == wanted)
    {
        return Err(CoreError::DuplicateName {
            entity,
            name: candidate.trim().to_string(),
        });
    }
    Ok(())
}
