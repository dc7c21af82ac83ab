//! Row-to-entity mapping.
//!
//! Every mapped type declares a table of `(column name, field assignment)`
//! pairs. Before any field is read, the column names actually present in the
//! result are compared against that table, so a SELECT list that drifts from
//! the mapping fails as `MalformedRow` instead of filling the wrong field.
//! An empty result has no rows to inspect, so [`check_statement`] compares
//! the columns a prepared statement describes instead.

use crate::error::RepositoryError;
use core_types::{Campaign, CampaignCategory, Channel, ChannelCategory, Company};
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column as _, Executor as _, Row, Statement as _};

/// Copies the value of the named column into one field of `T`.
pub type Assign<T> = fn(&mut T, &PgRow, &str) -> Result<(), sqlx::Error>;

/// One entry of a mapping table.
pub struct Column<T: 'static> {
    pub name: &'static str,
    pub assign: Assign<T>,
}

/// A type that can be built from a result row by column name.
pub trait RowMapping: Default + Sized + 'static {
    /// Used in error messages.
    const ENTITY: &'static str;
    const COLUMNS: &'static [Column<Self>];

    fn column_names() -> Vec<&'static str> {
        Self::COLUMNS.iter().map(|c| c.name).collect()
    }
}

macro_rules! column {
    ($name:literal => $($field:ident).+) => {
        Column {
            name: $name,
            assign: |entity, row, col| {
                entity.$($field).+ = row.try_get(col)?;
                Ok(())
            },
        }
    };
}

impl RowMapping for Campaign {
    const ENTITY: &'static str = "campaign";
    const COLUMNS: &'static [Column<Self>] = &[
        column!("campaign_id" => id),
        column!("campaign_name" => name),
        column!("start_date" => start_date),
        column!("end_date" => end_date),
        column!("company_id" => company_id),
        column!("campaign_category_id" => category_id),
        column!("budget" => budget),
        column!("revenue" => revenue),
        column!("net_profit" => net_profit),
    ];
}

impl RowMapping for Channel {
    const ENTITY: &'static str = "channel";
    const COLUMNS: &'static [Column<Self>] = &[
        column!("channel_id" => id),
        column!("channel_name" => name),
        column!("channel_category_id" => category_id),
    ];
}

impl RowMapping for Company {
    const ENTITY: &'static str = "company";
    const COLUMNS: &'static [Column<Self>] = &[
        column!("company_id" => id),
        column!("company_name" => name),
    ];
}

impl RowMapping for CampaignCategory {
    const ENTITY: &'static str = "campaign category";
    const COLUMNS: &'static [Column<Self>] = &[
        column!("campaign_category_id" => id),
        column!("campaign_category_name" => name),
    ];
}

impl RowMapping for ChannelCategory {
    const ENTITY: &'static str = "channel category";
    const COLUMNS: &'static [Column<Self>] = &[
        column!("channel_category_id" => id),
        column!("channel_category_name" => name),
    ];
}

/// A category label looked up for a single channel.
#[derive(Debug, Default)]
pub(crate) struct CategoryLabel {
    pub name: String,
}

impl RowMapping for CategoryLabel {
    const ENTITY: &'static str = "channel category label";
    const COLUMNS: &'static [Column<Self>] = &[column!("channel_category_name" => name)];
}

/// A channel row tagged with the campaign it is attached to (batched path).
#[derive(Debug, Default)]
pub(crate) struct LinkedChannel {
    pub campaign_id: i64,
    pub channel: Channel,
}

impl RowMapping for LinkedChannel {
    const ENTITY: &'static str = "campaign channel";
    const COLUMNS: &'static [Column<Self>] = &[
        column!("campaign_id" => campaign_id),
        column!("channel_id" => channel.id),
        column!("channel_name" => channel.name),
        column!("channel_category_id" => channel.category_id),
    ];
}

/// A category label tagged with its channel (batched path).
#[derive(Debug, Default)]
pub(crate) struct LinkedCategoryLabel {
    pub channel_id: i64,
    pub name: String,
}

impl RowMapping for LinkedCategoryLabel {
    const ENTITY: &'static str = "channel category label";
    const COLUMNS: &'static [Column<Self>] = &[
        column!("channel_id" => channel_id),
        column!("channel_category_name" => name),
    ];
}

/// Compares the columns a result carries with the ones a mapping declares.
///
/// Order is irrelevant because fields are read by name; missing and
/// unexpected columns are both rejected.
pub fn check_columns(entity: &str, expected: &[&str], actual: &[&str]) -> Result<(), RepositoryError> {
    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|name| !actual.contains(name))
        .collect();
    let unexpected: Vec<&str> = actual
        .iter()
        .copied()
        .filter(|name| !expected.contains(name))
        .collect();

    if missing.is_empty() && unexpected.is_empty() && expected.len() == actual.len() {
        return Ok(());
    }

    let mut problems = Vec::new();
    if !missing.is_empty() {
        problems.push(format!("missing [{}]", missing.join(", ")));
    }
    if !unexpected.is_empty() {
        problems.push(format!("unexpected [{}]", unexpected.join(", ")));
    }
    if problems.is_empty() {
        problems.push(format!("duplicate columns in [{}]", actual.join(", ")));
    }
    Err(RepositoryError::MalformedRow(format!(
        "{} result does not match its mapping: {}",
        entity,
        problems.join("; ")
    )))
}

fn validate_row<T: RowMapping>(row: &PgRow) -> Result<(), RepositoryError> {
    let actual: Vec<&str> = row.columns().iter().map(|c| c.name()).collect();
    check_columns(T::ENTITY, &T::column_names(), &actual)
}

fn assign_all<T: RowMapping>(row: &PgRow) -> Result<T, RepositoryError> {
    let mut entity = T::default();
    for column in T::COLUMNS {
        (column.assign)(&mut entity, row, column.name)?;
    }
    Ok(entity)
}

/// Maps a single row after validating its columns.
pub fn map_row<T: RowMapping>(row: &PgRow) -> Result<T, RepositoryError> {
    validate_row::<T>(row)?;
    assign_all(row)
}

/// Maps every row of a result. All rows of one result share their column
/// metadata, so only the first is validated; an empty result passes
/// unchecked.
pub fn map_rows<T: RowMapping>(rows: &[PgRow]) -> Result<Vec<T>, RepositoryError> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    validate_row::<T>(first)?;
    rows.iter().map(|row| assign_all::<T>(row)).collect()
}

/// Prepares `sql` without running it and checks the columns it would return.
pub async fn check_statement<T: RowMapping>(conn: &mut PgConnection, sql: &str) -> Result<(), RepositoryError> {
    let statement = (&mut *conn).prepare(sql).await?;
    let actual: Vec<&str> = statement.columns().iter().map(|c| c.name()).collect();
    check_columns(T::ENTITY, &T::column_names(), &actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_columns_in_any_order_pass() {
        let expected = ["channel_id", "channel_name", "channel_category_id"];
        let actual = ["channel_name", "channel_category_id", "channel_id"];
        assert!(check_columns("channel", &expected, &actual).is_ok());
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let expected = ["channel_id", "channel_name", "channel_category_id"];
        let actual = ["channel_id", "channel_name"];
        match check_columns("channel", &expected, &actual) {
            Err(RepositoryError::MalformedRow(msg)) => {
                assert!(msg.contains("missing [channel_category_id]"), "{}", msg)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn extra_column_is_rejected() {
        let expected = ["company_id", "company_name"];
        let actual = ["company_id", "company_name", "created_at"];
        match check_columns("company", &expected, &actual) {
            Err(RepositoryError::MalformedRow(msg)) => assert!(msg.contains("unexpected [created_at]")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn duplicated_column_is_rejected() {
        let expected = ["company_id", "company_name"];
        let actual = ["company_id", "company_name", "company_name"];
        assert!(check_columns("company", &expected, &actual).is_err());
    }

    #[test]
    fn mapping_tables_have_unique_column_names() {
        fn assert_unique(names: Vec<&'static str>) {
            let mut sorted = names.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), names.len(), "duplicate in {:?}", names);
        }
        assert_unique(Campaign::column_names());
        assert_unique(Channel::column_names());
        assert_unique(Company::column_names());
        assert_unique(CampaignCategory::column_names());
        assert_unique(ChannelCategory::column_names());
        assert_unique(LinkedChannel::column_names());
        assert_unique(LinkedCategoryLabel::column_names());
    }

    #[test]
    fn campaign_maps_every_persisted_field() {
        assert_eq!(Campaign::COLUMNS.len(), 9);
        assert_eq!(Channel::COLUMNS.len(), 3);
    }
}
