//! Turns listings and failures into text for the terminal.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use core_types::{Campaign, CampaignCategory, Channel, Company};
use services::{ErrorKind, ServiceError};
use std::collections::HashMap;

/// Names to show in place of the foreign keys on a campaign row.
#[derive(Debug, Default)]
pub struct Labels {
    companies: HashMap<i64, String>,
    categories: HashMap<i64, String>,
}

impl Labels {
    pub fn new(companies: &[Company], categories: &[CampaignCategory]) -> Self {
        Self {
            companies: companies.iter().map(|c| (c.id, c.name.clone())).collect(),
            categories: categories.iter().map(|c| (c.id, c.name.clone())).collect(),
        }
    }

    fn company(&self, id: i64) -> String {
        self.companies.get(&id).cloned().unwrap_or_else(|| format!("#{}", id))
    }

    fn category(&self, id: i64) -> String {
        self.categories.get(&id).cloned().unwrap_or_else(|| format!("#{}", id))
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// One row per campaign; the last column lists its channels one per line.
pub fn campaign_table(campaigns: &[Campaign], labels: &Labels) -> Table {
    let mut table = new_table(vec![
        "ID", "Name", "Start", "End", "Company", "Category", "Budget", "Revenue", "Net Profit", "Channels",
    ]);
    for campaign in campaigns {
        table.add_row(vec![
            campaign.id.to_string(),
            campaign.name.clone(),
            campaign.start_date.to_string(),
            campaign.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            labels.company(campaign.company_id),
            labels.category(campaign.category_id),
            campaign.budget.to_string(),
            campaign.revenue.to_string(),
            campaign.net_profit.to_string(),
            channel_list(&campaign.channels),
        ]);
    }
    table
}

fn channel_list(channels: &[Channel]) -> String {
    if channels.is_empty() {
        return "-".to_string();
    }
    channels
        .iter()
        .map(|ch| format!("{} (#{})", ch.name, ch.id))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn channel_table(channels: &[Channel]) -> Table {
    let mut table = new_table(vec!["ID", "Name", "Category"]);
    for channel in channels {
        let category = if channel.category_names.is_empty() {
            format!("#{}", channel.category_id)
        } else {
            channel.category_names.join(", ")
        };
        table.add_row(vec![channel.id.to_string(), channel.name.clone(), category]);
    }
    table
}

/// Two-column table for the lookup entities.
pub fn lookup_table<'a, I>(name_header: &str, rows: I) -> Table
where
    I: IntoIterator<Item = (i64, &'a str)>,
{
    let mut table = new_table(vec!["ID", name_header]);
    for (id, name) in rows {
        table.add_row(vec![id.to_string(), name.to_string()]);
    }
    table
}

/// The line shown to the user when an operation fails. Details go to the log.
pub fn describe(err: &ServiceError) -> String {
    match err.kind() {
        ErrorKind::Connection => {
            "Could not reach the database. Check that it is running, then try again.".to_string()
        }
        ErrorKind::ConstraintViolation => format!("The change was rejected. {}", err),
        ErrorKind::NotFound => format!("Nothing matched. {}", err),
        ErrorKind::MalformedRow => {
            "The database returned data in an unexpected shape. See the log for details.".to_string()
        }
        ErrorKind::Timeout => "The database took too long to respond. Try again.".to_string(),
        ErrorKind::InvalidInput => err.to_string(),
        ErrorKind::Database => "The database reported an error. See the log for details.".to_string(),
    }
}
