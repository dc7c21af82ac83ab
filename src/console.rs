//! The interactive menu.
//!
//! Every action asks for what it needs, calls one or two service operations and
//! prints the outcome. A failed action prints a message and returns to the
//! menu; only an interrupt (Ctrl+C) or "Exit" ends the loop. Esc cancels the
//! current action.

use crate::render::{self, Labels};
use chrono::NaiveDate;
use core_types::{check_money, normalize_name, Campaign, EntityKind, Named};
use inquire::validator::Validation;
use inquire::{Confirm, InquireError, MultiSelect, Select, Text};
use rust_decimal::Decimal;
use services::{AppServices, CampaignStore, ServiceError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
enum ActionError {
    #[error(transparent)]
    Prompt(#[from] InquireError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

type ActionResult = Result<(), ActionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    ListCampaigns,
    ListChannels,
    ListCompanies,
    ListCategories,
    AddCampaign,
    UpdateCampaign,
    RecordResults,
    DeleteCampaign,
    AddChannel,
    AttachChannel,
    DetachChannel,
    AddCompany,
    AddCampaignCategory,
    AddChannelCategory,
    Exit,
}

impl MenuAction {
    const ALL: [MenuAction; 15] = [
        MenuAction::ListCampaigns,
        MenuAction::ListChannels,
        MenuAction::ListCompanies,
        MenuAction::ListCategories,
        MenuAction::AddCampaign,
        MenuAction::UpdateCampaign,
        MenuAction::RecordResults,
        MenuAction::DeleteCampaign,
        MenuAction::AddChannel,
        MenuAction::AttachChannel,
        MenuAction::DetachChannel,
        MenuAction::AddCompany,
        MenuAction::AddCampaignCategory,
        MenuAction::AddChannelCategory,
        MenuAction::Exit,
    ];

    fn label(&self) -> &'static str {
        match self {
            MenuAction::ListCampaigns => "List campaigns",
            MenuAction::ListChannels => "List channels",
            MenuAction::ListCompanies => "List companies",
            MenuAction::ListCategories => "List categories",
            MenuAction::AddCampaign => "Add campaign",
            MenuAction::UpdateCampaign => "Update campaign",
            MenuAction::RecordResults => "Record campaign results",
            MenuAction::DeleteCampaign => "Delete campaign",
            MenuAction::AddChannel => "Add channel",
            MenuAction::AttachChannel => "Attach channel to campaign",
            MenuAction::DetachChannel => "Detach channel from campaign",
            MenuAction::AddCompany => "Add company",
            MenuAction::AddCampaignCategory => "Add campaign category",
            MenuAction::AddChannelCategory => "Add channel category",
            MenuAction::Exit => "Exit",
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Runs the menu until the user exits.
pub async fn run<S: CampaignStore>(services: &AppServices<S>) -> anyhow::Result<()> {
    println!("\nCampaign Manager\n");

    loop {
        let action = match Select::new("What would you like to do?", MenuAction::ALL.to_vec())
            .with_page_size(MenuAction::ALL.len())
            .prompt()
        {
            Ok(MenuAction::Exit) => break,
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(action = %action, "Menu action selected.");
        match perform(services, action).await {
            Ok(()) => {}
            Err(ActionError::Prompt(InquireError::OperationCanceled)) => println!("Cancelled."),
            Err(ActionError::Prompt(InquireError::OperationInterrupted)) => break,
            Err(ActionError::Prompt(e)) => return Err(e.into()),
            Err(ActionError::Service(e)) => println!("{}", render::describe(&e)),
        }
        println!();
    }

    println!("Goodbye.");
    Ok(())
}

async fn perform<S: CampaignStore>(services: &AppServices<S>, action: MenuAction) -> ActionResult {
    match action {
        MenuAction::ListCampaigns => Ok(show_campaigns(services, false).await?),
        MenuAction::ListChannels => Ok(show_channels(services).await?),
        MenuAction::ListCompanies => Ok(show_companies(services).await?),
        MenuAction::ListCategories => Ok(show_categories(services).await?),
        MenuAction::AddCampaign => add_campaign(services).await,
        MenuAction::UpdateCampaign => update_campaign(services).await,
        MenuAction::RecordResults => record_results(services).await,
        MenuAction::DeleteCampaign => delete_campaign(services).await,
        MenuAction::AddChannel => add_channel(services).await,
        MenuAction::AttachChannel => attach_channel(services).await,
        MenuAction::DetachChannel => detach_channel(services).await,
        MenuAction::AddCompany => {
            let name = prompt_name(EntityKind::Company, None)?;
            let company = services.create_company(&name).await?;
            println!("Added company '{}' (#{}).", company.name, company.id);
            Ok(())
        }
        MenuAction::AddCampaignCategory => {
            let name = prompt_name(EntityKind::CampaignCategory, None)?;
            let category = services.create_campaign_category(&name).await?;
            println!("Added campaign category '{}' (#{}).", category.name, category.id);
            Ok(())
        }
        MenuAction::AddChannelCategory => {
            let name = prompt_name(EntityKind::ChannelCategory, None)?;
            let category = services.create_channel_category(&name).await?;
            println!("Added channel category '{}' (#{}).", category.name, category.id);
            Ok(())
        }
        MenuAction::Exit => Ok(()),
    }
}

// --- Listings (shared with the one-shot subcommands) ---

pub async fn show_campaigns<S: CampaignStore>(
    services: &AppServices<S>,
    batched: bool,
) -> Result<(), ServiceError> {
    let campaigns = if batched {
        services.list_campaigns_batched().await?
    } else {
        services.list_campaigns().await?
    };
    if campaigns.is_empty() {
        println!("No campaigns yet.");
        return Ok(());
    }
    let labels = Labels::new(
        &services.list_companies().await?,
        &services.list_campaign_categories().await?,
    );
    println!("{}", render::campaign_table(&campaigns, &labels));
    Ok(())
}

pub async fn show_channels<S: CampaignStore>(services: &AppServices<S>) -> Result<(), ServiceError> {
    let channels = services.list_channels().await?;
    if channels.is_empty() {
        println!("No channels yet.");
    } else {
        println!("{}", render::channel_table(&channels));
    }
    Ok(())
}

pub async fn show_companies<S: CampaignStore>(services: &AppServices<S>) -> Result<(), ServiceError> {
    let companies = services.list_companies().await?;
    println!(
        "{}",
        render::lookup_table("Company", companies.iter().map(|c| (c.id, c.name.as_str())))
    );
    Ok(())
}

pub async fn show_categories<S: CampaignStore>(services: &AppServices<S>) -> Result<(), ServiceError> {
    let campaign_categories = services.list_campaign_categories().await?;
    let channel_categories = services.list_channel_categories().await?;
    println!(
        "{}",
        render::lookup_table(
            "Campaign Category",
            campaign_categories.iter().map(|c| (c.id, c.name.as_str()))
        )
    );
    println!(
        "{}",
        render::lookup_table(
            "Channel Category",
            channel_categories.iter().map(|c| (c.id, c.name.as_str()))
        )
    );
    Ok(())
}

// --- Campaign actions ---

async fn add_campaign<S: CampaignStore>(services: &AppServices<S>) -> ActionResult {
    let companies = services.list_companies().await?;
    let categories = services.list_campaign_categories().await?;
    if companies.is_empty() || categories.is_empty() {
        println!("Add at least one company and one campaign category first.");
        return Ok(());
    }

    let name = prompt_name(EntityKind::Campaign, None)?;
    let start_date = prompt_date("Start date (YYYY-MM-DD):", None)?;
    let end_date = prompt_end_date(start_date, None)?;
    let company_id = select_id("Company:", choices(&companies, |c| c.id), None)?;
    let category_id = select_id("Campaign category:", choices(&categories, |c| c.id), None)?;
    let budget = prompt_money("Budget:", None)?;

    let channels = services.list_channels().await?;
    let channel_ids: Vec<i64> = if channels.is_empty() {
        Vec::new()
    } else {
        MultiSelect::new("Channels (optional):", choices(&channels, |c| c.id))
            .with_help_message("Space to select, Enter to confirm")
            .prompt()?
            .into_iter()
            .map(|choice| choice.id)
            .collect()
    };

    // Results are recorded later, so revenue and net profit start at zero.
    let campaign = Campaign {
        name,
        start_date,
        end_date,
        company_id,
        category_id,
        budget,
        ..Default::default()
    };
    let created = if channel_ids.is_empty() {
        services.create_campaign(campaign).await?
    } else {
        services.create_campaign_with_channels(campaign, &channel_ids).await?
    };
    if created.channels.is_empty() {
        println!("Added campaign '{}' (#{}).", created.name, created.id);
    } else {
        println!(
            "Added campaign '{}' (#{}) on {}.",
            created.name,
            created.id,
            created.channel_names().join(", ")
        );
    }
    Ok(())
}

/// Edits the descriptive fields and budget. Revenue and net profit are left to
/// "Record campaign results".
async fn update_campaign<S: CampaignStore>(services: &AppServices<S>) -> ActionResult {
    let Some(campaign_id) = pick_campaign(services, "Campaign to update:").await? else {
        return Ok(());
    };
    let current = services.get_campaign(campaign_id).await?;
    let companies = services.list_companies().await?;
    let categories = services.list_campaign_categories().await?;

    let name = prompt_name(EntityKind::Campaign, Some(&current.name))?;
    let start_date = prompt_date("Start date (YYYY-MM-DD):", Some(current.start_date))?;
    let end_date = prompt_end_date(start_date, current.end_date)?;
    let company_id = select_id("Company:", choices(&companies, |c| c.id), Some(current.company_id))?;
    let category_id = select_id(
        "Campaign category:",
        choices(&categories, |c| c.id),
        Some(current.category_id),
    )?;
    let budget = prompt_money("Budget:", Some(current.budget))?;

    let updated = services
        .update_campaign(Campaign {
            name,
            start_date,
            end_date,
            company_id,
            category_id,
            budget,
            ..current
        })
        .await?;
    println!("Updated campaign '{}' (#{}).", updated.name, updated.id);
    Ok(())
}

async fn record_results<S: CampaignStore>(services: &AppServices<S>) -> ActionResult {
    let Some(campaign_id) = pick_campaign(services, "Campaign:").await? else {
        return Ok(());
    };
    let mut campaign = services.get_campaign(campaign_id).await?;
    campaign.revenue = prompt_money("Revenue:", Some(campaign.revenue))?;
    campaign.net_profit = campaign.projected_net_profit();

    let updated = services.update_campaign(campaign).await?;
    println!(
        "Recorded results for '{}': revenue {}, net profit {}.",
        updated.name, updated.revenue, updated.net_profit
    );
    Ok(())
}

async fn delete_campaign<S: CampaignStore>(services: &AppServices<S>) -> ActionResult {
    let Some(campaign_id) = pick_campaign(services, "Campaign to delete:").await? else {
        return Ok(());
    };
    let confirmed = Confirm::new("Delete this campaign and its channel links?")
        .with_default(false)
        .prompt()?;
    if !confirmed {
        println!("Nothing deleted.");
        return Ok(());
    }
    services.delete_campaign(campaign_id).await?;
    println!("Deleted campaign #{}.", campaign_id);
    Ok(())
}

// --- Channel actions ---

async fn add_channel<S: CampaignStore>(services: &AppServices<S>) -> ActionResult {
    let categories = services.list_channel_categories().await?;
    if categories.is_empty() {
        println!("Add a channel category first.");
        return Ok(());
    }
    let name = prompt_name(EntityKind::Channel, None)?;
    let category_id = select_id("Channel category:", choices(&categories, |c| c.id), None)?;

    let channel = services
        .create_channel(core_types::Channel {
            name,
            category_id,
            ..Default::default()
        })
        .await?;
    println!("Added channel '{}' (#{}).", channel.name, channel.id);
    Ok(())
}

async fn attach_channel<S: CampaignStore>(services: &AppServices<S>) -> ActionResult {
    let Some(campaign_id) = pick_campaign(services, "Campaign:").await? else {
        return Ok(());
    };
    let campaign = services.get_campaign(campaign_id).await?;
    let available: Vec<_> = services
        .list_channels()
        .await?
        .into_iter()
        .filter(|ch| !campaign.channels.iter().any(|linked| linked.id == ch.id))
        .collect();
    if available.is_empty() {
        println!("No channels left to attach to '{}'.", campaign.name);
        return Ok(());
    }

    let channel_id = select_id("Channel to attach:", choices(&available, |c| c.id), None)?;
    services.attach_channel(campaign_id, channel_id).await?;
    println!("Attached channel #{} to '{}'.", channel_id, campaign.name);
    Ok(())
}

async fn detach_channel<S: CampaignStore>(services: &AppServices<S>) -> ActionResult {
    let Some(campaign_id) = pick_campaign(services, "Campaign:").await? else {
        return Ok(());
    };
    let campaign = services.get_campaign(campaign_id).await?;
    if campaign.channels.is_empty() {
        println!("'{}' has no channels attached.", campaign.name);
        return Ok(());
    }

    let channel_id = select_id("Channel to detach:", choices(&campaign.channels, |c| c.id), None)?;
    services.detach_channel(campaign_id, channel_id).await?;
    println!("Detached channel #{} from '{}'.", channel_id, campaign.name);
    Ok(())
}

// --- Prompts ---

/// A selectable record, shown as "name (#id)".
#[derive(Debug, Clone, PartialEq, Eq)]
struct Choice {
    id: i64,
    label: String,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.label, self.id)
    }
}

fn choices<T: Named>(items: &[T], id: impl Fn(&T) -> i64) -> Vec<Choice> {
    items
        .iter()
        .map(|item| Choice {
            id: id(item),
            label: item.name().to_string(),
        })
        .collect()
}

fn select_id(message: &str, options: Vec<Choice>, current: Option<i64>) -> Result<i64, InquireError> {
    let cursor = current
        .and_then(|id| options.iter().position(|choice| choice.id == id))
        .unwrap_or(0);
    Ok(Select::new(message, options).with_starting_cursor(cursor).prompt()?.id)
}

/// `None` when there are no campaigns to choose from.
async fn pick_campaign<S: CampaignStore>(
    services: &AppServices<S>,
    message: &str,
) -> Result<Option<i64>, ActionError> {
    let campaigns = services.list_campaigns().await?;
    if campaigns.is_empty() {
        println!("No campaigns yet.");
        return Ok(None);
    }
    Ok(Some(select_id(message, choices(&campaigns, |c| c.id), None)?))
}

fn prompt_name(kind: EntityKind, current: Option<&str>) -> Result<String, InquireError> {
    let message = format!("Name of the {}:", kind);
    let mut prompt = Text::new(&message).with_validator(move |input: &str| {
        Ok(match normalize_name(input, kind) {
            Ok(_) => Validation::Valid,
            Err(e) => Validation::Invalid(e.to_string().into()),
        })
    });
    if let Some(current) = current {
        prompt = prompt.with_default(current);
    }
    prompt.prompt()
}

fn prompt_date(message: &str, current: Option<NaiveDate>) -> Result<NaiveDate, InquireError> {
    let default = current.map(|d| d.format(DATE_FORMAT).to_string());
    let mut prompt = Text::new(message).with_validator(|input: &str| Ok(validation(parse_date(input))));
    if let Some(default) = &default {
        prompt = prompt.with_default(default);
    }
    parse_date(&prompt.prompt()?).map_err(|e| InquireError::Custom(e.into()))
}

fn prompt_end_date(start: NaiveDate, current: Option<NaiveDate>) -> Result<Option<NaiveDate>, InquireError> {
    let default = current.map(|d| d.format(DATE_FORMAT).to_string());
    let mut prompt = Text::new("End date (YYYY-MM-DD):")
        .with_help_message("Leave empty for an open-ended campaign")
        .with_validator(move |input: &str| Ok(validation(parse_end_date(input, start))));
    if let Some(default) = &default {
        prompt = prompt.with_default(default);
    }
    parse_end_date(&prompt.prompt()?, start).map_err(|e| InquireError::Custom(e.into()))
}

fn prompt_money(message: &str, current: Option<Decimal>) -> Result<Decimal, InquireError> {
    let default = current.map(|d| d.to_string());
    let mut prompt = Text::new(message).with_validator(|input: &str| Ok(validation(parse_money(input))));
    if let Some(default) = &default {
        prompt = prompt.with_default(default);
    }
    parse_money(&prompt.prompt()?).map_err(|e| InquireError::Custom(e.into()))
}

fn validation<T>(parsed: Result<T, String>) -> Validation {
    match parsed {
        Ok(_) => Validation::Valid,
        Err(message) => Validation::Invalid(message.into()),
    }
}

// --- Input parsing ---

fn parse_date(input: &str) -> Result<NaiveDate, String> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| format!("'{}' is not a date in the form YYYY-MM-DD", input))
}

fn parse_end_date(input: &str, start: NaiveDate) -> Result<Option<NaiveDate>, String> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    let end = parse_date(input)?;
    if end < start {
        return Err(format!("The end date must not be before the start date {}", start));
    }
    Ok(Some(end))
}

/// A non-negative amount with at most two decimal places.
fn parse_money(input: &str) -> Result<Decimal, String> {
    let input = input.trim();
    let amount = Decimal::from_str(input).map_err(|_| format!("'{}' is not an amount", input))?;
    if amount < Decimal::ZERO {
        return Err("The amount must not be negative".to_string());
    }
    check_money("amount", amount).map_err(|e| e.to_string())?;
    Ok(amount)
}
