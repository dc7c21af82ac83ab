//! Application services: the only entry point the console uses.
//!
//! Each method forwards to the `CampaignStore`, logs failures at this
//! boundary, and hands them back typed so the caller can tell "nothing there"
//! from "something broke". Create and update paths also run the
//! application-level checks (field validation, case-insensitive name
//! uniqueness) before anything is written.

use core_types::{
    ensure_unique_name, normalize_name, Campaign, CampaignCategory, Channel, ChannelCategory, Company,
    EntityKind, Named,
};

pub mod error;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{ErrorKind, ServiceError};
pub use store::CampaignStore;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub struct AppServices<S: CampaignStore> {
    store: S,
}

impl<S: CampaignStore> AppServices<S> {
    pub fn new(store: S) -> Self {
        tracing::debug!("Application services initialised.");
        Self { store }
    }

    #[cfg(test)]
    fn store(&self) -> &S {
        &self.store
    }

    // --- Campaigns ---

    /// All campaigns with their channels attached.
    pub async fn list_campaigns(&self) -> ServiceResult<Vec<Campaign>> {
        logged("list_campaigns", self.store.select_all_campaigns().await)
    }

    /// Same result as [`Self::list_campaigns`], fetched with two queries in total.
    pub async fn list_campaigns_batched(&self) -> ServiceResult<Vec<Campaign>> {
        logged("list_campaigns_batched", self.store.select_all_campaigns_batched().await)
    }

    pub async fn get_campaign(&self, campaign_id: i64) -> ServiceResult<Campaign> {
        logged("get_campaign", self.store.select_campaign(campaign_id).await)
    }

    pub async fn create_campaign(&self, campaign: Campaign) -> ServiceResult<Campaign> {
        let result = async {
            let campaign = self.checked_new_campaign(campaign).await?;
            Ok::<_, ServiceError>(self.store.insert_campaign(&campaign).await?)
        }
        .await;
        logged("create_campaign", result)
    }

    /// Creates the campaign and its channel associations atomically.
    pub async fn create_campaign_with_channels(
        &self,
        campaign: Campaign,
        channel_ids: &[i64],
    ) -> ServiceResult<Campaign> {
        let result = async {
            let campaign = self.checked_new_campaign(campaign).await?;
            Ok::<_, ServiceError>(self
                .store
                .insert_campaign_with_channels(&campaign, channel_ids)
                .await?)
        }
        .await;
        logged("create_campaign_with_channels", result)
    }

    /// Replaces the stored fields of `campaign.id` with those of `campaign`.
    pub async fn update_campaign(&self, mut campaign: Campaign) -> ServiceResult<Campaign> {
        let result = async {
            campaign.name = normalize_name(&campaign.name, EntityKind::Campaign)?;
            campaign.validate()?;
            let existing = self.store.select_all_campaigns().await?;
            ensure_unique_name(
                existing.iter().filter(|c| c.id != campaign.id).map(Named::name),
                &campaign.name,
                EntityKind::Campaign,
            )?;
            Ok::<_, ServiceError>(self.store.update_campaign(&campaign).await?)
        }
        .await;
        logged("update_campaign", result)
    }

    pub async fn delete_campaign(&self, campaign_id: i64) -> ServiceResult<()> {
        logged("delete_campaign", self.store.delete_campaign(campaign_id).await)
    }

    pub async fn attach_channel(&self, campaign_id: i64, channel_id: i64) -> ServiceResult<()> {
        logged("attach_channel", self.store.attach_channel(campaign_id, channel_id).await)
    }

    pub async fn detach_channel(&self, campaign_id: i64, channel_id: i64) -> ServiceResult<()> {
        logged("detach_channel", self.store.detach_channel(campaign_id, channel_id).await)
    }

    // --- Channels ---

    /// All channels with their category names attached.
    pub async fn list_channels(&self) -> ServiceResult<Vec<Channel>> {
        logged("list_channels", self.store.select_all_channels().await)
    }

    pub async fn create_channel(&self, mut channel: Channel) -> ServiceResult<Channel> {
        let result = async {
            channel.name = normalize_name(&channel.name, EntityKind::Channel)?;
            let existing = self.store.select_all_channels().await?;
            ensure_unique_name(existing.iter().map(Named::name), &channel.name, EntityKind::Channel)?;
            Ok::<_, ServiceError>(self.store.insert_channel(&channel).await?)
        }
        .await;
        logged("create_channel", result)
    }

    // --- Lookup tables ---

    pub async fn list_companies(&self) -> ServiceResult<Vec<Company>> {
        logged("list_companies", self.store.select_all_companies().await)
    }

    pub async fn list_campaign_categories(&self) -> ServiceResult<Vec<CampaignCategory>> {
        logged("list_campaign_categories", self.store.select_all_campaign_categories().await)
    }

    pub async fn list_channel_categories(&self) -> ServiceResult<Vec<ChannelCategory>> {
        logged("list_channel_categories", self.store.select_all_channel_categories().await)
    }

    pub async fn create_company(&self, name: &str) -> ServiceResult<Company> {
        let result = async {
            let name = normalize_name(name, Company::KIND)?;
            let existing = self.store.select_all_companies().await?;
            ensure_unique_name(existing.iter().map(Named::name), &name, Company::KIND)?;
            Ok::<_, ServiceError>(self.store.insert_company(&name).await?)
        }
        .await;
        logged("create_company", result)
    }

    pub async fn create_campaign_category(&self, name: &str) -> ServiceResult<CampaignCategory> {
        let result = async {
            let name = normalize_name(name, CampaignCategory::KIND)?;
            let existing = self.store.select_all_campaign_categories().await?;
            ensure_unique_name(existing.iter().map(Named::name), &name, CampaignCategory::KIND)?;
            Ok::<_, ServiceError>(self.store.insert_campaign_category(&name).await?)
        }
        .await;
        logged("create_campaign_category", result)
    }

    pub async fn create_channel_category(&self, name: &str) -> ServiceResult<ChannelCategory> {
        let result = async {
            let name = normalize_name(name, ChannelCategory::KIND)?;
            let existing = self.store.select_all_channel_categories().await?;
            ensure_unique_name(existing.iter().map(Named::name), &name, ChannelCategory::KIND)?;
            Ok::<_, ServiceError>(self.store.insert_channel_category(&name).await?)
        }
        .await;
        logged("create_channel_category", result)
    }

    /// Prepares a campaign for insert: trims the name, validates fields and
    /// checks the name is not taken.
    async fn checked_new_campaign(&self, mut campaign: Campaign) -> ServiceResult<Campaign> {
        campaign.id = 0;
        campaign.channels.clear();
        campaign.name = normalize_name(&campaign.name, EntityKind::Campaign)?;
        campaign.validate()?;
        let existing = self.store.select_all_campaigns().await?;
        ensure_unique_name(existing.iter().map(Named::name), &campaign.name, EntityKind::Campaign)?;
        Ok(campaign)
    }
}

/// Logs a failed operation and converts the error into a `ServiceError`.
fn logged<T, E>(op: &'static str, result: Result<T, E>) -> ServiceResult<T>
where
    E: Into<ServiceError>,
{
    result.map_err(|e| {
        let err = e.into();
        match err.kind() {
            // The user typed something unusable; the console already says so.
            ErrorKind::InvalidInput | ErrorKind::ConstraintViolation | ErrorKind::NotFound => {
                tracing::warn!(operation = op, error = %err, "Operation rejected.");
            }
            _ => tracing::error!(operation = op, error = ?err, "Operation failed."),
        }
        err
    })
}
