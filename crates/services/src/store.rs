use async_trait::async_trait;
use core_types::{Campaign, CampaignCategory, Channel, ChannelCategory, Company};
use database::{DbRepository, RepositoryError};

/// The persistence operations the services depend on.
///
/// `DbRepository` is the production implementation; tests substitute an
/// in-memory store.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn select_all_campaigns(&self) -> Result<Vec<Campaign>, RepositoryError>;
    async fn select_all_campaigns_batched(&self) -> Result<Vec<Campaign>, RepositoryError>;
    async fn select_campaign(&self, campaign_id: i64) -> Result<Campaign, RepositoryError>;
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError>;
    async fn insert_campaign_with_channels(
        &self,
        campaign: &Campaign,
        channel_ids: &[i64],
    ) -> Result<Campaign, RepositoryError>;
    async fn update_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError>;
    async fn delete_campaign(&self, campaign_id: i64) -> Result<(), RepositoryError>;

    async fn attach_channel(&self, campaign_id: i64, channel_id: i64) -> Result<(), RepositoryError>;
    async fn detach_channel(&self, campaign_id: i64, channel_id: i64) -> Result<(), RepositoryError>;

    async fn select_all_channels(&self) -> Result<Vec<Channel>, RepositoryError>;
    async fn insert_channel(&self, channel: &Channel) -> Result<Channel, RepositoryError>;

    async fn select_all_channel_categories(&self) -> Result<Vec<ChannelCategory>, RepositoryError>;
    async fn select_all_campaign_categories(&self) -> Result<Vec<CampaignCategory>, RepositoryError>;
    async fn select_all_companies(&self) -> Result<Vec<Company>, RepositoryError>;
    async fn insert_channel_category(&self, name: &str) -> Result<ChannelCategory, RepositoryError>;
    async fn insert_campaign_category(&self, name: &str) -> Result<CampaignCategory, RepositoryError>;
    async fn insert_company(&self, name: &str) -> Result<Company, RepositoryError>;
}

#[async_trait]
impl CampaignStore for DbRepository {
    async fn select_all_campaigns(&self) -> Result<Vec<Campaign>, RepositoryError> {
        DbRepository::select_all_campaigns(self).await
    }

    async fn select_all_campaigns_batched(&self) -> Result<Vec<Campaign>, RepositoryError> {
        DbRepository::select_all_campaigns_batched(self).await
    }

    async fn select_campaign(&self, campaign_id: i64) -> Result<Campaign, RepositoryError> {
        DbRepository::select_campaign(self, campaign_id).await
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        DbRepository::insert_campaign(self, campaign).await
    }

    async fn insert_campaign_with_channels(
        &self,
        campaign: &Campaign,
        channel_ids: &[i64],
    ) -> Result<Campaign, RepositoryError> {
        DbRepository::insert_campaign_with_channels(self, campaign, channel_ids).await
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        DbRepository::update_campaign(self, campaign).await
    }

    async fn delete_campaign(&self, campaign_id: i64) -> Result<(), RepositoryError> {
        DbRepository::delete_campaign(self, campaign_id).await
    }

    async fn attach_channel(&self, campaign_id: i64, channel_id: i64) -> Result<(), RepositoryError> {
        DbRepository::attach_channel(self, campaign_id, channel_id).await
    }

    async fn detach_channel(&self, campaign_id: i64, channel_id: i64) -> Result<(), RepositoryError> {
        DbRepository::detach_channel(self, campaign_id, channel_id).await
    }

    async fn select_all_channels(&self) -> Result<Vec<Channel>, RepositoryError> {
        DbRepository::select_all_channels(self).await
    }

    async fn insert_channel(&self, channel: &Channel) -> Result<Channel, RepositoryError> {
        DbRepository::insert_channel(self, channel).await
    }

    async fn select_all_channel_categories(&self) -> Result<Vec<ChannelCategory>, RepositoryError> {
        DbRepository::select_all_channel_categories(self).await
    }

    async fn select_all_campaign_categories(&self) -> Result<Vec<CampaignCategory>, RepositoryError> {
        DbRepository::select_all_campaign_categories(self).await
    }

    async fn select_all_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        DbRepository::select_all_companies(self).await
    }

    async fn insert_channel_category(&self, name: &str) -> Result<ChannelCategory, RepositoryError> {
        DbRepository::insert_channel_category(self, name).await
    }

    async fn insert_campaign_category(&self, name: &str) -> Result<CampaignCategory, RepositoryError> {
        DbRepository::insert_campaign_category(self, name).await
    }

    async fn insert_company(&self, name: &str) -> Result<Company, RepositoryError> {
        DbRepository::insert_company(self, name).await
    }
}
