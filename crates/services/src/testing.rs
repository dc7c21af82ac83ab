//! An in-memory `CampaignStore` for exercising the services without a database.

use crate::store::CampaignStore;
use async_trait::async_trait;
use core_types::{Campaign, CampaignCategory, Channel, ChannelCategory, Company};
use database::RepositoryError;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    campaigns: Vec<Campaign>,
    channels: Vec<Channel>,
    links: Vec<(i64, i64)>,
    companies: Vec<Company>,
    campaign_categories: Vec<CampaignCategory>,
    channel_categories: Vec<ChannelCategory>,
    ids: Ids,
    writes: usize,
    fail_next: Option<RepositoryError>,
}

/// One identity sequence per table, as the database has.
#[derive(Default)]
struct Ids {
    campaign: i64,
    channel: i64,
    company: i64,
    campaign_category: i64,
    channel_category: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl State {
    fn check(&mut self) -> Result<(), RepositoryError> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn category_names(&self, category_id: i64) -> Vec<String> {
        self.channel_categories
            .iter()
            .filter(|c| c.id == category_id)
            .map(|c| c.name.clone())
            .collect()
    }

    fn with_channels(&self, campaign: &Campaign) -> Campaign {
        let mut campaign = campaign.clone();
        let mut channels: Vec<Channel> = self
            .links
            .iter()
            .filter(|(campaign_id, _)| *campaign_id == campaign.id)
            .filter_map(|(_, channel_id)| self.channels.iter().find(|ch| ch.id == *channel_id))
            .map(|ch| Channel {
                category_names: Vec::new(),
                ..ch.clone()
            })
            .collect();
        channels.sort_by_key(|ch| ch.id);
        campaign.channels = channels;
        campaign
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Number of successful mutating calls so far.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Makes the next store call fail with `err`.
    pub fn fail_next(&self, err: RepositoryError) {
        self.lock().fail_next = Some(err);
    }
}

fn not_found(what: &str, id: i64) -> RepositoryError {
    RepositoryError::NotFound(format!("{} {}", what, id))
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn select_all_campaigns(&self) -> Result<Vec<Campaign>, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        Ok(state.campaigns.iter().map(|c| state.with_channels(c)).collect())
    }

    async fn select_all_campaigns_batched(&self) -> Result<Vec<Campaign>, RepositoryError> {
        self.select_all_campaigns().await
    }

    async fn select_campaign(&self, campaign_id: i64) -> Result<Campaign, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        state
            .campaigns
            .iter()
            .find(|c| c.id == campaign_id)
            .map(|c| state.with_channels(c))
            .ok_or_else(|| not_found("campaign", campaign_id))
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        self.insert_campaign_with_channels(campaign, &[]).await
    }

    async fn insert_campaign_with_channels(
        &self,
        campaign: &Campaign,
        channel_ids: &[i64],
    ) -> Result<Campaign, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        if let Some(missing) = channel_ids
            .iter()
            .find(|id| !state.channels.iter().any(|ch| ch.id == **id))
        {
            return Err(RepositoryError::ConstraintViolation(format!(
                "channel {} does not exist",
                missing
            )));
        }

        let id = next(&mut state.ids.campaign);
        let stored = Campaign {
            id,
            channels: Vec::new(),
            ..campaign.clone()
        };
        state.campaigns.push(stored.clone());
        state.links.extend(channel_ids.iter().map(|channel_id| (id, *channel_id)));
        state.writes += 1;
        Ok(state.with_channels(&stored))
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        let slot = state
            .campaigns
            .iter_mut()
            .find(|c| c.id == campaign.id)
            .ok_or_else(|| not_found("campaign", campaign.id))?;
        *slot = Campaign {
            channels: Vec::new(),
            ..campaign.clone()
        };
        let updated = slot.clone();
        state.writes += 1;
        Ok(state.with_channels(&updated))
    }

    async fn delete_campaign(&self, campaign_id: i64) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        let before = state.campaigns.len();
        state.campaigns.retain(|c| c.id != campaign_id);
        if state.campaigns.len() == before {
            return Err(not_found("campaign", campaign_id));
        }
        state.links.retain(|(id, _)| *id != campaign_id);
        state.writes += 1;
        Ok(())
    }

    async fn attach_channel(&self, campaign_id: i64, channel_id: i64) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        let known = state.campaigns.iter().any(|c| c.id == campaign_id)
            && state.channels.iter().any(|ch| ch.id == channel_id);
        if !known || state.links.contains(&(campaign_id, channel_id)) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "cannot link campaign {} to channel {}",
                campaign_id, channel_id
            )));
        }
        state.links.push((campaign_id, channel_id));
        state.writes += 1;
        Ok(())
    }

    async fn detach_channel(&self, campaign_id: i64, channel_id: i64) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        let before = state.links.len();
        state.links.retain(|link| *link != (campaign_id, channel_id));
        if state.links.len() == before {
            return Err(not_found("campaign channel", channel_id));
        }
        state.writes += 1;
        Ok(())
    }

    async fn select_all_channels(&self) -> Result<Vec<Channel>, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        Ok(state
            .channels
            .iter()
            .map(|ch| Channel {
                category_names: state.category_names(ch.category_id),
                ..ch.clone()
            })
            .collect())
    }

    async fn insert_channel(&self, channel: &Channel) -> Result<Channel, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        let id = next(&mut state.ids.channel);
        let stored = Channel {
            id,
            category_names: Vec::new(),
            ..channel.clone()
        };
        state.channels.push(stored.clone());
        state.writes += 1;
        Ok(Channel {
            category_names: state.category_names(stored.category_id),
            ..stored
        })
    }

    async fn select_all_channel_categories(&self) -> Result<Vec<ChannelCategory>, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        Ok(state.channel_categories.clone())
    }

    async fn select_all_campaign_categories(&self) -> Result<Vec<CampaignCategory>, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        Ok(state.campaign_categories.clone())
    }

    async fn select_all_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        Ok(state.companies.clone())
    }

    async fn insert_channel_category(&self, name: &str) -> Result<ChannelCategory, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        let category = ChannelCategory {
            id: next(&mut state.ids.channel_category),
            name: name.to_string(),
        };
        state.channel_categories.push(category.clone());
        state.writes += 1;
        Ok(category)
    }

    async fn insert_campaign_category(&self, name: &str) -> Result<CampaignCategory, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        let category = CampaignCategory {
            id: next(&mut state.ids.campaign_category),
            name: name.to_string(),
        };
        state.campaign_categories.push(category.clone());
        state.writes += 1;
        Ok(category)
    }

    async fn insert_company(&self, name: &str) -> Result<Company, RepositoryError> {
        let mut state = self.lock();
        state.check()?;
        let company = Company {
            id: next(&mut state.ids.company),
            name: name.to_string(),
        };
        state.companies.push(company.clone());
        state.writes += 1;
        Ok(company)
    }
}
