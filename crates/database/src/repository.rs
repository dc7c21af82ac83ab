use crate::error::RepositoryError;
use crate::mapping::{check_statement, map_row, map_rows, CategoryLabel, LinkedCategoryLabel, LinkedChannel};
use crate::queries;
use configuration::PoolConfig;
use core_types::{Campaign, CampaignCategory, Channel, ChannelCategory, Company};
use sqlx::postgres::{PgConnection, PgPool};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

/// Longest sleep between two attempts, however many retries are configured.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Timeout and retry policy applied to every repository operation.
#[derive(Debug, Clone, Copy)]
pub struct OperationPolicy {
    /// Upper bound on one operation, connection checkout included.
    pub timeout: Duration,
    /// Extra attempts after a connection failure (idempotent operations only).
    pub retry_attempts: u32,
    /// Delay before the first retry, doubled for each later one up to
    /// 30 seconds.
    pub retry_backoff: Duration,
}

impl OperationPolicy {
    pub fn from_config(pool: &PoolConfig) -> Self {
        Self {
            timeout: pool.operation_timeout(),
            retry_attempts: pool.retry_attempts,
            retry_backoff: pool.retry_backoff(),
        }
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(MAX_BACKOFF)
    }
}

impl Default for OperationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry_attempts: 2,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
///
/// Each method checks one connection out of the pool and holds it until the
/// method returns. Reads that assemble an aggregate (a campaign with its
/// channels, a channel with its category names) run all of their queries on
/// that one connection.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
    policy: OperationPolicy,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self::with_policy(pool, OperationPolicy::default())
    }

    pub fn with_policy(pool: PgPool, policy: OperationPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Checks every SELECT in the catalog against its row mapping.
    ///
    /// Statements are prepared, not run, so this also covers tables that are
    /// still empty. Any mismatch is a `MalformedRow`.
    pub async fn verify_mappings(&self) -> Result<(), RepositoryError> {
        self.run("verify_mappings", async {
            let mut conn = self.pool.acquire().await?;
            check_statement::<Campaign>(&mut conn, queries::SELECT_ALL_CAMPAIGNS).await?;
            check_statement::<Campaign>(&mut conn, queries::SELECT_CAMPAIGN_BY_ID).await?;
            check_statement::<Channel>(&mut conn, queries::SELECT_CHANNELS_FOR_CAMPAIGN).await?;
            check_statement::<LinkedChannel>(&mut conn, queries::SELECT_CHANNELS_FOR_CAMPAIGNS).await?;
            check_statement::<Channel>(&mut conn, queries::SELECT_ALL_CHANNELS).await?;
            check_statement::<CategoryLabel>(&mut conn, queries::SELECT_CATEGORY_NAMES_FOR_CHANNEL).await?;
            check_statement::<LinkedCategoryLabel>(&mut conn, queries::SELECT_CATEGORY_NAMES_FOR_CHANNELS)
                .await?;
            check_statement::<ChannelCategory>(&mut conn, queries::SELECT_ALL_CHANNEL_CATEGORIES).await?;
            check_statement::<CampaignCategory>(&mut conn, queries::SELECT_ALL_CAMPAIGN_CATEGORIES).await?;
            check_statement::<Company>(&mut conn, queries::SELECT_ALL_COMPANIES).await?;
            tracing::debug!("Statement columns match their row mappings.");
            Ok(())
        })
        .await
    }

    // ==========================================================================
    // Campaigns
    // ==========================================================================

    /// Fetches every campaign with its attached channels.
    ///
    /// One query for the campaigns, then one channel query per campaign, in
    /// result order. See [`Self::select_all_campaigns_batched`] for the
    /// two-query variant.
    pub async fn select_all_campaigns(&self) -> Result<Vec<Campaign>, RepositoryError> {
        self.run_with_retry("select_all_campaigns", move || async move {
            let mut conn = self.pool.acquire().await?;
            let rows = sqlx::query(queries::SELECT_ALL_CAMPAIGNS)
                .fetch_all(&mut *conn)
                .await?;
            let mut campaigns: Vec<Campaign> = map_rows(&rows)?;

            for campaign in &mut campaigns {
                campaign.channels = fetch_channels_for_campaign(&mut conn, campaign.id).await?;
            }
            tracing::debug!(count = campaigns.len(), "Fetched campaigns.");
            Ok(campaigns)
        })
        .await
    }

    /// Fetches every campaign with its channels using exactly two queries.
    pub async fn select_all_campaigns_batched(&self) -> Result<Vec<Campaign>, RepositoryError> {
        self.run_with_retry("select_all_campaigns_batched", move || async move {
            let mut conn = self.pool.acquire().await?;
            let rows = sqlx::query(queries::SELECT_ALL_CAMPAIGNS)
                .fetch_all(&mut *conn)
                .await?;
            let mut campaigns: Vec<Campaign> = map_rows(&rows)?;
            if campaigns.is_empty() {
                return Ok(campaigns);
            }

            let ids: Vec<i64> = campaigns.iter().map(|c| c.id).collect();
            let rows = sqlx::query(queries::SELECT_CHANNELS_FOR_CAMPAIGNS)
                .bind(&ids)
                .fetch_all(&mut *conn)
                .await?;
            let linked: Vec<LinkedChannel> = map_rows(&rows)?;

            let mut by_campaign: HashMap<i64, Vec<Channel>> = HashMap::new();
            for link in linked {
                by_campaign.entry(link.campaign_id).or_default().push(link.channel);
            }
            for campaign in &mut campaigns {
                campaign.channels = by_campaign.remove(&campaign.id).unwrap_or_default();
            }
            Ok(campaigns)
        })
        .await
    }

    /// Fetches one campaign with its channels.
    pub async fn select_campaign(&self, campaign_id: i64) -> Result<Campaign, RepositoryError> {
        self.run_with_retry("select_campaign", move || async move {
            let mut conn = self.pool.acquire().await?;
            fetch_campaign(&mut conn, campaign_id).await
        })
        .await
    }

    /// Inserts a campaign and returns it with its database-assigned id.
    ///
    /// The stored `net_profit` is whatever the caller supplied.
    pub async fn insert_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        self.run("insert_campaign", async {
            let mut conn = self.pool.acquire().await?;
            let id = insert_campaign_row(&mut conn, campaign).await?;
            tracing::info!(campaign_id = id, name = %campaign.name, "Campaign inserted.");
            Ok(Campaign {
                id,
                channels: Vec::new(),
                ..campaign.clone()
            })
        })
        .await
    }

    /// Inserts a campaign and attaches `channel_ids` to it in one transaction.
    ///
    /// Nothing is written if any step fails: the transaction rolls back when it
    /// is dropped without a commit.
    pub async fn insert_campaign_with_channels(
        &self,
        campaign: &Campaign,
        channel_ids: &[i64],
    ) -> Result<Campaign, RepositoryError> {
        self.run("insert_campaign_with_channels", async {
            let mut tx = self.pool.begin().await?;

            let id = insert_campaign_row(&mut tx, campaign).await?;
            for channel_id in channel_ids {
                sqlx::query(queries::INSERT_CAMPAIGN_CHANNEL)
                    .bind(id)
                    .bind(channel_id)
                    .execute(&mut *tx)
                    .await?;
            }
            let channels = fetch_channels_for_campaign(&mut tx, id).await?;

            tx.commit().await?;
            tracing::info!(
                campaign_id = id,
                channels = channel_ids.len(),
                "Campaign inserted with channels."
            );
            Ok(Campaign {
                id,
                channels,
                ..campaign.clone()
            })
        })
        .await
    }

    /// Replaces every mutable field of the campaign with `campaign.id`.
    ///
    /// Channel associations are untouched. Returns the stored campaign.
    pub async fn update_campaign(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        self.run_with_retry("update_campaign", move || async move {
            let mut conn = self.pool.acquire().await?;
            let result = sqlx::query(queries::UPDATE_CAMPAIGN)
                .bind(campaign.id)
                .bind(&campaign.name)
                .bind(campaign.start_date)
                .bind(campaign.end_date)
                .bind(campaign.company_id)
                .bind(campaign.category_id)
                .bind(campaign.budget)
                .bind(campaign.revenue)
                .bind(campaign.net_profit)
                .execute(&mut *conn)
                .await?;

            if result.rows_affected() == 0 {
                return Err(campaign_not_found(campaign.id));
            }
            tracing::info!(campaign_id = campaign.id, "Campaign updated.");
            fetch_campaign(&mut conn, campaign.id).await
        })
        .await
    }

    /// Deletes a campaign together with its channel associations.
    pub async fn delete_campaign(&self, campaign_id: i64) -> Result<(), RepositoryError> {
        self.run_with_retry("delete_campaign", move || async move {
            let mut tx = self.pool.begin().await?;

            let detached = sqlx::query(queries::DELETE_CHANNELS_FOR_CAMPAIGN)
                .bind(campaign_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            let deleted = sqlx::query(queries::DELETE_CAMPAIGN)
                .bind(campaign_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if deleted == 0 {
                return Err(campaign_not_found(campaign_id));
            }
            tx.commit().await?;
            tracing::info!(campaign_id, detached, "Campaign deleted.");
            Ok(())
        })
        .await
    }

    // ==========================================================================
    // Campaign <-> Channel association
    // ==========================================================================

    /// Attaches an existing channel to an existing campaign.
    ///
    /// Unknown ids and an already-attached pair are constraint violations.
    pub async fn attach_channel(&self, campaign_id: i64, channel_id: i64) -> Result<(), RepositoryError> {
        self.run("attach_channel", async {
            let mut conn = self.pool.acquire().await?;
            sqlx::query(queries::INSERT_CAMPAIGN_CHANNEL)
                .bind(campaign_id)
                .bind(channel_id)
                .execute(&mut *conn)
                .await?;
            tracing::info!(campaign_id, channel_id, "Channel attached to campaign.");
            Ok(())
        })
        .await
    }

    pub async fn detach_channel(&self, campaign_id: i64, channel_id: i64) -> Result<(), RepositoryError> {
        self.run_with_retry("detach_channel", move || async move {
            let mut conn = self.pool.acquire().await?;
            let removed = sqlx::query(queries::DELETE_CAMPAIGN_CHANNEL)
                .bind(campaign_id)
                .bind(channel_id)
                .execute(&mut *conn)
                .await?
                .rows_affected();
            if removed == 0 {
                return Err(RepositoryError::NotFound(format!(
                    "channel {} is not attached to campaign {}",
                    channel_id, campaign_id
                )));
            }
            Ok(())
        })
        .await
    }

    /// Fetches the channels attached to one campaign.
    pub async fn select_channels_for_campaign(&self, campaign_id: i64) -> Result<Vec<Channel>, RepositoryError> {
        self.run_with_retry("select_channels_for_campaign", move || async move {
            let mut conn = self.pool.acquire().await?;
            fetch_channels_for_campaign(&mut conn, campaign_id).await
        })
        .await
    }

    // ==========================================================================
    // Channels
    // ==========================================================================

    /// Fetches every channel with its category name(s), one lookup per channel.
    pub async fn select_all_channels(&self) -> Result<Vec<Channel>, RepositoryError> {
        self.run_with_retry("select_all_channels", move || async move {
            let mut conn = self.pool.acquire().await?;
            let rows = sqlx::query(queries::SELECT_ALL_CHANNELS)
                .fetch_all(&mut *conn)
                .await?;
            let mut channels: Vec<Channel> = map_rows(&rows)?;

            for channel in &mut channels {
                channel.category_names = fetch_category_names(&mut conn, channel.id).await?;
            }
            tracing::debug!(count = channels.len(), "Fetched channels.");
            Ok(channels)
        })
        .await
    }

    /// Fetches every channel with its category name(s) using two queries.
    pub async fn select_all_channels_batched(&self) -> Result<Vec<Channel>, RepositoryError> {
        self.run_with_retry("select_all_channels_batched", move || async move {
            let mut conn = self.pool.acquire().await?;
            let rows = sqlx::query(queries::SELECT_ALL_CHANNELS)
                .fetch_all(&mut *conn)
                .await?;
            let mut channels: Vec<Channel> = map_rows(&rows)?;
            if channels.is_empty() {
                return Ok(channels);
            }

            let ids: Vec<i64> = channels.iter().map(|c| c.id).collect();
            let rows = sqlx::query(queries::SELECT_CATEGORY_NAMES_FOR_CHANNELS)
                .bind(&ids)
                .fetch_all(&mut *conn)
                .await?;
            let labels: Vec<LinkedCategoryLabel> = map_rows(&rows)?;

            let mut by_channel: HashMap<i64, Vec<String>> = HashMap::new();
            for label in labels {
                by_channel.entry(label.channel_id).or_default().push(label.name);
            }
            for channel in &mut channels {
                channel.category_names = by_channel.remove(&channel.id).unwrap_or_default();
            }
            Ok(channels)
        })
        .await
    }

    /// Fetches the category name(s) of one channel.
    pub async fn select_category_names_for_channel(&self, channel_id: i64) -> Result<Vec<String>, RepositoryError> {
        self.run_with_retry("select_category_names_for_channel", move || async move {
            let mut conn = self.pool.acquire().await?;
            fetch_category_names(&mut conn, channel_id).await
        })
        .await
    }

    /// Inserts a channel and returns it with its new id and category name.
    pub async fn insert_channel(&self, channel: &Channel) -> Result<Channel, RepositoryError> {
        self.run("insert_channel", async {
            let mut conn = self.pool.acquire().await?;
            let id: i64 = sqlx::query_scalar(queries::INSERT_CHANNEL)
                .bind(&channel.name)
                .bind(channel.category_id)
                .fetch_one(&mut *conn)
                .await?;
            let category_names = fetch_category_names(&mut conn, id).await?;
            tracing::info!(channel_id = id, name = %channel.name, "Channel inserted.");
            Ok(Channel {
                id,
                name: channel.name.clone(),
                category_id: channel.category_id,
                category_names,
            })
        })
        .await
    }

    // ==========================================================================
    // Lookup tables
    // ==========================================================================

    /// Fetches all channel categories, ordered by id.
    pub async fn select_all_channel_categories(&self) -> Result<Vec<ChannelCategory>, RepositoryError> {
        self.run_with_retry("select_all_channel_categories", move || async move {
            let rows = sqlx::query(queries::SELECT_ALL_CHANNEL_CATEGORIES)
                .fetch_all(&self.pool)
                .await?;
            map_rows(&rows)
        })
        .await
    }

    /// Fetches all campaign categories, ordered by id.
    pub async fn select_all_campaign_categories(&self) -> Result<Vec<CampaignCategory>, RepositoryError> {
        self.run_with_retry("select_all_campaign_categories", move || async move {
            let rows = sqlx::query(queries::SELECT_ALL_CAMPAIGN_CATEGORIES)
                .fetch_all(&self.pool)
                .await?;
            map_rows(&rows)
        })
        .await
    }

    /// Fetches all companies, ordered by id.
    pub async fn select_all_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        self.run_with_retry("select_all_companies", move || async move {
            let rows = sqlx::query(queries::SELECT_ALL_COMPANIES)
                .fetch_all(&self.pool)
                .await?;
            map_rows(&rows)
        })
        .await
    }

    pub async fn insert_channel_category(&self, name: &str) -> Result<ChannelCategory, RepositoryError> {
        let id = self
            .insert_named("insert_channel_category", queries::INSERT_CHANNEL_CATEGORY, name)
            .await?;
        Ok(ChannelCategory { id, name: name.to_string() })
    }

    pub async fn insert_campaign_category(&self, name: &str) -> Result<CampaignCategory, RepositoryError> {
        let id = self
            .insert_named("insert_campaign_category", queries::INSERT_CAMPAIGN_CATEGORY, name)
            .await?;
        Ok(CampaignCategory { id, name: name.to_string() })
    }

    pub async fn insert_company(&self, name: &str) -> Result<Company, RepositoryError> {
        let id = self.insert_named("insert_company", queries::INSERT_COMPANY, name).await?;
        Ok(Company { id, name: name.to_string() })
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    /// Single-column `INSERT ... RETURNING id` shared by the lookup tables.
    async fn insert_named(&self, op: &'static str, sql: &'static str, name: &str) -> Result<i64, RepositoryError> {
        self.run(op, async {
            let id: i64 = sqlx::query_scalar(sql).bind(name).fetch_one(&self.pool).await?;
            tracing::info!(operation = op, id, name, "Row inserted.");
            Ok(id)
        })
        .await
    }

    /// Runs `fut` under the operation timeout.
    ///
    /// Failures are only traced at debug level here; the services layer logs
    /// them once for the user-facing operation.
    async fn run<T, Fut>(&self, op: &'static str, fut: Fut) -> Result<T, RepositoryError>
    where
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        let result = match tokio::time::timeout(self.policy.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout(format!(
                "{} (exceeded {:?})",
                op, self.policy.timeout
            ))),
        };
        if let Err(e) = &result {
            tracing::debug!(operation = op, error = %e, "Repository operation failed.");
        }
        result
    }

    /// Like [`Self::run`], retrying connection failures with exponential backoff.
    ///
    /// Only used for operations that are safe to repeat.
    async fn run_with_retry<T, F, Fut>(&self, op: &'static str, mut attempt_fn: F) -> Result<T, RepositoryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        let mut attempt = 0;
        loop {
            match self.run(op, attempt_fn()).await {
                Err(e) if e.is_retryable() && attempt < self.policy.retry_attempts => {
                    let delay = self.policy.backoff_for(attempt);
                    attempt += 1;
                    tracing::warn!(operation = op, attempt, ?delay, error = %e, "Connection failure, retrying.");
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

fn campaign_not_found(campaign_id: i64) -> RepositoryError {
    RepositoryError::NotFound(format!("campaign {}", campaign_id))
}

async fn fetch_campaign(conn: &mut PgConnection, campaign_id: i64) -> Result<Campaign, RepositoryError> {
    let row = sqlx::query(queries::SELECT_CAMPAIGN_BY_ID)
        .bind(campaign_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| campaign_not_found(campaign_id))?;
    let mut campaign: Campaign = map_row(&row)?;
    campaign.channels = fetch_channels_for_campaign(conn, campaign_id).await?;
    Ok(campaign)
}

async fn fetch_channels_for_campaign(conn: &mut PgConnection, campaign_id: i64) -> Result<Vec<Channel>, RepositoryError> {
    let rows = sqlx::query(queries::SELECT_CHANNELS_FOR_CAMPAIGN)
        .bind(campaign_id)
        .fetch_all(&mut *conn)
        .await?;
    map_rows(&rows)
}

async fn fetch_category_names(conn: &mut PgConnection, channel_id: i64) -> Result<Vec<String>, RepositoryError> {
    let rows = sqlx::query(queries::SELECT_CATEGORY_NAMES_FOR_CHANNEL)
        .bind(channel_id)
        .fetch_all(&mut *conn)
        .await?;
    let labels: Vec<CategoryLabel> = map_rows(&rows)?;
    Ok(labels.into_iter().map(|label| label.name).collect())
}

async fn insert_campaign_row(conn: &mut PgConnection, campaign: &Campaign) -> Result<i64, RepositoryError> {
    let id: i64 = sqlx::query_scalar(queries::INSERT_CAMPAIGN)
        .bind(&campaign.name)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(campaign.company_id)
        .bind(campaign.category_id)
        .bind(campaign.budget)
        .bind(campaign.revenue)
        .bind(campaign.net_profit)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}
