//! The fixed catalog of SQL statements.
//!
//! Column lists here must equal the mapping tables in `mapping`; the tests at
//! the bottom of this file hold them together. Every Channel select uses the
//! same three columns: `channel_id, channel_name, channel_category_id`.

// --- Campaigns ---

pub const SELECT_ALL_CAMPAIGNS: &str = r#"
    SELECT campaign_id, campaign_name, start_date, end_date, company_id,
           campaign_category_id, budget, revenue, net_profit
    FROM campaign
    ORDER BY campaign_id ASC
"#;

pub const SELECT_CAMPAIGN_BY_ID: &str = r#"
    SELECT campaign_id, campaign_name, start_date, end_date, company_id,
           campaign_category_id, budget, revenue, net_profit
    FROM campaign
    WHERE campaign_id = $1
"#;

pub const INSERT_CAMPAIGN: &str = r#"
    INSERT INTO campaign (
        campaign_name, start_date, end_date, company_id,
        campaign_category_id, budget, revenue, net_profit
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING campaign_id
"#;

pub const UPDATE_CAMPAIGN: &str = r#"
    UPDATE campaign
    SET campaign_name = $2, start_date = $3, end_date = $4, company_id = $5,
        campaign_category_id = $6, budget = $7, revenue = $8, net_profit = $9
    WHERE campaign_id = $1
"#;

pub const DELETE_CAMPAIGN: &str = "DELETE FROM campaign WHERE campaign_id = $1";

// --- Campaign <-> Channel association ---

pub const SELECT_CHANNELS_FOR_CAMPAIGN: &str = r#"
    SELECT ch.channel_id, ch.channel_name, ch.channel_category_id
    FROM channel AS ch
    JOIN campaign_channel AS cc ON cc.channel_id = ch.channel_id
    WHERE cc.campaign_id = $1
    ORDER BY ch.channel_id ASC
"#;

pub const SELECT_CHANNELS_FOR_CAMPAIGNS: &str = r#"
    SELECT cc.campaign_id, ch.channel_id, ch.channel_name, ch.channel_category_id
    FROM channel AS ch
    JOIN campaign_channel AS cc ON cc.channel_id = ch.channel_id
    WHERE cc.campaign_id = ANY($1)
    ORDER BY cc.campaign_id ASC, ch.channel_id ASC
"#;

pub const INSERT_CAMPAIGN_CHANNEL: &str =
    "INSERT INTO campaign_channel (campaign_id, channel_id) VALUES ($1, $2)";

pub const DELETE_CAMPAIGN_CHANNEL: &str =
    "DELETE FROM campaign_channel WHERE campaign_id = $1 AND channel_id = $2";

pub const DELETE_CHANNELS_FOR_CAMPAIGN: &str = "DELETE FROM campaign_channel WHERE campaign_id = $1";

// --- Channels ---

pub const SELECT_ALL_CHANNELS: &str = r#"
    SELECT channel_id, channel_name, channel_category_id
    FROM channel
    ORDER BY channel_id ASC
"#;

pub const SELECT_CATEGORY_NAMES_FOR_CHANNEL: &str = r#"
    SELECT cat.channel_category_name
    FROM channel AS ch
    JOIN channel_category AS cat ON cat.channel_category_id = ch.channel_category_id
    WHERE ch.channel_id = $1
    ORDER BY cat.channel_category_id ASC
"#;

pub const SELECT_CATEGORY_NAMES_FOR_CHANNELS: &str = r#"
    SELECT ch.channel_id, cat.channel_category_name
    FROM channel AS ch
    JOIN channel_category AS cat ON cat.channel_category_id = ch.channel_category_id
    WHERE ch.channel_id = ANY($1)
    ORDER BY ch.channel_id ASC, cat.channel_category_id ASC
"#;

pub const INSERT_CHANNEL: &str = r#"
    INSERT INTO channel (channel_name, channel_category_id)
    VALUES ($1, $2)
    RETURNING channel_id
"#;

// --- Lookup tables ---
// Ordered by id explicitly: identity order is not guaranteed to be insertion order.

pub const SELECT_ALL_CHANNEL_CATEGORIES: &str = r#"
    SELECT channel_category_id, channel_category_name
    FROM channel_category
    ORDER BY channel_category_id ASC
"#;

pub const SELECT_ALL_CAMPAIGN_CATEGORIES: &str = r#"
    SELECT campaign_category_id, campaign_category_name
    FROM campaign_category
    ORDER BY campaign_category_id ASC
"#;

pub const SELECT_ALL_COMPANIES: &str = r#"
    SELECT company_id, company_name
    FROM company
    ORDER BY company_id ASC
"#;

pub const INSERT_CHANNEL_CATEGORY: &str =
    "INSERT INTO channel_category (channel_category_name) VALUES ($1) RETURNING channel_category_id";

pub const INSERT_CAMPAIGN_CATEGORY: &str =
    "INSERT INTO campaign_category (campaign_category_name) VALUES ($1) RETURNING campaign_category_id";

pub const INSERT_COMPANY: &str = "INSERT INTO company (company_name) VALUES ($1) RETURNING company_id";
