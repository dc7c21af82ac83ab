use crate::enums::EntityKind;
use crate::error::CoreError;
use crate::validation::{check_money, normalize_name};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Anything identified to the user by a unique display name.
pub trait Named {
    const KIND: EntityKind;

    fn name(&self) -> &str;
}

/// A marketing campaign run by a company.
///
/// `id` is `0` until the database assigns one on insert. `channels` is filled in
/// by a follow-up query when the campaign is read back; an empty list means no
/// channels are attached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    /// Open-ended campaigns have no end date.
    pub end_date: Option<NaiveDate>,
    pub company_id: i64,
    pub category_id: i64,
    pub budget: Decimal,
    pub revenue: Decimal,
    pub net_profit: Decimal,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl Campaign {
    /// Checks the campaign's own fields. Foreign keys are left to the database.
    ///
    /// Money amounts must already be exact at two decimal places, so what is
    /// stored is what the caller passed.
    pub fn validate(&self) -> Result<(), CoreError> {
        normalize_name(&self.name, EntityKind::Campaign)?;

        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(CoreError::InvalidInput(
                    "end_date".to_string(),
                    format!("{} is before the start date {}", end, self.start_date),
                ));
            }
        }
        if self.budget < Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "budget".to_string(),
                format!("{} must not be negative", self.budget),
            ));
        }
        if self.revenue < Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "revenue".to_string(),
                format!("{} must not be negative", self.revenue),
            ));
        }
        check_money("budget", self.budget)?;
        check_money("revenue", self.revenue)?;
        check_money("net_profit", self.net_profit)?;
        Ok(())
    }

    /// Net profit implied by the current revenue and budget.
    pub fn projected_net_profit(&self) -> Decimal {
        self.revenue - self.budget
    }

    /// Names of the attached channels, in attachment order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }
}

impl Named for Campaign {
    const KIND: EntityKind = EntityKind::Campaign;

    fn name(&self) -> &str {
        &self.name
    }
}

/// A delivery channel (newsletter, social feed, billboard, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    /// Category label(s), attached by a follow-up query like `Campaign::channels`.
    #[serde(default)]
    pub category_names: Vec<String>,
}

impl Named for Channel {
    const KIND: EntityKind = EntityKind::Channel;

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

impl Named for Company {
    const KIND: EntityKind = EntityKind::Company;

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCategory {
    pub id: i64,
    pub name: String,
}

impl Named for CampaignCategory {
    const KIND: EntityKind = EntityKind::CampaignCategory;

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCategory {
    pub id: i64,
    pub name: String,
}

impl Named for ChannelCategory {
    const KIND: EntityKind = EntityKind::ChannelCategory;

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn spring_sale() -> Campaign {
        Campaign {
            name: "Spring Sale".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31),
            company_id: 1,
            category_id: 1,
            budget: dec!(1000.00),
            revenue: dec!(0.00),
            ..Default::default()
        }
    }

    #[test]
    fn new_entities_are_unsaved_and_empty() {
        let campaign = Campaign::default();
        assert_eq!(campaign.id, 0);
        assert!(campaign.channels.is_empty());
        assert_eq!(campaign.net_profit, Decimal::ZERO);

        let channel = Channel::default();
        assert_eq!(channel.id, 0);
        assert!(channel.category_names.is_empty());
    }

    #[test]
    fn campaign_without_channels_serializes_an_empty_list() {
        let json = serde_json::to_string(&spring_sale()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["channels"], serde_json::json!([]));
        assert_eq!(value["end_date"], serde_json::json!("2024-03-31"));
    }

    #[test]
    fn missing_collections_deserialize_as_empty() {
        let json = r#"{"id":3,"name":"Newsletter","category_id":2}"#;
        let channel: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(channel.id, 3);
        assert!(channel.category_names.is_empty());
    }

    #[test]
    fn money_survives_json_without_rounding() {
        let mut campaign = spring_sale();
        campaign.budget = dec!(0.10) + dec!(0.20);
        let back: Campaign = serde_json::from_str(&serde_json::to_string(&campaign).unwrap()).unwrap();
        assert_eq!(back.budget, dec!(0.30));
        assert_eq!(back, campaign);
    }

    #[test]
    fn end_date_before_start_is_rejected() {
        let mut campaign = spring_sale();
        campaign.end_date = NaiveDate::from_ymd_opt(2024, 2, 1);
        let err = campaign.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "end_date"));
    }

    #[test]
    fn open_ended_campaign_is_valid() {
        let mut campaign = spring_sale();
        campaign.end_date = None;
        assert!(campaign.validate().is_ok());
    }

    #[test]
    fn negative_budget_is_rejected() {
        let mut campaign = spring_sale();
        campaign.budget = dec!(-5);
        assert!(campaign.validate().is_err());
    }

    #[test]
    fn sub_cent_budget_is_rejected() {
        let mut campaign = spring_sale();
        campaign.budget = dec!(10.005);
        let err = campaign.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "budget"));

        campaign.budget = dec!(10.50);
        assert!(campaign.validate().is_ok());
    }

    #[test]
    fn amounts_beyond_the_money_column_are_rejected() {
        let mut campaign = spring_sale();
        campaign.revenue = dec!(10000000000.00);
        let err = campaign.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "revenue"));

        campaign.revenue = dec!(9999999999.99);
        campaign.net_profit = dec!(-10000000000);
        let err = campaign.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "net_profit"));
    }

    #[test]
    fn projected_net_profit_is_revenue_minus_budget() {
        let mut campaign = spring_sale();
        campaign.revenue = dec!(1250.50);
        assert_eq!(campaign.projected_net_profit(), dec!(250.50));
    }
}
