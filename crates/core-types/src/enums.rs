use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of records the application manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Campaign,
    Channel,
    Company,
    CampaignCategory,
    ChannelCategory,
}

impl EntityKind {
    /// A human-readable label used in prompts and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Campaign => "campaign",
            EntityKind::Channel => "channel",
            EntityKind::Company => "company",
            EntityKind::CampaignCategory => "campaign category",
            EntityKind::ChannelCategory => "channel category",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
