//! Credit costs and balances

use serde::{Deserialize, Serialize};

use crate::{Feature, Tier};

impl Feature {
    /// Credits charged for one use of this feature
    pub const fn cost(&self) -> u32 {
        match self {
            Self::Beginner | Self::Thinker | Self::Story | Self::PdfExport => 1,
            Self::Compress | Self::SelfExplain => 2,
            Self::Mastery => 3,
            Self::FileAnalysis => 4,
            Self::LearningPath => 5,
        }
    }
}

/// Snapshot of a user's credit position, as shown to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditStatus {
    /// Credits that can be spent right now
    pub available: u32,
    /// Credits spent today (UTC)
    pub daily_used: u32,
    /// Credits spent this month (UTC)
    pub monthly_used: u32,
    /// Daily ceiling for the effective tier
    pub daily_limit: u32,
    /// Monthly pool for the effective tier
    pub monthly_limit: u32,
    /// Purchased top-up credits remaining
    pub bonus: u32,
    /// Tier the limits were taken from
    pub tier: Tier,
    /// Deduction is bypassed entirely
    pub early_access: bool,
}
