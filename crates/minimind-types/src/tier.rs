//! Subscription tier types

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Subscription tier levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Free tier - 15 credits/day, core explanation modes only
    Free,
    /// Pro tier - 100 credits/day from a 500 credit monthly pool, all features
    Pro,
}

impl Tier {
    /// Static limits for this tier
    pub const fn limits(&self) -> TierLimits {
        TierLimits::for_tier(*self)
    }

    /// Stable string form used in storage
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" | "premium" => Ok(Self::Pro),
            _ => Err(ParseError::Tier(s.to_string())),
        }
    }
}

/// Billing interval of a paid plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    /// Renews every calendar month
    Monthly,
    /// Renews every calendar year
    Yearly,
}

impl PlanType {
    /// Length of one paid period in months
    pub const fn months(&self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Yearly => 12,
        }
    }

    /// Stable string form used in storage
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "yearly" | "annual" => Ok(Self::Yearly),
            _ => Err(ParseError::PlanType(s.to_string())),
        }
    }
}

/// Credit-consuming features of the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Beginner explanation
    Beginner,
    /// Thinker explanation
    Thinker,
    /// Story explanation
    Story,
    /// Mastery explanation
    Mastery,
    /// Knowledge compression
    Compress,
    /// Self-explanation scoring
    SelfExplain,
    /// Uploaded file analysis
    FileAnalysis,
    /// Generated learning path
    LearningPath,
    /// PDF export of an explanation
    PdfExport,
}

impl Feature {
    /// All features, in display order
    pub const ALL: [Feature; 9] = [
        Self::Beginner,
        Self::Thinker,
        Self::Story,
        Self::Mastery,
        Self::Compress,
        Self::SelfExplain,
        Self::FileAnalysis,
        Self::LearningPath,
        Self::PdfExport,
    ];

    /// Get the feature ID string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Thinker => "thinker",
            Self::Story => "story",
            Self::Mastery => "mastery",
            Self::Compress => "compress",
            Self::SelfExplain => "self_explain",
            Self::FileAnalysis => "file_analysis",
            Self::LearningPath => "learning_path",
            Self::PdfExport => "pdf_export",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Feature {
    type Err = ParseError;

    /// Accepts both the snake_case ids and the camelCase mode names the web
    /// client sends (`learningPath`, `selfExplain`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "beginner" => Ok(Self::Beginner),
            "thinker" => Ok(Self::Thinker),
            "story" => Ok(Self::Story),
            "mastery" => Ok(Self::Mastery),
            "compress" | "compression" => Ok(Self::Compress),
            "selfexplain" | "selfexplanation" => Ok(Self::SelfExplain),
            "fileanalysis" => Ok(Self::FileAnalysis),
            "learningpath" => Ok(Self::LearningPath),
            "pdfexport" => Ok(Self::PdfExport),
            _ => Err(ParseError::Feature(s.to_string())),
        }
    }
}

/// Credit limits and capabilities for a tier.
///
/// | Tier | Daily | Monthly | Pro-only features |
/// |------|-------|---------|-------------------|
/// | Free | 15    | 0       | locked            |
/// | Pro  | 100   | 500     | unlocked          |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    /// The tier these limits apply to
    pub tier: Tier,
    /// Credits available per UTC day
    pub daily_credits: u32,
    /// Credits available per UTC calendar month (0 = no monthly pool)
    pub monthly_credits: u32,
    /// File analysis enabled
    pub file_analysis: bool,
    /// Learning paths enabled
    pub learning_path: bool,
    /// PDF export enabled
    pub pdf_export: bool,
}

impl TierLimits {
    /// Get the limits for a specific tier
    pub const fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Free => Self {
                tier,
                daily_credits: 15,
                monthly_credits: 0,
                file_analysis: false,
                learning_path: false,
                pdf_export: false,
            },
            Tier::Pro => Self {
                tier,
                daily_credits: 100,
                monthly_credits: 500,
                file_analysis: true,
                learning_path: true,
                pdf_export: true,
            },
        }
    }

    /// Whether this tier may use a feature
    pub const fn allows(&self, feature: Feature) -> bool {
        match feature {
            Feature::Beginner
            | Feature::Thinker
            | Feature::Story
            | Feature::Mastery
            | Feature::Compress
            | Feature::SelfExplain => true,
            Feature::FileAnalysis => self.file_analysis,
            Feature::LearningPath => self.learning_path,
            Feature::PdfExport => self.pdf_export,
        }
    }

    /// Whether the tier has a separate monthly pool
    pub const fn has_monthly_pool(&self) -> bool {
        self.monthly_credits > 0
    }
}
