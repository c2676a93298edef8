// src/category.rs
//! Category taxonomy and the explicit priority order used by the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primary topic label of an article. Exactly one per classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SportsEntertainment,
    MilitaryConflict,
    EconomicCrisis,
    PoliticalTension,
    SocialUnrest,
    NaturalDisaster,
    CyberSecurity,
    HealthCrisis,
    GeneralNews,
}

/// Non-sports categories in evaluation order. The first one whose match count
/// reaches the sensitivity threshold wins. Sports is checked before this list.
pub const CATEGORY_PRIORITY: [Category; 7] = [
    Category::MilitaryConflict,
    Category::EconomicCrisis,
    Category::PoliticalTension,
    Category::SocialUnrest,
    Category::NaturalDisaster,
    Category::CyberSecurity,
    Category::HealthCrisis,
];

/// Pattern group that feeds the sports check.
pub const SPORTS_GROUP: &str = "sports_keywords";
/// Pattern group used for the diagnostic relevance score.
pub const GEOPOLITICAL_GROUP: &str = "geopolitical_keywords";

impl Category {
    pub const ALL: [Category; 9] = [
        Category::SportsEntertainment,
        Category::MilitaryConflict,
        Category::EconomicCrisis,
        Category::PoliticalTension,
        Category::SocialUnrest,
        Category::NaturalDisaster,
        Category::CyberSecurity,
        Category::HealthCrisis,
        Category::GeneralNews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SportsEntertainment => "sports_entertainment",
            Self::MilitaryConflict => "military_conflict",
            Self::EconomicCrisis => "economic_crisis",
            Self::PoliticalTension => "political_tension",
            Self::SocialUnrest => "social_unrest",
            Self::NaturalDisaster => "natural_disaster",
            Self::CyberSecurity => "cyber_security",
            Self::HealthCrisis => "health_crisis",
            Self::GeneralNews => "general_news",
        }
    }

    /// Name of the pattern group whose count drives this category.
    /// `GeneralNews` is the fallback and has no group.
    pub fn pattern_group(&self) -> Option<&'static str> {
        match self {
            Self::SportsEntertainment => Some(SPORTS_GROUP),
            Self::GeneralNews => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| anyhow::anyhow!("unknown category `{}`", s.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("sports".parse::<Category>().is_err());
    }

    #[test]
    fn priority_excludes_sports_and_default() {
        assert!(!CATEGORY_PRIORITY.contains(&Category::SportsEntertainment));
        assert!(!CATEGORY_PRIORITY.contains(&Category::GeneralNews));
        assert_eq!(CATEGORY_PRIORITY[0], Category::MilitaryConflict);
        assert_eq!(CATEGORY_PRIORITY[1], Category::EconomicCrisis);
        assert_eq!(CATEGORY_PRIORITY[2], Category::PoliticalTension);
    }

    #[test]
    fn serde_uses_snake_case() {
        let s = serde_json::to_string(&Category::SportsEntertainment).unwrap();
        assert_eq!(s, "\"sports_entertainment\"");
        let c: Category = serde_json::from_str("\"cyber_security\"").unwrap();
        assert_eq!(c, Category::CyberSecurity);
    }
}
