// src/classifier.rs
//! Content classifier: turns pattern matches into one category label plus a
//! diagnostic relevance score.
//!
//! Order:
//! 1) sports (`sports_keywords` >= threshold) wins over everything else
//! 2) `CATEGORY_PRIORITY`, first group reaching the threshold
//! 3) `general_news` when nothing reaches it

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::category::{Category, CATEGORY_PRIORITY, GEOPOLITICAL_GROUP, SPORTS_GROUP};
use crate::ingest::types::ArticleCandidate;
use crate::language;
use crate::patterns::{tokenize, PatternMatcher, PatternMatches};

/// Outcome of classifying one candidate. Not persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    /// Match count of the assigned category's group (0 for `general_news`).
    pub match_count: usize,
    /// `geopolitical_keywords` occurrences / word count, in `0.0..=1.0`.
    pub relevance_score: f32,
    pub matched_patterns: Vec<String>,
    #[serde(default)]
    pub group_counts: BTreeMap<String, usize>,
}

impl ClassificationResult {
    /// Default-category result with no signal.
    pub fn empty() -> Self {
        Self {
            category: Category::GeneralNews,
            match_count: 0,
            relevance_score: 0.0,
            matched_patterns: Vec::new(),
            group_counts: BTreeMap::new(),
        }
    }
}

/// Pick the category from group counts. Separated from scanning so the
/// priority contract can be tested on plain numbers.
pub fn assign_category(matches: &PatternMatches, threshold: u32) -> (Category, usize) {
    let threshold = threshold.max(1) as usize;

    let sports = matches.count(SPORTS_GROUP);
    if sports >= threshold {
        return (Category::SportsEntertainment, sports);
    }

    for cat in CATEGORY_PRIORITY {
        let Some(group) = cat.pattern_group() else {
            continue;
        };
        let n = matches.count(group);
        if n >= threshold {
            return (cat, n);
        }
    }
    (Category::GeneralNews, 0)
}

/// Ratio of geopolitical keyword hits to word count.
pub fn relevance_score(matches: &PatternMatches, text: &str) -> f32 {
    let words = tokenize(text).len();
    if words == 0 {
        return 0.0;
    }
    let hits = matches.count(GEOPOLITICAL_GROUP) as f32;
    (hits / words as f32).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct ContentClassifier {
    matcher: Arc<PatternMatcher>,
}

impl ContentClassifier {
    pub fn new(matcher: Arc<PatternMatcher>) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Deterministic, never fails. Empty title and description give `general_news`
    /// with score 0.
    pub fn classify(&self, candidate: &ArticleCandidate, threshold: u32) -> ClassificationResult {
        let text = candidate.combined_text();
        if text.trim().is_empty() {
            return ClassificationResult::empty();
        }

        let lang = language::resolve(candidate.language.as_deref(), &text);
        let matches = self.matcher.scan(&text, lang);
        let (category, match_count) = assign_category(&matches, threshold);

        ClassificationResult {
            category,
            match_count,
            relevance_score: relevance_score(&matches, &text),
            matched_patterns: matches.matched_ids(),
            group_counts: matches.counts(),
        }
    }

    pub fn classify_text(&self, title: &str, description: &str, threshold: u32) -> ClassificationResult {
        let c = ArticleCandidate {
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        };
        self.classify(&c, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternTable;

    // One or two terms per group so counts are easy to reason about.
    const TEST_TOML: &str = r#"
version = 1

[entities]
sports_keywords = ["FIFA"]

[languages.en]
sports_keywords = ["match", "goal"]
geopolitical_keywords = ["minister", "border"]
military_conflict = ["troops", "artillery"]
economic_crisis = ["recession", "inflation"]
political_tension = ["boycott", "minister"]
social_unrest = ["protest", "riot"]
natural_disaster = ["earthquake", "flood"]
cyber_security = ["ransomware", "hackers"]
health_crisis = ["outbreak", "virus"]
"#;

    fn clf() -> ContentClassifier {
        let table = PatternTable::from_toml_str(TEST_TOML).unwrap();
        ContentClassifier::new(Arc::new(PatternMatcher::new(&table).unwrap()))
    }

    #[test]
    fn sports_takes_priority_over_military() {
        let r = clf().classify_text("FIFA match", "troops and artillery, troops again", 2);
        assert_eq!(r.category, Category::SportsEntertainment);
        assert_eq!(r.match_count, 2);
    }

    #[test]
    fn priority_order_is_respected() {
        // economic (2) and political (2) both reach threshold; economic comes first.
        let r = clf().classify_text("Recession and inflation", "boycott by the minister", 2);
        assert_eq!(r.category, Category::EconomicCrisis);

        // health alone
        let r = clf().classify_text("Virus outbreak", "", 2);
        assert_eq!(r.category, Category::HealthCrisis);
    }

    #[test]
    fn threshold_boundary() {
        let c = clf();
        assert_eq!(c.classify_text("riot", "", 2).category, Category::GeneralNews);
        assert_eq!(c.classify_text("riot", "protest", 2).category, Category::SocialUnrest);
        assert_eq!(c.classify_text("riot", "", 1).category, Category::SocialUnrest);
        assert_eq!(c.classify_text("riot protest", "", 3).category, Category::GeneralNews);
    }

    #[test]
    fn zero_threshold_is_treated_as_one() {
        assert_eq!(clf().classify_text("", "", 0).category, Category::GeneralNews);
        assert_eq!(
            clf().classify_text("flood", "", 0).category,
            Category::NaturalDisaster
        );
    }

    #[test]
    fn empty_input_is_general_news_with_zero_score() {
        let r = clf().classify_text("", "   ", 2);
        assert_eq!(r, ClassificationResult::empty());
    }

    #[test]
    fn relevance_score_is_ratio_of_geopolitical_hits() {
        let r = clf().classify_text("minister visits the border", "", 2);
        assert!((r.relevance_score - 0.5).abs() < 1e-6);
        let r = clf().classify_text("goal", "", 2);
        assert_eq!(r.relevance_score, 0.0);
    }

    #[test]
    fn deterministic() {
        let c = clf();
        let a = c.classify_text("FIFA boycott", "minister troops", 2);
        let b = c.classify_text("FIFA boycott", "minister troops", 2);
        assert_eq!(a, b);
    }
}
