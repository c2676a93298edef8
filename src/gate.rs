// src/gate.rs
//! Ingestion filter gate: the single admit/reject point between feed fetch and
//! persistence.
//!
//! Per candidate: Received -> Validated -> Classified -> Admitted | Rejected.
//! - missing url (or title, when required) -> Rejected(missing_required_field)
//! - category excluded       -> Rejected(category_excluded)
//! - below min relevance     -> Rejected(low_relevance_score), only when configured
//! - otherwise               -> Admitted
//!
//! The gate holds no mutable state; the config snapshot is passed per call.

use anyhow::Result;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::category::Category;
use crate::classifier::{ClassificationResult, ContentClassifier};
use crate::config::FilterConfiguration;
use crate::ingest::types::ArticleCandidate;

/// Max matched pattern ids carried in one log record.
const LOG_PATTERNS_MAX: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    CategoryExcluded,
    MissingRequiredField,
    LowRelevanceScore,
    Admitted,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategoryExcluded => "category_excluded",
            Self::MissingRequiredField => "missing_required_field",
            Self::LowRelevanceScore => "low_relevance_score",
            Self::Admitted => "admitted",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one candidate. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDecision {
    pub url: String,
    pub classification: ClassificationResult,
    pub admitted: bool,
    pub reason: DecisionReason,
}

impl FilterDecision {
    pub fn category(&self) -> Category {
        self.classification.category
    }
}

/// Structured log record emitted once per decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub url: String,
    pub category: Category,
    pub admitted: bool,
    pub reason: DecisionReason,
    pub matched_patterns: Vec<String>,
}

impl From<&FilterDecision> for DecisionRecord {
    fn from(d: &FilterDecision) -> Self {
        Self {
            url: d.url.clone(),
            category: d.classification.category,
            admitted: d.admitted,
            reason: d.reason,
            matched_patterns: d.classification.matched_patterns.clone(),
        }
    }
}

/// Logging collaborator. Best effort: an error here never changes a decision.
pub trait DecisionLog: Send + Sync {
    fn record(&self, rec: &DecisionRecord) -> Result<()>;
}

/// Default sink: one `tracing` event on target `filter`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDecisionLog;

impl DecisionLog for TracingDecisionLog {
    fn record(&self, rec: &DecisionRecord) -> Result<()> {
        let matched: Vec<&str> = rec
            .matched_patterns
            .iter()
            .take(LOG_PATTERNS_MAX)
            .map(String::as_str)
            .collect();
        info!(
            target: "filter",
            url = %rec.url,
            category = %rec.category,
            admitted = rec.admitted,
            reason = %rec.reason,
            matched_patterns = ?matched,
            "filter decision"
        );
        Ok(())
    }
}

/// Keeps records in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryDecisionLog {
    pub records: Mutex<Vec<DecisionRecord>>,
}

impl MemoryDecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<DecisionRecord> {
        self.records
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }
}

impl DecisionLog for MemoryDecisionLog {
    fn record(&self, rec: &DecisionRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("decision log mutex poisoned"))?
            .push(rec.clone());
        Ok(())
    }
}

#[derive(Clone)]
pub struct FilterGate {
    classifier: ContentClassifier,
    log: Arc<dyn DecisionLog>,
}

impl fmt::Debug for FilterGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterGate")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl FilterGate {
    pub fn new(classifier: ContentClassifier) -> Self {
        Self::with_log(classifier, Arc::new(TracingDecisionLog))
    }

    pub fn with_log(classifier: ContentClassifier, log: Arc<dyn DecisionLog>) -> Self {
        Self { classifier, log }
    }

    pub fn classifier(&self) -> &ContentClassifier {
        &self.classifier
    }

    /// Decide one candidate against a config snapshot and emit its log record.
    pub fn evaluate(&self, candidate: &ArticleCandidate, cfg: &FilterConfiguration) -> FilterDecision {
        let decision = self.decide(candidate, cfg);
        self.emit(&decision);
        decision
    }

    /// Pure decision, no side effects.
    pub fn decide(&self, candidate: &ArticleCandidate, cfg: &FilterConfiguration) -> FilterDecision {
        let url = candidate.url.trim().to_string();

        // Received -> Validated
        if let Some(field) = candidate.missing_required_field(cfg.require_title) {
            debug!(target: "filter", field, "candidate missing required field");
            return FilterDecision {
                url,
                classification: ClassificationResult::empty(),
                admitted: false,
                reason: DecisionReason::MissingRequiredField,
            };
        }

        // Validated -> Classified
        let classification = self.classifier.classify(candidate, cfg.sensitivity_threshold);

        // Classified -> Admitted | Rejected
        let reason = if cfg.is_excluded(classification.category) {
            DecisionReason::CategoryExcluded
        } else if cfg
            .min_relevance_score
            .is_some_and(|min| classification.relevance_score < min)
        {
            DecisionReason::LowRelevanceScore
        } else {
            DecisionReason::Admitted
        };

        FilterDecision {
            url,
            classification,
            admitted: reason == DecisionReason::Admitted,
            reason,
        }
    }

    fn emit(&self, decision: &FilterDecision) {
        counter!(
            "filter_decisions_total",
            "category" => decision.classification.category.as_str(),
            "reason" => decision.reason.as_str()
        )
        .increment(1);
        if decision.admitted {
            counter!("filter_admitted_total").increment(1);
        } else {
            counter!("filter_rejected_total").increment(1);
        }

        if let Err(e) = self.log.record(&DecisionRecord::from(decision)) {
            debug!(target: "filter", error = ?e, "decision log unavailable");
        }
    }
}
