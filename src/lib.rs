// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod category;
pub mod classifier;
pub mod config;
pub mod gate;
pub mod ingest;
pub mod language;
pub mod metrics;
pub mod patterns;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::category::Category;
pub use crate::classifier::{ClassificationResult, ContentClassifier};
pub use crate::config::{FilterConfigHandle, FilterConfiguration};
pub use crate::gate::{DecisionReason, FilterDecision, FilterGate};
pub use crate::ingest::types::ArticleCandidate;

use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::patterns::{PatternMatcher, PatternTable};

/// Env switch for JSON log lines (`FILTER_LOG_FORMAT=json`); anything else is compact text.
pub const ENV_LOG_FORMAT: &str = "FILTER_LOG_FORMAT";

/// Install the global tracing subscriber. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("geo_news_filter=info,filter=info,ingest=info,warn"));

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Gate backed by the pattern table from `$PATTERN_TABLE_PATH` or the built-in one.
pub fn default_gate() -> anyhow::Result<FilterGate> {
    let table = PatternTable::load_default()?;
    let matcher = PatternMatcher::new(&table)?;
    Ok(FilterGate::new(ContentClassifier::new(Arc::new(matcher))))
}
