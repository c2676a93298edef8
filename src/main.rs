//! Geopolitical news filter service entrypoint.
//! Loads filter config and pattern table (fail fast), starts the ingest
//! scheduler when feeds are configured, and serves the ops routes.

use shuttle_axum::ShuttleAxum;
use std::path::PathBuf;
use std::sync::Arc;

use geo_news_filter::api::{self, AppState};
use geo_news_filter::config::{start_hot_reload_thread, FilterConfigHandle, FilterConfiguration};
use geo_news_filter::ingest::config::{ingest_interval_secs, load_feeds_default};
use geo_news_filter::ingest::providers;
use geo_news_filter::ingest::scheduler::{spawn_scheduler, IngestSchedulerCfg};
use geo_news_filter::ingest::sink::JsonLinesSink;
use geo_news_filter::metrics::Metrics;

const ENV_ADMITTED_PATH: &str = "ADMITTED_ARTICLES_PATH";
const DEFAULT_ADMITTED_PATH: &str = "data/admitted.jsonl";

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    geo_news_filter::init_tracing();

    // --- Filter config + pattern table: refuse to start on bad input ---
    let (cfg, config_path) = FilterConfiguration::load_default()?;
    tracing::info!(
        target: "config",
        path = ?config_path,
        threshold = cfg.sensitivity_threshold,
        filter_sports = cfg.filter_sports_content,
        "filter config loaded"
    );
    let metrics = Metrics::init(cfg.sensitivity_threshold)?;
    let handle = FilterConfigHandle::new(cfg);
    let gate = geo_news_filter::default_gate()?;

    if let Some(path) = config_path.clone() {
        if start_hot_reload_thread(handle.clone(), path) {
            tracing::info!(target: "config", "filter config hot reload enabled");
        }
    }

    // --- Ingest scheduler (only when feeds are configured) ---
    let feeds = load_feeds_default()?;
    if feeds.is_empty() {
        tracing::info!(target: "ingest", "no feeds configured; scheduler not started");
    } else {
        let client = reqwest::Client::builder()
            .user_agent(concat!("geo-news-filter/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .map_err(anyhow::Error::from)?;
        let sink_path = std::env::var(ENV_ADMITTED_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ADMITTED_PATH));
        tracing::info!(target: "ingest", feeds = feeds.len(), sink = %sink_path.display(), "starting scheduler");
        spawn_scheduler(
            IngestSchedulerCfg {
                interval_secs: ingest_interval_secs(),
            },
            providers::from_specs(&feeds, &client),
            gate.clone(),
            handle.clone(),
            Arc::new(JsonLinesSink::new(sink_path)),
        );
    }

    let state = AppState {
        gate,
        config: handle,
        config_path,
    };
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
