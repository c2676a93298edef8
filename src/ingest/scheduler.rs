// src/ingest/scheduler.rs
use metrics::counter;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::FilterConfigHandle;
use crate::gate::FilterGate;
use crate::ingest::types::{ArticleSink, FeedProvider};

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn a tokio task that runs one ingest pass per tick. The first tick fires
/// immediately. The config handle is read per candidate, so reloads apply
/// mid-run without restarting the task.
pub fn spawn_scheduler(
    cfg: IngestSchedulerCfg,
    providers: Vec<Box<dyn FeedProvider>>,
    gate: FilterGate,
    config: FilterConfigHandle,
    sink: Arc<dyn ArticleSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(cfg.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = crate::ingest::run_once(&providers, &gate, &config, sink.as_ref()).await;
            counter!("ingest_runs_total").increment(1);

            tracing::debug!(
                target: "ingest",
                providers = providers.len(),
                admitted = report.admitted,
                rejected = report.rejected,
                "ingest tick"
            );
        }
    })
}
