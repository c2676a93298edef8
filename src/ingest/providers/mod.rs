// src/ingest/providers/mod.rs
pub mod rss;

use crate::ingest::config::FeedSpec;
use crate::ingest::types::FeedProvider;

/// Build HTTP providers for the configured feeds, sharing one client.
pub fn from_specs(specs: &[FeedSpec], client: &reqwest::Client) -> Vec<Box<dyn FeedProvider>> {
    specs
        .iter()
        .map(|f| {
            Box::new(
                rss::RssProvider::from_url(&f.name, &f.url, client.clone())
                    .with_language(f.language.clone()),
            ) as Box<dyn FeedProvider>
        })
        .collect()
}
