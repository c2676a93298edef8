// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod scheduler;
pub mod sink;
pub mod types;

use crate::config::{FilterConfigHandle, FilterConfiguration};
use crate::gate::{FilterDecision, FilterGate};
use crate::ingest::types::{AdmittedArticle, ArticleCandidate, ArticleSink, FeedProvider};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::HashSet;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_candidates_total",
            "Candidates parsed from feed providers."
        );
        describe_counter!(
            "ingest_duplicates_total",
            "Candidates dropped because their url was already seen in the run."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_counter!("ingest_sink_errors_total", "Admitted articles the sink failed to store.");
        describe_counter!("filter_decisions_total", "Gate decisions by category and reason.");
        describe_counter!("filter_admitted_total", "Candidates admitted by the gate.");
        describe_counter!("filter_rejected_total", "Candidates rejected by the gate.");
        describe_histogram!("ingest_parse_ms", "Provider parse time in milliseconds.");
        describe_counter!("ingest_runs_total", "Scheduled ingest passes.");
        describe_counter!(
            "filter_config_reloads_total",
            "Filter config snapshots published after startup."
        );
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last ran."
        );
    });
}

/// Normalize text: collapse whitespace, trim, strip stray punctuation.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Strip trailing sentence punctuation (keep quotes)
    while let Some(last) = out.chars().last() {
        if matches!(last, '!' | '?' | '.' | ',') {
            out.pop();
        } else {
            break;
        }
    }

    out
}

/// Longest title or description kept on a stored article.
pub const STORED_TEXT_MAX_CHARS: usize = 1500;

/// Cut `s` to at most `max` chars. Only applied to what the sink stores;
/// the gate always sees the full text.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => s[..i].to_string(),
        None => s.to_string(),
    }
}

/// Short stable id for a url (first 6 bytes of SHA-256, hex).
pub fn url_fingerprint(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(url.trim().as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Normalize text fields and drop repeated urls (first occurrence wins).
/// Candidates with an empty url are kept so the gate can reject them.
/// Returns (kept, duplicates).
pub fn normalize_and_dedup(raw: Vec<ArticleCandidate>) -> (Vec<ArticleCandidate>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(raw.len());
    let mut dups = 0usize;

    for mut c in raw {
        c.title = normalize_text(&c.title);
        c.description = normalize_text(&c.description);
        c.url = c.url.trim().to_string();
        c.source = c.source.trim().to_string();

        if !c.url.is_empty() && !seen.insert(c.url.clone()) {
            dups += 1;
            continue;
        }
        keep.push(c);
    }
    (keep, dups)
}

/// Run the gate over a batch with one config snapshot. No sink involved.
pub fn filter_batch(
    gate: &FilterGate,
    cfg: &FilterConfiguration,
    candidates: &[ArticleCandidate],
) -> Vec<FilterDecision> {
    candidates.iter().map(|c| gate.evaluate(c, cfg)).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub fetched: usize,
    pub duplicates: usize,
    pub admitted: usize,
    pub rejected: usize,
    pub stored: usize,
    pub provider_errors: usize,
    pub sink_errors: usize,
}

/// Fetch every provider, gate each candidate against the config snapshot
/// current at that moment, and forward admitted ones to `sink`.
pub async fn run_once(
    providers: &[Box<dyn FeedProvider>],
    gate: &FilterGate,
    config: &FilterConfigHandle,
    sink: &dyn ArticleSink,
) -> IngestReport {
    ensure_metrics_described();
    let mut report = IngestReport::default();

    let mut raw = Vec::new();
    for p in providers {
        match p.fetch_latest().await {
            Ok(mut v) => raw.append(&mut v),
            Err(e) => {
                tracing::warn!(error = ?e, provider = p.name(), "provider error");
                counter!("ingest_provider_errors_total").increment(1);
                report.provider_errors += 1;
            }
        }
    }
    report.fetched = raw.len();

    let (candidates, dups) = normalize_and_dedup(raw);
    report.duplicates = dups;

    for c in candidates {
        // Snapshot per candidate: a reload applies from the next candidate on.
        let cfg = config.snapshot();
        let decision = gate.evaluate(&c, &cfg);
        if !decision.admitted {
            report.rejected += 1;
            continue;
        }
        report.admitted += 1;

        let article = AdmittedArticle {
            id: url_fingerprint(&c.url),
            category: decision.classification.category,
            relevance_score: decision.classification.relevance_score,
            candidate: ArticleCandidate {
                title: truncate_chars(&c.title, STORED_TEXT_MAX_CHARS),
                description: truncate_chars(&c.description, STORED_TEXT_MAX_CHARS),
                ..c
            },
        };
        match sink.store(article).await {
            Ok(()) => report.stored += 1,
            Err(e) => {
                tracing::warn!(error = ?e, url = %decision.url, "sink error");
                counter!("ingest_sink_errors_total").increment(1);
                report.sink_errors += 1;
            }
        }
    }

    // Telemetry
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    counter!("ingest_candidates_total").increment(report.fetched as u64);
    counter!("ingest_duplicates_total").increment(report.duplicates as u64);
    gauge!("ingest_pipeline_last_run_ts").set(now as f64);

    tracing::info!(
        target: "ingest",
        fetched = report.fetched,
        duplicates = report.duplicates,
        admitted = report.admitted,
        rejected = report.rejected,
        stored = report.stored,
        "ingest run finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_collapses_ws_and_punct() {
        let s = "  Hello,&nbsp;&nbsp; world!!!  ";
        let out = normalize_text(s);
        assert_eq!(out, "Hello, world");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("ñandú", 3), "ñan");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn fingerprint_is_stable_and_trimmed() {
        let a = url_fingerprint("http://example.com/x");
        assert_eq!(a.len(), 12);
        assert_eq!(a, url_fingerprint("  http://example.com/x "));
        assert_ne!(a, url_fingerprint("http://example.com/y"));
    }

    #[test]
    fn dedup_by_url_keeps_first_and_empty_urls() {
        let mk = |title: &str, url: &str| ArticleCandidate {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        };
        let raw = vec![
            mk("first", "http://a"),
            mk("second", " http://a "),
            mk("no url", ""),
            mk("no url again", ""),
            mk("<b>other</b>", "http://b"),
        ];
        let (kept, dups) = normalize_and_dedup(raw);
        assert_eq!(dups, 1);
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[0].title, "first");
        assert_eq!(kept[3].title, "other");
    }
}
