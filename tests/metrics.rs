// tests/metrics.rs
//
// Metric series emitted by the gate and the config handle, captured with a
// local Prometheus recorder so tests do not fight over the global one.

use metrics_exporter_prometheus::PrometheusBuilder;

use geo_news_filter::config::{FilterConfigHandle, FilterConfiguration};
use geo_news_filter::ArticleCandidate;

fn cand(title: &str, url: &str) -> ArticleCandidate {
    ArticleCandidate {
        title: title.into(),
        url: url.into(),
        ..Default::default()
    }
}

#[test]
fn gate_and_reload_series_are_exported() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let gate = geo_news_filter::default_gate().unwrap();

    metrics::with_local_recorder(&recorder, || {
        let cfg = FilterConfiguration::default();
        gate.evaluate(&cand("FIFA World Cup qualifiers", "http://wc"), &cfg);
        gate.evaluate(&cand("Troops and artillery at the front", "http://m"), &cfg);
        gate.evaluate(&cand("Valid headline", ""), &cfg);

        let h = FilterConfigHandle::new(cfg);
        h.replace(FilterConfiguration {
            sensitivity_threshold: 1,
            ..Default::default()
        })
        .unwrap();
    });

    let text = handle.render();
    for needle in [
        "filter_decisions_total",
        "filter_admitted_total 1",
        "filter_rejected_total 2",
        "filter_config_reloads_total 1",
        "filter_sensitivity_threshold 1",
        r#"reason="category_excluded""#,
        r#"category="military_conflict""#,
        r#"reason="missing_required_field""#,
    ] {
        assert!(text.contains(needle), "missing `{needle}` in:\n{text}");
    }
}

#[tokio::test]
async fn http_provider_error_is_counted_once() {
    use geo_news_filter::ingest::providers::rss::RssProvider;
    use geo_news_filter::ingest::sink::MemorySink;
    use geo_news_filter::ingest::types::FeedProvider;
    use std::time::Duration;

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let _guard = metrics::set_default_local_recorder(&recorder);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    // Nothing listens on the discard port.
    let providers: Vec<Box<dyn FeedProvider>> = vec![Box::new(RssProvider::from_url(
        "Offline",
        "http://127.0.0.1:9/rss",
        client,
    ))];
    let report = geo_news_filter::ingest::run_once(
        &providers,
        &geo_news_filter::default_gate().unwrap(),
        &FilterConfigHandle::new(FilterConfiguration::default()),
        &MemorySink::new(),
    )
    .await;
    assert_eq!(report.provider_errors, 1);

    let text = handle.render();
    assert!(text.contains("ingest_provider_errors_total 1"), "{text}");
}

#[tokio::test]
async fn metrics_route_serves_exposition_text() {
    use axum::body::{self, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt as _;

    // The only test in this binary that installs the global recorder.
    let m = geo_news_filter::metrics::Metrics::init(2).expect("install recorder");
    metrics::counter!("filter_admitted_total").increment(2);

    let resp = m
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("filter_sensitivity_threshold 2"), "{text}");
    assert!(text.contains("filter_admitted_total 2"), "{text}");
}
