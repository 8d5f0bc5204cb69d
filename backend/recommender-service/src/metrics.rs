use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, TextEncoder};

static STAGE_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "recommender_stage_duration_seconds",
            "Duration of each recommendation pipeline stage",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["stage"],
    )
    .expect("failed to create recommender_stage_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register recommender_stage_duration_seconds");
    histogram
});

static PIPELINE_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "recommender_pipeline_runs_total",
            "Rating-change pipeline runs by outcome",
        ),
        &["outcome"],
    )
    .expect("failed to create recommender_pipeline_runs_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register recommender_pipeline_runs_total");
    counter
});

static RATINGS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("recommender_ratings_total", "Ledger calls by feeling and change"),
        &["feeling", "change"],
    )
    .expect("failed to create recommender_ratings_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register recommender_ratings_total");
    counter
});

static WILSON_FALLBACKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "recommender_wilson_fallbacks_total",
        "Wilson scores replaced with 0.0 after a non-finite result",
    )
    .expect("failed to create recommender_wilson_fallbacks_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register recommender_wilson_fallbacks_total");
    counter
});

pub fn observe_stage(stage: &str, elapsed: Duration) {
    STAGE_DURATION_SECONDS
        .with_label_values(&[stage])
        .observe(elapsed.as_secs_f64());
}

pub fn record_pipeline(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    PIPELINE_RUNS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_rating(feeling: &str, change: &str) {
    RATINGS_TOTAL.with_label_values(&[feeling, change]).inc();
}

pub fn record_wilson_fallback() {
    WILSON_FALLBACKS_TOTAL.inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
