use lazy_static::lazy_static;
use prometheus::{
    GaugeVec, Histogram, IntCounter, IntCounterVec, register_gauge_vec, register_histogram,
    register_int_counter, register_int_counter_vec,
};


lazy_static! {
    pub static ref HOURLY_RATE_LIMIT: GaugeVec = register_gauge_vec!(
        "sentry_hourly_rate_limit",
        "Rate limit for Sentry projects",
        &["project"]
    )
    .unwrap();
    pub static ref RECEIVED_EVENT_HOURLY_RATE: GaugeVec = register_gauge_vec!(
        "sentry_received_event_hourly_rate",
        "Received events for Sentry projects",
        &["project"]
    )
    .unwrap();
    pub static ref SCRAPE_CYCLES: IntCounterVec = register_int_counter_vec!(
        "sentry_exporter_scrape_cycles_total",
        "Scrape cycles by outcome",
        &["outcome"]
    )
    .unwrap();
    pub static ref SCRAPE_DURATION: Histogram = register_histogram!(
        "sentry_exporter_scrape_duration_seconds",
        "Duration of successful scrape cycles in seconds"
    )
    .unwrap();
    pub static ref UPSTREAM_THROTTLED: IntCounter = register_int_counter!(
        "sentry_exporter_upstream_throttled_total",
        "Upstream 429 responses absorbed by backoff"
    )
    .unwrap();
}

// Gauge writes are keyed by project slug and last-write-wins

pub fn set_hourly_rate_limit(project_slug: &str, value: i64) {
    HOURLY_RATE_LIMIT
        .with_label_values(&[project_slug])
        .set(value as f64);
}

pub fn set_received_events(project_slug: &str, value: i64) {
    RECEIVED_EVENT_HOURLY_RATE
        .with_label_values(&[project_slug])
        .set(value as f64);
}

pub fn record_cycle(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    SCRAPE_CYCLES.with_label_values(&[outcome]).inc();
}
