use log::debug;
use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::Arc;

// Use global registry for Pingora's built-in Prometheus service
static RESPONSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "xss_guard_responses_total",
            "Responses seen by the XSS guard, by outcome",
        ),
        &["outcome"],
    )
    .expect("metric creation failed")
});

static BLOCKED_RESPONSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("xss_guard_blocked_total", "Responses blocked by the XSS guard"),
        &["reason"],
    )
    .expect("metric creation failed")
});

static RISK_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("xss_guard_risk_events_total", "Risk events reported"),
        &["category"],
    )
    .expect("metric creation failed")
});

pub struct MetricsCollector {
    pub registry: Arc<Registry>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        // Register with default registry (used by Pingora)
        for collector in [&*RESPONSES, &*BLOCKED_RESPONSES, &*RISK_EVENTS] {
            if let Err(e) = prometheus::register(Box::new(collector.clone())) {
                debug!("Metric already registered: {}", e);
            }
        }

        Self {
            registry: Arc::new(prometheus::default_registry().clone()),
        }
    }

    pub fn increment_response(&self, outcome: &str) {
        RESPONSES.with_label_values(&[outcome]).inc();
    }

    pub fn increment_blocked(&self, reason: &str) {
        RESPONSES.with_label_values(&["blocked"]).inc();
        BLOCKED_RESPONSES.with_label_values(&[reason]).inc();
    }

    pub fn increment_risk_events(&self, category: &str) {
        RISK_EVENTS.with_label_values(&[category]).inc();
    }

    pub fn responses(&self, outcome: &str) -> u64 {
        RESPONSES.with_label_values(&[outcome]).get()
    }

    pub fn blocked(&self, reason: &str) -> u64 {
        BLOCKED_RESPONSES.with_label_values(&[reason]).get()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
