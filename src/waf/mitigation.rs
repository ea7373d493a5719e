use super::{BlockAction, HeaderField, RiskEvent, RiskReporter};
use crate::metrics::MetricsCollector;
use log::warn;
use std::sync::Arc;

/// Placeholder in `block_url` replaced by the request correlation id.
pub const REQUEST_ID_PLACEHOLDER: &str = "%request_id%";

/// Redirects a blocked response to the configured block page.
pub struct RedirectBlock {
    block_url: String,
}

impl RedirectBlock {
    pub fn new(block_url: impl Into<String>) -> Self {
        Self {
            block_url: block_url.into(),
        }
    }

    pub fn location(&self, request_id: &str) -> String {
        self.block_url.replace(REQUEST_ID_PLACEHOLDER, request_id)
    }
}

impl BlockAction for RedirectBlock {
    fn apply(&self, headers: &mut Vec<HeaderField>, request_id: &str) {
        headers.retain(|h| !h.name.eq_ignore_ascii_case("location"));
        headers.push(HeaderField::new("Location", self.location(request_id)));
    }
}

/// Logs every risk and counts it by category.
pub struct LogRiskReporter {
    metrics: Arc<MetricsCollector>,
}

impl LogRiskReporter {
    pub fn new(metrics: Arc<MetricsCollector>) -> Self {
        Self { metrics }
    }
}

impl RiskReporter for LogRiskReporter {
    fn report(&self, request_id: &str, event: &RiskEvent) {
        warn!(
            "Security risk - Request: {}, Type: {}, Confidence: {}, Message: {}, Evidence: {:?}",
            request_id, event.category, event.confidence, event.message, event.evidence
        );
        self.metrics.increment_risk_events(&event.category);
    }
}
