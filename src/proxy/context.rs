use crate::config::DetectionConfig;
use crate::waf::ResponseInterceptor;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

static PROCESS_TAG: Lazy<u64> = Lazy::new(|| {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
});

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generates a correlation id unique within this process.
pub fn next_request_id() -> String {
    let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{:016x}{:08x}", *PROCESS_TAG, seq)
}

pub struct ProxyContext {
    /// Snapshot taken when the request arrived; reloads do not affect it.
    pub config: Arc<DetectionConfig>,
    pub request_id: String,
    /// Present only when the XSS check is armed for this request.
    pub interceptor: Option<ResponseInterceptor>,
}

impl ProxyContext {
    pub fn new(config: Arc<DetectionConfig>) -> Self {
        Self {
            config,
            request_id: String::new(),
            interceptor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = next_request_id();
        let b = next_request_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 24);
    }

    #[test]
    fn test_new_context_is_unarmed() {
        let ctx = ProxyContext::new(Arc::new(DetectionConfig::default()));
        assert!(ctx.interceptor.is_none());
        assert!(ctx.request_id.is_empty());
    }
}
