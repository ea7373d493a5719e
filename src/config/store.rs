use super::{DetectionConfig, GuardConfig};
use log::info;
use parking_lot::RwLock;
use std::sync::Arc;

/// Holds the current detection snapshot. Reloads swap in a new `Arc`;
/// requests keep whichever snapshot they started with.
pub struct ConfigStore {
    current: RwLock<Arc<DetectionConfig>>,
}

impl ConfigStore {
    pub fn new(settings: &GuardConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(DetectionConfig::from_settings(settings))),
        }
    }

    pub fn current(&self) -> Arc<DetectionConfig> {
        self.current.read().clone()
    }

    pub fn replace(&self, settings: &GuardConfig) {
        let next = Arc::new(DetectionConfig::from_settings(settings));
        *self.current.write() = next;
        info!(
            "XSS detection settings updated (armed: {}, min_param_length: {}, max_detection_num: {})",
            settings.xss_armed(),
            settings.xss.min_param_length,
            settings.xss.max_detection_num
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_swaps_snapshot() {
        let store = ConfigStore::new(&GuardConfig::default());
        let before = store.current();

        let mut settings = GuardConfig::default();
        settings.xss.max_detection_num = 1;
        store.replace(&settings);

        // In-flight holders keep the old snapshot
        assert_eq!(before.max_suspicious_count, 10);
        assert_eq!(store.current().max_suspicious_count, 1);
        assert!(!Arc::ptr_eq(&before, &store.current()));
    }

    #[test]
    fn test_current_is_shared() {
        let store = ConfigStore::new(&GuardConfig::default());
        assert!(Arc::ptr_eq(&store.current(), &store.current()));
    }
}
