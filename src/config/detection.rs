use super::{FinalizationMode, GuardConfig};
use crate::waf::SuspicionPattern;
use log::error;

/// Immutable detection settings shared by every request of one
/// configuration generation.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub suspicion_pattern: SuspicionPattern,
    pub min_param_length: usize,
    pub max_suspicious_count: usize,
    pub block_url: String,
    pub finalization: FinalizationMode,
    pub max_body_size: usize,
    /// False when the guard is disabled or `xss` is an ignored type.
    pub armed: bool,
}

impl DetectionConfig {
    pub fn new(
        pattern: &str,
        min_param_length: usize,
        max_suspicious_count: usize,
        block_url: &str,
    ) -> Self {
        let defaults = GuardConfig::default();
        Self {
            suspicion_pattern: compile_pattern(pattern),
            min_param_length,
            max_suspicious_count,
            block_url: block_url.to_string(),
            finalization: defaults.xss.finalization,
            max_body_size: defaults.max_body_size,
            armed: true,
        }
    }

    pub fn from_settings(settings: &GuardConfig) -> Self {
        Self {
            suspicion_pattern: compile_pattern(&settings.xss.filter_regex),
            min_param_length: settings.xss.min_param_length,
            max_suspicious_count: settings.xss.max_detection_num,
            block_url: settings.block_url.clone(),
            finalization: settings.xss.finalization,
            max_body_size: settings.max_body_size,
            armed: settings.xss_armed(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self::from_settings(&GuardConfig::default())
    }
}

fn compile_pattern(source: &str) -> SuspicionPattern {
    match SuspicionPattern::compile(source) {
        Ok(pattern) => pattern,
        Err(e) => {
            error!(
                "Invalid XSS filter regex '{}': {}; parameter filtering disabled",
                source, e
            );
            SuspicionPattern::inactive(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let mut settings = GuardConfig::default();
        settings.xss.min_param_length = 3;
        settings.xss.max_detection_num = 2;
        settings.block_url = "/b/%request_id%".to_string();

        let config = DetectionConfig::from_settings(&settings);
        assert!(config.suspicion_pattern.is_active());
        assert_eq!(config.min_param_length, 3);
        assert_eq!(config.max_suspicious_count, 2);
        assert_eq!(config.block_url, "/b/%request_id%");
        assert!(config.armed);
    }

    #[test]
    fn test_bad_regex_builds_inactive_pattern() {
        let mut settings = GuardConfig::default();
        settings.xss.filter_regex = "<(script".to_string();
        let config = DetectionConfig::from_settings(&settings);
        assert!(!config.suspicion_pattern.is_active());
        assert_eq!(config.suspicion_pattern.source(), "<(script");
    }

    #[test]
    fn test_ignored_type_carried_into_snapshot() {
        let mut settings = GuardConfig::default();
        settings.ignored_types.push("xss".to_string());
        assert!(!DetectionConfig::from_settings(&settings).armed);
    }
}
