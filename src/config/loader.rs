use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GuardConfig {
    #[serde(default)]
    pub xss: XssConfig,
    #[serde(default = "default_block_url")]
    pub block_url: String,
    /// Attack categories that are not checked (e.g. `xss`)
    #[serde(default)]
    pub ignored_types: Vec<String>,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    #[serde(default)]
    pub hot_reload: HotReloadConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct XssConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_filter_regex")]
    pub filter_regex: String,
    #[serde(default = "default_min_param_length")]
    pub min_param_length: usize,
    #[serde(default = "default_max_detection_num")]
    pub max_detection_num: usize,
    #[serde(default)]
    pub finalization: FinalizationMode,
}

/// When the buffered body counts as complete.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinalizationMode {
    /// Buffer every chunk until end of stream, then scan.
    #[default]
    StreamComplete,
    /// Scan only bodies delivered as one data chunk; bodies streamed in
    /// several chunks pass through unscanned.
    SingleChunk,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HotReloadConfig {
    pub enabled: bool,
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_filter_regex() -> String {
    r"<![\-\[A-Za-z]|<([A-Za-z]{1,12})[/ >]".to_string()
}

fn default_min_param_length() -> usize {
    15
}

fn default_max_detection_num() -> usize {
    10
}

fn default_block_url() -> String {
    "/blocked?request_id=%request_id%".to_string()
}

fn default_max_body_size() -> usize {
    4194304 // 4MB
}

fn default_debounce_secs() -> u64 {
    2
}

impl GuardConfig {
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: GuardConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Whether responses are intercepted at all.
    pub fn xss_armed(&self) -> bool {
        self.xss.enabled && !self.ignored_types.iter().any(|t| t == crate::waf::XSS_CATEGORY)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            xss: XssConfig::default(),
            block_url: default_block_url(),
            ignored_types: vec![],
            max_body_size: default_max_body_size(),
            hot_reload: HotReloadConfig::default(),
        }
    }
}

impl Default for XssConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filter_regex: default_filter_regex(),
            min_param_length: default_min_param_length(),
            max_detection_num: default_max_detection_num(),
            finalization: FinalizationMode::default(),
        }
    }
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_secs: default_debounce_secs(),
        }
    }
}
