use super::{ParamValue, QueryParameter};
use crate::config::DetectionConfig;
use regex::bytes::Regex;

/// Configured suspicion regex. A pattern that failed to compile stays in
/// the snapshot as an inactive matcher that never matches.
#[derive(Debug, Clone)]
pub struct SuspicionPattern {
    source: String,
    regex: Option<Regex>,
}

impl SuspicionPattern {
    pub fn compile(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(source)?;
        Ok(Self {
            source: source.to_string(),
            regex: Some(regex),
        })
    }

    pub fn inactive(source: &str) -> Self {
        Self {
            source: source.to_string(),
            regex: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_active(&self) -> bool {
        self.regex.is_some()
    }

    /// Unanchored search over raw bytes.
    pub fn is_match(&self, value: &[u8]) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(value))
    }
}

/// A parameter is suspicious when it is plain text, longer than
/// `min_param_length` bytes and the suspicion pattern matches it.
pub fn is_suspicious(param: &QueryParameter, config: &DetectionConfig) -> bool {
    match &param.value {
        ParamValue::Text(value) => {
            value.len() > config.min_param_length && config.suspicion_pattern.is_match(value)
        }
        ParamValue::Structured(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILTER: &str = r"<![\-\[A-Za-z]|<([A-Za-z]{1,12})[/ >]";

    fn config(pattern: &str, min_len: usize) -> DetectionConfig {
        DetectionConfig::new(pattern, min_len, 10, "/blocked")
    }

    #[test]
    fn test_script_tag_is_suspicious() {
        let cfg = config(FILTER, 15);
        let param = QueryParameter::text("q", "\"><script>alert(1)</script>");
        assert!(is_suspicious(&param, &cfg));
    }

    #[test]
    fn test_plain_text_is_not_suspicious() {
        let cfg = config(FILTER, 15);
        let param = QueryParameter::text("q", "a perfectly normal search phrase");
        assert!(!is_suspicious(&param, &cfg));
    }

    #[test]
    fn test_short_values_never_suspicious() {
        // Matches the pattern but is not longer than the threshold
        let cfg = config(FILTER, 15);
        let exact = QueryParameter::text("q", "<b>xxxxxxxxxxxx");
        assert_eq!(exact.as_bytes().unwrap().len(), 15);
        assert!(!is_suspicious(&exact, &cfg));

        let cfg = config(".*", 3);
        assert!(!is_suspicious(&QueryParameter::text("q", "abc"), &cfg));
        assert!(is_suspicious(&QueryParameter::text("q", "abcd"), &cfg));
    }

    #[test]
    fn test_invalid_utf8_value_still_matches() {
        let cfg = config(FILTER, 15);
        let param = QueryParameter::text("q", b"\"><script>alert(1)</script>\xFF".to_vec());
        assert!(is_suspicious(&param, &cfg));
    }

    #[test]
    fn test_search_not_full_match() {
        let cfg = config("<img", 0);
        let param = QueryParameter::text("q", "prefix <img src=x> suffix");
        assert!(is_suspicious(&param, &cfg));
    }

    #[test]
    fn test_structured_values_never_suspicious() {
        let cfg = config(".*", 0);
        let param = QueryParameter {
            name: "tags".to_string(),
            value: ParamValue::Structured(vec![(String::new(), b"<script>alert(1)</script>".to_vec())]),
        };
        assert!(!is_suspicious(&param, &cfg));
    }

    #[test]
    fn test_invalid_pattern_fails_closed() {
        let cfg = config("(<script", 0);
        assert!(!cfg.suspicion_pattern.is_active());
        let param = QueryParameter::text("q", "(<script>alert(1)</script>");
        assert!(!is_suspicious(&param, &cfg));
    }

    #[test]
    fn test_compile_reports_error() {
        assert!(SuspicionPattern::compile("[unclosed").is_err());
        let pattern = SuspicionPattern::compile("<svg").unwrap();
        assert_eq!(pattern.source(), "<svg");
        assert!(pattern.is_match(b"x<svg/onload=1>"));
    }
}
