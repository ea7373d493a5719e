use super::{is_suspicious, DetectionResult, QueryParameter};
use crate::config::DetectionConfig;

/// Looks for suspicious GET parameters echoed verbatim in `body`.
///
/// Parameters are walked in order while counting the suspicious ones. Once
/// the count exceeds `max_suspicious_count` the scan escalates immediately,
/// before the current value is looked up in the body. Otherwise the first
/// suspicious value found in the body wins. `None` means the request had no
/// query map.
pub fn scan(
    params: Option<&[QueryParameter]>,
    body: &[u8],
    config: &DetectionConfig,
) -> DetectionResult {
    let Some(params) = params else {
        return DetectionResult::NoMatch;
    };

    let mut count = 0usize;
    for param in params {
        if !is_suspicious(param, config) {
            continue;
        }

        count += 1;
        if count > config.max_suspicious_count {
            return DetectionResult::ExcessiveSuspicion { count };
        }

        if let Some(value) = param.as_bytes() {
            if contains_literal(body, value) {
                return DetectionResult::ReflectedMatch {
                    parameter: param.clone(),
                };
            }
        }
    }

    DetectionResult::NoMatch
}

fn contains_literal(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waf::parse_query;

    const FILTER: &str = r"<![\-\[A-Za-z]|<([A-Za-z]{1,12})[/ >]";

    fn config(max_count: usize) -> DetectionConfig {
        DetectionConfig::new(FILTER, 5, max_count, "/blocked")
    }

    #[test]
    fn test_reflected_parameter() {
        let params = vec![
            QueryParameter::text("page", "1"),
            QueryParameter::text("x", "<script>"),
        ];
        let body = b"<html><body>You searched for <script></body></html>";
        let result = scan(Some(params.as_slice()), body, &config(10));
        assert_eq!(
            result,
            DetectionResult::ReflectedMatch {
                parameter: QueryParameter::text("x", "<script>"),
            }
        );
    }

    #[test]
    fn test_reflected_value_with_trailing_invalid_byte() {
        let params = parse_query("q=%22%3E%3Cscript%3Ealert(1)%3C%2Fscript%3E%FF");
        let body = b"<html>Results for \"><script>alert(1)</script>\xFF</html>";
        let result = scan(Some(params.as_slice()), body, &config(10));
        assert_eq!(result.reason(), "reflected_parameter");
    }

    #[test]
    fn test_escaped_reflection_is_not_a_match() {
        let params = vec![QueryParameter::text("x", "<script>")];
        let body = b"<p>You searched for &lt;script&gt;</p>";
        assert_eq!(scan(Some(params.as_slice()), body, &config(10)), DetectionResult::NoMatch);
    }

    #[test]
    fn test_escalation_fires_without_reflection() {
        let params = vec![
            QueryParameter::text("a", "<img src=x>"),
            QueryParameter::text("b", "<svg onload=1>"),
        ];
        let body = b"<html>nothing echoed</html>";
        assert_eq!(
            scan(Some(params.as_slice()), body, &config(1)),
            DetectionResult::ExcessiveSuspicion { count: 2 }
        );
    }

    #[test]
    fn test_escalation_precedes_containment() {
        // b is reflected, but crossing the threshold is checked first
        let params = vec![
            QueryParameter::text("a", "<img src=x>"),
            QueryParameter::text("b", "<svg onload=1>"),
        ];
        let body = b"<html><svg onload=1></html>";
        assert_eq!(
            scan(Some(params.as_slice()), body, &config(1)),
            DetectionResult::ExcessiveSuspicion { count: 2 }
        );
    }

    #[test]
    fn test_first_reflection_short_circuits() {
        // Evaluating b would push the count past the threshold
        let params = vec![
            QueryParameter::text("a", "<img src=x>"),
            QueryParameter::text("b", "<svg onload=1>"),
        ];
        let body = b"<div><img src=x></div>";
        assert_eq!(
            scan(Some(params.as_slice()), body, &config(1)),
            DetectionResult::ReflectedMatch {
                parameter: QueryParameter::text("a", "<img src=x>"),
            }
        );
    }

    #[test]
    fn test_zero_threshold_escalates_on_first_suspicious() {
        let params = vec![QueryParameter::text("a", "<img src=x>")];
        assert_eq!(
            scan(Some(params.as_slice()), b"<img src=x>", &config(0)),
            DetectionResult::ExcessiveSuspicion { count: 1 }
        );
    }

    #[test]
    fn test_non_suspicious_parameters_do_not_count() {
        let params = vec![
            QueryParameter::text("a", "plain text value"),
            QueryParameter::text("b", "another plain value"),
            QueryParameter::text("c", "<img src=x>"),
        ];
        assert_eq!(
            scan(Some(params.as_slice()), b"<html></html>", &config(1)),
            DetectionResult::NoMatch
        );
    }

    #[test]
    fn test_missing_query_map() {
        assert_eq!(scan(None, b"<script>", &config(10)), DetectionResult::NoMatch);
        assert_eq!(scan(Some(&[] as &[QueryParameter]), b"<script>", &config(10)), DetectionResult::NoMatch);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let params = vec![
            QueryParameter::text("a", "<img src=x>"),
            QueryParameter::text("b", "<b>bold</b>"),
        ];
        let body = b"<p><b>bold</b></p>";
        let cfg = config(10);
        let first = scan(Some(params.as_slice()), body, &cfg);
        let second = scan(Some(params.as_slice()), body, &cfg);
        assert_eq!(first, second);
        assert!(first.is_positive());
    }

    #[test]
    fn test_contains_literal() {
        assert!(contains_literal(b"abcdef", b"cde"));
        assert!(!contains_literal(b"abc", b"abcd"));
        assert!(contains_literal(b"abc", b""));
    }
}
