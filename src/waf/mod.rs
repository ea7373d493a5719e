pub mod body_inspector;
pub mod content_type;
pub mod interceptor;
pub mod mitigation;
pub mod param_filter;
pub mod query;
pub mod reflection_scanner;

pub use body_inspector::*;
pub use content_type::*;
pub use interceptor::*;
pub use mitigation::*;
pub use param_filter::*;
pub use query::*;
pub use reflection_scanner::*;

/// Attack category this guard reports under.
pub const XSS_CATEGORY: &str = "xss";

/// One outgoing response header, as observed at detection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

impl HeaderField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Decoded value of a GET parameter. Values are raw decoded bytes: a client
/// may percent-encode sequences that are not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(Vec<u8>),
    /// Array-style parameter (`tags[]=a&tags[]=b`, `user[name]=x`) as
    /// `(sub key, value)` pairs.
    Structured(Vec<(String, Vec<u8>)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    pub name: String,
    pub value: ParamValue,
}

impl QueryParameter {
    pub fn text(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: ParamValue::Text(value.into()),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            ParamValue::Text(value) => Some(value),
            ParamValue::Structured(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionResult {
    NoMatch,
    ReflectedMatch { parameter: QueryParameter },
    ExcessiveSuspicion { count: usize },
}

impl DetectionResult {
    pub fn is_positive(&self) -> bool {
        !matches!(self, DetectionResult::NoMatch)
    }

    /// Metric label for a positive result.
    pub fn reason(&self) -> &'static str {
        match self {
            DetectionResult::NoMatch => "none",
            DetectionResult::ReflectedMatch { .. } => "reflected_parameter",
            DetectionResult::ExcessiveSuspicion { .. } => "excessive_suspicion",
        }
    }

    pub fn risk_event(&self) -> Option<RiskEvent> {
        match self {
            DetectionResult::NoMatch => None,
            DetectionResult::ReflectedMatch { parameter } => {
                let evidence = parameter
                    .as_bytes()
                    .map(|v| String::from_utf8_lossy(v).into_owned())
                    .unwrap_or_default();
                Some(RiskEvent {
                    category: XSS_CATEGORY.to_string(),
                    confidence: 100,
                    message: format!("reflected XSS via parameter '{}'", evidence),
                    evidence,
                })
            }
            DetectionResult::ExcessiveSuspicion { .. } => Some(RiskEvent {
                category: XSS_CATEGORY.to_string(),
                confidence: 100,
                evidence: String::new(),
                message: "excessively suspected parameters".to_string(),
            }),
        }
    }
}

/// Alert handed to the risk reporter when a response is blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskEvent {
    pub category: String,
    pub confidence: u8,
    pub evidence: String,
    pub message: String,
}

/// Delivery channel for confirmed risks.
pub trait RiskReporter: Send + Sync {
    fn report(&self, request_id: &str, event: &RiskEvent);
}

/// Header-side mitigation applied to a blocked response.
pub trait BlockAction: Send + Sync {
    fn apply(&self, headers: &mut Vec<HeaderField>, request_id: &str);
}
