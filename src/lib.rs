//! Reflected XSS guard for a Pingora reverse proxy.
//!
//! Buffers HTML responses, looks for suspicious GET parameters echoed
//! verbatim in the body and, on a hit, suppresses the body and redirects to
//! a block page.

pub mod config;
pub mod metrics;
pub mod proxy;
pub mod waf;

pub use config::*;
pub use metrics::*;
pub use proxy::*;
pub use waf::*;
