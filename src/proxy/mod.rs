pub mod context;

use crate::config::ConfigStore;
use crate::metrics::MetricsCollector;
use crate::waf::*;
use async_trait::async_trait;
use bytes::Bytes;
use context::{next_request_id, ProxyContext};
use log::{error, info, warn};
use pingora::http::{RequestHeader, ResponseHeader};
use pingora::prelude::*;
use pingora::upstreams::peer::HttpPeer;
use pingora_proxy::{ProxyHttp, Session};
use std::sync::Arc;
use std::time::Duration;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

pub struct XssGuardProxy {
    pub store: Arc<ConfigStore>,
    pub reporter: Arc<dyn RiskReporter>,
    pub metrics: Arc<MetricsCollector>,
    pub upstream_addr: (String, u16),
}

impl XssGuardProxy {
    pub fn new(
        upstream_addr: (String, u16),
        store: Arc<ConfigStore>,
        reporter: Arc<dyn RiskReporter>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            reporter,
            metrics,
            upstream_addr,
        }
    }

    fn record_outcome(&self, ctx: &ProxyContext) {
        let Some(interceptor) = ctx.interceptor.as_ref() else {
            self.metrics.increment_response("unarmed");
            return;
        };

        if !interceptor.state().is_terminal() {
            self.metrics.increment_response("incomplete");
            return;
        }

        match (interceptor.state(), interceptor.result()) {
            (InterceptState::Blocked, Some(result)) => self.metrics.increment_blocked(result.reason()),
            (_, Some(_)) => self.metrics.increment_response("clean"),
            (_, None) => self.metrics.increment_response("unscanned"),
        }
    }
}

/// Correlation id from the inbound request, or a freshly generated one.
pub fn request_id_for(request: &RequestHeader) -> String {
    request
        .headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(next_request_id)
}

/// Asks the upstream for an unencoded body. A compressed body cannot be
/// searched for reflected parameters.
pub fn request_identity_encoding(request: &mut RequestHeader) -> Result<()> {
    request.insert_header("Accept-Encoding", "identity")
}

/// HEAD requests and 1xx/204/304 responses never carry a body.
pub fn response_has_body(method: &http::Method, status: u16) -> bool {
    *method != http::Method::HEAD && !(100..200).contains(&status) && status != 204 && status != 304
}

/// Copies the outgoing header set with names staged for the classifier.
pub fn snapshot_headers(response: &ResponseHeader) -> Vec<HeaderField> {
    response
        .headers
        .iter()
        .map(|(name, value)| {
            HeaderField::new(
                staged_header_name(name.as_str()),
                String::from_utf8_lossy(value.as_bytes()),
            )
        })
        .collect()
}

#[async_trait]
impl ProxyHttp for XssGuardProxy {
    type CTX = ProxyContext;

    fn new_ctx(&self) -> Self::CTX {
        ProxyContext::new(self.store.current())
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool>
    where
        Self::CTX: Send + Sync,
    {
        let request = session.req_header();
        ctx.request_id = request_id_for(request);

        if ctx.config.armed {
            let params = request.uri.query().map(parse_query);
            let block_action = Arc::new(RedirectBlock::new(ctx.config.block_url.clone()));
            ctx.interceptor = Some(ResponseInterceptor::new(
                ctx.config.clone(),
                params,
                ctx.request_id.clone(),
                self.reporter.clone(),
                block_action,
            ));
        }

        Ok(false)
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        let peer = Box::new(HttpPeer::new(
            (self.upstream_addr.0.as_str(), self.upstream_addr.1),
            false,
            "".to_string(),
        ));
        Ok(peer)
    }

    async fn upstream_request_filter(
        &self,
        _session: &mut Session,
        upstream_request: &mut RequestHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()>
    where
        Self::CTX: Send + Sync,
    {
        upstream_request.insert_header(REQUEST_ID_HEADER, ctx.request_id.as_str())?;
        if ctx.interceptor.is_some() {
            request_identity_encoding(upstream_request)?;
        }
        Ok(())
    }

    async fn response_filter(
        &self,
        session: &mut Session,
        upstream_response: &mut ResponseHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()>
    where
        Self::CTX: Send + Sync,
    {
        let Some(interceptor) = ctx.interceptor.as_mut() else {
            return Ok(());
        };

        interceptor.on_headers(snapshot_headers(upstream_response));
        let has_body = response_has_body(
            &session.req_header().method,
            upstream_response.status.as_u16(),
        );
        if has_body && interceptor.state() == InterceptState::Init {
            // Body may be replaced, so its length is no longer known
            upstream_response.remove_header(&http::header::CONTENT_LENGTH);
            upstream_response.insert_header("Transfer-Encoding", "chunked")?;
            upstream_response.insert_header("Cache-Control", "no-store")?;
        }
        upstream_response.insert_header(REQUEST_ID_HEADER, ctx.request_id.as_str())?;

        Ok(())
    }

    fn response_body_filter(
        &self,
        _session: &mut Session,
        body: &mut Option<Bytes>,
        end_of_stream: bool,
        ctx: &mut Self::CTX,
    ) -> Result<Option<Duration>>
    where
        Self::CTX: Send + Sync,
    {
        let Some(interceptor) = ctx.interceptor.as_mut() else {
            return Ok(None);
        };

        let was_blocked = interceptor.state() == InterceptState::Blocked;
        *body = interceptor.on_body(body.take(), end_of_stream);

        if !was_blocked && interceptor.state() == InterceptState::Blocked {
            let location = interceptor
                .headers()
                .iter()
                .find(|h| h.name == "Location")
                .map(|h| h.value.as_str())
                .unwrap_or_default();
            // Headers are already on the wire, so the Location never reaches the client
            warn!(
                "Response body suppressed - Request: {}, Redirect not sent (headers already committed): {}",
                interceptor.request_id(),
                location
            );
        }

        Ok(None)
    }

    async fn logging(&self, session: &mut Session, e: Option<&pingora::Error>, ctx: &mut Self::CTX)
    where
        Self::CTX: Send + Sync,
    {
        let response_code = session
            .response_written()
            .map_or(0, |resp| resp.status.as_u16());
        let method = session.req_header().method.as_str();
        let path = session.req_header().uri.path();

        if let Some(error) = e {
            error!(
                "Request failed - ID: {}, Method: {}, Path: {}, Error: {:?}",
                ctx.request_id, method, path, error
            );
        } else {
            info!(
                "Request completed - ID: {}, Method: {}, Path: {}, Status: {}",
                ctx.request_id, method, path, response_code
            );
        }

        self.record_outcome(ctx);
    }
}
