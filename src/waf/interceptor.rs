use super::{
    content_encoding, is_html, scan, BlockAction, BodyInspector, DetectionResult, HeaderField, QueryParameter,
    RiskReporter,
};
use crate::config::{DetectionConfig, FinalizationMode};
use bytes::{Bytes, BytesMut};
use log::{debug, warn};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptState {
    /// Armed, nothing seen yet.
    Init,
    /// Holding body chunks until the body is complete.
    Buffering,
    /// Body is emitted unchanged; terminal.
    Passthrough,
    /// Body was suppressed and mitigation applied; terminal.
    Blocked,
}

impl InterceptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InterceptState::Passthrough | InterceptState::Blocked)
    }
}

/// Per-response controller: buffers the body, classifies the response and
/// runs the reflection scan once the body is complete.
pub struct ResponseInterceptor {
    config: Arc<DetectionConfig>,
    params: Option<Vec<QueryParameter>>,
    request_id: String,
    reporter: Arc<dyn RiskReporter>,
    block_action: Arc<dyn BlockAction>,
    headers: Vec<HeaderField>,
    body: BodyInspector,
    state: InterceptState,
    data_chunks: usize,
    result: Option<DetectionResult>,
}

impl ResponseInterceptor {
    pub fn new(
        config: Arc<DetectionConfig>,
        params: Option<Vec<QueryParameter>>,
        request_id: impl Into<String>,
        reporter: Arc<dyn RiskReporter>,
        block_action: Arc<dyn BlockAction>,
    ) -> Self {
        let body = BodyInspector::new(config.max_body_size);
        Self {
            config,
            params,
            request_id: request_id.into(),
            reporter,
            block_action,
            headers: Vec::new(),
            body,
            state: InterceptState::Init,
            data_chunks: 0,
            result: None,
        }
    }

    pub fn state(&self) -> InterceptState {
        self.state
    }

    pub fn headers(&self) -> &[HeaderField] {
        &self.headers
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Scan outcome, present once the body has been scanned.
    pub fn result(&self) -> Option<&DetectionResult> {
        self.result.as_ref()
    }

    /// Records the outgoing header set. A response already known to be
    /// non-HTML, or carrying an encoded body, skips buffering entirely.
    pub fn on_headers(&mut self, headers: Vec<HeaderField>) {
        if self.state != InterceptState::Init {
            return;
        }

        self.headers = headers;
        if !is_html(&self.headers) {
            debug!(
                "Request {}: response is not HTML, skipping XSS scan",
                self.request_id
            );
            self.state = InterceptState::Passthrough;
        } else if let Some(coding) = content_encoding(&self.headers) {
            warn!(
                "Request {}: HTML body is {}-encoded, forwarding response unscanned",
                self.request_id, coding
            );
            self.state = InterceptState::Passthrough;
        }
    }

    /// Feeds one body chunk and returns what to emit downstream now.
    ///
    /// `None` means nothing is emitted yet. Once blocked, the emitted body is
    /// a single empty payload and everything after it is dropped.
    pub fn on_body(&mut self, chunk: Option<Bytes>, end_of_stream: bool) -> Option<Bytes> {
        if self.state.is_terminal() {
            return chunk.filter(|_| self.state == InterceptState::Passthrough);
        }

        self.state = InterceptState::Buffering;

        // Empty payloads, such as the bare end-of-stream call, carry no data
        if let Some(chunk) = chunk.filter(|c| !c.is_empty()) {
            self.data_chunks += 1;
            if let Err(e) = self.body.append_chunk(&chunk) {
                warn!(
                    "Request {}: {}, forwarding response unscanned",
                    self.request_id, e
                );
                self.state = InterceptState::Passthrough;
                let mut out = BytesMut::from(&self.body.take()[..]);
                out.extend_from_slice(&chunk);
                return Some(out.freeze());
            }
        }

        if self.config.finalization == FinalizationMode::SingleChunk && self.data_chunks > 1 {
            debug!(
                "Request {}: body is streamed in several chunks ({} bytes held), skipping XSS scan",
                self.request_id,
                self.body.len()
            );
            self.state = InterceptState::Passthrough;
            return Some(self.body.take());
        }

        if !end_of_stream {
            return None;
        }

        Some(self.finalize())
    }

    fn finalize(&mut self) -> Bytes {
        if !is_html(&self.headers) {
            self.state = InterceptState::Passthrough;
            return self.body.take();
        }

        let result = scan(self.params.as_deref(), self.body.body(), &self.config);
        let emitted = match result.risk_event() {
            Some(event) => {
                self.reporter.report(&self.request_id, &event);
                self.block_action.apply(&mut self.headers, &self.request_id);
                self.body.clear();
                self.state = InterceptState::Blocked;
                Bytes::new()
            }
            None => {
                self.state = InterceptState::Passthrough;
                self.body.take()
            }
        };

        self.result = Some(result);
        emitted
    }
}
