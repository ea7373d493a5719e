use bytes::{Bytes, BytesMut};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyLimitExceeded {
    pub limit: usize,
    pub attempted: usize,
}

impl fmt::Display for BodyLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "response body of {} bytes exceeds maximum size of {} bytes",
            self.attempted, self.limit
        )
    }
}

impl std::error::Error for BodyLimitExceeded {}

/// Accumulates the response body of a single request.
pub struct BodyInspector {
    max_body_size: usize,
    buffer: BytesMut,
}

impl BodyInspector {
    pub fn new(max_body_size: usize) -> Self {
        Self {
            max_body_size,
            buffer: BytesMut::new(),
        }
    }

    /// Appends `chunk`, or leaves the buffer untouched if it would grow past
    /// the limit.
    pub fn append_chunk(&mut self, chunk: &[u8]) -> Result<(), BodyLimitExceeded> {
        let attempted = self.buffer.len() + chunk.len();
        if attempted > self.max_body_size {
            return Err(BodyLimitExceeded {
                limit: self.max_body_size,
                attempted,
            });
        }

        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    pub fn body(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Hands out everything buffered so far, leaving the buffer empty.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_chunks() {
        let mut inspector = BodyInspector::new(64);
        inspector.append_chunk(b"<html>").unwrap();
        inspector.append_chunk(b"</html>").unwrap();
        assert_eq!(inspector.body(), b"<html></html>");
        assert_eq!(inspector.len(), 13);
    }

    #[test]
    fn test_limit_rejects_chunk() {
        let mut inspector = BodyInspector::new(8);
        inspector.append_chunk(b"12345").unwrap();
        let err = inspector.append_chunk(b"6789").unwrap_err();
        assert_eq!(err, BodyLimitExceeded { limit: 8, attempted: 9 });
        assert_eq!(inspector.body(), b"12345");
    }

    #[test]
    fn test_take_empties_buffer() {
        let mut inspector = BodyInspector::new(64);
        inspector.append_chunk(b"body").unwrap();
        assert_eq!(inspector.take(), Bytes::from_static(b"body"));
        assert!(inspector.is_empty());
        inspector.append_chunk(b"x").unwrap();
        inspector.clear();
        assert!(inspector.is_empty());
    }
}
