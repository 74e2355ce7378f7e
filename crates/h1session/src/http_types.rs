//! Owned request/response types built on the `http` crate
//!
//! These are what a finished [`RawMessage`](crate::RawMessage) converts into
//! once its bytes have left the stream buffer.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri, Version};

use crate::state::TimestampNs;

/// HTTP/1.x request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, etc.)
    pub method:       Method,
    /// Request target URI
    pub uri:          Uri,
    /// HTTP headers
    pub headers:      HeaderMap,
    /// Request body bytes
    pub body:         Bytes,
    /// When the last byte of this request was observed
    pub timestamp_ns: TimestampNs,
    /// Version from the request line (None for versions `http` has no name for)
    pub version:      Option<Version>,
}

/// HTTP/1.x response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code (200, 404, etc.)
    pub status:       StatusCode,
    /// HTTP headers
    pub headers:      HeaderMap,
    /// Response body bytes
    pub body:         Bytes,
    /// When the first byte of this response was observed
    pub timestamp_ns: TimestampNs,
    /// Version from the status line (None for versions `http` has no name for)
    pub version:      Option<Version>,
    /// Reason phrase as sent, None when the status line had none
    pub reason:       Option<String>,
}

impl HttpResponse {
    /// Interim (1xx) responses precede the final response to a request.
    /// `101 Switching Protocols` is final: nothing else answers the request.
    pub fn is_interim(&self) -> bool {
        self.status.is_informational() && self.status != StatusCode::SWITCHING_PROTOCOLS
    }
}
