use std::ops::Range;

use bytes::Bytes;

use crate::state::TimestampNs;

/// HTTP version from a start line (`HTTP/<major>.<minor>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const HTTP_10: Version = Version { major: 1, minor: 0 };
    pub const HTTP_11: Version = Version { major: 1, minor: 1 };

    /// Map to [`http::Version`]. Unknown minors of HTTP/1 map to HTTP/1.1.
    pub fn to_http(self) -> Option<http::Version> {
        match (self.major, self.minor) {
            (0, 9) => Some(http::Version::HTTP_09),
            (1, 0) => Some(http::Version::HTTP_10),
            (1, _) => Some(http::Version::HTTP_11),
            _ => None,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

/// Fields that only one side of an exchange carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Request {
        method:      String,
        request_uri: String,
        /// First `Host` header value
        host:        Option<String>,
    },
    Response {
        status_code:   u16,
        /// Remainder of the status line after the code, possibly empty
        reason_phrase: String,
    },
}

/// One decoded HTTP/1.x request or response.
///
/// Whether it is a request or a response is decided by the start line alone:
/// a leading `HTTP/` token makes it a response. `start..end` covers the start
/// line, the header section and the body, in absolute stream positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version:          Version,
    pub kind:             MessageKind,
    /// Header fields in wire order, values trimmed of surrounding whitespace
    pub headers:          Vec<(String, String)>,
    /// Declared body length, 0 without a `Content-Length` header
    pub content_length:   usize,
    /// First `Content-Type` header value, verbatim
    pub content_type:     Option<String>,
    pub start:            usize,
    pub end:              usize,
    /// Arrival time of the first byte of the message
    pub timestamp_ns:     TimestampNs,
    /// Arrival time of the last byte of the message
    pub end_timestamp_ns: TimestampNs,
}

impl Message {
    pub fn is_request(&self) -> bool {
        matches!(self.kind, MessageKind::Request { .. })
    }

    pub fn is_response(&self) -> bool {
        matches!(self.kind, MessageKind::Response { .. })
    }

    pub fn method(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Request { method, .. } => Some(method),
            MessageKind::Response { .. } => None,
        }
    }

    pub fn request_uri(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Request { request_uri, .. } => Some(request_uri),
            MessageKind::Response { .. } => None,
        }
    }

    pub fn host(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Request { host, .. } => host.as_deref(),
            MessageKind::Response { .. } => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match &self.kind {
            MessageKind::Request { .. } => None,
            MessageKind::Response { status_code, .. } => Some(*status_code),
        }
    }

    pub fn reason_phrase(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Request { .. } => None,
            MessageKind::Response { reason_phrase, .. } => Some(reason_phrase),
        }
    }

    /// First value of a header, matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a header in wire order.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Total size in bytes, start line through body.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Absolute positions of the body.
    pub fn body_range(&self) -> Range<usize> {
        self.end - self.content_length..self.end
    }
}

/// A finished [`Message`] together with a copy of its bytes.
///
/// Produced by [`Http1Stream::feed`](crate::Http1Stream::feed), so the
/// stream can drop the bytes as soon as the message is queued.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub message: Message,
    /// `data[message.start..message.end]`
    pub raw:     Bytes,
}

impl RawMessage {
    /// Start line and header section, including the blank line.
    pub fn head(&self) -> Bytes {
        self.raw
            .slice(..self.raw.len().saturating_sub(self.message.content_length))
    }

    /// Body bytes (zero-copy slice of `raw`).
    pub fn body(&self) -> Bytes {
        self.raw
            .slice(self.raw.len().saturating_sub(self.message.content_length)..)
    }

    /// Convert to [`HttpRequest`](crate::HttpRequest).
    ///
    /// Returns None for responses and for request lines the `http` crate
    /// cannot represent. The request timestamp is the arrival of its last
    /// byte (when the request was fully sent).
    pub fn to_http_request(&self) -> Option<crate::HttpRequest> {
        let MessageKind::Request {
            method,
            request_uri,
            ..
        } = &self.message.kind
        else {
            return None;
        };
        Some(crate::HttpRequest {
            method:       http::Method::from_bytes(method.as_bytes()).ok()?,
            uri:          request_uri.parse().ok()?,
            headers:      self.http_headers(),
            body:         self.body(),
            timestamp_ns: self.message.end_timestamp_ns,
            version:      self.message.version.to_http(),
        })
    }

    /// Convert to [`HttpResponse`](crate::HttpResponse).
    ///
    /// Returns None for requests and for status codes outside 100..=999. The
    /// response timestamp is the arrival of its first byte.
    pub fn to_http_response(&self) -> Option<crate::HttpResponse> {
        let MessageKind::Response {
            status_code,
            reason_phrase,
        } = &self.message.kind
        else {
            return None;
        };
        Some(crate::HttpResponse {
            status:       http::StatusCode::from_u16(*status_code).ok()?,
            headers:      self.http_headers(),
            body:         self.body(),
            timestamp_ns: self.message.timestamp_ns,
            version:      self.message.version.to_http(),
            reason:       (!reason_phrase.is_empty()).then(|| reason_phrase.clone()),
        })
    }

    /// Headers as a [`http::HeaderMap`]; pairs the `http` crate rejects are
    /// skipped, repeated names are appended.
    pub fn http_headers(&self) -> http::HeaderMap {
        let mut header_map = http::HeaderMap::with_capacity(self.message.headers.len());
        for (name, value) in &self.message.headers {
            let parsed = (
                http::header::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(value),
            );
            if let (Ok(n), Ok(v)) = parsed {
                header_map.append(n, v);
            }
        }
        header_map
    }
}
