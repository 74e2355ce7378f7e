// HTTP/1.x session crate
// Incremental, resumable message parsing for passively captured byte streams

//! Decodes HTTP/1.x requests and responses from byte streams that arrive in
//! arbitrary fragments, as seen by a passive network monitor.
//!
//! An [`Http1Stream`] holds one direction of one connection. Bytes are
//! appended as they are captured and [`Http1Stream::parse`] advances as far as
//! they allow, so splitting the same bytes differently across calls always
//! yields the same messages and the same `parse_offset`:
//!
//! ```
//! use h1session::{Http1Stream, ParseStatus, TimestampNs};
//!
//! let mut stream = Http1Stream::new();
//! stream.append(b"HTTP/1.1 200 OK\r\nContent-Len", TimestampNs(1)).unwrap();
//! assert_eq!(stream.parse().unwrap(), ParseStatus::Incomplete);
//!
//! stream.append(b"gth: 2\r\n\r\nhi", TimestampNs(2)).unwrap();
//! assert_eq!(stream.parse().unwrap(), ParseStatus::Complete);
//!
//! let message = stream.message().unwrap();
//! assert_eq!(message.status_code(), Some(200));
//! assert_eq!(message.content_length, 2);
//! assert_eq!(stream.parse_offset(), message.end);
//!
//! // Pipelined messages: reset, then parse on from the same offset.
//! stream.reset();
//! ```
//!
//! The crate does no I/O and no logging.

mod http_types;
mod message;
mod parse;
mod state;


use dashmap::DashMap;
pub use http_types::{HttpRequest, HttpResponse};
pub use message::{Message, MessageKind, RawMessage, Version};
pub use parse::{is_http1_request, is_http1_response};
pub use state::{H1Limits, Http1Stream, ParseError, ParseErrorKind, ParseStatus, TimestampNs};
use std::hash::Hash;
use std::sync::Mutex;

/// HTTP/1.x stream cache with generic keys.
///
/// Uses `DashMap<K, Mutex<Http1Stream>>` to provide per-key serialization:
/// the shard lock is held only to look up or insert the entry, while the
/// per-key mutex keeps two threads from driving the same stream at once.
/// Key by connection and direction; each key must see its bytes in order.
pub struct H1SessionCache<K> {
    streams: DashMap<K, Mutex<Http1Stream>>,
    limits:  H1Limits,
}

impl<K: Hash + Eq + Clone> H1SessionCache<K> {
    /// Create a new cache
    pub fn new() -> Self {
        Self::with_limits(H1Limits::default())
    }

    /// Create a cache whose streams use custom limits
    pub fn with_limits(limits: H1Limits) -> Self {
        Self {
            streams: DashMap::new(),
            limits,
        }
    }

    /// Feed captured bytes to the stream for `key`
    ///
    /// If the key doesn't exist, creates a new stream automatically.
    /// Returns the messages these bytes finished, oldest first. The vector
    /// may be empty if the current message is still incomplete; this is not
    /// an error. On error the stream is failed: [`remove`](Self::remove) it
    /// before feeding that key again (messages finished before the failure
    /// can still be popped from the removed stream).
    pub fn feed(
        &self,
        key: K,
        bytes: &[u8],
        timestamp_ns: TimestampNs,
    ) -> Result<Vec<RawMessage>, ParseError> {
        let entry = self
            .streams
            .entry(key)
            .or_insert_with(|| Mutex::new(Http1Stream::with_limits(self.limits.clone())))
            .downgrade();
        let mut stream = entry.lock().unwrap_or_else(|e| e.into_inner());
        stream.feed(bytes, timestamp_ns)?;
        let messages = std::iter::from_fn(|| stream.try_pop()).collect();
        Ok(messages)
    }

    /// Remove stream state (call when the connection closes)
    pub fn remove(&self, key: &K) -> Option<Http1Stream> {
        self.streams
            .remove(key)
            .map(|(_, mutex)| mutex.into_inner().unwrap_or_else(|e| e.into_inner()))
    }

    /// Check if stream state exists
    pub fn contains(&self, key: &K) -> bool {
        self.streams.contains_key(key)
    }

    /// Get number of tracked streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl<K: Hash + Eq + Clone> Default for H1SessionCache<K> {
    fn default() -> Self {
        Self::new()
    }
}
