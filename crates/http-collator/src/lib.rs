//! HTTP collation library
//!
//! Collates individual data events (from eBPF, pcap, etc.) into HTTP/1.x
//! messages and complete request/response exchanges.
//!
//! # Usage
//!
//! Implement the [`DataEvent`] trait for your data source, then feed events
//! to the [`Collator`]:
//!
//! ```
//! use http_collator::{Collator, DataEvent, Direction};
//!
//! struct Captured {
//!     bytes:     Vec<u8>,
//!     at:        u64,
//!     direction: Direction,
//! }
//!
//! impl DataEvent for Captured {
//!     fn payload(&self) -> &[u8] { &self.bytes }
//!     fn timestamp_ns(&self) -> u64 { self.at }
//!     fn direction(&self) -> Direction { self.direction }
//!     fn connection_id(&self) -> u64 { 7 }
//! }
//!
//! let collator = Collator::new();
//! collator.add_event(Captured {
//!     bytes:     b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec(),
//!     at:        1_000,
//!     direction: Direction::ClientToServer,
//! });
//! let events = collator.add_event(Captured {
//!     bytes:     b"HTTP/1.1 204 No Content\r\n\r\n".to_vec(),
//!     at:        5_000,
//!     direction: Direction::ServerToClient,
//! });
//!
//! let exchange = events.iter().find_map(|e| e.as_exchange()).unwrap();
//! assert_eq!(exchange.latency_ns, 4_000);
//! println!("{exchange}");
//! ```

mod connection;
mod exchange;
mod traits;


#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { ::tracing::warn!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}
pub(crate) use trace_warn;

#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}
pub(crate) use trace_debug;

use std::marker::PhantomData;

use connection::{Connection as Conn, HalfConnection};
use dashmap::DashMap;
pub use exchange::{
    CollationEvent, CollatorConfig, Exchange, MessageMetadata, ParsedHttpMessage,
};
pub use h1session::{H1Limits, HttpRequest, HttpResponse, RawMessage, TimestampNs};
use h1session::{is_http1_request, is_http1_response};
pub use traits::{DataEvent, Direction};

/// Collates individual data events into messages and request/response
/// exchanges.
///
/// Generic over the event type `E` which must implement [`DataEvent`].
/// Connections live in a `DashMap`, so a collator can be shared between
/// threads; events of one connection must still arrive in order.
pub struct Collator<E: DataEvent> {
    /// Connections tracked by connection id
    connections: DashMap<u64, Conn>,
    config:      CollatorConfig,
    _phantom:    PhantomData<E>,
}

impl<E: DataEvent> Default for Collator<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DataEvent> Collator<E> {
    /// Create a new collator with default settings
    pub fn new() -> Self {
        Self::with_config(CollatorConfig::default())
    }

    /// Create a new collator with custom configuration
    pub fn with_config(config: CollatorConfig) -> Self {
        Self {
            connections: DashMap::new(),
            config,
            _phantom: PhantomData,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &CollatorConfig {
        &self.config
    }

    /// Number of tracked connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Add a data event and return the events it produced.
    ///
    /// Returns one `Message` per finished message (if `emit_messages`) and
    /// one `Exchange` per final response that answers a pending request (if
    /// `emit_exchanges`), in stream order. Often empty: most events only
    /// carry part of a message.
    pub fn add_event(&self, event: E) -> Vec<CollationEvent> {
        let payload = event.payload();
        if payload.is_empty() {
            return Vec::new();
        }

        let direction = event.direction();
        let conn_id = event.connection_id();
        let timestamp_ns = TimestampNs(event.timestamp_ns());

        let mut entry = self
            .connections
            .entry(conn_id)
            .or_insert_with(|| Conn::new(&self.config.limits));
        let conn = &mut *entry;
        conn.last_activity_ns = timestamp_ns;

        let messages = self.feed_half(
            conn_id,
            direction,
            conn.half_mut(direction),
            payload,
            timestamp_ns,
        );

        let mut events = Vec::new();
        for raw in messages {
            self.collate(conn_id, direction, conn, &raw, &mut events);
        }
        events
    }

    /// Clean up stale connections
    ///
    /// Drops every connection idle for `timeout_ns` or longer. A connection
    /// whose last activity is after `current_time_ns` (clock skew) is kept.
    pub fn cleanup(&self, current_time_ns: TimestampNs) {
        let timeout_ns = self.config.timeout_ns;
        self.connections.retain(|_id, conn| {
            let keep = current_time_ns.saturating_sub(conn.last_activity_ns) < timeout_ns;
            if !keep {
                trace_debug!("evicting idle connection {_id}");
            }
            keep
        });
    }

    /// Forget a connection (e.g. on close), returning the requests that
    /// never got a final response, oldest first.
    pub fn close_connection(&self, conn_id: u64) -> Vec<HttpRequest> {
        let Some((_, conn)) = self.connections.remove(&conn_id) else {
            return Vec::new();
        };
        if !conn.pending_requests.is_empty() {
            trace_debug!(
                "closing connection {conn_id} with {} unanswered requests",
                conn.pending_requests.len()
            );
        }
        conn.pending_requests.into()
    }

    /// Feed one payload into a direction's stream and collect the messages
    /// it finished. A parse failure discards the stream; messages finished
    /// before the failure are still returned.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn feed_half(
        &self,
        conn_id: u64,
        direction: Direction,
        half: &mut HalfConnection,
        payload: &[u8],
        timestamp_ns: TimestampNs,
    ) -> Vec<RawMessage> {
        if half.awaiting_resync {
            if !is_http1_request(payload) && !is_http1_response(payload) {
                trace_debug!(
                    "connection {conn_id} {direction}: skipping {} bytes until a start line",
                    payload.len()
                );
                return Vec::new();
            }
            trace_debug!("connection {conn_id} {direction}: resynchronized");
            half.awaiting_resync = false;
        }

        let result = half.stream.feed(payload, timestamp_ns);
        let messages = std::iter::from_fn(|| half.stream.try_pop()).collect();
        if let Err(_err) = result {
            trace_warn!("connection {conn_id} {direction}: discarding stream: {_err}");
            half.discard(self.config.limits.clone());
        }
        messages
    }

    /// Turn one finished message into collation events and update the
    /// request queue.
    fn collate(
        &self,
        conn_id: u64,
        direction: Direction,
        conn: &mut Conn,
        raw: &RawMessage,
        events: &mut Vec<CollationEvent>,
    ) {
        let message = if raw.message.is_request() {
            raw.to_http_request().map(ParsedHttpMessage::Request)
        } else {
            raw.to_http_response().map(ParsedHttpMessage::Response)
        };
        let Some(message) = message else {
            trace_debug!(
                "connection {conn_id} {direction}: dropping message at byte {} (not representable)",
                raw.message.start
            );
            return;
        };

        if self.config.emit_messages {
            let timestamp_ns = match &message {
                ParsedHttpMessage::Request(req) => req.timestamp_ns,
                ParsedHttpMessage::Response(resp) => resp.timestamp_ns,
            };
            events.push(CollationEvent::Message {
                message:  message.clone(),
                metadata: MessageMetadata {
                    connection_id: conn_id,
                    direction,
                    timestamp_ns,
                },
            });
        }

        match message {
            ParsedHttpMessage::Request(request) => {
                let dropped = conn.push_request(request, self.config.max_pending_requests);
                if dropped.is_some() {
                    trace_warn!(
                        "connection {conn_id}: more than {} unanswered requests, dropping the oldest",
                        self.config.max_pending_requests
                    );
                }
            },
            // Interim responses precede the final one for the same request
            ParsedHttpMessage::Response(response) if response.is_interim() => {},
            ParsedHttpMessage::Response(response) => {
                let Some(request) = conn.pending_requests.pop_front() else {
                    trace_debug!("connection {conn_id}: response without a pending request");
                    return;
                };
                if self.config.emit_exchanges {
                    let latency_ns = response.timestamp_ns.saturating_sub(request.timestamp_ns);
                    events.push(CollationEvent::Exchange(Exchange {
                        request,
                        response,
                        latency_ns,
                        connection_id: conn_id,
                    }));
                }
            },
        }
    }
}
