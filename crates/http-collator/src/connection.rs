//! Connection state tracking for HTTP collation

use std::collections::VecDeque;

use h1session::{H1Limits, HttpRequest, Http1Stream, TimestampNs};

use crate::traits::Direction;

/// One direction of a connection.
pub(crate) struct HalfConnection {
    pub(crate) stream:          Http1Stream,
    /// Set after a parse failure: bytes are skipped until a payload starts
    /// like an HTTP/1 start line
    pub(crate) awaiting_resync: bool,
}

impl HalfConnection {
    fn new(limits: H1Limits) -> Self {
        Self {
            stream:          Http1Stream::with_limits(limits),
            awaiting_resync: false,
        }
    }

    /// Replace the stream with an empty one and wait for a start line.
    pub(crate) fn discard(&mut self, limits: H1Limits) {
        self.stream = Http1Stream::with_limits(limits);
        self.awaiting_resync = true;
    }
}

/// Tracks state for a single connection
pub(crate) struct Connection {
    pub(crate) client:           HalfConnection,
    pub(crate) server:           HalfConnection,
    /// Requests still waiting for a final response, oldest first
    pub(crate) pending_requests: VecDeque<HttpRequest>,
    pub(crate) last_activity_ns: TimestampNs,
}

impl Connection {
    pub(crate) fn new(limits: &H1Limits) -> Self {
        Self {
            client:           HalfConnection::new(limits.clone()),
            server:           HalfConnection::new(limits.clone()),
            pending_requests: VecDeque::new(),
            last_activity_ns: TimestampNs(0),
        }
    }

    pub(crate) fn half_mut(&mut self, direction: Direction) -> &mut HalfConnection {
        match direction {
            Direction::ClientToServer => &mut self.client,
            Direction::ServerToClient => &mut self.server,
        }
    }

    /// Queue a request for pairing. Returns the request dropped to stay
    /// within `max_pending`, if any.
    pub(crate) fn push_request(
        &mut self,
        request: HttpRequest,
        max_pending: usize,
    ) -> Option<HttpRequest> {
        self.pending_requests.push_back(request);
        if self.pending_requests.len() > max_pending {
            self.pending_requests.pop_front()
        } else {
            None
        }
    }
}
