use std::collections::VecDeque;
use std::ops::Range;

use bytes::Bytes;

use crate::message::{Message, MessageKind, RawMessage, Version};

/// Newtype for nanosecond-precision timestamps (monotonic clock).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimestampNs(pub u64);

impl TimestampNs {
    /// Returns `self - other`, clamped to zero on underflow.
    pub fn saturating_sub(self, other: TimestampNs) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

impl std::fmt::Display for TimestampNs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

impl From<u64> for TimestampNs {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<TimestampNs> for u64 {
    fn from(v: TimestampNs) -> Self {
        v.0
    }
}

/// Configurable limits for a single HTTP/1.x byte stream.
///
/// Captured traffic is untrusted: these bound the memory one stream can pin
/// while a message is still incomplete.
#[derive(Debug, Clone)]
pub struct H1Limits {
    /// Maximum number of retained (not yet compacted) bytes (default: 16 MiB)
    pub max_buffer_size:  usize,
    /// Maximum length of a start line or header line, terminator excluded
    /// (default: 8192)
    pub max_line_length:  usize,
    /// Maximum number of header fields per message (default: 128)
    pub max_header_count: usize,
}

impl Default for H1Limits {
    fn default() -> Self {
        Self {
            max_buffer_size:  16 * 1024 * 1024, // 16 MiB
            max_line_length:  8192,
            max_header_count: 128,
        }
    }
}

/// Outcome of a successful [`Http1Stream::parse`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// The bytes seen so far are a valid prefix; append more and call again.
    Incomplete,
    /// A whole message is available through [`Http1Stream::message`].
    Complete,
}

impl ParseStatus {
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

/// Where the parser is within the current message.
///
/// Moves forward only: `StartLine → Headers → Body → Complete`, with
/// `Headers → Complete` when there is no body. `Failed` is reachable from any
/// phase and only [`Http1Stream::reset`] leaves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsePhase {
    StartLine,
    Headers,
    Body { remaining: usize },
    Complete,
    Failed(ParseError),
}

/// Start line fields, kept until the header section ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StartLine {
    Request { method: String, request_uri: String },
    Response { status_code: u16, reason_phrase: String },
}

/// Fields of the message currently being assembled.
///
/// Each field is written once, when the bytes that carry it are consumed, so
/// resuming never re-derives anything.
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingMessage {
    pub(crate) start:          usize,
    pub(crate) version:        Option<Version>,
    pub(crate) start_line:     Option<StartLine>,
    pub(crate) headers:        Vec<(String, String)>,
    pub(crate) host:           Option<String>,
    pub(crate) content_length: Option<usize>,
    pub(crate) content_type:   Option<String>,
}

impl PendingMessage {
    fn finish(
        &mut self,
        end: usize,
        timestamp_ns: TimestampNs,
        end_timestamp_ns: TimestampNs,
    ) -> Option<Message> {
        let pending = std::mem::take(self);
        let kind = match pending.start_line? {
            StartLine::Request {
                method,
                request_uri,
            } => MessageKind::Request {
                method,
                request_uri,
                host: pending.host,
            },
            StartLine::Response {
                status_code,
                reason_phrase,
            } => MessageKind::Response {
                status_code,
                reason_phrase,
            },
        };
        Some(Message {
            version: pending.version?,
            kind,
            headers: pending.headers,
            content_length: pending.content_length.unwrap_or(0),
            content_type: pending.content_type,
            start: pending.start,
            end,
            timestamp_ns,
            end_timestamp_ns,
        })
    }
}

/// One direction of one HTTP/1.x connection.
///
/// Owns the bytes received so far, the parse cursor and the message being
/// assembled. Positions (`parse_offset`, [`Message::start`], [`Message::end`])
/// are absolute: they count every byte ever appended and keep their meaning
/// after [`compact`](Self::compact) drops a consumed prefix.
///
/// Two ways to drive it:
///
/// - manually: [`append`](Self::append), [`parse`](Self::parse), read
///   [`message`](Self::message), then [`reset`](Self::reset) before parsing
///   the next pipelined message;
/// - with [`feed`](Self::feed), which runs that loop and queues finished
///   messages for [`try_pop`](Self::try_pop).
///
/// A stream must only be driven by one caller at a time; use
/// [`H1SessionCache`](crate::H1SessionCache) to share streams between threads.
#[derive(Debug, Clone)]
pub struct Http1Stream {
    /// Retained bytes; `data[0]` is the byte at absolute position `base`
    pub(crate) data: Vec<u8>,

    /// Absolute position of `data[0]`
    pub(crate) base: usize,

    /// First unconsumed byte (absolute)
    pub(crate) parse_offset: usize,

    /// Where the line terminator search resumes (absolute, >= parse_offset)
    pub(crate) scan_offset: usize,

    pub(crate) phase: ParsePhase,

    pub(crate) pending: PendingMessage,

    /// Finished message, present while `phase` is `Complete`
    pub(crate) message: Option<Message>,

    /// Messages finished by `feed()`, waiting for `try_pop()`
    pub(crate) completed: VecDeque<RawMessage>,

    /// Absolute position where each append began, with its timestamp
    pub(crate) arrivals: VecDeque<(usize, TimestampNs)>,

    pub(crate) limits: H1Limits,
}

impl Default for Http1Stream {
    fn default() -> Self {
        Self::with_limits(H1Limits::default())
    }
}

impl Http1Stream {
    /// Create a stream with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream with custom limits.
    pub fn with_limits(limits: H1Limits) -> Self {
        Self {
            data: Vec::new(),
            base: 0,
            parse_offset: 0,
            scan_offset: 0,
            phase: ParsePhase::StartLine,
            pending: PendingMessage::default(),
            message: None,
            completed: VecDeque::new(),
            arrivals: VecDeque::new(),
            limits,
        }
    }

    /// Append newly captured bytes.
    ///
    /// Never moves existing positions. Fails with
    /// [`ParseErrorKind::BufferTooLarge`] when the retained bytes would exceed
    /// [`H1Limits::max_buffer_size`]; the bytes are dropped and the stream is
    /// marked failed, since it no longer holds a contiguous byte sequence.
    pub fn append(&mut self, bytes: &[u8], timestamp_ns: TimestampNs) -> Result<(), ParseError> {
        if self.data.len() + bytes.len() > self.limits.max_buffer_size {
            return Err(self.fail(ParseErrorKind::BufferTooLarge, self.end_offset()));
        }
        if bytes.is_empty() {
            return Ok(());
        }
        self.arrivals.push_back((self.end_offset(), timestamp_ns));
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Advance parsing as far as the appended bytes allow.
    ///
    /// - `Ok(Incomplete)`: valid so far, more bytes are needed;
    /// - `Ok(Complete)`: [`message`](Self::message) is set and
    ///   `parse_offset` sits right after it. Calling again without
    ///   [`reset`](Self::reset) returns `Complete` and changes nothing;
    /// - `Err(_)`: the bytes cannot be an HTTP/1.x message. The error is
    ///   sticky: later calls return it again without looking at any byte.
    pub fn parse(&mut self) -> Result<ParseStatus, ParseError> {
        crate::parse::parse_message(self)
    }

    /// The finished message, once [`parse`](Self::parse) returned `Complete`.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// Prepare for the next pipelined message.
    ///
    /// Discards the finished (or failed, or half-parsed) message. Neither the
    /// bytes nor `parse_offset` change, so parsing resumes at the first byte
    /// after the previous message.
    pub fn reset(&mut self) {
        self.message = None;
        self.pending = PendingMessage::default();
        self.phase = ParsePhase::StartLine;
        self.scan_offset = self.parse_offset;
    }

    /// Append `bytes`, then parse every message they finish.
    ///
    /// Finished messages are copied out with their raw bytes and queued for
    /// [`try_pop`](Self::try_pop); the consumed prefix is then compacted.
    /// On error, messages finished before the failure stay queued.
    pub fn feed(&mut self, bytes: &[u8], timestamp_ns: TimestampNs) -> Result<(), ParseError> {
        self.append(bytes, timestamp_ns)?;
        while self.parse()?.is_complete() {
            if let Some(raw) = self.take_raw() {
                self.completed.push_back(raw);
            }
            self.reset();
        }
        self.compact();
        Ok(())
    }

    /// Pop the oldest message finished by [`feed`](Self::feed).
    pub fn try_pop(&mut self) -> Option<RawMessage> {
        self.completed.pop_front()
    }

    /// Check if any finished messages are waiting to be popped.
    pub fn has_completed(&self) -> bool {
        !self.completed.is_empty()
    }

    /// Take the finished message together with a copy of its bytes.
    ///
    /// The stream stays in the `Complete` phase; call [`reset`](Self::reset)
    /// before parsing on.
    pub fn take_raw(&mut self) -> Option<RawMessage> {
        let message = self.message.take()?;
        let raw = Bytes::copy_from_slice(self.bytes(message.start..message.end)?);
        Some(RawMessage { message, raw })
    }

    /// Drop retained bytes no message needs any more.
    ///
    /// Keeps everything from the start of the finished or in-progress message,
    /// or from `parse_offset` between messages. Returns the number of bytes
    /// released.
    pub fn compact(&mut self) -> usize {
        let keep_from = match (&self.message, &self.phase) {
            (Some(message), _) => message.start,
            (None, ParsePhase::Headers | ParsePhase::Body { .. }) => self.pending.start,
            _ => self.parse_offset,
        };
        let released = keep_from.saturating_sub(self.base);
        if released == 0 {
            return 0;
        }
        self.data.drain(..released);
        self.base = keep_from;
        while self.arrivals.len() > 1 && self.arrivals[1].0 <= self.base {
            self.arrivals.pop_front();
        }
        released
    }

    /// First unconsumed byte (absolute position).
    pub fn parse_offset(&self) -> usize {
        self.parse_offset
    }

    /// Absolute position one past the last appended byte.
    pub fn end_offset(&self) -> usize {
        self.base + self.data.len()
    }

    /// Absolute position of the first retained byte.
    pub fn base_offset(&self) -> usize {
        self.base
    }

    /// Retained bytes, starting at [`base_offset`](Self::base_offset).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes from `parse_offset` to the end: input the parser has not consumed.
    pub fn unparsed(&self) -> &[u8] {
        &self.data[self.parse_offset - self.base..]
    }

    /// Bytes in an absolute range, or `None` if any part was compacted away or
    /// has not arrived yet.
    pub fn bytes(&self, range: Range<usize>) -> Option<&[u8]> {
        if range.start < self.base || range.start > range.end || range.end > self.end_offset() {
            return None;
        }
        Some(&self.data[range.start - self.base..range.end - self.base])
    }

    /// Whether the current message hit a parse error.
    pub fn is_failed(&self) -> bool {
        matches!(self.phase, ParsePhase::Failed(_))
    }

    /// Arrival time of the byte at an absolute position.
    pub(crate) fn timestamp_at(&self, position: usize) -> TimestampNs {
        let idx = self.arrivals.partition_point(|&(offset, _)| offset <= position);
        idx.checked_sub(1)
            .and_then(|i| self.arrivals.get(i))
            .map(|&(_, ts)| ts)
            .unwrap_or_default()
    }

    /// Record a failure for the current message and return it.
    pub(crate) fn fail(&mut self, kind: ParseErrorKind, offset: usize) -> ParseError {
        let err = ParseError { kind, offset };
        self.phase = ParsePhase::Failed(err.clone());
        err
    }

    /// Close the current message at `parse_offset`.
    pub(crate) fn complete(&mut self) {
        let end = self.parse_offset;
        let timestamp_ns = self.timestamp_at(self.pending.start);
        let end_timestamp_ns = self.timestamp_at(end.saturating_sub(1).max(self.pending.start));
        self.message = self.pending.finish(end, timestamp_ns, end_timestamp_ns);
        self.phase = ParsePhase::Complete;
    }
}

/// Kind of parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// First line is neither a request line nor a status line
    MalformedStartLine,
    /// Header line without a colon, with an invalid name, or folded
    MalformedHeader,
    /// `Content-Length` is not a decimal number, overflows, or is repeated
    /// with a different value
    InvalidContentLength,
    /// Start line or header line longer than `max_line_length`
    LineTooLong,
    /// More header fields than `max_header_count`
    TooManyHeaders,
    /// Retained bytes would exceed `max_buffer_size`
    BufferTooLarge,
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedStartLine => write!(f, "malformed HTTP/1 start line"),
            Self::MalformedHeader => write!(f, "malformed HTTP/1 header field"),
            Self::InvalidContentLength => write!(f, "invalid Content-Length"),
            Self::LineTooLong => write!(f, "HTTP/1 line exceeds max_line_length"),
            Self::TooManyHeaders => write!(f, "HTTP/1 header count exceeds max_header_count"),
            Self::BufferTooLarge => write!(f, "stream buffer exceeds max_buffer_size"),
        }
    }
}

/// Parse error with the absolute stream position of the offending line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong
    pub kind:   ParseErrorKind,
    /// Absolute stream position where the offending line (or append) starts
    pub offset: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}", self.kind, self.offset)
    }
}

impl std::error::Error for ParseError {}
