//! HTTP/1.x message state machine
//!
//! Consumes a stream one line at a time while in the start line and header
//! section, then counts body bytes. All progress is stored in the stream, so
//! a call that runs out of bytes returns and the next call resumes at the
//! same byte: the terminator scan restarts where it stopped, and fields are
//! recorded once, when their line is consumed.

use crate::message::Version;
use crate::state::{
    Http1Stream, ParseError, ParseErrorKind, ParsePhase, ParseStatus, PendingMessage, StartLine,
};

/// Request methods recognized by [`is_http1_request`].
const METHODS: &[&[u8]] = &[
    b"GET", b"POST", b"PUT", b"DELETE", b"HEAD", b"OPTIONS", b"PATCH", b"CONNECT", b"TRACE",
];

/// Check if data starts with an HTTP/1.x request line for a common method
pub fn is_http1_request(data: &[u8]) -> bool {
    METHODS
        .iter()
        .any(|m| data.starts_with(m) && data.get(m.len()) == Some(&b' '))
}

/// Check if data starts with an HTTP/1.x status line
pub fn is_http1_response(data: &[u8]) -> bool {
    data.starts_with(b"HTTP/1.")
}

/// A complete line, in absolute stream positions.
struct Line {
    start: usize,
    /// End of the content, terminator excluded
    end:   usize,
    /// First byte after the terminator
    next:  usize,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

pub(crate) fn parse_message(stream: &mut Http1Stream) -> Result<ParseStatus, ParseError> {
    loop {
        match &stream.phase {
            ParsePhase::Complete => return Ok(ParseStatus::Complete),
            ParsePhase::Failed(err) => return Err(err.clone()),
            ParsePhase::StartLine => {
                let Some(line) = next_line(stream)? else {
                    return Ok(ParseStatus::Incomplete);
                };
                if line.is_empty() {
                    // Stray CRLF between messages
                    stream.parse_offset = line.next;
                    continue;
                }
                let (version, start_line) = match parse_start_line(line_bytes(stream, &line)) {
                    Ok(parsed) => parsed,
                    Err(kind) => return Err(stream.fail(kind, line.start)),
                };
                stream.pending.start = line.start;
                stream.pending.version = Some(version);
                stream.pending.start_line = Some(start_line);
                stream.parse_offset = line.next;
                stream.phase = ParsePhase::Headers;
            },
            ParsePhase::Headers => {
                let Some(line) = next_line(stream)? else {
                    return Ok(ParseStatus::Incomplete);
                };
                if line.is_empty() {
                    stream.parse_offset = line.next;
                    match stream.pending.content_length {
                        Some(remaining) if remaining > 0 => {
                            stream.phase = ParsePhase::Body { remaining };
                        },
                        _ => stream.complete(),
                    }
                    continue;
                }
                if stream.pending.headers.len() >= stream.limits.max_header_count {
                    return Err(stream.fail(ParseErrorKind::TooManyHeaders, line.start));
                }
                let field = parse_header_line(line_bytes(stream, &line));
                let recorded =
                    field.and_then(|(name, value)| record_header(&mut stream.pending, name, value));
                if let Err(kind) = recorded {
                    return Err(stream.fail(kind, line.start));
                }
                stream.parse_offset = line.next;
            },
            ParsePhase::Body { remaining } => {
                let remaining = *remaining;
                let taken = (stream.end_offset() - stream.parse_offset).min(remaining);
                stream.parse_offset += taken;
                if taken < remaining {
                    stream.phase = ParsePhase::Body {
                        remaining: remaining - taken,
                    };
                    return Ok(ParseStatus::Incomplete);
                }
                stream.complete();
            },
        }
    }
}

/// Find the line starting at `parse_offset`, resuming the terminator scan
/// where the previous call stopped.
///
/// A line ends at LF; a CR right before the LF belongs to the terminator.
fn next_line(stream: &mut Http1Stream) -> Result<Option<Line>, ParseError> {
    let start = stream.parse_offset;
    let from = stream.scan_offset.max(start);
    let max_line_length = stream.limits.max_line_length;

    let found = stream.data[from - stream.base..]
        .iter()
        .position(|&b| b == b'\n');
    let Some(pos) = found else {
        stream.scan_offset = stream.end_offset();
        // One extra byte for a CR still waiting for its LF
        if stream.scan_offset - start > max_line_length.saturating_add(1) {
            return Err(stream.fail(ParseErrorKind::LineTooLong, start));
        }
        return Ok(None);
    };

    let lf = from + pos;
    stream.scan_offset = lf + 1;
    let end = if lf > start && stream.data[lf - 1 - stream.base] == b'\r' {
        lf - 1
    } else {
        lf
    };
    if end - start > max_line_length {
        return Err(stream.fail(ParseErrorKind::LineTooLong, start));
    }
    Ok(Some(Line {
        start,
        end,
        next: lf + 1,
    }))
}

fn line_bytes<'a>(stream: &'a Http1Stream, line: &Line) -> &'a [u8] {
    &stream.data[line.start - stream.base..line.end - stream.base]
}

/// Classify and parse a start line. A leading `HTTP/` makes it a status line.
pub(crate) fn parse_start_line(line: &[u8]) -> Result<(Version, StartLine), ParseErrorKind> {
    if line.contains(&b'\r') {
        return Err(ParseErrorKind::MalformedStartLine);
    }
    if line.starts_with(b"HTTP/") {
        parse_status_line(line)
    } else {
        parse_request_line(line)
    }
}

/// `METHOD SP request-target SP HTTP-version`
fn parse_request_line(line: &[u8]) -> Result<(Version, StartLine), ParseErrorKind> {
    let err = ParseErrorKind::MalformedStartLine;
    let mut fields = line.split(|&b| is_ws(b)).filter(|f| !f.is_empty());
    let (Some(method), Some(request_uri), Some(version), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(err);
    };
    if !method.iter().all(|&b| is_tchar(b)) {
        return Err(err);
    }
    let version = parse_version(version).ok_or(err)?;
    Ok((
        version,
        StartLine::Request {
            method:      String::from_utf8_lossy(method).into_owned(),
            request_uri: String::from_utf8_lossy(request_uri).into_owned(),
        },
    ))
}

/// `HTTP-version SP 3DIGIT [SP reason-phrase]`
fn parse_status_line(line: &[u8]) -> Result<(Version, StartLine), ParseErrorKind> {
    let err = ParseErrorKind::MalformedStartLine;
    let split = line.iter().position(|&b| is_ws(b)).ok_or(err)?;
    let version = parse_version(&line[..split]).ok_or(err)?;

    let rest = &line[split..];
    let rest = &rest[rest.iter().take_while(|&&b| is_ws(b)).count()..];
    let code = rest.get(..3).ok_or(err)?;
    let status_code = parse_decimal::<u16>(code).ok_or(err)?;
    let reason_phrase = match rest.get(3) {
        None => &[][..],
        Some(&b) if is_ws(b) => &rest[4..],
        Some(_) => return Err(err),
    };
    Ok((
        version,
        StartLine::Response {
            status_code,
            reason_phrase: String::from_utf8_lossy(reason_phrase).into_owned(),
        },
    ))
}

/// `HTTP/<digits>.<digits>`
fn parse_version(token: &[u8]) -> Option<Version> {
    let digits = token.strip_prefix(b"HTTP/")?;
    let dot = digits.iter().position(|&b| b == b'.')?;
    Some(Version {
        major: parse_decimal(&digits[..dot])?,
        minor: parse_decimal(&digits[dot + 1..])?,
    })
}

/// `field-name ":" OWS field-value OWS`
pub(crate) fn parse_header_line(line: &[u8]) -> Result<(String, String), ParseErrorKind> {
    let err = ParseErrorKind::MalformedHeader;
    // Obsolete line folding
    if line.first().is_some_and(|&b| is_ws(b)) || line.contains(&b'\r') {
        return Err(err);
    }
    let colon = line.iter().position(|&b| b == b':').ok_or(err)?;
    let name = &line[..colon];
    if name.is_empty() || !name.iter().all(|&b| is_tchar(b)) {
        return Err(err);
    }
    let value = trim_ows(&line[colon + 1..]);
    Ok((
        String::from_utf8_lossy(name).into_owned(),
        String::from_utf8_lossy(value).into_owned(),
    ))
}

/// Store a header field, filling the recognized ones on first sight.
fn record_header(
    pending: &mut PendingMessage,
    name: String,
    value: String,
) -> Result<(), ParseErrorKind> {
    if name.eq_ignore_ascii_case("content-length") {
        let length =
            parse_decimal::<usize>(value.as_bytes()).ok_or(ParseErrorKind::InvalidContentLength)?;
        if pending.content_length.is_some_and(|existing| existing != length) {
            return Err(ParseErrorKind::InvalidContentLength);
        }
        pending.content_length = Some(length);
    } else if name.eq_ignore_ascii_case("content-type") {
        pending.content_type.get_or_insert_with(|| value.clone());
    } else if name.eq_ignore_ascii_case("host") {
        pending.host.get_or_insert_with(|| value.clone());
    }
    pending.headers.push((name, value));
    Ok(())
}

/// Non-empty run of ASCII digits that fits in `T`.
fn parse_decimal<T: std::str::FromStr>(digits: &[u8]) -> Option<T> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn trim_ows(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().take_while(|&&b| is_ws(b)).count();
    let end = bytes.len() - bytes[start..].iter().rev().take_while(|&&b| is_ws(b)).count();
    &bytes[start..end]
}

fn is_ws(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// RFC 9110 `tchar`
fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
