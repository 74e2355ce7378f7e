//! Fuzz target: Structured message generation
//!
//! This fuzz target generates semi-valid HTTP/1.x messages using the
//! Arbitrary trait and delivers them in arbitrary chunks. Whatever the split
//! points, the parser must report the same outcome and the same offset as
//! when it sees all bytes at once.

#![no_main]

use arbitrary::Arbitrary;
use h1session::{Http1Stream, Message, ParseError, TimestampNs};
use libfuzzer_sys::fuzz_target;

const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "HEAD", "M-SEARCH"];

/// A structured HTTP/1.x message for fuzzing
#[derive(Debug, Arbitrary)]
struct FuzzMessage {
    is_response:    bool,
    method:         u8,
    target:         String,
    status_code:    u16,
    reason:         String,
    minor_version:  u8,
    headers:        Vec<(String, String)>,
    content_length: Option<u8>,
    body:           Vec<u8>,
    /// Use bare LF instead of CRLF
    bare_lf:        bool,
}

impl FuzzMessage {
    fn to_bytes(&self) -> Vec<u8> {
        let eol = if self.bare_lf { "\n" } else { "\r\n" };
        let mut out = if self.is_response {
            format!(
                "HTTP/1.{} {:03} {}{eol}",
                self.minor_version % 2,
                self.status_code % 1000,
                self.reason
            )
        } else {
            let method = METHODS[self.method as usize % METHODS.len()];
            format!(
                "{method} /{} HTTP/1.{}{eol}",
                self.target,
                self.minor_version % 2
            )
        };
        for (name, value) in &self.headers {
            out.push_str(&format!("{name}: {value}{eol}"));
        }
        if let Some(length) = self.content_length {
            out.push_str(&format!("Content-Length: {length}{eol}"));
        }
        out.push_str(eol);

        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// A sequence of pipelined messages and where to split them
#[derive(Debug, Arbitrary)]
struct FuzzConnection {
    messages: Vec<FuzzMessage>,
    splits:   Vec<u16>,
}

#[derive(Debug, PartialEq)]
struct Outcome {
    messages:     Vec<Message>,
    error:        Option<ParseError>,
    parse_offset: usize,
}

fn run(data: &[u8], chunks: &[&[u8]]) -> Outcome {
    let mut stream = Http1Stream::new();
    let mut messages = Vec::new();
    let mut error = None;

    'chunks: for chunk in chunks {
        if let Err(err) = stream.append(chunk, TimestampNs(0)) {
            error = Some(err);
            break;
        }
        loop {
            match stream.parse() {
                Ok(status) if status.is_complete() => {
                    messages.extend(stream.message().cloned());
                    stream.reset();
                },
                Ok(_) => break,
                Err(err) => {
                    error = Some(err);
                    break 'chunks;
                },
            }
        }
    }

    assert!(stream.parse_offset() <= data.len());
    Outcome {
        messages,
        error,
        parse_offset: stream.parse_offset(),
    }
}

fuzz_target!(|conn: FuzzConnection| {
    let data: Vec<u8> = conn.messages.iter().flat_map(|m| m.to_bytes()).collect();

    let mut cuts: Vec<usize> = conn
        .splits
        .iter()
        .map(|&s| s as usize % (data.len() + 1))
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut from = 0;
    for cut in cuts {
        chunks.push(&data[from..cut]);
        from = cut;
    }
    chunks.push(&data[from..]);

    let whole = run(&data, &[&data]);
    let split = run(&data, &chunks);
    assert_eq!(whole, split);
});
