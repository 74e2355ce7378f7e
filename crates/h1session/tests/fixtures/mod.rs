#![allow(dead_code)]
//! Captured HTTP/1.x traffic used across the integration tests
//!
//! Real browser and server messages, byte-for-byte, plus helpers that drive a
//! stream with a given chunking.

use h1session::{Http1Stream, Message, ParseError, ParseStatus, TimestampNs};

/// Response headers shared by the captured responses, up to and including
/// `Content-Type`
pub const RESPONSE_HEAD: &str = concat!(
    "HTTP/1.1 200 OK\r\n",
    "Date: Tue, 14 Aug 2012 22:31:45 GMT\r\n",
    "Expires: -1\r\n",
    "Cache-Control: private, max-age=0\r\n",
    "Content-Type: text/html; charset=UTF-8\r\n",
);

/// Bodiless response with nine header fields
pub const SIMPLE_RESPONSE: &str = concat!(
    "HTTP/1.1 200 OK\r\n",
    "Date: Tue, 14 Aug 2012 22:31:45 GMT\r\n",
    "Expires: -1\r\n",
    "Cache-Control: private, max-age=0\r\n",
    "Content-Type: text/html; charset=UTF-8\r\n",
    "Content-Encoding: gzip\r\n",
    "Server: gws\r\n",
    "Content-Length: 0\r\n",
    "X-XSS-Protection: 1; mode=block\r\n",
    "X-Frame-Options: SAMEORIGIN\r\n",
    "\r\n",
);

/// Browser GET with a long cookie, no body
pub const SIMPLE_REQUEST: &str = concat!(
    "GET / HTTP/1.1\r\n",
    "Host: www.google.ro\r\n",
    "Connection: keep-alive\r\n",
    "User-Agent: Mozilla/5.0 (Macintosh; Intel Mac OS X 10_7_4) AppleWebKit/537.1 (KHTML, like Gecko) Chrome/21.0.1180.75 Safari/537.1\r\n",
    "Accept: */*\r\n",
    "X-Chrome-Variations: CLa1yQEIj7bJAQiftskBCKS2yQEIp7bJAQiptskBCLSDygE=\r\n",
    "Referer: http://www.google.ro/\r\n",
    "Accept-Encoding: gzip,deflate,sdch\r\n",
    "Accept-Language: en-US,en;q=0.8\r\n",
    "Accept-Charset: ISO-8859-1,utf-8;q=0.7,*;q=0.3\r\n",
    "Cookie: PREF=ID=6b67d166417efec4:U=69097d4080ae0e15:FF=0:TM=1340891937:LM=1340891938:S=8t97UBiUwKbESvVX; NID=61=sf10OV-t02wu5PXrc09AhGagFrhSAB2C_98ZaI53-uH4jGiVG_yz9WmE3vjEBcmJyWUogB1ZF5puyDIIiB-UIdLd4OEgPR3x1LHNyuGmEDaNbQ_XaxWQqqQ59mX1qgLQ\r\n",
    "\r\n",
);

/// The same GET carrying a two-byte body
pub const REQUEST_WITH_BODY: &str = concat!(
    "GET / HTTP/1.1\r\n",
    "Host: www.google.ro\r\n",
    "Connection: keep-alive\r\n",
    "User-Agent: Mozilla/5.0 (Macintosh; Intel Mac OS X 10_7_4) AppleWebKit/537.1 (KHTML, like Gecko) Chrome/21.0.1180.75 Safari/537.1\r\n",
    "Accept: */*\r\n",
    "X-Chrome-Variations: CLa1yQEIj7bJAQiftskBCKS2yQEIp7bJAQiptskBCLSDygE=\r\n",
    "Referer: http://www.google.ro/\r\n",
    "Accept-Encoding: gzip,deflate,sdch\r\n",
    "Accept-Language: en-US,en;q=0.8\r\n",
    "Content-Length: 2\r\n",
    "Accept-Charset: ISO-8859-1,utf-8;q=0.7,*;q=0.3\r\n",
    "Cookie: PREF=ID=6b67d166417efec4:U=69097d4080ae0e15:FF=0:TM=1340891937:LM=1340891938:S=8t97UBiUwKbESvVX; NID=61=sf10OV-t02wu5PXrc09AhGagFrhSAB2C_98ZaI53-uH4jGiVG_yz9WmE3vjEBcmJyWUogB1ZF5puyDIIiB-UIdLd4OEgPR3x1LHNyuGmEDaNbQ_XaxWQqqQ59mX1qgLQ\r\n",
    "\r\n",
    "xx",
);

/// Response with a 30-byte body
pub const RESPONSE_WITH_BODY: &str = concat!(
    "HTTP/1.1 200 OK\r\n",
    "Date: Tue, 14 Aug 2012 22:31:45 GMT\r\n",
    "Expires: -1\r\n",
    "Cache-Control: private, max-age=0\r\n",
    "Content-Type: text/html; charset=UTF-8\r\n",
    "Content-Encoding: gzip\r\n",
    "Server: gws\r\n",
    "Content-Length: 30\r\n",
    "X-XSS-Protection: 1; mode=block\r\n",
    "X-Frame-Options: SAMEORIGIN\r\n",
    "\r\n",
    "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
);

/// Redirect declaring 290 body bytes; the capture carries 297, so the last
/// seven belong to whatever follows
pub const MOVED_PERMANENTLY: &str = concat!(
    "HTTP/1.1 301 Moved Permanently\r\n",
    "Date: Sun, 29 Sep 2013 16:53:59 GMT\r\n",
    "Server: Apache\r\n",
    "Location: http://www.hotnews.ro/\r\n",
    "Vary: Accept-Encoding\r\n",
    "Content-Length: 290\r\n",
    "Connection: close\r\n",
    "Content-Type: text/html; charset=iso-8859-1\r\n",
    "\r\n",
    "<!DOCTYPE HTML PUBLIC \"-//IETF//DTD HTML 2.0//EN\">\r\n",
    "<html><head>\r\n",
    "<title>301 Moved Permanently</title>\r\n",
    "</head><body>\r\n",
    "<h1>Moved Permanently</h1>\r\n",
    "<p>The document has moved <a href=\"http://www.hotnews.ro/\">here</a>.</p>\r\n",
    "<hr>\r\n",
    "<address>Apache Server at hotnews.ro Port 80</address>\r\n",
    "</body></html>",
);

/// Every well-formed fixture, for tests that run over all of them
pub const ALL_MESSAGES: &[&str] = &[
    SIMPLE_RESPONSE,
    SIMPLE_REQUEST,
    REQUEST_WITH_BODY,
    RESPONSE_WITH_BODY,
    MOVED_PERMANENTLY,
];

/// Position right after the first occurrence of `needle`
pub fn offset_after(haystack: &str, needle: &str) -> usize {
    haystack.find(needle).expect("needle present in fixture") + needle.len()
}

/// Result of driving a stream over some chunking of the input
#[derive(Debug, PartialEq, Eq)]
pub struct Outcome {
    pub result:       Result<ParseStatus, ParseError>,
    pub message:      Option<Message>,
    pub parse_offset: usize,
}

/// Append `data` split at `splits` (ascending positions), parsing after each
/// chunk, all under the same timestamp.
pub fn parse_in_chunks(data: &[u8], splits: &[usize]) -> Outcome {
    let mut stream = Http1Stream::new();
    let mut result = Ok(ParseStatus::Incomplete);
    let mut from = 0;
    for &to in splits.iter().chain(std::iter::once(&data.len())) {
        stream
            .append(&data[from..to], TimestampNs(0))
            .expect("within buffer limits");
        result = stream.parse();
        from = to;
    }
    Outcome {
        result,
        message: stream.message().cloned(),
        parse_offset: stream.parse_offset(),
    }
}

/// Single-call reference outcome
pub fn parse_whole(data: &[u8]) -> Outcome {
    parse_in_chunks(data, &[])
}

/// Feed one byte per append
pub fn parse_bytewise(data: &[u8]) -> Outcome {
    let splits: Vec<usize> = (1..data.len()).collect();
    parse_in_chunks(data, &splits)
}
