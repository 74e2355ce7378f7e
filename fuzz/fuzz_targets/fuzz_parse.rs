//! Fuzz target: Raw byte parsing
//!
//! This fuzz target feeds completely random bytes to the parser.
//! The goal is to ensure the parser never panics on arbitrary input and
//! that its offsets stay within the bytes it was given.

#![no_main]

use h1session::{H1SessionCache, Http1Stream, TimestampNs};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Manual drive: parse, reset, repeat until stuck
    let mut stream = Http1Stream::new();
    if stream.append(data, TimestampNs(1)).is_ok() {
        while let Ok(status) = stream.parse() {
            assert!(stream.parse_offset() <= stream.end_offset());
            if !status.is_complete() {
                break;
            }
            let message = stream.message().expect("complete without message");
            assert!(message.start < message.end);
            assert_eq!(message.end, stream.parse_offset());
            stream.reset();
        }
    }

    // Same bytes through the cache, whole and in two halves
    let cache: H1SessionCache<u32> = H1SessionCache::new();
    let whole = cache.feed(1, data, TimestampNs(1));

    if data.len() > 10 {
        let mid = data.len() / 2;
        let first = cache.feed(2, &data[..mid], TimestampNs(1));
        let second = cache.feed(2, &data[mid..], TimestampNs(2));
        if let (Ok(whole), Ok(mut halves), Ok(rest)) = (whole, first, second) {
            halves.extend(rest);
            assert_eq!(whole.len(), halves.len());
        }
    }
});
