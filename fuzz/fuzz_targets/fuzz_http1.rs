//! Fuzz target: HTTP/1.x collation
//!
//! Feeds random events to the collator: random bytes, random directions and
//! connection ids, random clock. The collator must never panic, whatever it
//! is given, and must keep accepting events after parse failures.

#![no_main]

use arbitrary::Arbitrary;
use http_collator::{Collator, CollatorConfig, DataEvent, Direction, H1Limits, TimestampNs};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzEvent {
    payload:          Vec<u8>,
    timestamp_ns:     u64,
    client_to_server: bool,
    connection_id:    u8,
}

impl DataEvent for FuzzEvent {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    fn direction(&self) -> Direction {
        if self.client_to_server {
            Direction::ClientToServer
        } else {
            Direction::ServerToClient
        }
    }

    fn connection_id(&self) -> u64 {
        u64::from(self.connection_id % 4)
    }
}

fuzz_target!(|events: Vec<FuzzEvent>| {
    // Small limits so the limit paths are reachable
    let config = CollatorConfig {
        max_pending_requests: 4,
        limits: H1Limits {
            max_buffer_size:  4096,
            max_line_length:  256,
            max_header_count: 8,
        },
        ..CollatorConfig::default()
    };
    let collator: Collator<FuzzEvent> = Collator::with_config(config);

    let mut last_ts = 0;
    for event in events {
        last_ts = event.timestamp_ns;
        for produced in collator.add_event(event) {
            if let Some(exchange) = produced.as_exchange() {
                let _ = exchange.to_string();
            }
        }
    }

    collator.cleanup(TimestampNs(last_ts));
    for conn_id in 0..4 {
        assert!(collator.close_connection(conn_id).len() <= 4);
    }
});
