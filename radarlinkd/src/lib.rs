//! RadarLink agent library
//!
//! Pieces of the `radarlinkd` binary that are worth testing on their own:
//! the HTTP forwarder, the forwarding loop, device selection and output
//! formatting.

/// HTTP delivery of readings to the collector.
pub mod forwarder;

/// Serial-to-HTTP forwarding loop.
pub mod relay;

// Internal helpers for the binary - not part of public API
#[doc(hidden)]
pub mod format;
#[doc(hidden)]
pub mod select;

#[cfg(test)]
pub mod test_utils;

pub use forwarder::{EchoForm, HttpForwarder, RecordSink};
pub use relay::{Relay, RelaySummary};
