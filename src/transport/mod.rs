//! Pose transport.
//!
//! Envelopes leave the process as one UTF-8 JSON datagram per frame. Delivery
//! is fire-and-forget: no acknowledgement, retry or queue, and a lost datagram
//! is superseded by the next frame's. Destinations must be loopback unless
//! remote delivery is explicitly allowed.
//!
//! `EnvelopeListener` is the receiving side, used by the `pose_listen` tool and
//! by tests.

mod endpoint;
mod listener;
mod udp;

pub use endpoint::{parse_udp_endpoint, validate_destination, UdpEndpoint};
pub use listener::EnvelopeListener;
pub use udp::{EnvelopeSink, SinkStats, UdpSender, MAX_DATAGRAM_BYTES};
