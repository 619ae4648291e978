use anyhow::{anyhow, Context, Result};
use std::net::{SocketAddr, UdpSocket};

use super::endpoint::{parse_udp_endpoint, validate_destination};
use crate::config::TransportSettings;
use crate::envelope::PoseEnvelope;

/// Largest payload a single IPv4 UDP datagram can carry.
pub const MAX_DATAGRAM_BYTES: usize = 65_507;

/// Counters kept by a sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub datagrams_sent: u64,
    pub send_failures: u64,
}

/// Destination for pose envelopes.
///
/// Delivery is best effort: a failed send is reported to the caller and the
/// envelope is dropped. Implementations never retry or queue.
pub trait EnvelopeSink {
    /// Send one envelope. Returns the payload size in bytes.
    fn send(&mut self, envelope: &PoseEnvelope) -> Result<usize>;

    fn stats(&self) -> SinkStats;

    /// Close the underlying socket. Called exactly once during shutdown.
    fn close(&mut self) {}
}

/// Fire-and-forget UDP sender bound to one destination.
pub struct UdpSender {
    socket: Option<UdpSocket>,
    destination: SocketAddr,
    stats: SinkStats,
}

impl UdpSender {
    /// Resolve and validate the configured destination and bind an ephemeral
    /// local socket of the matching address family.
    pub fn bind(settings: &TransportSettings) -> Result<Self> {
        let endpoint = parse_udp_endpoint(&settings.udp_addr)?;
        validate_destination(&endpoint, settings.allow_remote)?;
        let destination = endpoint.resolve()?;
        Self::bind_to(destination)
    }

    /// Bind a sender for an already resolved destination.
    pub fn bind_to(destination: SocketAddr) -> Result<Self> {
        let local = if destination.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local).with_context(|| format!("bind udp socket on {}", local))?;
        log::info!("udp transport ready, sending poses to {}", destination);
        Ok(Self {
            socket: Some(socket),
            destination,
            stats: SinkStats::default(),
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    fn send_payload(&self, payload: &[u8]) -> Result<usize> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| anyhow!("udp socket closed"))?;
        if payload.len() > MAX_DATAGRAM_BYTES {
            return Err(anyhow!(
                "pose payload of {} bytes exceeds datagram limit",
                payload.len()
            ));
        }
        socket
            .send_to(payload, self.destination)
            .with_context(|| format!("send pose datagram to {}", self.destination))
    }
}

impl EnvelopeSink for UdpSender {
    fn send(&mut self, envelope: &PoseEnvelope) -> Result<usize> {
        let result = envelope
            .to_json_bytes()
            .and_then(|payload| self.send_payload(&payload));
        match &result {
            Ok(_) => self.stats.datagrams_sent += 1,
            Err(_) => self.stats.send_failures += 1,
        }
        result
    }

    fn stats(&self) -> SinkStats {
        self.stats
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            log::info!(
                "udp transport closed ({} datagrams sent, {} failed)",
                self.stats.datagrams_sent,
                self.stats.send_failures
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_destination_is_rejected_without_opt_in() {
        let settings = TransportSettings {
            udp_addr: "10.1.2.3:5052".to_string(),
            allow_remote: false,
        };
        assert!(UdpSender::bind(&settings).is_err());
    }

    #[test]
    fn closed_sender_counts_failures() -> Result<()> {
        let mut sender = UdpSender::bind(&TransportSettings::default())?;
        sender.close();
        assert!(sender.send(&PoseEnvelope::default()).is_err());
        assert_eq!(
            sender.stats(),
            SinkStats {
                datagrams_sent: 0,
                send_failures: 1
            }
        );
        Ok(())
    }
}
