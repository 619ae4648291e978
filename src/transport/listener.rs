use anyhow::{Context, Result};
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use super::endpoint::parse_udp_endpoint;
use super::udp::MAX_DATAGRAM_BYTES;
use crate::envelope::PoseEnvelope;

/// Receiving end of the pose stream, as an engine would run it.
pub struct EnvelopeListener {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl EnvelopeListener {
    /// Bind to `host:port`. Port 0 picks an ephemeral port.
    pub fn bind(addr: &str) -> Result<Self> {
        let endpoint = parse_udp_endpoint(addr)?;
        let local = endpoint.resolve()?;
        let socket =
            UdpSocket::bind(local).with_context(|| format!("bind udp listener on {}", local))?;
        Ok(Self {
            socket,
            buffer: vec![0u8; MAX_DATAGRAM_BYTES],
        })
    }

    /// Block for at most `timeout` per receive. `None` blocks indefinitely.
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket
            .set_read_timeout(timeout)
            .context("set udp read timeout")
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().context("read udp listener address")
    }

    /// Receive and decode one datagram.
    pub fn recv(&mut self) -> Result<(PoseEnvelope, SocketAddr)> {
        let (len, from) = self
            .socket
            .recv_from(&mut self.buffer)
            .context("recv pose datagram")?;
        let envelope = PoseEnvelope::from_json_bytes(&self.buffer[..len])
            .with_context(|| format!("datagram from {}", from))?;
        Ok((envelope, from))
    }
}
