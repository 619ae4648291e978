//! UDP destination parsing and the loopback policy.

use anyhow::{anyhow, Context, Result};
use std::net::{SocketAddr, ToSocketAddrs};

/// A parsed `host:port` datagram endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UdpEndpoint {
    pub host: String,
    pub port: u16,
}

impl UdpEndpoint {
    /// Resolve the endpoint to a socket address. The first resolved address
    /// wins.
    pub fn resolve(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("resolve udp destination {}:{}", self.host, self.port))?
            .next()
            .ok_or_else(|| anyhow!("udp destination {} resolved to no address", self.host))
    }

    pub fn is_loopback(&self) -> bool {
        if self.host == "localhost" {
            return true;
        }
        self.host
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
    }
}

impl std::fmt::Display for UdpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Parse a UDP endpoint from an address string.
///
/// Supports formats:
/// - `host:port`
/// - `udp://host:port`
/// - `[ipv6]:port` (IPv6 with brackets)
pub fn parse_udp_endpoint(addr: &str) -> Result<UdpEndpoint> {
    let mut remainder = addr.trim();

    if let Some((scheme, rest)) = remainder.split_once("://") {
        if scheme != "udp" {
            return Err(anyhow!("unsupported UDP scheme: {}", scheme));
        }
        remainder = rest;
    }

    let (host, port) = split_host_port(remainder)?;
    if host.is_empty() {
        return Err(anyhow!("missing UDP host in {}", addr));
    }
    Ok(UdpEndpoint { host, port })
}

fn split_host_port(addr: &str) -> Result<(String, u16)> {
    // Handle IPv6 addresses in brackets: [::1]:5052
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, rest) = rest
            .split_once(']')
            .ok_or_else(|| anyhow!("invalid UDP address: {}", addr))?;
        let port = rest
            .strip_prefix(':')
            .ok_or_else(|| anyhow!("missing UDP port in {}", addr))?;
        let port: u16 = port
            .parse()
            .with_context(|| format!("invalid UDP port in {}", addr))?;
        return Ok((host.to_string(), port));
    }

    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("missing UDP port in {}", addr))?;
    let port: u16 = port
        .parse()
        .with_context(|| format!("invalid UDP port in {}", addr))?;
    Ok((host.to_string(), port))
}

/// Reject non-loopback destinations unless explicitly allowed.
///
/// Pose data is meant for an engine on the same machine.
pub fn validate_destination(endpoint: &UdpEndpoint, allow_remote: bool) -> Result<()> {
    if allow_remote || endpoint.is_loopback() {
        return Ok(());
    }
    Err(anyhow!(
        "pose destination must be loopback: {} (set transport.allow_remote or POSE_RELAY_ALLOW_REMOTE to override)",
        endpoint
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_endpoint_plain() {
        let ep = parse_udp_endpoint("127.0.0.1:5052").unwrap();
        assert_eq!(ep.host, "127.0.0.1");
        assert_eq!(ep.port, 5052);
    }

    #[test]
    fn parse_endpoint_udp_scheme() {
        let ep = parse_udp_endpoint("udp://localhost:9000").unwrap();
        assert_eq!(ep.host, "localhost");
        assert_eq!(ep.port, 9000);
    }

    #[test]
    fn parse_endpoint_ipv6() {
        let ep = parse_udp_endpoint("[::1]:5052").unwrap();
        assert_eq!(ep.host, "::1");
        assert_eq!(ep.port, 5052);
        assert_eq!(ep.to_string(), "[::1]:5052");
    }

    #[test]
    fn parse_endpoint_rejects_bad_input() {
        assert!(parse_udp_endpoint("tcp://127.0.0.1:5052").is_err());
        assert!(parse_udp_endpoint("127.0.0.1").is_err());
        assert!(parse_udp_endpoint("127.0.0.1:notaport").is_err());
        assert!(parse_udp_endpoint(":5052").is_err());
    }

    #[test]
    fn loopback_destinations_are_accepted() {
        for addr in ["127.0.0.1:5052", "localhost:5052", "[::1]:5052", "127.0.0.2:1"] {
            let ep = parse_udp_endpoint(addr).unwrap();
            assert!(validate_destination(&ep, false).is_ok(), "{}", addr);
        }
    }

    #[test]
    fn remote_destinations_need_opt_in() {
        let ep = parse_udp_endpoint("192.168.1.10:5052").unwrap();
        let err = validate_destination(&ep, false).unwrap_err();
        assert!(err.to_string().contains("must be loopback"));
        assert!(validate_destination(&ep, true).is_ok());
    }

    #[test]
    fn resolves_loopback() -> Result<()> {
        let addr = parse_udp_endpoint("127.0.0.1:5052")?.resolve()?;
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 5052);
        Ok(())
    }
}
