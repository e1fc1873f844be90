//! Which hosts the active scanner should probe.
//!
//! The default strategy asks the OS for the address of the interface that
//! carries the default route (no packets are sent) and assumes it sits in a
//! `/24`.  That guess is wrong on larger subnets, which is why the network
//! can also be pinned in the client configuration.

use std::net::{IpAddr, Ipv4Addr};

use ipnetwork::Ipv4Network;
use tracing::debug;

/// Prefix length assumed around the local address.
pub const ASSUMED_PREFIX: u8 = 24;

/// Source of the local IPv4 network to scan.
pub trait NetworkEnumerator: Send + Sync {
    /// The network to scan, or `None` if it cannot be determined.
    fn local_network(&self) -> Option<Ipv4Network>;
}

/// Uses the default-route interface address and assumes a `/24`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRouteEnumerator;

impl NetworkEnumerator for DefaultRouteEnumerator {
    fn local_network(&self) -> Option<Ipv4Network> {
        match local_ip_address::local_ip() {
            Ok(IpAddr::V4(ip)) => network_around(ip, ASSUMED_PREFIX),
            Ok(IpAddr::V6(ip)) => {
                debug!("default route is IPv6 ({ip}); no IPv4 network to scan");
                None
            }
            Err(e) => {
                debug!("could not determine local address: {e}");
                None
            }
        }
    }
}

/// Always returns the same network (configuration override).
#[derive(Debug, Clone, Copy)]
pub struct StaticNetwork(pub Ipv4Network);

impl NetworkEnumerator for StaticNetwork {
    fn local_network(&self) -> Option<Ipv4Network> {
        Some(self.0)
    }
}

/// The network of `prefix` bits containing `ip`, normalised to its network
/// address.
pub fn network_around(ip: Ipv4Addr, prefix: u8) -> Option<Ipv4Network> {
    let net = Ipv4Network::new(ip, prefix).ok()?;
    Ipv4Network::new(net.network(), prefix).ok()
}

/// Host addresses of `network`: the network and broadcast addresses are
/// excluded unless the prefix is /31 or /32.
pub fn candidate_hosts(network: Ipv4Network) -> Vec<Ipv4Addr> {
    if network.prefix() >= 31 {
        return network.iter().collect();
    }
    let (first, last) = (network.network(), network.broadcast());
    network
        .iter()
        .filter(|ip| *ip != first && *ip != last)
        .collect()
}
