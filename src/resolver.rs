//! Resolver interface (C5): bulk hostname → target-address resolution,
//! hidden behind a trait so the engine never depends on a concrete DNS
//! stack. Grounded in `original_source/fastsnmp/mass_resolver.py`, which
//! resolves every host concurrently via `asyncio.wait` over one coroutine
//! per host and collects whichever succeed, logging (via `gaierror`
//! swallowing there, `log::warn!` here) and simply omitting the rest.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddrV6};

use async_trait::async_trait;
use trust_dns_resolver::TokioAsyncResolver;

use crate::error::Result;

/// Given a set of host names, return a mapping from name to its resolved
/// target addresses, ordered as the resolver prefers them tried. A name
/// absent from the result means resolution failed for that host; the
/// caller is expected to have already logged a warning (§4.5, §7).
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, hosts: &HashSet<String>) -> HashMap<String, Vec<SocketAddrV6>>;
}

/// The crate's one concrete `Resolver`, backed by `trust-dns-resolver`.
/// Performs a bulk concurrent `lookup_ip` per host (the combined A+AAAA
/// query) and maps every result to a dual-stack v6 address — an A result
/// becomes a v4-mapped-v6 address, so the engine's single `AF_INET6` socket
/// (§4.4) can dial either kind identically.
pub struct TrustDnsResolver {
    inner: TokioAsyncResolver,
    port: u16,
}

impl TrustDnsResolver {
    /// Builds a resolver from the system's configured nameservers
    /// (`/etc/resolv.conf` on unix). `port` is the SNMP port every
    /// resolved address is paired with.
    pub fn from_system_config(port: u16) -> Result<Self> {
        let inner = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(crate::error::Error::Resolve)?;
        Ok(TrustDnsResolver { inner, port })
    }

    async fn resolve_one(&self, host: &str) -> Option<Vec<SocketAddrV6>> {
        let Ok(response) = self.inner.lookup_ip(host).await else {
            return None;
        };
        let addrs: Vec<SocketAddrV6> = response
            .iter()
            .map(|ip| {
                let v6 = match ip {
                    IpAddr::V6(v6) => v6,
                    IpAddr::V4(v4) => v4_mapped_v6(v4),
                };
                SocketAddrV6::new(v6, self.port, 0, 0)
            })
            .collect();
        if addrs.is_empty() {
            None
        } else {
            Some(addrs)
        }
    }
}

fn v4_mapped_v6(ip: Ipv4Addr) -> Ipv6Addr {
    ip.to_ipv6_mapped()
}

#[async_trait]
impl Resolver for TrustDnsResolver {
    async fn resolve(&self, hosts: &HashSet<String>) -> HashMap<String, Vec<SocketAddrV6>> {
        // Resolve every host concurrently, the same shape as the original's
        // `async_resolve_mass`: one task per host, collect whichever finish
        // successfully.
        let futures = hosts.iter().map(|host| async move {
            let resolved = self.resolve_one(host).await;
            (host.clone(), resolved)
        });
        let results = futures::future::join_all(futures).await;

        let mut resolved = HashMap::with_capacity(results.len());
        for (host, addresses) in results {
            match addresses {
                Some(addresses) => {
                    resolved.insert(host, addresses);
                }
                None => {
                    log::warn!("unable to resolve {host}, skipping this host");
                }
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v4_mapped_v6_addresses_round_trip_the_original_octets() {
        let mapped = v4_mapped_v6(Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(mapped.to_ipv4_mapped(), Some(Ipv4Addr::new(192, 0, 2, 1)));
    }
}
