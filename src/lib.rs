//! `snmp_poller`: a high-fanout SNMPv2c GetBulk poller.
//!
//! Two subsystems dominate: a BER/ASN.1 codec specialised for SNMPv2c
//! messages ([`ber`], [`message`], [`value`], [`oid`]) and a single-socket,
//! event-driven poll engine ([`engine`], [`row`], [`job`]) that issues
//! concurrent GetBulk requests, stitches replies into table rows, retries
//! with backoff, and yields results as a lazy [`stream::PollStream`].
//!
//! The hostname→address resolver ([`resolver`]), the outer scheduler that
//! partitions host lists into periodic jobs, downstream sinks, and process
//! supervision are all external collaborators — this crate only implements
//! the core and the resolver's interface (§1).

pub mod ber;
pub mod config;
pub mod engine;
pub mod error;
pub mod job;
pub mod message;
pub mod oid;
pub mod resolver;
pub mod result;
pub mod row;
pub mod stream;
pub mod value;

use std::collections::HashSet;

use crate::config::PollConfig;
use crate::engine::PollEngine;
use crate::error::Result;
use crate::job::Job;
use crate::oid::Oid;
use crate::resolver::Resolver;
use crate::stream::PollStream;

/// An ordered sequence of "main OIDs" (table column prefixes) presented
/// together to one GetBulk (§3's "OidGroup").
pub type OidGroup = Vec<Oid>;

/// The core entry point (§6): `poll(hosts, oid_groups, community, timeout,
/// backoff, retry, msg_type, max_repetitions, start_reqid, reqid_step)` in
/// the distilled spec becomes `hosts` + `oid_groups` + a `PollConfig`
/// bundling the tuning parameters + a `Resolver` trait object supplying the
/// external hostname→address mapping (§4.5, §0's "no process-wide mutable
/// state" — nothing here reads a file, an env var, or a global).
///
/// Resolves `hosts` first (a failure for one host just skips it, with a
/// warning — §4.5), builds one [`Job`] per (host, oid-group) using
/// `addresses[0]` deterministically per host, binds the polling socket, and
/// returns a [`PollStream`] the caller pulls from. A synchronous setup
/// failure (socket bind/configure) is returned immediately; every other
/// failure surfaces as a stream item instead (§6).
pub async fn poll(
    hosts: HashSet<String>,
    oid_groups: Vec<OidGroup>,
    config: PollConfig,
    resolver: &dyn Resolver,
) -> Result<PollStream> {
    let resolved = resolver.resolve(&hosts).await;
    let kind = config.pdu_kind();

    let mut jobs = Vec::with_capacity(hosts.len() * oid_groups.len().max(1));
    for host in &hosts {
        let Some(addresses) = resolved.get(host) else {
            // Already warned by the resolver implementation (§4.5).
            continue;
        };
        let Some(target) = addresses.first() else {
            continue;
        };
        for group in &oid_groups {
            jobs.push(Job::new(host.clone(), *target, group.clone(), kind));
        }
    }

    let engine = PollEngine::bind(config, jobs).await?;
    Ok(PollStream::new(engine))
}
