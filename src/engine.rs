//! Poll engine (C4): the single non-blocking UDP socket and readiness loop
//! that dispatches jobs, decodes replies, retries on a backoff schedule, and
//! produces [`crate::result::PollResult`]s. [`crate::stream::PollStream`]
//! drives this one iteration at a time from `poll_next`; nothing here spawns
//! a task of its own (§5: "no shared mutable state with any other loop").
//!
//! Grounded in §4.4's four-step main loop; the readiness mechanism is
//! `tokio::net::UdpSocket`'s `readable()`/`try_recv_from()`/`try_send_to()`
//! pair, which is "the platform's scalable I/O notifier" the design asks
//! for, reached through the ecosystem's standard async-runtime wrapper
//! rather than a hand-rolled `mio::Poll` (§4.4.1).

use std::collections::{HashMap, VecDeque};
use std::net::{Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::config::PollConfig;
use crate::error::{Error, Fault, Result};
use crate::job::{InFlight, Job};
use crate::message::{PduKind, ReqIdGenerator, Request};
use crate::result::{Cell, PollResult, Timeout};
use crate::row;

/// How many queued jobs a single dispatch pass will send before yielding to
/// the receive side (§4.4 step 1's "B, e.g. 1000").
const DISPATCH_BATCH: usize = 1000;

/// How long one readiness wait blocks before the loop re-checks timeouts
/// regardless (§4.4 step 2's "T_poll (≈10 ms)").
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Datagrams larger than this are the agent's fault (§6: "≤64 KiB per
/// datagram; larger responses ... cause decode failure") — the receive
/// buffer is sized to that ceiling, not grown dynamically.
const MAX_DATAGRAM_BYTES: usize = 65536;

/// Generous receive-buffer size (§4.4: "≥16 MiB to absorb bursts from
/// hundreds of responders"). Best-effort: some sandboxes cap `SO_RCVBUF`
/// lower than requested, which is not fatal to correctness, only throughput.
const RECV_BUFFER_BYTES: usize = 16 * 1024 * 1024;

/// Owns the one UDP socket for a `poll()` invocation and all of its
/// bookkeeping: the send queue of not-yet-dispatched jobs, the in-flight
/// table keyed by request-id, and the buffer of results ready to be pulled.
pub struct PollEngine {
    socket: UdpSocket,
    config: PollConfig,
    reqid_gen: ReqIdGenerator,
    send_queue: VecDeque<Job>,
    in_flight: HashMap<i32, InFlight>,
    ready: VecDeque<PollResult>,
    cancelled: Arc<AtomicBool>,
}

impl PollEngine {
    /// Binds the dual-stack socket (`AF_INET6` with `IPV6_V6ONLY` disabled,
    /// so IPv4 targets expressed as `::ffff:a.b.c.d` work identically to
    /// native v6 ones) and seeds the send queue with `jobs`.
    pub async fn bind(config: PollConfig, jobs: Vec<Job>) -> Result<Self> {
        let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP)).map_err(Error::Socket)?;
        socket.set_only_v6(false).map_err(Error::Socket)?;
        socket.set_nonblocking(true).map_err(Error::Socket)?;
        let _ = socket.set_recv_buffer_size(RECV_BUFFER_BYTES);
        let any: SocketAddr = (Ipv6Addr::UNSPECIFIED, 0).into();
        socket.bind(&any.into()).map_err(Error::Socket)?;
        let socket = UdpSocket::from_std(socket.into()).map_err(Error::Socket)?;

        let start = config
            .start_reqid
            .unwrap_or_else(|| rand::thread_rng().gen_range(1..=30_000));

        Ok(PollEngine {
            socket,
            reqid_gen: ReqIdGenerator::new(start, config.reqid_step),
            send_queue: jobs.into(),
            in_flight: HashMap::new(),
            ready: VecDeque::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
            config,
        })
    }

    pub(crate) fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub(crate) fn pop_ready(&mut self) -> Option<PollResult> {
        self.ready.pop_front()
    }

    /// §4.4 step 4: done once nothing is queued to send and nothing is
    /// awaiting a reply.
    pub(crate) fn is_done(&self) -> bool {
        self.send_queue.is_empty() && self.in_flight.is_empty()
    }

    /// Runs one pass of §4.4's four steps. Called repeatedly by
    /// [`crate::stream::PollStream`] until it has a result to yield or the
    /// engine reports [`Self::is_done`].
    pub(crate) async fn drive_one_iteration(&mut self) -> Result<()> {
        if !self.cancelled.load(Ordering::Relaxed) {
            self.dispatch_batch()?;
        }

        let sleep = tokio::time::sleep(POLL_INTERVAL);
        tokio::pin!(sleep);
        tokio::select! {
            readable = self.socket.readable() => {
                readable.map_err(Error::Fatal)?;
                self.receive_all()?;
            }
            _ = &mut sleep => {}
        }

        self.check_timeouts()?;
        Ok(())
    }

    /// §4.4 step 1: drain up to `DISPATCH_BATCH` jobs, encode and send each.
    /// On `EWOULDBLOCK` the job goes back to the front of the queue and
    /// dispatch stops for this iteration.
    fn dispatch_batch(&mut self) -> Result<()> {
        for _ in 0..DISPATCH_BATCH {
            let Some(job) = self.send_queue.pop_front() else {
                break;
            };
            match self.dispatch_one(job) {
                Ok(()) => {}
                Err(DispatchOutcome::Requeue(job)) => {
                    self.send_queue.push_front(job);
                    break;
                }
                Err(DispatchOutcome::Fatal(err)) => return Err(err),
            }
        }
        Ok(())
    }

    fn dispatch_one(&mut self, job: Job) -> std::result::Result<(), DispatchOutcome> {
        let request_id = self.reqid_gen.next();
        if self.in_flight.contains_key(&request_id) {
            // §4.2, §9 Open Question: a freshly generated id colliding with
            // a still-live entry is a programmer-visible fault, not silently
            // skipped — skipping could drop a still-live column's
            // continuation, which is worse than failing loudly.
            return Err(DispatchOutcome::Fatal(Error::Fault(Fault::IdCollision { id: request_id })));
        }

        let request = Request {
            request_id,
            community: self.config.community.clone(),
            kind: job.kind,
            oids: job.oids_to_poll.clone(),
        };
        match self.socket.try_send_to(&request.encode(), SocketAddr::V6(job.target)) {
            Ok(_) => {
                let now = Instant::now();
                let base_timeout = Duration::from_secs(self.config.timeout_secs);
                self.in_flight.insert(request_id, InFlight::new(job, now, base_timeout));
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(DispatchOutcome::Requeue(job)),
            Err(e) => Err(DispatchOutcome::Fatal(Error::Fatal(e))),
        }
    }

    /// §4.4 step 2: drain the socket until it would block, decoding and
    /// handling each datagram as it comes.
    fn receive_all(&mut self) -> Result<()> {
        let mut buf = [0u8; MAX_DATAGRAM_BYTES];
        loop {
            match self.socket.try_recv_from(&mut buf) {
                Ok((n, _src)) => self.handle_datagram(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(Error::Fatal(e)),
            }
        }
    }

    fn handle_datagram(&mut self, data: &[u8]) {
        let response = match crate::message::Response::decode_partial(data) {
            Ok(response) => response,
            Err((err, partial)) => {
                // A partial parse never completes a walk (§4.1, §7) — it's
                // surfaced here only so the discard log line can name which
                // in-flight request it probably came from.
                match partial.request_id {
                    Some(id) => log::debug!(
                        "discarding malformed datagram for request-id {id}: {err} ({})",
                        to_hex(data)
                    ),
                    None => log::debug!("discarding malformed datagram: {err} ({})", to_hex(data)),
                }
                return;
            }
        };

        let Some(entry) = self.in_flight.remove(&response.request_id) else {
            // Late reply after a timeout already fired — expected, not a fault.
            log::debug!("late reply for unknown request-id {}, discarding", response.request_id);
            return;
        };

        let round_trip = entry.last_sent.elapsed();
        let received_at = Utc::now();

        if !response.status.is_success() {
            log::warn!(
                "agent for host {} reported error-status {} (request-id {}), abandoning this walk",
                entry.job.host, response.status.error_status, response.request_id
            );
            return;
        }

        match entry.job.kind {
            PduKind::Get => {
                if response.varbinds.len() != entry.job.main_oids.len() {
                    log::warn!(
                        "Get response from {} carried {} varbinds for {} requested oids",
                        entry.job.host,
                        response.varbinds.len(),
                        entry.job.main_oids.len()
                    );
                }
                for (main_oid, varbind) in entry.job.main_oids.iter().zip(response.varbinds.iter()) {
                    self.ready.push_back(PollResult::Cell(Cell {
                        host: entry.job.host.clone(),
                        main_oid: main_oid.clone(),
                        index_part: None,
                        value: varbind.value.clone(),
                        received_at,
                        round_trip,
                    }));
                }
            }
            PduKind::GetBulk { .. } => {
                let assembled = row::assemble(&entry.job.main_oids, &response.varbinds);
                for cell in assembled.cells {
                    self.ready.push_back(PollResult::Cell(Cell {
                        host: entry.job.host.clone(),
                        main_oid: cell.main_oid,
                        index_part: Some(cell.index_part),
                        value: cell.value,
                        received_at,
                        round_trip,
                    }));
                }
                let cancelled = self.cancelled.load(Ordering::Relaxed);
                if !assembled.walk_complete() && !cancelled {
                    let (main_oids, oids_to_poll) = row::next_request_oids(&entry.job.main_oids, &assembled.next_columns);
                    self.send_queue.push_back(entry.job.continued(main_oids, oids_to_poll));
                }
            }
        }
    }

    /// §4.4 step 3: resend entries past their deadline (incrementing
    /// `attempt`, preserving the original request-id so late replies still
    /// match), or give up and yield a [`Timeout`] once retries are
    /// exhausted.
    fn check_timeouts(&mut self) -> Result<()> {
        let now = Instant::now();
        let expired: Vec<i32> = self
            .in_flight
            .iter()
            .filter(|(_, entry)| now >= entry.deadline)
            .map(|(&id, _)| id)
            .collect();

        for id in expired {
            self.handle_expired(id, now)?;
        }
        Ok(())
    }

    fn handle_expired(&mut self, id: i32, now: Instant) -> Result<()> {
        let give_up = self
            .in_flight
            .get(&id)
            .ok_or(Error::Fault(Fault::UnknownInFlightEntry { id }))?
            .attempt
            > self.config.retry;

        if give_up {
            let entry = self
                .in_flight
                .remove(&id)
                .ok_or(Error::Fault(Fault::UnknownInFlightEntry { id }))?;
            log::warn!(
                "walk to host {} abandoned after {} attempts",
                entry.job.host, entry.attempt
            );
            self.ready.push_back(PollResult::Timeout(Timeout {
                host: entry.job.host,
                main_oids: entry.job.main_oids,
            }));
            return Ok(());
        }

        let base_timeout = Duration::from_secs(self.config.timeout_secs);
        let backoff = self.config.backoff;
        let community = self.config.community.clone();
        let (kind, oids, target) = {
            let entry = self
                .in_flight
                .get(&id)
                .ok_or(Error::Fault(Fault::UnknownInFlightEntry { id }))?;
            (entry.job.kind, entry.job.oids_to_poll.clone(), entry.job.target)
        };
        let request = Request {
            request_id: id,
            community,
            kind,
            oids,
        };

        match self.socket.try_send_to(&request.encode(), SocketAddr::V6(target)) {
            Ok(_) => {
                let entry = self
                    .in_flight
                    .get_mut(&id)
                    .ok_or(Error::Fault(Fault::UnknownInFlightEntry { id }))?;
                entry.record_resend(now, backoff, base_timeout);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                // Didn't actually resend — try again next tick rather than
                // burning an attempt or waiting a full backoff period.
                let entry = self
                    .in_flight
                    .get_mut(&id)
                    .ok_or(Error::Fault(Fault::UnknownInFlightEntry { id }))?;
                entry.deadline = now + Duration::from_millis(1);
            }
            Err(e) => return Err(Error::Fatal(e)),
        }
        Ok(())
    }
}

enum DispatchOutcome {
    Requeue(Job),
    Fatal(Error),
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_hex_formats_lowercase_pairs() {
        assert_eq!(to_hex(&[0x01, 0xAB, 0x00]), "01ab00");
    }
}
