//! The job and in-flight-entry types from §3: a `Job` is immutable for the
//! life of one outstanding request; continuation (a fresh request-id with
//! advanced `oids_to_poll`) allocates a new `Job` rather than mutating one
//! in place, since the in-flight table is keyed by request-id and a retry
//! must resend byte-for-byte the same request.

use std::net::SocketAddrV6;
use std::time::{Duration, Instant};

use crate::message::PduKind;
use crate::oid::Oid;

/// One outstanding (or about-to-be-sent) unit of work: a host, the table
/// columns it's walking, and the OIDs to actually put in the next request.
///
/// `main_oids` never changes for the life of a walk; `oids_to_poll` advances
/// each round to the last-seen OID per live column (§3's invariant:
/// `oids_to_poll.len() == main_oids.len()`, since finished columns are
/// dropped from both in lockstep by [`crate::row::next_request_oids`]).
#[derive(Debug, Clone)]
pub struct Job {
    pub host: String,
    pub target: SocketAddrV6,
    pub main_oids: Vec<Oid>,
    pub oids_to_poll: Vec<Oid>,
    pub kind: PduKind,
}

impl Job {
    pub fn new(
        host: String,
        target: SocketAddrV6,
        main_oids: Vec<Oid>,
        kind: PduKind,
    ) -> Self {
        let oids_to_poll = main_oids.clone();
        Job {
            host,
            target,
            main_oids,
            oids_to_poll,
            kind,
        }
    }

    /// A continuation of this walk: same host, target, and kind, but a
    /// narrowed `main_oids` (finished columns dropped) and advanced
    /// `oids_to_poll`, as produced by the row assembler.
    pub fn continued(&self, main_oids: Vec<Oid>, oids_to_poll: Vec<Oid>) -> Self {
        Job {
            host: self.host.clone(),
            target: self.target,
            main_oids,
            oids_to_poll,
            kind: self.kind,
        }
    }
}

/// An in-flight table entry: the job it's tracking, when it was first sent
/// (for external attribution), when it was most recently (re)sent (for RTT),
/// the running deadline, and how many times it's been sent.
///
/// Invariant (§3, §9 Open Question resolution): `first_sent` is set once
/// when the job is first dispatched and never reset on retry — only
/// `attempt` increments and `deadline` grows by each attempt's backoff
/// duration in turn, so the deadline for attempt N is always `first_sent +
/// Σ duration(1..=N)`, matching the source's retry branch never resetting
/// the in-flight entry's first-sent-time.
#[derive(Debug, Clone)]
pub struct InFlight {
    pub job: Job,
    pub first_sent: Instant,
    pub last_sent: Instant,
    pub attempt: u32,
    pub deadline: Instant,
}

impl InFlight {
    /// A freshly dispatched entry: attempt 1, deadline `now + base_timeout`
    /// (§4.4's formula for `attempt == 1`).
    pub fn new(job: Job, now: Instant, base_timeout: Duration) -> Self {
        InFlight {
            job,
            first_sent: now,
            last_sent: now,
            attempt: 1,
            deadline: now + base_timeout,
        }
    }

    /// Record that this entry was just resent: `attempt` increments and the
    /// deadline grows by `attempt × backoff × base_timeout` (§4.4), added to
    /// the *previous* deadline rather than recomputed from scratch — the two
    /// are equal as long as resends happen at their deadline, but this form
    /// needs no stored history of past attempts.
    pub fn record_resend(&mut self, now: Instant, backoff: u32, base_timeout: Duration) {
        self.attempt += 1;
        self.last_sent = now;
        self.deadline += base_timeout * (self.attempt * backoff);
    }
}
