//! Crate-wide error taxonomy.
//!
//! Mirrors the failure categories laid out in the design: protocol decode
//! errors are local to one datagram and never stop the loop; fatal socket
//! errors and internal invariant violations do.

use thiserror::Error;

use crate::ber::DecodeError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error returned by fallible entry points and the last item of a
/// [`crate::stream::PollStream`] when the loop had to give up.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to bind or configure the polling socket: {0}")]
    Socket(#[source] std::io::Error),

    #[error("fatal socket I/O error: {0}")]
    Fatal(#[source] std::io::Error),

    #[error("datagram decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("internal invariant violated: {0}")]
    Fault(#[from] Fault),

    #[error("resolver error: {0}")]
    Resolve(#[from] trust_dns_resolver::error::ResolveError),
}

/// A programmer-visible fault: something the design declares must never
/// happen in a correctly operating loop. These terminate the loop rather
/// than being swallowed, per the "no exception-for-control-flow" rule for
/// values, but "fail loudly" rule for violated invariants.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("a freshly generated request-id {id} collided with a live in-flight entry")]
    IdCollision { id: i32 },

    /// Not raised for an ordinary late reply after timeout — that's expected
    /// and silently discarded (§4.4 step 2). This fires only when the loop's
    /// own bookkeeping expects an in-flight entry to still exist (e.g. while
    /// applying a timeout-driven retry) and it does not.
    #[error("expected an in-flight entry for request-id {id}, found none")]
    UnknownInFlightEntry { id: i32 },
}
