//! The `Result` data model from §3: one emitted cell, timestamped and
//! attributed back to its host and column, plus the synthetic `Timeout`
//! marker for an abandoned walk.
//!
//! Named `PollResult` rather than `Result` to avoid shadowing
//! `std::result::Result` at every call site.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::oid::Oid;
use crate::value::Value;

/// One cell of poll output: `(host, main_oid, index_part, value,
/// receive_timestamp, round_trip_duration)` from §3. `index_part` is empty
/// for a plain Get (§3: "empty for non-GetBulk").
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub host: String,
    pub main_oid: Oid,
    pub index_part: Option<Oid>,
    pub value: Value,
    pub received_at: DateTime<Utc>,
    pub round_trip: Duration,
}

/// A walk that never completed within its retry budget. Carries the whole
/// column tuple it was polling for ("the original main-oids for downstream
/// attribution", §4.4 step 3) rather than a single OID, since the walk may
/// have spanned several columns at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeout {
    pub host: String,
    pub main_oids: Vec<Oid>,
}

/// One item pulled from a [`crate::stream::PollStream`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult {
    Cell(Cell),
    Timeout(Timeout),
}
