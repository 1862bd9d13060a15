//! `PollConfig`: every tunable §6 lists as a parameter to `poll()`, lifted
//! into a plain struct (§9 "Global logger / module-level constants" →
//! configuration passed at construction). No file I/O, no env var reads, no
//! CLI parsing happens anywhere in this crate — an external collaborator
//! loads this however it likes and hands it to [`crate::poll`].

use serde::{Deserialize, Serialize};

use crate::message::PduKind;

/// What kind of PDU a poll issues. Mirrors [`PduKind`] but without the
/// repeater fields baked in, since those are config-level defaults applied
/// uniformly to every oid-group rather than chosen per-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Get,
    GetBulk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// SNMPv2c community string. Plain bytes, not `String` — the wire
    /// format never requires valid UTF-8 and the original implementation
    /// never assumed it either (§3.1).
    pub community: Vec<u8>,

    /// Base timeout, in seconds, before the first retry of an unanswered
    /// request. Default matches the original's `check_timeout`.
    pub timeout_secs: u64,

    /// Multiplier applied per retry attempt (§4.4's backoff formula).
    pub backoff: u32,

    /// Maximum number of resends before a walk is abandoned and yielded as
    /// a `Timeout` result.
    pub retry: u32,

    pub msg_type: MessageType,

    /// GetBulk's `max-repetitions` field. Ignored for `MessageType::Get`.
    pub max_repetitions: i32,

    /// First request-id to hand out. `None` picks a random start in
    /// `[1, 30_000]`, matching the original's `random.randint(1, 999) *
    /// 10^6`-style scheme (here just a smaller, plainer range since this
    /// crate doesn't need the original's decimal-digit offset trick, which
    /// existed only to keep retry/continuation ids human-distinguishable
    /// in log output — `attempt` and `InFlight` already carry that here).
    pub start_reqid: Option<i32>,

    /// Step between successive freshly allocated request-ids.
    pub reqid_step: i32,

    /// SNMP UDP port. Always 161 in practice but kept configurable for
    /// tests that bind a loopback fake agent on an ephemeral port.
    pub port: u16,
}

impl PollConfig {
    /// Non-repeaters is always 0 for this crate's GetBulk usage (§4.2): all
    /// requested OIDs are walked columns, never a mix of scalar-then-walked.
    pub fn pdu_kind(&self) -> PduKind {
        match self.msg_type {
            MessageType::Get => PduKind::Get,
            MessageType::GetBulk => PduKind::GetBulk {
                non_repeaters: 0,
                max_repetitions: self.max_repetitions,
            },
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            community: b"public".to_vec(),
            timeout_secs: 3,
            backoff: 2,
            retry: 2,
            msg_type: MessageType::GetBulk,
            max_repetitions: 60,
            start_reqid: None,
            reqid_step: 1,
            port: 161,
        }
    }
}
