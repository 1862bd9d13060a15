//! SNMPv2c message and PDU codec (C2): `SEQUENCE { version, community, pdu }`
//! where `pdu` is one of GetRequest/GetBulkRequest (outgoing) or
//! GetResponse (incoming).
//!
//! Nothing here knows about jobs, in-flight tables, or retries — that's
//! [`crate::engine`]. This module only turns a [`Message`] into bytes and
//! back.

use crate::ber::{self, DecodeError, DecodeResult, Tag};
use crate::oid::Oid;
use crate::value::Value;

/// SNMPv2c, the only version this crate speaks.
const SNMP_VERSION: i64 = 1;

/// One name/value pair inside a PDU's varbind list.
#[derive(Debug, Clone, PartialEq)]
pub struct Varbind {
    pub oid: Oid,
    pub value: Value,
}

impl Varbind {
    /// A varbind carrying `Null`, as every outgoing Get/GetBulk request uses.
    pub fn query(oid: Oid) -> Self {
        Varbind {
            oid,
            value: Value::Null,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        ber::encode_sequence_with(out, Tag::SEQUENCE, |content| {
            ber::encode_tlv(content, Tag::OBJECT_IDENTIFIER, &self.oid.encode());
            self.value.encode(content);
        });
    }

    fn decode(input: &[u8]) -> DecodeResult<(Varbind, &[u8])> {
        let seq = ber::decode_tlv_expect(input, Tag::SEQUENCE)?;
        let oid_tlv = ber::decode_tlv_expect(seq.content, Tag::OBJECT_IDENTIFIER)?;
        let oid = Oid::decode(oid_tlv.content)?;
        let (value, rest) = Value::decode(oid_tlv.rest)?;
        if !rest.is_empty() {
            return Err(DecodeError::TruncatedInput);
        }
        Ok((Varbind { oid, value }, seq.rest))
    }
}

/// Which PDU a [`Message`] carries. `original_source/fastsnmp/snmp_poller.py`
/// builds both a plain Get (one varbind per OID, never walked) and a
/// GetBulk from the same varbind-list builder, selected by a `msg_type`
/// parameter; this enum is that choice made explicit at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduKind {
    Get,
    GetBulk {
        non_repeaters: i32,
        max_repetitions: i32,
    },
}

/// A decoded GetResponse's error-status, or its absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseStatus {
    pub error_status: i32,
    pub error_index: i32,
}

impl ResponseStatus {
    pub fn is_success(&self) -> bool {
        self.error_status == 0
    }
}

/// A request to encode and send. `PduKind::Get` ignores
/// `non_repeaters`/`max_repetitions` entirely — they only mean something for
/// GetBulk — so the request always carries a `PduKind` rather than raw
/// repeater fields, keeping kind and parameters inseparable.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub request_id: i32,
    pub community: Vec<u8>,
    pub kind: PduKind,
    pub oids: Vec<Oid>,
}

impl Request {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        ber::encode_sequence_with(&mut out, Tag::SEQUENCE, |content| {
            ber::encode_tlv(content, Tag::INTEGER, &ber::encode_integer(SNMP_VERSION));
            ber::encode_octet_string(content, &self.community);
            self.encode_pdu(content);
        });
        out
    }

    fn encode_pdu(&self, content: &mut Vec<u8>) {
        let (tag, non_repeaters, max_repetitions) = match self.kind {
            PduKind::Get => (Tag::PDU_GET_REQUEST, 0, 0),
            PduKind::GetBulk {
                non_repeaters,
                max_repetitions,
            } => (Tag::PDU_GET_BULK_REQUEST, non_repeaters, max_repetitions),
        };
        ber::encode_sequence_with(content, tag, |pdu| {
            ber::encode_tlv(pdu, Tag::INTEGER, &ber::encode_integer(self.request_id as i64));
            ber::encode_tlv(pdu, Tag::INTEGER, &ber::encode_integer(non_repeaters as i64));
            ber::encode_tlv(pdu, Tag::INTEGER, &ber::encode_integer(max_repetitions as i64));
            ber::encode_sequence_with(pdu, Tag::SEQUENCE, |varbinds| {
                for oid in &self.oids {
                    Varbind::query(oid.clone()).encode(varbinds);
                }
            });
        });
    }
}

/// A decoded GetResponse. Produced by [`Response::decode`]; the engine looks
/// up `request_id` in its in-flight table and hands `varbinds` to the row
/// assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub request_id: i32,
    pub status: ResponseStatus,
    pub varbinds: Vec<Varbind>,
}

/// Whatever top-level GetResponse fields were fully decoded before a
/// downstream element failed. Fields fill in left-to-right in wire order, so
/// e.g. `status.is_some()` implies `request_id.is_some()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialResponse {
    pub request_id: Option<i32>,
    pub status: Option<ResponseStatus>,
    pub varbinds: Vec<Varbind>,
}

impl Response {
    /// Decode a full SNMPv2c message and assert it carries a GetResponse PDU.
    /// Like the original poller's `msg_decode`, the community string is read
    /// but not matched against anything here — this crate has no per-host
    /// auth concept (§3.1), so that's left to a caller that cares.
    pub fn decode(input: &[u8]) -> DecodeResult<Response> {
        Self::decode_partial(input).map_err(|(err, _partial)| err)
    }

    /// Like [`Self::decode`], but on failure also returns whatever top-level
    /// fields were fully parsed before the failing element, per §4.1's
    /// partial-parse requirement: "an outer sequence header is valid but an
    /// inner element fails" still surfaces request-id/error-status/
    /// error-index/varbinds-so-far for diagnostics. A partial parse never
    /// completes a walk on its own (§4.1, §7) — [`crate::engine::PollEngine`]
    /// uses it only to log a request-id alongside an otherwise-opaque
    /// discarded datagram.
    pub fn decode_partial(input: &[u8]) -> std::result::Result<Response, (DecodeError, PartialResponse)> {
        let mut partial = PartialResponse::default();
        Self::decode_into(input, &mut partial).map_err(|err| (err, partial))
    }

    fn decode_into(input: &[u8], partial: &mut PartialResponse) -> DecodeResult<Response> {
        let message = ber::decode_tlv_expect(input, Tag::SEQUENCE)?;
        let version_tlv = ber::decode_tlv_expect(message.content, Tag::INTEGER)?;
        let version = ber::decode_integer(version_tlv.content)?;
        if version != SNMP_VERSION {
            return Err(DecodeError::InvalidInteger("unsupported SNMP version"));
        }
        let (_community, after_community) = ber::decode_octet_string(version_tlv.rest)?;
        let pdu = ber::decode_tlv_expect(after_community, Tag::PDU_GET_RESPONSE)?;

        let request_id_tlv = ber::decode_tlv_expect(pdu.content, Tag::INTEGER)?;
        let request_id: i32 = ber::decode_integer(request_id_tlv.content)?
            .try_into()
            .map_err(|_| DecodeError::InvalidInteger("request-id out of i32 range"))?;
        partial.request_id = Some(request_id);

        let error_status_tlv = ber::decode_tlv_expect(request_id_tlv.rest, Tag::INTEGER)?;
        let error_status: i32 = ber::decode_integer(error_status_tlv.content)?
            .try_into()
            .map_err(|_| DecodeError::InvalidInteger("error-status out of i32 range"))?;
        let error_index_tlv = ber::decode_tlv_expect(error_status_tlv.rest, Tag::INTEGER)?;
        let error_index: i32 = ber::decode_integer(error_index_tlv.content)?
            .try_into()
            .map_err(|_| DecodeError::InvalidInteger("error-index out of i32 range"))?;
        let status = ResponseStatus {
            error_status,
            error_index,
        };
        partial.status = Some(status);

        let varbind_list = ber::decode_tlv_expect(error_index_tlv.rest, Tag::SEQUENCE)?;
        let mut rest = varbind_list.content;
        while !rest.is_empty() {
            let (varbind, after) = Varbind::decode(rest)?;
            partial.varbinds.push(varbind);
            rest = after;
        }

        Ok(Response {
            request_id,
            status,
            varbinds: partial.varbinds.clone(),
        })
    }
}

/// Generates request-ids: a random start in `[1, 30_000]` by default, then
/// `wrapping_add(step)` on every call. Wraparound is arithmetic, not
/// special-cased — collisions against a live in-flight entry are the
/// caller's job to detect (`Fault::IdCollision`).
#[derive(Debug, Clone)]
pub struct ReqIdGenerator {
    next: i32,
    step: i32,
}

impl ReqIdGenerator {
    pub fn new(start: i32, step: i32) -> Self {
        ReqIdGenerator { next: start, step }
    }

    pub fn next(&mut self) -> i32 {
        let id = self.next;
        self.next = self.next.wrapping_add(self.step);
        id
    }
}
