//! The SNMP value union (§3 of the design): every concrete type a varbind's
//! value can hold, plus BER encode/decode for each. Implemented as a tagged
//! enum rather than a heterogeneous/dynamic collection, per design note 9.

use crate::ber::{self, DecodeError, DecodeResult, Tag};
use crate::oid::Oid;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer32(i32),
    Unsigned32(u32),
    Counter32(u32),
    Counter64(u64),
    Gauge32(u32),
    TimeTicks(u32),
    OctetString(Vec<u8>),
    ObjectIdentifier(Oid),
    IpAddress([u8; 4]),
    Opaque(Opaque),
    Null,
    /// Distinct sentinel markers, not `Null` — see §3.
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

/// The SNMP "opaque" wrapper. Most agents use it for raw vendor-specific
/// bytes, but RFC 3417 also defines an opaque-wrapped float/double
/// extension (content starts with `9F 78` or `9F 79`), which §3 calls out
/// by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Opaque {
    Float(f32),
    Double(f64),
    Raw(Vec<u8>),
}

const OPAQUE_FLOAT_PREFIX: [u8; 2] = [0x9F, 0x78];
const OPAQUE_DOUBLE_PREFIX: [u8; 2] = [0x9F, 0x79];

impl Value {
    /// Is this one of the three walk-terminating sentinels, or `Null`?
    /// The row assembler (§4.3 step 2) treats all four as "column
    /// finished, don't emit" — but they remain distinct variants here since
    /// callers that *do* care about the difference (diagnostics) still can.
    pub fn ends_a_column(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Value::Integer32(v) => {
                ber::encode_tlv(out, Tag::INTEGER, &ber::encode_integer(*v as i64))
            }
            // RFC 2578 defines Unsigned32 as `[APPLICATION 2] IMPLICIT INTEGER`
            // — the identical tag Gauge32 uses. There is no wire-level way to
            // tell them apart; see `decode` below.
            Value::Unsigned32(v) => {
                ber::encode_tlv(out, Tag::GAUGE32, &ber::encode_unsigned(*v as u64))
            }
            Value::Counter32(v) => {
                ber::encode_tlv(out, Tag::COUNTER32, &ber::encode_unsigned(*v as u64))
            }
            Value::Counter64(v) => {
                ber::encode_tlv(out, Tag::COUNTER64, &ber::encode_unsigned(*v))
            }
            Value::Gauge32(v) => {
                ber::encode_tlv(out, Tag::GAUGE32, &ber::encode_unsigned(*v as u64))
            }
            Value::TimeTicks(v) => {
                ber::encode_tlv(out, Tag::TIME_TICKS, &ber::encode_unsigned(*v as u64))
            }
            Value::OctetString(bytes) => ber::encode_octet_string(out, bytes),
            Value::ObjectIdentifier(oid) => ber::encode_tlv(out, Tag::OBJECT_IDENTIFIER, &oid.encode()),
            Value::IpAddress(bytes) => ber::encode_tlv(out, Tag::IP_ADDRESS, bytes),
            Value::Opaque(opaque) => {
                let content = match opaque {
                    Opaque::Float(f) => {
                        let mut v = OPAQUE_FLOAT_PREFIX.to_vec();
                        v.extend_from_slice(&f.to_be_bytes());
                        v
                    }
                    Opaque::Double(d) => {
                        let mut v = OPAQUE_DOUBLE_PREFIX.to_vec();
                        v.extend_from_slice(&d.to_be_bytes());
                        v
                    }
                    Opaque::Raw(bytes) => bytes.clone(),
                };
                ber::encode_tlv(out, Tag::OPAQUE, &content)
            }
            Value::Null => ber::encode_null(out),
            Value::NoSuchObject => ber::encode_tlv(out, Tag::NO_SUCH_OBJECT, &[]),
            Value::NoSuchInstance => ber::encode_tlv(out, Tag::NO_SUCH_INSTANCE, &[]),
            Value::EndOfMibView => ber::encode_tlv(out, Tag::END_OF_MIB_VIEW, &[]),
        }
    }

    pub fn decode(input: &[u8]) -> DecodeResult<(Value, &[u8])> {
        let tlv = ber::decode_tlv(input)?;
        let value = match tlv.tag {
            Tag::INTEGER => Value::Integer32(
                ber::decode_integer(tlv.content)?
                    .try_into()
                    .map_err(|_| DecodeError::InvalidInteger("Integer32 out of i32 range"))?,
            ),
            Tag::COUNTER32 => Value::Counter32(decode_u32(tlv.content)?),
            Tag::COUNTER64 => Value::Counter64(ber::decode_unsigned(tlv.content)?),
            // Gauge32 and Unsigned32 share a wire tag; a decoder has no way
            // to tell which MIB type it came from, so it always decodes to
            // Gauge32. Callers that know the column is Unsigned32 by MIB
            // definition can convert themselves.
            Tag::GAUGE32 => Value::Gauge32(decode_u32(tlv.content)?),
            Tag::TIME_TICKS => Value::TimeTicks(decode_u32(tlv.content)?),
            Tag::OCTET_STRING => Value::OctetString(tlv.content.to_vec()),
            Tag::OBJECT_IDENTIFIER => Value::ObjectIdentifier(Oid::decode(tlv.content)?),
            Tag::IP_ADDRESS => {
                let bytes: [u8; 4] = tlv
                    .content
                    .try_into()
                    .map_err(|_| DecodeError::InvalidInteger("IpAddress is not 4 bytes"))?;
                Value::IpAddress(bytes)
            }
            Tag::OPAQUE => Value::Opaque(decode_opaque(tlv.content)),
            Tag::NULL => Value::Null,
            Tag::NO_SUCH_OBJECT => Value::NoSuchObject,
            Tag::NO_SUCH_INSTANCE => Value::NoSuchInstance,
            Tag::END_OF_MIB_VIEW => Value::EndOfMibView,
            found => {
                return Err(DecodeError::InvalidTag {
                    expected: Tag::NULL,
                    found,
                });
            }
        };
        Ok((value, tlv.rest))
    }
}

fn decode_u32(content: &[u8]) -> DecodeResult<u32> {
    let v = ber::decode_unsigned(content)?;
    v.try_into()
        .map_err(|_| DecodeError::InvalidInteger("value out of u32 range"))
}

fn decode_opaque(content: &[u8]) -> Opaque {
    if let Some(rest) = content.strip_prefix(&OPAQUE_FLOAT_PREFIX) {
        if let Ok(bytes) = <[u8; 4]>::try_from(rest) {
            return Opaque::Float(f32::from_be_bytes(bytes));
        }
    }
    if let Some(rest) = content.strip_prefix(&OPAQUE_DOUBLE_PREFIX) {
        if let Ok(bytes) = <[u8; 8]>::try_from(rest) {
            return Opaque::Double(f64::from_be_bytes(bytes));
        }
    }
    Opaque::Raw(content.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: Value) {
        let mut buf = Vec::new();
        value.encode(&mut buf);
        let (decoded, rest) = Value::decode(&buf).unwrap();
        assert_eq!(decoded, value);
        assert!(rest.is_empty());
    }

    #[test]
    fn every_variant_round_trips() {
        round_trip(Value::Integer32(-42));
        round_trip(Value::Counter32(u32::MAX));
        round_trip(Value::Counter64(u64::MAX));
        round_trip(Value::Gauge32(7));
        round_trip(Value::TimeTicks(123_456));
        round_trip(Value::OctetString(b"eth0".to_vec()));
        round_trip(Value::ObjectIdentifier("1.3.6.1.2.1.1.1.0".parse().unwrap()));
        round_trip(Value::IpAddress([192, 168, 1, 1]));
        round_trip(Value::Opaque(Opaque::Float(1.5)));
        round_trip(Value::Opaque(Opaque::Double(1.5)));
        round_trip(Value::Opaque(Opaque::Raw(vec![1, 2, 3])));
        round_trip(Value::Null);
        round_trip(Value::NoSuchObject);
        round_trip(Value::NoSuchInstance);
        round_trip(Value::EndOfMibView);
    }

    #[test]
    fn unsigned32_decodes_back_as_gauge32_since_they_share_a_wire_tag() {
        let mut buf = Vec::new();
        Value::Unsigned32(42).encode(&mut buf);
        let (decoded, rest) = Value::decode(&buf).unwrap();
        assert_eq!(decoded, Value::Gauge32(42));
        assert!(rest.is_empty());
    }

    #[test]
    fn terminators_and_null_end_a_column_but_are_distinct_variants() {
        assert!(Value::Null.ends_a_column());
        assert!(Value::EndOfMibView.ends_a_column());
        assert!(Value::NoSuchObject.ends_a_column());
        assert!(Value::NoSuchInstance.ends_a_column());
        assert!(!Value::Integer32(0).ends_a_column());
        assert_ne!(Value::Null, Value::EndOfMibView);
    }
}
