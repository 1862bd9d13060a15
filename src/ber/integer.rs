//! INTEGER content-octet encoding: minimal two's-complement for signed
//! values (request-id, error-status, error-index, Integer32), minimal
//! big-endian magnitude with a sign-guard byte for unsigned values
//! (Counter32/64, Gauge32, TimeTicks, Unsigned32).
//!
//! These functions operate on the *content octets* of an INTEGER TLV, not
//! the TLV itself — callers wrap the result with [`super::encode_tlv`].

use super::{DecodeError, DecodeResult};

/// Minimal two's-complement encoding of `value`. Strips redundant leading
/// 0x00/0xFF bytes: a leading 0x00 is redundant only if the following byte's
/// high bit is 0 (i.e. it wouldn't flip the sign if dropped), likewise 0xFF
/// is redundant only if the following byte's high bit is 1.
pub fn encode_integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let b = bytes[start];
        let next_high_bit = bytes[start + 1] & 0x80 != 0;
        let redundant = (b == 0x00 && !next_high_bit) || (b == 0xFF && next_high_bit);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

pub fn decode_integer(content: &[u8]) -> DecodeResult<i64> {
    if content.is_empty() {
        return Err(DecodeError::InvalidInteger("empty INTEGER content"));
    }
    if content.len() > 8 {
        return Err(DecodeError::InvalidInteger(
            "INTEGER content wider than 64 bits",
        ));
    }
    let negative = content[0] & 0x80 != 0;
    let mut buf = [if negative { 0xFF } else { 0x00 }; 8];
    buf[8 - content.len()..].copy_from_slice(content);
    Ok(i64::from_be_bytes(buf))
}

/// Minimal big-endian unsigned magnitude. Prepends 0x00 when the natural
/// high byte would have its sign bit set, so the value is never
/// misinterpreted as negative by a two's-complement reader (required for
/// Counter64's full 64-bit range).
pub fn encode_unsigned(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first_significant = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    let mut out = bytes[first_significant..].to_vec();
    if out[0] & 0x80 != 0 {
        out.insert(0, 0x00);
    }
    out
}

pub fn decode_unsigned(content: &[u8]) -> DecodeResult<u64> {
    if content.is_empty() {
        return Err(DecodeError::InvalidInteger("empty INTEGER content"));
    }
    if content.len() > 9 || (content.len() == 9 && content[0] != 0) {
        return Err(DecodeError::InvalidInteger(
            "unsigned INTEGER content wider than 64 bits",
        ));
    }
    let mut buf = [0u8; 8];
    // Drop a leading sign-guard 0x00 byte if content is exactly 9 bytes.
    let significant = if content.len() == 9 {
        &content[1..]
    } else {
        content
    };
    buf[8 - significant.len()..].copy_from_slice(significant);
    Ok(u64::from_be_bytes(buf))
}
