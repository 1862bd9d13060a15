//! BER/ASN.1 primitives (X.690), specialised to what SNMPv2c needs: TLV tag
//! and length, minimal two's-complement integers, minimal unsigned
//! magnitudes, octet strings, object identifiers and NULL.
//!
//! Nothing here knows about SNMP PDUs — that's [`crate::message`]. This
//! module only knows how to read and write tagged, length-prefixed values.

mod integer;
mod length;
mod oid;
mod tag;

pub use integer::{decode_integer, decode_unsigned, encode_integer, encode_unsigned};
pub use length::{decode_length, encode_length};
pub use oid::{decode_object_id, encode_object_id};
pub use tag::{Class, Tag};

use thiserror::Error;

/// Errors produced while decoding a BER TLV stream. Distinct from
/// [`crate::error::Error`] so that a partial decode can carry one of these
/// alongside whatever top-level fields were successfully parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("input ended before a complete TLV could be read")]
    TruncatedInput,
    #[error("length prefix overflows usize or exceeds the remaining input")]
    LengthOverflow,
    #[error("expected tag {expected:?}, found {found:?}")]
    InvalidTag { expected: Tag, found: Tag },
    #[error("invalid INTEGER encoding: {0}")]
    InvalidInteger(&'static str),
    #[error("invalid OBJECT IDENTIFIER encoding: {0}")]
    InvalidOid(&'static str),
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// One decoded TLV: the tag byte, the declared content length, and a slice
/// over that content. `rest` is everything after this TLV.
pub struct Tlv<'a> {
    pub tag: Tag,
    pub content: &'a [u8],
    pub rest: &'a [u8],
}

/// Read one tag + length + content triple from `input`. Only definite-form
/// lengths are accepted; indefinite length (0x80 alone) is rejected as
/// `LengthOverflow` since neither the request encoder nor the response
/// decoder supports end-of-contents octets.
pub fn decode_tlv(input: &[u8]) -> DecodeResult<Tlv<'_>> {
    let (tag, after_tag) = tag::decode_tag(input)?;
    let (len, after_len) = length::decode_length(after_tag)?;
    if after_len.len() < len {
        return Err(DecodeError::TruncatedInput);
    }
    let (content, rest) = after_len.split_at(len);
    Ok(Tlv { tag, content, rest })
}

/// Read one TLV and assert its tag equals `expected`.
pub fn decode_tlv_expect(input: &[u8], expected: Tag) -> DecodeResult<Tlv<'_>> {
    let tlv = decode_tlv(input)?;
    if tlv.tag != expected {
        return Err(DecodeError::InvalidTag {
            expected,
            found: tlv.tag,
        });
    }
    Ok(tlv)
}

/// Append a tag, BER length, and content to `out` — the universal
/// constructor every higher-level encoder (INTEGER, OCTET STRING, OID,
/// SEQUENCE, ...) funnels through.
pub fn encode_tlv(out: &mut Vec<u8>, tag: Tag, content: &[u8]) {
    out.push(tag.to_byte());
    encode_length(out, content.len());
    out.extend_from_slice(content);
}

/// Encode a SEQUENCE whose content is produced by `f` writing into a fresh
/// buffer, then wrapped with the sequence tag and length. Used for the
/// outer message, the PDU body, and each varbind.
pub fn encode_sequence_with<F>(out: &mut Vec<u8>, tag: Tag, f: F)
where
    F: FnOnce(&mut Vec<u8>),
{
    let mut content = Vec::new();
    f(&mut content);
    encode_tlv(out, tag, &content);
}

pub fn encode_null(out: &mut Vec<u8>) {
    encode_tlv(out, Tag::NULL, &[]);
}

pub fn encode_octet_string(out: &mut Vec<u8>, bytes: &[u8]) {
    encode_tlv(out, Tag::OCTET_STRING, bytes);
}

pub fn decode_octet_string<'a>(input: &'a [u8]) -> DecodeResult<(&'a [u8], &'a [u8])> {
    let tlv = decode_tlv_expect(input, Tag::OCTET_STRING)?;
    Ok((tlv.content, tlv.rest))
}
