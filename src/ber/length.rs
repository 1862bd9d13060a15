//! BER length octets: short form (<128, one byte) and long form
//! (`0x80 | n` followed by `n` big-endian bytes). Indefinite length
//! (the lone byte `0x80`) is rejected — see module docs on [`super::decode_tlv`].

use super::{DecodeError, DecodeResult};

pub fn encode_length(out: &mut Vec<u8>, len: usize) {
    if len < 128 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let first_significant = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    let significant = &bytes[first_significant..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}

pub fn decode_length(input: &[u8]) -> DecodeResult<(usize, &[u8])> {
    let (&first, rest) = input.split_first().ok_or(DecodeError::TruncatedInput)?;
    if first & 0x80 == 0 {
        return Ok((first as usize, rest));
    }
    let num_bytes = (first & 0x7F) as usize;
    if num_bytes == 0 {
        // Indefinite length form — not supported.
        return Err(DecodeError::LengthOverflow);
    }
    if rest.len() < num_bytes {
        return Err(DecodeError::TruncatedInput);
    }
    if num_bytes > std::mem::size_of::<usize>() {
        return Err(DecodeError::LengthOverflow);
    }
    let (len_bytes, rest) = rest.split_at(num_bytes);
    let mut buf = [0u8; std::mem::size_of::<usize>()];
    buf[std::mem::size_of::<usize>() - num_bytes..].copy_from_slice(len_bytes);
    Ok((usize::from_be_bytes(buf), rest))
}
