//! OBJECT IDENTIFIER content-octet encoding: the first two sub-identifiers
//! are combined as `40*a + b`; each following sub-identifier is base-128,
//! high bit set on every byte but the last.

use super::{DecodeError, DecodeResult};

pub fn encode_object_id(sub_ids: &[u32]) -> Vec<u8> {
    assert!(sub_ids.len() >= 2, "an OID needs at least two sub-identifiers");
    let mut out = Vec::new();
    out.push((sub_ids[0] * 40 + sub_ids[1]) as u8);
    for &sub_id in &sub_ids[2..] {
        encode_base128(&mut out, sub_id);
    }
    out
}

fn encode_base128(out: &mut Vec<u8>, value: u32) {
    let mut chunks = [0u8; 5];
    let mut n = 0;
    let mut v = value;
    loop {
        chunks[n] = (v & 0x7F) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let high_bit = if i == 0 { 0x00 } else { 0x80 };
        out.push(chunks[i] | high_bit);
    }
}

pub fn decode_object_id(content: &[u8]) -> DecodeResult<Vec<u32>> {
    if content.is_empty() {
        return Err(DecodeError::InvalidOid("empty OID content"));
    }
    let first = content[0] as u32;
    let mut sub_ids = vec![first / 40, first % 40];

    let mut value: u32 = 0;
    let mut in_progress = false;
    for &byte in &content[1..] {
        in_progress = true;
        value = value
            .checked_shl(7)
            .ok_or(DecodeError::InvalidOid("sub-identifier overflows u32"))?
            | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            sub_ids.push(value);
            value = 0;
            in_progress = false;
        }
    }
    if in_progress {
        return Err(DecodeError::InvalidOid(
            "final sub-identifier byte is not terminated (high bit still set)",
        ));
    }
    Ok(sub_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scenario_1_round_trip() {
        // "1.3.268633409"
        let encoded = encode_object_id(&[1, 3, 268_633_409]);
        assert_eq!(encoded, vec![0x2B, 0x81, 0x80, 0x8C, 0x8A, 0x41]);
        assert_eq!(decode_object_id(&encoded).unwrap(), vec![1, 3, 268_633_409]);
    }

    #[test]
    fn unterminated_sub_id_is_rejected() {
        // 0x81 has its high bit set and nothing follows.
        assert!(matches!(
            decode_object_id(&[0x2B, 0x81]),
            Err(DecodeError::InvalidOid(_))
        ));
    }

    #[test]
    fn small_well_known_oid() {
        // sysDescr.0 = 1.3.6.1.2.1.1.1.0
        let sub_ids = [1u32, 3, 6, 1, 2, 1, 1, 1, 0];
        let encoded = encode_object_id(&sub_ids);
        assert_eq!(encoded, vec![0x2B, 6, 1, 2, 1, 1, 1, 0]);
        assert_eq!(decode_object_id(&encoded).unwrap(), sub_ids.to_vec());
    }

    proptest! {
        #[test]
        fn oid_round_trips(
            a in 1u32..3,
            b in 0u32..40,
            rest in proptest::collection::vec(0u32..2u32.pow(31), 0..8)
        ) {
            let mut sub_ids = vec![a, b];
            sub_ids.extend(rest);
            let encoded = encode_object_id(&sub_ids);
            prop_assert_eq!(decode_object_id(&encoded).unwrap(), sub_ids);
        }
    }
}
