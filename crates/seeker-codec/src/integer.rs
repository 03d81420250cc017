use crate::{CodecError, Result};

/// Minimal big-endian byte length needed to hold `v` (at least 1, even
/// for `v == 0`).
fn minimal_len(v: u64) -> u8 {
    let bits_used = 64 - v.leading_zeros();
    (bits_used as u8).div_ceil(8).max(1)
}

fn minimal_be_bytes(v: u64, len: u8) -> Vec<u8> {
    v.to_be_bytes()[8 - len as usize..].to_vec()
}

/// Variable-length sortable encoding for unsigned magnitudes (spec
/// §4.B "Integer / Positive"): a one-byte length-and-sign prefix
/// followed by the minimal big-endian magnitude. Shorter encodings
/// always sort before longer ones because the prefix grows with
/// length; within equal length, big-endian bytes sort numerically.
pub fn serialize_positive(v: u64) -> Vec<u8> {
    let len = minimal_len(v);
    let mut out = Vec::with_capacity(1 + len as usize);
    out.push(0x80 + len);
    out.extend(minimal_be_bytes(v, len));
    out
}

pub fn unserialize_positive(bytes: &[u8]) -> Result<(u64, usize)> {
    let &prefix = bytes.first().ok_or(CodecError::TooShort("positive"))?;
    if prefix < 0x81 || prefix > 0x88 {
        return Err(CodecError::Invalid("positive", format!("bad prefix {prefix:#x}")));
    }
    let len = (prefix - 0x80) as usize;
    let body = bytes.get(1..1 + len).ok_or(CodecError::TooShort("positive"))?;
    let mut buf = [0u8; 8];
    buf[8 - len..].copy_from_slice(body);
    Ok((u64::from_be_bytes(buf), 1 + len))
}

/// Variable-length sortable encoding with an inverted high bit for
/// negatives (spec §4.B). Negative magnitudes use a prefix byte in a
/// disjoint, lower range than positive ones (so every negative sorts
/// before every non-negative), and their magnitude bytes are bitwise
/// complemented so that a bigger magnitude (a more negative number)
/// sorts first.
pub fn serialize_integer(v: i64) -> Vec<u8> {
    if v >= 0 {
        serialize_positive(v as u64)
    } else {
        // v in [i64::MIN, -1]; magnitude 0 for v == -1, increasing as v decreases.
        let magnitude = (-(v as i128) - 1) as u64;
        let len = minimal_len(magnitude);
        let mut out = Vec::with_capacity(1 + len as usize);
        out.push(0x7F - len);
        for b in minimal_be_bytes(magnitude, len) {
            out.push(!b);
        }
        out
    }
}

pub fn unserialize_integer(bytes: &[u8]) -> Result<(i64, usize)> {
    let &prefix = bytes.first().ok_or(CodecError::TooShort("integer"))?;
    if prefix >= 0x81 {
        let (v, n) = unserialize_positive(bytes)?;
        return Ok((v as i64, n));
    }
    if !(0x77..=0x7E).contains(&prefix) {
        return Err(CodecError::Invalid("integer", format!("bad prefix {prefix:#x}")));
    }
    let len = (0x7F - prefix) as usize;
    let body = bytes.get(1..1 + len).ok_or(CodecError::TooShort("integer"))?;
    let mut buf = [0u8; 8];
    for (i, &b) in body.iter().enumerate() {
        buf[8 - len + i] = !b;
    }
    let magnitude = u64::from_be_bytes(buf);
    let v = -(magnitude as i128) - 1;
    Ok((v as i64, 1 + len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_sentinel_values() {
        for v in [0i64, 1, -1, 100, -100, i64::MAX, i64::MIN, -128, 127] {
            let enc = serialize_integer(v);
            let (decoded, consumed) = unserialize_integer(&enc).unwrap();
            assert_eq!(decoded, v);
            assert_eq!(consumed, enc.len());
        }
    }

    #[test]
    fn positive_round_trips() {
        for v in [0u64, 1, 255, 65536, u64::MAX] {
            let enc = serialize_positive(v);
            let (decoded, _) = unserialize_positive(&enc).unwrap();
            assert_eq!(decoded, v);
        }
    }

    #[test]
    fn negative_sorts_before_positive() {
        assert!(serialize_integer(-1) < serialize_integer(0));
        assert!(serialize_integer(-100) < serialize_integer(-1));
        assert!(serialize_integer(-1) < serialize_integer(1));
    }

    proptest! {
        #[test]
        fn round_trip(v in any::<i64>()) {
            let enc = serialize_integer(v);
            let (decoded, consumed) = unserialize_integer(&enc).unwrap();
            prop_assert_eq!(decoded, v);
            prop_assert_eq!(consumed, enc.len());
        }

        #[test]
        fn sortable(a in any::<i64>(), b in any::<i64>()) {
            let enc_a = serialize_integer(a);
            let enc_b = serialize_integer(b);
            prop_assert_eq!(a < b, enc_a < enc_b);
        }
    }
}
