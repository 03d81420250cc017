/// Encodes `f` as 8 sign-flipped big-endian bytes so that byte-wise
/// (memcmp) comparison of the output matches numeric comparison of the
/// input (spec §4.B "Float / Double").
///
/// For non-negative floats the sign bit is set; for negative floats
/// every bit is flipped. Both transforms are self-inverse.
pub fn serialize_f64(f: f64) -> [u8; 8] {
    let bits = f.to_bits();
    let flipped = if bits & (1 << 63) != 0 { !bits } else { bits | (1 << 63) };
    flipped.to_be_bytes()
}

pub fn unserialize_f64(bytes: &[u8; 8]) -> f64 {
    let flipped = u64::from_be_bytes(*bytes);
    let bits = if flipped & (1 << 63) != 0 { flipped & !(1 << 63) } else { !flipped };
    f64::from_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_common_values() {
        for v in [0.0, -0.0, 1.0, -1.0, 42.5, -42.5, f64::MIN, f64::MAX] {
            assert_eq!(unserialize_f64(&serialize_f64(v)), v);
        }
    }

    proptest! {
        #[test]
        fn round_trip(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            prop_assert_eq!(unserialize_f64(&serialize_f64(v)), v);
        }

        #[test]
        fn sortable(a in any::<f64>().prop_filter("finite", |v| v.is_finite()),
                    b in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            let enc_a = serialize_f64(a);
            let enc_b = serialize_f64(b);
            prop_assert_eq!(a < b, enc_a < enc_b);
        }
    }
}
