use crate::{CodecError, Result};
use byteorder::{BigEndian, ByteOrder};

const RANGE_BYTES: usize = 7; // two 56-bit ids packed end to end... see below, one id is 7 bytes.
const CARTESIAN_BYTES: usize = 12; // 3 * 4 bytes fixed-point.

/// A covered span of 56-bit trixel ids (spec §4.B "Geo": "`range` is
/// two 56-bit big-endian ids").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoRange {
    pub start: u64,
    pub end: u64,
}

/// A point on the unit sphere, fixed-point encoded per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cartesian {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Scale used to pack an axis in `[-1.0, 1.0]` into an unsigned 32-bit
/// fixed-point integer: `encoded = round(v * SCALE) + OFFSET`. `OFFSET`
/// recenters the signed range onto the unsigned one so the result
/// never overflows `u32`.
const FIXED_SCALE: f64 = i32::MAX as f64;
const FIXED_OFFSET: u32 = 1 << 31;

fn encode_axis(v: f64) -> u32 {
    let scaled = (v * FIXED_SCALE).round();
    (scaled as i64 + FIXED_OFFSET as i64) as u32
}

fn decode_axis(bits: u32) -> f64 {
    (bits as i64 - FIXED_OFFSET as i64) as f64 / FIXED_SCALE
}

fn serialize_id56(id: u64) -> [u8; 7] {
    let be = id.to_be_bytes();
    let mut out = [0u8; 7];
    out.copy_from_slice(&be[1..8]);
    out
}

fn unserialize_id56(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[1..8].copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

fn serialize_range(r: &GeoRange) -> [u8; 14] {
    let mut out = [0u8; 14];
    out[..7].copy_from_slice(&serialize_id56(r.start));
    out[7..].copy_from_slice(&serialize_id56(r.end));
    out
}

fn serialize_cartesian(c: &Cartesian) -> [u8; CARTESIAN_BYTES] {
    let mut out = [0u8; CARTESIAN_BYTES];
    BigEndian::write_u32(&mut out[0..4], encode_axis(c.x));
    BigEndian::write_u32(&mut out[4..8], encode_axis(c.y));
    BigEndian::write_u32(&mut out[8..12], encode_axis(c.z));
    out
}

fn write_len_prefixed_list<T>(out: &mut Vec<u8>, items: &[T], encode: impl Fn(&T) -> Vec<u8>) {
    out.extend((items.len() as u32).to_be_bytes());
    for item in items {
        out.extend(encode(item));
    }
}

/// `ranges_centroids` (spec §4.B "Geo"): a length-prefixed list of
/// ranges followed by a length-prefixed list of centroids.
pub fn serialize_geo(ranges: &[GeoRange], centroids: &[Cartesian]) -> Vec<u8> {
    let mut out = Vec::new();
    write_len_prefixed_list(&mut out, ranges, |r| serialize_range(r).to_vec());
    write_len_prefixed_list(&mut out, centroids, |c| serialize_cartesian(c).to_vec());
    out
}

/// Value a `_point`/`_polygon`/... cast tag resolves to before being
/// handed to [`serialize_geo`]; the actual geometry-to-cover expansion
/// lives behind `seeker_trixel::CoverGenerator`, out of this crate's
/// scope.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoValue {
    pub ranges: Vec<GeoRange>,
    pub centroids: Vec<Cartesian>,
}

pub fn unserialize_geo(bytes: &[u8]) -> Result<GeoValue> {
    if bytes.len() < 4 {
        return Err(CodecError::TooShort("geo"));
    }
    let mut pos = 0usize;
    let range_count = BigEndian::read_u32(&bytes[pos..pos + 4]) as usize;
    pos += 4;
    let mut ranges = Vec::with_capacity(range_count);
    for _ in 0..range_count {
        let chunk = bytes
            .get(pos..pos + RANGE_BYTES * 2)
            .ok_or(CodecError::TooShort("geo"))?;
        ranges.push(GeoRange {
            start: unserialize_id56(&chunk[..RANGE_BYTES]),
            end: unserialize_id56(&chunk[RANGE_BYTES..]),
        });
        pos += RANGE_BYTES * 2;
    }

    let centroid_count_bytes = bytes.get(pos..pos + 4).ok_or(CodecError::TooShort("geo"))?;
    let centroid_count = BigEndian::read_u32(centroid_count_bytes) as usize;
    pos += 4;
    let mut centroids = Vec::with_capacity(centroid_count);
    for _ in 0..centroid_count {
        let chunk = bytes
            .get(pos..pos + CARTESIAN_BYTES)
            .ok_or(CodecError::TooShort("geo"))?;
        centroids.push(Cartesian {
            x: decode_axis(BigEndian::read_u32(&chunk[0..4])),
            y: decode_axis(BigEndian::read_u32(&chunk[4..8])),
            z: decode_axis(BigEndian::read_u32(&chunk[8..12])),
        });
        pos += CARTESIAN_BYTES;
    }

    Ok(GeoValue { ranges, centroids })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_empty() {
        let encoded = serialize_geo(&[], &[]);
        let decoded = unserialize_geo(&encoded).unwrap();
        assert!(decoded.ranges.is_empty());
        assert!(decoded.centroids.is_empty());
    }

    #[test]
    fn round_trips_ranges_and_centroids() {
        let ranges = vec![GeoRange { start: 10, end: 20 }, GeoRange { start: 1 << 40, end: (1 << 55) - 1 }];
        let centroids = vec![Cartesian { x: 0.5, y: -0.5, z: 1.0 }, Cartesian { x: -1.0, y: 0.0, z: 0.25 }];
        let encoded = serialize_geo(&ranges, &centroids);
        let decoded = unserialize_geo(&encoded).unwrap();
        assert_eq!(decoded.ranges, ranges);
        for (a, b) in decoded.centroids.iter().zip(&centroids) {
            assert!((a.x - b.x).abs() < 1e-6);
            assert!((a.y - b.y).abs() < 1e-6);
            assert!((a.z - b.z).abs() < 1e-6);
        }
    }

    #[test]
    fn id56_round_trips_at_boundary() {
        let max_id = (1u64 << 56) - 1;
        let enc = serialize_id56(max_id);
        assert_eq!(unserialize_id56(&enc), max_id);
    }
}
