use crate::{CodecError, Result};
use uuid::Uuid;

/// Alphabet for the compact `~`-prefixed short form (spec §4.B: "an
/// optional encoded short form (base-59-ish) is accepted with a `~`
/// prefix"). 59 symbols: the 62 alphanumerics minus `0`, `O` and `l`,
/// which are easy to confuse when read aloud or copied by hand.
const BASE59_ALPHABET: &[u8] = b"123456789ABCDEFGHIJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn base59_value(c: u8) -> Option<u128> {
    BASE59_ALPHABET.iter().position(|&b| b == c).map(|p| p as u128)
}

fn encode_base59(mut v: u128) -> String {
    if v == 0 {
        return (BASE59_ALPHABET[0] as char).to_string();
    }
    let mut digits = Vec::new();
    while v > 0 {
        let rem = (v % 59) as usize;
        digits.push(BASE59_ALPHABET[rem]);
        v /= 59;
    }
    digits.reverse();
    String::from_utf8(digits).expect("alphabet is ASCII")
}

fn decode_base59(s: &str) -> Result<u128> {
    let mut v: u128 = 0;
    for c in s.bytes() {
        let digit = base59_value(c).ok_or_else(|| CodecError::Invalid("uuid", format!("bad base-59 digit {c:#x}")))?;
        v = v
            .checked_mul(59)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| CodecError::Invalid("uuid", "base-59 value overflows u128".to_string()))?;
    }
    Ok(v)
}

/// Strips an optional `{...}` wrapper or `urn:uuid:` prefix from a
/// single UUID token.
fn strip_wrapper(token: &str) -> &str {
    let token = token.strip_prefix('{').and_then(|t| t.strip_suffix('}')).unwrap_or(token);
    token.strip_prefix("urn:uuid:").unwrap_or(token)
}

/// Parses the human-readable form: one or more canonical 36-char
/// UUIDs separated by `;`, each optionally wrapped, or a single
/// `~`-prefixed compact form.
pub fn parse_uuids(s: &str) -> Result<Vec<Uuid>> {
    if let Some(rest) = s.strip_prefix('~') {
        let value = decode_base59(rest)?;
        return Ok(vec![Uuid::from_u128(value)]);
    }
    s.split(';')
        .map(|token| {
            Uuid::parse_str(strip_wrapper(token.trim()))
                .map_err(|e| CodecError::Invalid("uuid", e.to_string()))
        })
        .collect()
}

/// Serialized form: concatenation of each UUID's 16-byte binary
/// representation (spec §4.B).
pub fn serialize_uuids(uuids: &[Uuid]) -> Vec<u8> {
    let mut out = Vec::with_capacity(uuids.len() * 16);
    for u in uuids {
        out.extend_from_slice(u.as_bytes());
    }
    out
}

pub fn unserialize_uuids(bytes: &[u8]) -> Result<Vec<Uuid>> {
    if bytes.len() % 16 != 0 {
        return Err(CodecError::Invalid("uuid", format!("length {} is not a multiple of 16", bytes.len())));
    }
    bytes
        .chunks_exact(16)
        .map(|chunk| Ok(Uuid::from_slice(chunk).expect("chunk is exactly 16 bytes")))
        .collect()
}

/// Compact short form for a single UUID (the inverse of the `~`
/// branch of [`parse_uuids`]).
pub fn short_form(u: &Uuid) -> String {
    format!("~{}", encode_base59(u.as_u128()))
}
