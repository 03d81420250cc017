use crate::{CodecError, Result};

/// Encodes `values` as a length-prefixed concatenation: each element
/// is preceded by its byte length as a variable-length unsigned
/// integer, continuation-bit encoded low-to-high 7 bits at a time
/// (spec §4.F step 5 "StringList"; same shape as the original's
/// `serialise_length`/`unserialise_length`).
pub fn serialize_string_list(values: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in values {
        write_length(&mut out, value.len() as u64);
        out.extend_from_slice(value);
    }
    out
}

/// Inverse of [`serialize_string_list`].
pub fn unserialize_string_list(bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut values = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (len, used) = read_length(&bytes[pos..]).ok_or(CodecError::TooShort("string_list"))?;
        pos += used;
        let len = len as usize;
        if pos + len > bytes.len() {
            return Err(CodecError::TooShort("string_list"));
        }
        values.push(bytes[pos..pos + len].to_vec());
        pos += len;
    }
    Ok(values)
}

fn write_length(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn read_length(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        value |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        shift += 7;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_multiple_values() {
        let values = vec![b"hello".to_vec(), b"world!".to_vec(), Vec::new()];
        let encoded = serialize_string_list(&values);
        assert_eq!(unserialize_string_list(&encoded).unwrap(), values);
    }

    #[test]
    fn empty_list_round_trips() {
        assert_eq!(unserialize_string_list(&serialize_string_list(&[])).unwrap(), Vec::<Vec<u8>>::new());
    }

    #[test]
    fn truncated_input_is_too_short() {
        let encoded = serialize_string_list(&[b"hello".to_vec()]);
        assert!(unserialize_string_list(&encoded[..encoded.len() - 1]).is_err());
    }
}
