use crate::{CodecError, Result};

/// Single-byte `'f'`/`'t'` encoding (spec §4.B "Boolean").
pub fn serialize_bool(b: bool) -> u8 {
    if b { b't' } else { b'f' }
}

pub fn unserialize_bool(byte: u8) -> Result<bool> {
    match byte {
        b't' => Ok(true),
        b'f' => Ok(false),
        other => Err(CodecError::Invalid("boolean", format!("byte {other:#x}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        assert_eq!(unserialize_bool(serialize_bool(true)).unwrap(), true);
        assert_eq!(unserialize_bool(serialize_bool(false)).unwrap(), false);
    }

    #[test]
    fn rejects_garbage() {
        assert!(unserialize_bool(b'x').is_err());
    }
}
