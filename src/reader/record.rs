//! Changeset value decoding.
//!
//! **IMPORTANT**: SQLite changesets use a DIFFERENT encoding than database
//! records! Changeset value type codes:
//!
//! - 0: Undefined (special marker for unchanged columns in UPDATE)
//! - 1: INTEGER (always 8 bytes, big-endian i64)
//! - 2: FLOAT (8 bytes, big-endian IEEE 754)
//! - 3: TEXT (varint length + UTF-8 bytes)
//! - 4: BLOB (varint length + raw bytes)
//! - 5: NULL (no data follows)

use alloc::string::String;

use super::varint::decode_varint;
use crate::value::Value;

/// Decode a single value from changeset binary format.
///
/// Returns the value and number of bytes consumed, or `None` if the input is
/// truncated or carries an unknown type code.
#[must_use]
pub(crate) fn decode_value(data: &[u8]) -> Option<(Value, usize)> {
    if data.is_empty() {
        return None;
    }

    let type_code = data[0];
    let data = &data[1..];

    match type_code {
        0 => Some((Value::Undefined, 1)),
        1 => {
            // INTEGER: 8 bytes big-endian
            let bytes: [u8; 8] = data.get(..8)?.try_into().ok()?;
            Some((Value::Integer(i64::from_be_bytes(bytes)), 9))
        }
        2 => {
            // FLOAT: 8 bytes big-endian IEEE 754
            let bytes: [u8; 8] = data.get(..8)?.try_into().ok()?;
            let v = f64::from_be_bytes(bytes);
            // SQLite stores NaN as NULL and normalizes -0.0 to 0.0; mirror
            // that so a decoded value round-trips through the formatter
            if v.is_nan() {
                Some((Value::Null, 9))
            } else {
                let normalized = if v == 0.0 { 0.0 } else { v };
                Some((Value::Real(normalized), 9))
            }
        }
        3 => {
            // TEXT: varint length + UTF-8 bytes
            let (len, len_bytes) = decode_varint(data)?;
            let len = usize::try_from(len).ok()?;
            let data = data.get(len_bytes..)?;
            if data.len() < len {
                return None;
            }
            let text = String::from_utf8(data[..len].to_vec()).ok()?;
            Some((Value::Text(text), 1 + len_bytes + len))
        }
        4 => {
            // BLOB: varint length + raw bytes
            let (len, len_bytes) = decode_varint(data)?;
            let len = usize::try_from(len).ok()?;
            let data = data.get(len_bytes..)?;
            if data.len() < len {
                return None;
            }
            Some((Value::Blob(data[..len].to_vec()), 1 + len_bytes + len))
        }
        5 => Some((Value::Null, 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn test_decode_undefined() {
        assert_eq!(decode_value(&[0x00]), Some((Value::Undefined, 1)));
    }

    #[test]
    fn test_decode_null() {
        assert_eq!(decode_value(&[0x05]), Some((Value::Null, 1)));
    }

    #[test]
    fn test_decode_integer() {
        let mut data = vec![0x01];
        data.extend((-42i64).to_be_bytes());
        assert_eq!(decode_value(&data), Some((Value::Integer(-42), 9)));
    }

    #[test]
    fn test_decode_real() {
        let mut data = vec![0x02];
        data.extend(6.5f64.to_be_bytes());
        assert_eq!(decode_value(&data), Some((Value::Real(6.5), 9)));
    }

    #[test]
    fn test_decode_real_nan_becomes_null() {
        let mut data = vec![0x02];
        data.extend(f64::NAN.to_be_bytes());
        assert_eq!(decode_value(&data), Some((Value::Null, 9)));
    }

    #[test]
    fn test_decode_real_negative_zero_normalized() {
        let mut data = vec![0x02];
        data.extend((-0.0f64).to_be_bytes());
        let (value, _) = decode_value(&data).unwrap();
        assert_eq!(value, Value::Real(0.0));
    }

    #[test]
    fn test_decode_text() {
        let data = [0x03, 0x05, b'a', b'l', b'i', b'c', b'e'];
        assert_eq!(decode_value(&data), Some((Value::from("alice"), 7)));
    }

    #[test]
    fn test_decode_blob() {
        let data = [0x04, 0x03, 0xde, 0xad, 0xbe];
        assert_eq!(
            decode_value(&data),
            Some((Value::Blob(vec![0xde, 0xad, 0xbe]), 5))
        );
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(decode_value(&[]), None);
        assert_eq!(decode_value(&[0x01, 0x00, 0x00]), None);
        assert_eq!(decode_value(&[0x03, 0x05, b'a']), None);
        assert_eq!(decode_value(&[0x04]), None);
    }

    #[test]
    fn test_decode_unknown_type_code() {
        assert_eq!(decode_value(&[0x06, 0x01]), None);
        assert_eq!(decode_value(&[0xff]), None);
    }

    #[test]
    fn test_decode_invalid_utf8_text() {
        let data = [0x03, 0x02, 0xff, 0xfe];
        assert_eq!(decode_value(&data), None);
    }

    #[test]
    fn test_decode_sequence() {
        // Integer 1 then text "a", as they appear inside a record
        let mut data: Vec<u8> = vec![0x01];
        data.extend(1i64.to_be_bytes());
        data.extend([0x03, 0x01, b'a']);

        let (first, len) = decode_value(&data).unwrap();
        assert_eq!(first, Value::Integer(1));
        let (second, _) = decode_value(&data[len..]).unwrap();
        assert_eq!(second, Value::from("a"));
    }
}
