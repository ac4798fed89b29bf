//! Per-type composite-key segment codec.
//!
//! Integers are written big-endian with the sign bit flipped on signed types,
//! making byte order equal numeric order. Variable-length segments come in
//! two forms: the terminal form is the raw bytes, while the non-terminal form
//! escapes `0x00` as `0x00 0x01` and closes with the `0x00 0x00` terminator,
//! keeping prefix columns from bleeding into their successors.

use arrow_schema::DataType;

use super::KeyError;
use crate::value::Value;

macro_rules! put_signed {
    ($v:expr, $unsigned:ty, $out:expr) => {{
        let flipped = (*$v as $unsigned) ^ (1 << (<$unsigned>::BITS - 1));
        $out.extend_from_slice(&flipped.to_be_bytes());
    }};
}

/// Append the segment encoding of `value` to `out`.
///
/// `is_last` selects the terminal form for variable-length types; it has no
/// effect on fixed-width types.
pub fn encode_segment(value: &Value, is_last: bool, out: &mut Vec<u8>) {
    match value {
        Value::Int8(v) => put_signed!(v, u8, out),
        Value::Int16(v) => put_signed!(v, u16, out),
        Value::Int32(v) => put_signed!(v, u32, out),
        Value::Int64(v) => put_signed!(v, u64, out),
        Value::UInt8(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::UInt16(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::UInt32(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::UInt64(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::String(v) => encode_bytes(v.as_bytes(), is_last, out),
        Value::Binary(v) => encode_bytes(v, is_last, out),
    }
}

fn encode_bytes(bytes: &[u8], is_last: bool, out: &mut Vec<u8>) {
    if is_last {
        out.extend_from_slice(bytes);
        return;
    }
    out.reserve(bytes.len() + 2);
    for &byte in bytes {
        if byte == 0x00 {
            out.extend_from_slice(&[0x00, 0x01]);
        } else {
            out.push(byte);
        }
    }
    out.extend_from_slice(&[0x00, 0x00]);
}

macro_rules! take_signed {
    ($input:expr, $unsigned:ty, $signed:ty, $data_type:expr) => {{
        let raw = take_fixed::<{ <$unsigned>::BITS as usize / 8 }>($input, $data_type)?;
        (<$unsigned>::from_be_bytes(raw) ^ (1 << (<$unsigned>::BITS - 1))) as $signed
    }};
}

/// Decode one segment of `data_type` from the front of `input`, advancing it.
pub fn decode_segment(
    data_type: &DataType,
    is_last: bool,
    input: &mut &[u8],
) -> Result<Value, KeyError> {
    let value = match data_type {
        DataType::Int8 => Value::Int8(take_signed!(input, u8, i8, data_type)),
        DataType::Int16 => Value::Int16(take_signed!(input, u16, i16, data_type)),
        DataType::Int32 => Value::Int32(take_signed!(input, u32, i32, data_type)),
        DataType::Int64 => Value::Int64(take_signed!(input, u64, i64, data_type)),
        DataType::UInt8 => Value::UInt8(u8::from_be_bytes(take_fixed::<1>(input, data_type)?)),
        DataType::UInt16 => Value::UInt16(u16::from_be_bytes(take_fixed::<2>(input, data_type)?)),
        DataType::UInt32 => Value::UInt32(u32::from_be_bytes(take_fixed::<4>(input, data_type)?)),
        DataType::UInt64 => Value::UInt64(u64::from_be_bytes(take_fixed::<8>(input, data_type)?)),
        DataType::Utf8 => {
            let bytes = take_bytes(input, is_last)?;
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        DataType::Binary => Value::Binary(take_bytes(input, is_last)?),
        other => {
            return Err(KeyError::Value(crate::value::ValueError::UnsupportedType(
                other.clone(),
            )))
        }
    };
    Ok(value)
}

fn take_fixed<const N: usize>(input: &mut &[u8], data_type: &DataType) -> Result<[u8; N], KeyError> {
    if input.len() < N {
        return Err(KeyError::TruncatedSegment {
            data_type: data_type.clone(),
        });
    }
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&input[..N]);
    *input = &input[N..];
    Ok(bytes)
}

fn take_bytes(input: &mut &[u8], is_last: bool) -> Result<Vec<u8>, KeyError> {
    if is_last {
        let bytes = input.to_vec();
        *input = &[];
        return Ok(bytes);
    }
    let mut bytes = Vec::new();
    let mut rest = *input;
    loop {
        match rest {
            [] | [0x00] => return Err(KeyError::MissingTerminator),
            [0x00, 0x00, tail @ ..] => {
                *input = tail;
                return Ok(bytes);
            }
            [0x00, 0x01, tail @ ..] => {
                bytes.push(0x00);
                rest = tail;
            }
            [0x00, ..] => return Err(KeyError::InvalidEscape),
            [byte, tail @ ..] => {
                bytes.push(*byte);
                rest = tail;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;

    use super::{decode_segment, encode_segment};
    use crate::value::Value;

    fn encoded(value: &Value, is_last: bool) -> Vec<u8> {
        let mut out = Vec::new();
        encode_segment(value, is_last, &mut out);
        out
    }

    #[test]
    fn signed_encoding_preserves_order() {
        let values = [i32::MIN, -1, 0, 1, i32::MAX];
        let encodings: Vec<_> = values
            .iter()
            .map(|v| encoded(&Value::Int32(*v), true))
            .collect();
        for pair in encodings.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn bucket_ordinal_form_is_big_endian() {
        assert_eq!(
            encoded(&Value::UInt32(0x0102_0304), true),
            vec![0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn non_terminal_strings_escape_and_terminate() {
        let segment = encoded(&Value::Binary(vec![b'a', 0x00, b'b']), false);
        assert_eq!(segment, vec![b'a', 0x00, 0x01, b'b', 0x00, 0x00]);

        // A shorter prefix string sorts before its extension.
        let a = encoded(&Value::from("ab"), false);
        let b = encoded(&Value::from("ab\0"), false);
        assert!(a < b);
    }

    #[test]
    fn round_trips() {
        let cases = [
            (Value::Int8(-3), DataType::Int8),
            (Value::Int64(i64::MIN), DataType::Int64),
            (Value::UInt16(9), DataType::UInt16),
            (Value::from("with\0nul"), DataType::Utf8),
            (Value::Binary(vec![0x00, 0xff, 0x00]), DataType::Binary),
        ];
        for (value, data_type) in cases {
            for is_last in [false, true] {
                let bytes = encoded(&value, is_last);
                let mut input = bytes.as_slice();
                let decoded = decode_segment(&data_type, is_last, &mut input).unwrap();
                assert_eq!(decoded, value);
                assert!(input.is_empty());
            }
        }
    }

    #[test]
    fn decode_errors() {
        let mut input: &[u8] = &[0x01];
        assert!(decode_segment(&DataType::Int32, true, &mut input).is_err());

        let mut input: &[u8] = &[b'a', 0x00];
        assert!(decode_segment(&DataType::Utf8, false, &mut input).is_err());

        let mut input: &[u8] = &[b'a', 0x00, 0x07];
        assert!(decode_segment(&DataType::Utf8, false, &mut input).is_err());
    }
}
