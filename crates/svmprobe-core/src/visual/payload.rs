//! Readers for runtime payloads: managed strings, managed array bodies and
//! NUL-terminated C strings.

use crate::error::{InspectError, InspectResult};
use crate::target::Target;
use crate::types::descriptor::{ARRAY_DATA_FIELD, ARRAY_LENGTH_FIELD, STRING_VALUE_FIELD};
use crate::types::{Address, InlineArray, ObjectHandle, Value};

/// Rendered in place of a managed string that cannot be decoded.
pub const INVALID_STRING: &str = "<Invalid String>";

/// Longest managed string (in UTF-16 code units) the decoder accepts.
///
/// Larger lengths come from torn or stale objects.
pub const MAX_STRING_LENGTH: u64 = 1 << 20;

/// Element count of the managed array behind `array`.
///
/// ## Errors
///
/// `TypeMismatch` when the length field is missing or negative, or
/// `MemoryFault` when it cannot be read.
pub fn array_length(target: &dyn Target, array: &ObjectHandle) -> InspectResult<u64>
{
    let length = target
        .read_field(array, ARRAY_LENGTH_FIELD)?
        .as_scalar()
        .and_then(|scalar| scalar.as_i64())
        .ok_or_else(|| InspectError::mismatch(format!("{ARRAY_LENGTH_FIELD} of {} is not an integer", array.type_name)))?;
    u64::try_from(length).map_err(|_| InspectError::mismatch(format!("negative array length {length}")))
}

/// Element storage of the managed array behind `array`, sized to its
/// runtime length.
///
/// ## Errors
///
/// Propagates failures of [`array_length`]; `TypeMismatch` when the payload
/// field is not an inline array.
pub fn array_elements(target: &dyn Target, array: &ObjectHandle) -> InspectResult<InlineArray>
{
    let length = array_length(target, array)?;
    match target.read_field(array, ARRAY_DATA_FIELD)? {
        Value::Array(payload) => Ok(InlineArray { length, ..payload }),
        other => Err(InspectError::mismatch(format!("{ARRAY_DATA_FIELD} is not an inline array: {other:?}"))),
    }
}

/// Decode the managed `java.lang.String` behind `string`.
///
/// ## Errors
///
/// Any failed read, a null or oversized backing array, or invalid UTF-16.
pub fn decode_java_string(target: &dyn Target, string: &ObjectHandle) -> InspectResult<String>
{
    let chars = match target.read_field(string, STRING_VALUE_FIELD)? {
        Value::Reference(handle) if !handle.is_null() => handle,
        _ => return Err(InspectError::mismatch("string has no backing array")),
    };
    let elements = array_elements(target, &chars)?;
    if elements.length > MAX_STRING_LENGTH {
        return Err(InspectError::mismatch(format!("string length {} out of range", elements.length)));
    }

    let byte_len = usize::try_from(elements.length.saturating_mul(2))
        .map_err(|_| InspectError::mismatch("string does not fit in memory"))?;
    let mut bytes = vec![0u8; byte_len];
    target.read_memory(elements.address, &mut bytes)?;
    decode_utf16le(&bytes)
}

/// Strict UTF-16LE decoding. Unpaired surrogates are an error.
///
/// ## Errors
///
/// `TypeMismatch` for an odd byte count or an invalid code unit sequence.
pub fn decode_utf16le(bytes: &[u8]) -> InspectResult<String>
{
    if bytes.len() % 2 != 0 {
        return Err(InspectError::mismatch("odd UTF-16 byte count"));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|err| InspectError::mismatch(err.to_string()))
}

/// Read at most `limit` bytes of the C string at `address`.
///
/// Stops at NUL. Non-ASCII bytes become `?`. When the budget is used up
/// before a terminator shows up, `...` is appended.
///
/// ## Errors
///
/// `MemoryFault` from the first unreadable byte.
pub fn read_c_string(target: &dyn Target, address: Address, limit: usize) -> InspectResult<String>
{
    let mut text = String::new();
    for index in 0..limit {
        let byte = target.read_u8(address + index as u64)?;
        if byte == 0 {
            break;
        }
        text.push(if byte.is_ascii() { char::from(byte) } else { '?' });
        if index + 1 == limit {
            text.push_str("...");
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_decode_utf16le_ascii_and_beyond()
    {
        let text = "Grüße, 世界 🌍";
        let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        assert_eq!(decode_utf16le(&bytes).unwrap(), text);
    }

    #[test]
    fn test_decode_utf16le_rejects_lone_surrogate()
    {
        let bytes = 0xd800u16.to_le_bytes();
        assert!(decode_utf16le(&bytes).is_err());
        assert!(decode_utf16le(&[0x41]).is_err());
    }
}
