//! Field encodings shared by every record layout.
//!
//! | Encoding | Layout |
//! |----------|--------|
//! | short string | `u16` byte length + UTF-8 (max 65535 bytes) |
//! | long string | `i32` byte length + UTF-8 (attribute keys and values) |
//! | nullable | `u8` presence flag (0 = absent) + value if present |
//! | identifier | two `u64`: high bits, then low bits |
//! | identifier list | `i32` count + identifiers |
//! | attribute map | `i32` count + (long string key, long string value) pairs |
//!
//! Writers take any `Write` and return codec errors; readers take any `Read`
//! and return `io::Error` with `InvalidData` for content that cannot be a
//! valid field, leaving classification to the caller.

use crate::error::{CodecError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use provlog_core::{AttributeUpdates, Attributes};
use std::io::{self, Read, Write};
use uuid::Uuid;

/// Largest encodable short string, in bytes
pub const MAX_SHORT_STRING_LEN: usize = u16::MAX as usize;

/// Largest encodable long string, in bytes
pub const MAX_LONG_STRING_LEN: usize = i32::MAX as usize;

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

// ============================================================================
// Writing
// ============================================================================

/// Write a presence flag.
pub fn write_bool<W: Write>(out: &mut W, value: bool) -> Result<()> {
    out.write_u8(value as u8)?;
    Ok(())
}

/// Write a count prefix.
pub fn write_count<W: Write>(out: &mut W, count: usize) -> Result<()> {
    let count = i32::try_from(count).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("collection of {} entries cannot be encoded", count),
        )
    })?;
    out.write_i32::<BigEndian>(count)?;
    Ok(())
}

/// Write a short string.
pub fn write_short_string<W: Write>(out: &mut W, field: &'static str, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > MAX_SHORT_STRING_LEN {
        return Err(CodecError::StringTooLong {
            field,
            len: bytes.len(),
            limit: MAX_SHORT_STRING_LEN,
        });
    }
    out.write_u16::<BigEndian>(bytes.len() as u16)?;
    out.write_all(bytes)?;
    Ok(())
}

/// Write a nullable short string; absent values take one byte.
pub fn write_nullable_string<W: Write>(
    out: &mut W,
    field: &'static str,
    value: Option<&str>,
) -> Result<()> {
    match value {
        Some(v) => {
            write_bool(out, true)?;
            write_short_string(out, field, v)
        }
        None => write_bool(out, false),
    }
}

/// Write a long string.
pub fn write_long_string<W: Write>(out: &mut W, field: &'static str, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > MAX_LONG_STRING_LEN {
        return Err(CodecError::StringTooLong {
            field,
            len: bytes.len(),
            limit: MAX_LONG_STRING_LEN,
        });
    }
    out.write_i32::<BigEndian>(bytes.len() as i32)?;
    out.write_all(bytes)?;
    Ok(())
}

/// Write a nullable long string.
pub fn write_nullable_long_string<W: Write>(
    out: &mut W,
    field: &'static str,
    value: Option<&str>,
) -> Result<()> {
    match value {
        Some(v) => {
            write_bool(out, true)?;
            write_long_string(out, field, v)
        }
        None => write_bool(out, false),
    }
}

/// Write an identifier as two longs, high bits first.
pub fn write_uuid<W: Write>(out: &mut W, uuid: &Uuid) -> Result<()> {
    let bits = uuid.as_u128();
    out.write_u64::<BigEndian>((bits >> 64) as u64)?;
    out.write_u64::<BigEndian>(bits as u64)?;
    Ok(())
}

/// Write a counted identifier list.
pub fn write_uuids<'a, W, I>(out: &mut W, uuids: I) -> Result<()>
where
    W: Write,
    I: ExactSizeIterator<Item = &'a Uuid>,
{
    write_count(out, uuids.len())?;
    for uuid in uuids {
        write_uuid(out, uuid)?;
    }
    Ok(())
}

/// Write an attribute snapshot.
pub fn write_attributes<W: Write>(out: &mut W, attributes: &Attributes) -> Result<()> {
    write_count(out, attributes.len())?;
    for (key, value) in attributes {
        write_long_string(out, "attribute key", key)?;
        write_long_string(out, "attribute value", value)?;
    }
    Ok(())
}

/// Write an attribute delta; removed attributes carry an absent value.
pub fn write_attribute_updates<W: Write>(out: &mut W, updates: &AttributeUpdates) -> Result<()> {
    write_count(out, updates.len())?;
    for (key, value) in updates {
        write_long_string(out, "attribute key", key)?;
        write_nullable_long_string(out, "attribute value", value.as_deref())?;
    }
    Ok(())
}

// ============================================================================
// Reading
// ============================================================================

/// Read a presence flag; any non-zero byte is true.
pub fn read_bool<R: Read>(input: &mut R) -> io::Result<bool> {
    Ok(input.read_u8()? != 0)
}

/// Read a count prefix.
pub fn read_count<R: Read>(input: &mut R) -> io::Result<usize> {
    let count = input.read_i32::<BigEndian>()?;
    usize::try_from(count).map_err(|_| invalid_data(format!("negative count {}", count)))
}

fn utf8(bytes: Vec<u8>) -> io::Result<String> {
    String::from_utf8(bytes).map_err(|e| invalid_data(format!("invalid UTF-8 in string: {}", e)))
}

/// Read a short string.
///
/// Accepts standard UTF-8 and the modified UTF-8 found in archived segments,
/// where NUL is `C0 80` and characters above U+FFFF are stored as two
/// three-byte surrogates.
pub fn read_short_string<R: Read>(input: &mut R) -> io::Result<String> {
    let len = input.read_u16::<BigEndian>()? as usize;
    let mut bytes = vec![0u8; len];
    input.read_exact(&mut bytes)?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            decode_modified_utf8(&bytes)
                .ok_or_else(|| invalid_data("invalid UTF-8 in string"))
        }
    }
}

/// Decode modified UTF-8 into UTF-16 units, then pair the surrogates.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let continuation = |i: usize| -> Option<u16> {
        bytes
            .get(i)
            .filter(|b| *b & 0xC0 == 0x80)
            .map(|b| u16::from(b & 0x3F))
    };

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(u16::from(b));
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            units.push(u16::from(b & 0x1F) << 6 | continuation(i + 1)?);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let high = continuation(i + 1)?;
            let low = continuation(i + 2)?;
            units.push(u16::from(b & 0x0F) << 12 | high << 6 | low);
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

/// Read a nullable short string.
pub fn read_nullable_string<R: Read>(input: &mut R) -> io::Result<Option<String>> {
    if read_bool(input)? {
        read_short_string(input).map(Some)
    } else {
        Ok(None)
    }
}

/// Read a long string.
///
/// The buffer grows with the bytes actually read, so a corrupt length
/// prefix fails with `UnexpectedEof` instead of allocating up front.
pub fn read_long_string<R: Read>(input: &mut R) -> io::Result<String> {
    let len = input.read_i32::<BigEndian>()?;
    let len = u64::try_from(len)
        .map_err(|_| invalid_data(format!("negative string length {}", len)))?;

    let mut bytes = Vec::new();
    input.by_ref().take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("string of {} bytes ended after {}", len, bytes.len()),
        ));
    }
    utf8(bytes)
}

/// Read a nullable long string.
pub fn read_nullable_long_string<R: Read>(input: &mut R) -> io::Result<Option<String>> {
    if read_bool(input)? {
        read_long_string(input).map(Some)
    } else {
        Ok(None)
    }
}

/// Read an identifier stored as two longs.
pub fn read_uuid<R: Read>(input: &mut R) -> io::Result<Uuid> {
    let high = input.read_u64::<BigEndian>()?;
    let low = input.read_u64::<BigEndian>()?;
    Ok(Uuid::from_u128(((high as u128) << 64) | low as u128))
}

/// Read a counted identifier list.
pub fn read_uuids<R: Read>(input: &mut R) -> io::Result<Vec<Uuid>> {
    let count = read_count(input)?;
    let mut uuids = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        uuids.push(read_uuid(input)?);
    }
    Ok(uuids)
}

/// Parse the hyphenated text form of an identifier.
pub fn parse_uuid(text: &str) -> io::Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| invalid_data(format!("invalid UUID '{}': {}", text, e)))
}

/// Read a counted list of identifiers stored as short strings.
pub fn read_text_uuids<R: Read>(input: &mut R) -> io::Result<Vec<Uuid>> {
    let count = read_count(input)?;
    let mut uuids = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        uuids.push(parse_uuid(&read_short_string(input)?)?);
    }
    Ok(uuids)
}

/// Read an attribute snapshot.
pub fn read_attributes<R: Read>(input: &mut R) -> io::Result<Attributes> {
    let count = read_count(input)?;
    let mut attributes = Attributes::new();
    for _ in 0..count {
        let key = read_long_string(input)?;
        let value = read_long_string(input)?;
        attributes.insert(key, value);
    }
    Ok(attributes)
}

/// Read an attribute delta.
pub fn read_attribute_updates<R: Read>(input: &mut R) -> io::Result<AttributeUpdates> {
    let count = read_count(input)?;
    let mut updates = AttributeUpdates::new();
    for _ in 0..count {
        let key = read_long_string(input)?;
        let value = read_nullable_long_string(input)?;
        updates.insert(key, value);
    }
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_string_layout() {
        let mut buf = Vec::new();
        write_short_string(&mut buf, "test", "héllo").unwrap();
        assert_eq!(&buf[0..2], &[0, 6]);
        assert_eq!(&buf[2..], "héllo".as_bytes());
        assert_eq!(read_short_string(&mut buf.as_slice()).unwrap(), "héllo");
    }

    #[test]
    fn test_short_string_limit() {
        let max = "a".repeat(MAX_SHORT_STRING_LEN);
        let mut buf = Vec::new();
        write_short_string(&mut buf, "details", &max).unwrap();
        assert_eq!(buf.len(), 2 + MAX_SHORT_STRING_LEN);

        let too_long = "a".repeat(MAX_SHORT_STRING_LEN + 1);
        let mut buf = Vec::new();
        let err = write_short_string(&mut buf, "details", &too_long).unwrap_err();
        assert!(matches!(
            err,
            CodecError::StringTooLong {
                field: "details",
                len: 65536,
                ..
            }
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_nullable_absent_is_one_byte() {
        let mut buf = Vec::new();
        write_nullable_string(&mut buf, "details", None).unwrap();
        assert_eq!(buf, vec![0]);
        assert_eq!(read_nullable_string(&mut buf.as_slice()).unwrap(), None);
    }

    #[test]
    fn test_long_string_beyond_short_limit() {
        let value = "v".repeat(100_000);
        let mut buf = Vec::new();
        write_long_string(&mut buf, "attribute value", &value).unwrap();
        assert_eq!(&buf[0..4], &100_000i32.to_be_bytes());
        assert_eq!(read_long_string(&mut buf.as_slice()).unwrap(), value);
    }

    #[test]
    fn test_long_string_truncated() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1_000_000i32.to_be_bytes());
        buf.extend_from_slice(b"short");
        let err = read_long_string(&mut buf.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_long_string_negative_length() {
        let buf = (-5i32).to_be_bytes();
        let err = read_long_string(&mut buf.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_invalid_utf8() {
        let buf = [0u8, 2, 0xC3, 0x28];
        let err = read_short_string(&mut buf.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_modified_utf8_nul_and_supplementary() {
        // "a\0" then U+1F600 as a surrogate pair (D83D DE00)
        let encoded = [b'a', 0xC0, 0x80, 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        let mut buf = (encoded.len() as u16).to_be_bytes().to_vec();
        buf.extend_from_slice(&encoded);

        assert_eq!(
            read_short_string(&mut buf.as_slice()).unwrap(),
            "a\u{0}\u{1F600}"
        );
    }

    #[test]
    fn test_modified_utf8_lone_surrogate_rejected() {
        let buf = [0u8, 3, 0xED, 0xA0, 0xBD];
        let err = read_short_string(&mut buf.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_uuid_wire_layout() {
        let uuid = Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap();
        let mut buf = Vec::new();
        write_uuid(&mut buf, &uuid).unwrap();

        assert_eq!(buf.len(), 16);
        assert_eq!(&buf[0..8], &0x123e4567_e89b_12d3u64.to_be_bytes());
        assert_eq!(&buf[8..16], &0xa456_4266_1417_4000u64.to_be_bytes());
        assert_eq!(read_uuid(&mut buf.as_slice()).unwrap(), uuid);
    }

    #[test]
    fn test_text_uuids() {
        let uuid = Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap();
        let mut buf = Vec::new();
        write_count(&mut buf, 1).unwrap();
        write_short_string(&mut buf, "uuid", &uuid.to_string()).unwrap();
        assert_eq!(read_text_uuids(&mut buf.as_slice()).unwrap(), vec![uuid]);

        let mut buf = Vec::new();
        write_count(&mut buf, 1).unwrap();
        write_short_string(&mut buf, "uuid", "not-a-uuid").unwrap();
        let err = read_text_uuids(&mut buf.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_negative_count() {
        let buf = (-1i32).to_be_bytes();
        let err = read_uuids(&mut buf.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_attribute_updates_keep_removals() {
        let mut updates = AttributeUpdates::new();
        updates.insert("kept".to_string(), Some("line1\nline2".to_string()));
        updates.insert("removed".to_string(), None);

        let mut buf = Vec::new();
        write_attribute_updates(&mut buf, &updates).unwrap();
        let decoded = read_attribute_updates(&mut buf.as_slice()).unwrap();

        assert_eq!(decoded, updates);
        assert_eq!(decoded.get("removed"), Some(&None));
    }
}
