//! TIFF tag utilities
//!
//! Utilities for working with TIFF tags and their values.

use byteorder::ReadBytesExt;

use crate::errors::{ScrubError, ScrubResult};
use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{field_types, tags};
use crate::tiff::ifd::IFDEntry;
use crate::tiff::types::TagValue;

/// Decodes the values of `entry` from the reader's current position
///
/// The caller is responsible for seeking to the inline value field or to
/// the out-of-line value offset, and for checking that `count` values fit
/// inside the file.
///
/// # Arguments
/// * `reader` - The seekable reader, positioned at the first value
/// * `entry` - The IFD entry with tag information
/// * `handler` - The byte order handler
pub fn read_tag_value(
    reader: &mut dyn SeekableReader,
    entry: &IFDEntry,
    handler: &dyn ByteOrderHandler,
) -> ScrubResult<TagValue> {
    let count = entry.count as usize;

    let value = match entry.field_type {
        field_types::BYTE | field_types::UNDEFINED => {
            let mut buffer = vec![0u8; count];
            reader.read_exact(&mut buffer)?;
            TagValue::Bytes(buffer)
        },
        field_types::ASCII => {
            let mut buffer = vec![0u8; count];
            reader.read_exact(&mut buffer)?;
            if buffer.pop() != Some(0) {
                return Err(ScrubError::malformed(format!(
                    "ASCII value of tag {} ({}) is not NUL-terminated",
                    entry.tag, get_tag_name(entry.tag))));
            }
            TagValue::Ascii(buffer)
        },
        field_types::SHORT => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(handler.read_u16(reader)? as u64);
            }
            TagValue::Unsigned(values)
        },
        field_types::LONG => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(handler.read_u32(reader)? as u64);
            }
            TagValue::Unsigned(values)
        },
        field_types::LONG8 | field_types::IFD8 => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(handler.read_u64(reader)?);
            }
            TagValue::Unsigned(values)
        },
        field_types::SBYTE => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(reader.read_i8()? as i64);
            }
            TagValue::Signed(values)
        },
        field_types::SSHORT => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(handler.read_i16(reader)? as i64);
            }
            TagValue::Signed(values)
        },
        field_types::SLONG => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(handler.read_i32(reader)? as i64);
            }
            TagValue::Signed(values)
        },
        field_types::SLONG8 => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(handler.read_i64(reader)?);
            }
            TagValue::Signed(values)
        },
        field_types::FLOAT => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(handler.read_f32(reader)? as f64);
            }
            TagValue::Float(values)
        },
        field_types::DOUBLE => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(handler.read_f64(reader)?);
            }
            TagValue::Float(values)
        },
        field_types::RATIONAL => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                let numerator = handler.read_u32(reader)?;
                let denominator = handler.read_u32(reader)?;
                values.push(numerator as f64 / denominator as f64);
            }
            TagValue::Float(values)
        },
        field_types::SRATIONAL => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                let numerator = handler.read_i32(reader)?;
                let denominator = handler.read_i32(reader)?;
                values.push(numerator as f64 / denominator as f64);
            }
            TagValue::Float(values)
        },
        _ => return Err(ScrubError::UnsupportedFieldType(entry.field_type)),
    };

    Ok(value)
}

/// Get the name of a TIFF tag
///
/// Returns a human-readable name for a tag based on its numeric ID.
/// If the tag is not recognized, returns "Unknown".
pub fn get_tag_name(tag: u16) -> &'static str {
    match tag {
        tags::NEW_SUBFILE_TYPE => "NewSubfileType",
        tags::IMAGE_WIDTH => "ImageWidth",
        tags::IMAGE_LENGTH => "ImageLength",
        tags::COMPRESSION => "Compression",
        tags::IMAGE_DESCRIPTION => "ImageDescription",
        tags::STRIP_OFFSETS => "StripOffsets",
        tags::STRIP_BYTE_COUNTS => "StripByteCounts",
        tags::SOFTWARE => "Software",
        tags::TILE_WIDTH => "TileWidth",
        tags::TILE_LENGTH => "TileLength",
        tags::TILE_OFFSETS => "TileOffsets",
        tags::TILE_BYTE_COUNTS => "TileByteCounts",
        tags::XMP => "XMP",
        tags::NDPI_MAGIC => "NDPI_FORMAT_FLAG",
        tags::NDPI_SOURCE_LENS => "NDPI_SOURCELENS",
        _ => "Unknown",
    }
}

/// Get the name of a TIFF field type
pub fn get_field_type_name(field_type: u16) -> &'static str {
    match field_type {
        field_types::BYTE => "BYTE",
        field_types::ASCII => "ASCII",
        field_types::SHORT => "SHORT",
        field_types::LONG => "LONG",
        field_types::RATIONAL => "RATIONAL",
        field_types::SBYTE => "SBYTE",
        field_types::UNDEFINED => "UNDEFINED",
        field_types::SSHORT => "SSHORT",
        field_types::SLONG => "SLONG",
        field_types::SRATIONAL => "SRATIONAL",
        field_types::FLOAT => "FLOAT",
        field_types::DOUBLE => "DOUBLE",
        field_types::LONG8 => "LONG8",
        field_types::SLONG8 => "SLONG8",
        field_types::IFD8 => "IFD8",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::byte_order::{BigEndianHandler, LittleEndianHandler};
    use std::io::Cursor;

    #[test]
    fn test_ascii_value_strips_terminator() {
        let entry = IFDEntry::new(tags::IMAGE_DESCRIPTION, field_types::ASCII, 4, 0, 0);
        let mut cursor = Cursor::new(b"abc\0".to_vec());
        let value = read_tag_value(&mut cursor, &entry, &LittleEndianHandler).unwrap();
        assert_eq!(value, TagValue::Ascii(b"abc".to_vec()));
    }

    #[test]
    fn test_unterminated_ascii_is_malformed() {
        let entry = IFDEntry::new(tags::IMAGE_DESCRIPTION, field_types::ASCII, 3, 0, 0);
        let mut cursor = Cursor::new(b"abc".to_vec());
        let result = read_tag_value(&mut cursor, &entry, &LittleEndianHandler);
        assert!(matches!(result, Err(ScrubError::MalformedContainer(_))));
    }

    #[test]
    fn test_float_value_big_endian() {
        let entry = IFDEntry::new(tags::NDPI_SOURCE_LENS, field_types::FLOAT, 1, 0, 0);
        let mut cursor = Cursor::new((-1.0f32).to_be_bytes().to_vec());
        let value = read_tag_value(&mut cursor, &entry, &BigEndianHandler).unwrap();
        assert_eq!(value.first_as_f64(), Some(-1.0));
    }

    #[test]
    fn test_short_array() {
        let entry = IFDEntry::new(tags::STRIP_BYTE_COUNTS, field_types::SHORT, 3, 0, 0);
        let mut cursor = Cursor::new(vec![1, 0, 2, 0, 0xFF, 0xFF]);
        let value = read_tag_value(&mut cursor, &entry, &LittleEndianHandler).unwrap();
        assert_eq!(value, TagValue::Unsigned(vec![1, 2, 65535]));
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        let entry = IFDEntry::new(999, 99, 1, 0, 0);
        let mut cursor = Cursor::new(vec![0u8; 8]);
        let result = read_tag_value(&mut cursor, &entry, &LittleEndianHandler);
        assert!(matches!(result, Err(ScrubError::UnsupportedFieldType(99))));
    }
}
