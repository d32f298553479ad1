//! In-place byte-range redaction
//!
//! Every mutation the crate performs goes through this module: zeroing a
//! byte range, or rewriting a single directory pointer. Neither operation
//! ever changes the length of the underlying file.

use log::{debug, trace};
use std::fmt;
use std::io::{self, SeekFrom};

use crate::errors::{ScrubError, ScrubResult};
use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::{SeekableReader, SeekableWriter};

/// Size of the zero buffer written per call
const ZERO_CHUNK_SIZE: usize = 64 * 1024;

/// A contiguous run of bytes inside one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Absolute file offset of the first byte
    pub offset: u64,
    /// Number of bytes
    pub length: u64,
}

impl ByteRange {
    pub fn new(offset: u64, length: u64) -> Self {
        ByteRange { offset, length }
    }

    /// Exclusive end offset, or None if it overflows u64
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }

    /// Returns true if the range lies entirely inside a file of `file_size` bytes
    pub fn fits_within(&self, file_size: u64) -> bool {
        matches!(self.end(), Some(end) if end <= file_size)
    }

    /// Returns true if the two ranges share at least one byte
    pub fn overlaps(&self, other: &ByteRange) -> bool {
        if self.length == 0 || other.length == 0 {
            return false;
        }
        let self_end = self.offset.saturating_add(self.length);
        let other_end = other.offset.saturating_add(other.length);
        self.offset < other_end && other.offset < self_end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, +{})", self.offset, self.length)
    }
}

/// Location and width of an on-disk pointer field
///
/// The TIFF header's first-IFD field and each IFD's trailing next-IFD field
/// are pointer slots. Classic TIFF slots are 4 bytes wide; BigTIFF slots,
/// and NDPI next-IFD slots, are 8 bytes wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerSlot {
    /// Absolute file offset of the field
    pub position: u64,
    /// Field width in bytes (4 or 8)
    pub width: u8,
}

impl PointerSlot {
    pub fn new(position: u64, width: u8) -> Self {
        PointerSlot { position, width }
    }

    /// Returns true if `value` can be stored in this slot without truncation
    pub fn can_hold(&self, value: u64) -> bool {
        match self.width {
            4 => value <= u32::MAX as u64,
            8 => true,
            _ => false,
        }
    }

    /// The bytes this slot occupies
    pub fn range(&self) -> ByteRange {
        ByteRange::new(self.position, self.width as u64)
    }
}

/// Returns the current length of the stream; leaves the cursor at the end
fn current_size(writer: &mut dyn SeekableWriter) -> io::Result<u64> {
    writer.seek(SeekFrom::End(0))
}

/// Overwrites `range` with zero bytes
///
/// The file size is re-read immediately before writing; a range that no
/// longer fits (the file shrank, or the caller miscomputed) is rejected
/// with an I/O error and nothing is written.
pub fn zero_range(writer: &mut dyn SeekableWriter, range: ByteRange) -> ScrubResult<()> {
    if range.length == 0 {
        trace!("Skipping empty range at {}", range.offset);
        return Ok(());
    }

    let file_size = current_size(writer)?;
    if !range.fits_within(file_size) {
        return Err(ScrubError::IoError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("range {} extends past end of file ({} bytes)", range, file_size),
        )));
    }

    debug!("Zeroing {} bytes at offset {}", range.length, range.offset);
    writer.seek(SeekFrom::Start(range.offset))?;

    let zeros = [0u8; ZERO_CHUNK_SIZE];
    let mut remaining = range.length;
    while remaining > 0 {
        let chunk = remaining.min(ZERO_CHUNK_SIZE as u64) as usize;
        writer.write_all(&zeros[..chunk])?;
        remaining -= chunk as u64;
    }

    Ok(())
}

/// Rewrites one pointer field with `value`, in the file's byte order
pub fn write_pointer(
    writer: &mut dyn SeekableWriter,
    handler: &dyn ByteOrderHandler,
    slot: PointerSlot,
    value: u64,
) -> ScrubResult<()> {
    if !slot.can_hold(value) {
        return Err(ScrubError::malformed(format!(
            "pointer value {} does not fit the {}-byte field at offset {}",
            value, slot.width, slot.position
        )));
    }

    let file_size = current_size(writer)?;
    if !slot.range().fits_within(file_size) {
        return Err(ScrubError::IoError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("pointer field at {} extends past end of file ({} bytes)", slot.position, file_size),
        )));
    }

    debug!("Rewriting {}-byte pointer at offset {} to {}", slot.width, slot.position, value);
    writer.seek(SeekFrom::Start(slot.position))?;
    match slot.width {
        4 => handler.write_u32(writer, value as u32)?,
        _ => handler.write_u64(writer, value)?,
    }

    Ok(())
}

/// Checks that a payload starts with `expected`, or is already zeroed
///
/// Used before zeroing data that is supposed to hold a compressed image, so
/// that a misread pointer never destroys unrelated bytes. A zeroed prefix is
/// accepted so that running the redaction twice is harmless.
pub fn verify_prefix(reader: &mut dyn SeekableReader, range: ByteRange, expected: &[u8]) -> ScrubResult<()> {
    let len = (expected.len() as u64).min(range.length) as usize;
    if len == 0 {
        return Ok(());
    }

    reader.seek(SeekFrom::Start(range.offset))?;
    let mut prefix = vec![0u8; len];
    reader.read_exact(&mut prefix)?;

    if prefix[..] == expected[..len] || prefix.iter().all(|&b| b == 0) {
        trace!("Payload at {} starts with {:02X?}", range.offset, prefix);
        Ok(())
    } else {
        Err(ScrubError::malformed(format!(
            "unexpected data at offset {}: expected {:02X?}, found {:02X?}",
            range.offset, &expected[..len], prefix
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::byte_order::{BigEndianHandler, LittleEndianHandler};
    use std::io::Cursor;

    #[test]
    fn test_zero_range_only_touches_range() {
        let mut cursor = Cursor::new(vec![0xAAu8; 32]);
        zero_range(&mut cursor, ByteRange::new(8, 10)).unwrap();

        let data = cursor.into_inner();
        assert_eq!(data.len(), 32);
        assert!(data[..8].iter().all(|&b| b == 0xAA));
        assert!(data[8..18].iter().all(|&b| b == 0));
        assert!(data[18..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_zero_range_larger_than_chunk() {
        let len = ZERO_CHUNK_SIZE * 2 + 17;
        let mut cursor = Cursor::new(vec![1u8; len + 4]);
        zero_range(&mut cursor, ByteRange::new(2, len as u64)).unwrap();

        let data = cursor.into_inner();
        assert_eq!(data.len(), len + 4);
        assert_eq!(&data[..2], &[1, 1]);
        assert!(data[2..2 + len].iter().all(|&b| b == 0));
        assert_eq!(&data[2 + len..], &[1, 1]);
    }

    #[test]
    fn test_zero_range_past_end_is_rejected_without_writing() {
        let mut cursor = Cursor::new(vec![7u8; 16]);
        let result = zero_range(&mut cursor, ByteRange::new(10, 7));
        assert!(matches!(result, Err(ScrubError::IoError(_))));

        let data = cursor.into_inner();
        assert_eq!(data, vec![7u8; 16]);
    }

    #[test]
    fn test_zero_range_overflowing_offset_is_rejected() {
        let mut cursor = Cursor::new(vec![7u8; 16]);
        assert!(zero_range(&mut cursor, ByteRange::new(u64::MAX, 2)).is_err());
    }

    #[test]
    fn test_write_pointer_respects_byte_order_and_width() {
        let mut cursor = Cursor::new(vec![0xFFu8; 16]);
        write_pointer(&mut cursor, &LittleEndianHandler, PointerSlot::new(4, 4), 0x0102_0304).unwrap();
        write_pointer(&mut cursor, &BigEndianHandler, PointerSlot::new(8, 8), 0x0A0B).unwrap();

        let data = cursor.into_inner();
        assert_eq!(&data[..4], &[0xFF; 4]);
        assert_eq!(&data[4..8], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&data[8..16], &[0, 0, 0, 0, 0, 0, 0x0A, 0x0B]);
    }

    #[test]
    fn test_write_pointer_rejects_values_too_wide_for_slot() {
        let mut cursor = Cursor::new(vec![0u8; 8]);
        let result = write_pointer(&mut cursor, &LittleEndianHandler, PointerSlot::new(0, 4), 1 << 33);
        assert!(matches!(result, Err(ScrubError::MalformedContainer(_))));
        assert_eq!(cursor.into_inner(), vec![0u8; 8]);
    }

    #[test]
    fn test_verify_prefix() {
        let mut cursor = Cursor::new(vec![0x11, 0xFF, 0xD8, 0xFF, 0x00, 0x00, 0x12, 0x34]);
        assert!(verify_prefix(&mut cursor, ByteRange::new(1, 3), &[0xFF, 0xD8]).is_ok());
        assert!(verify_prefix(&mut cursor, ByteRange::new(4, 2), &[0xFF, 0xD8]).is_ok());
        assert!(matches!(
            verify_prefix(&mut cursor, ByteRange::new(6, 2), &[0xFF, 0xD8]),
            Err(ScrubError::MalformedContainer(_))
        ));
        assert!(verify_prefix(&mut cursor, ByteRange::new(6, 0), &[0xFF, 0xD8]).is_ok());
    }

    #[test]
    fn test_byte_range_overlap() {
        let a = ByteRange::new(0, 10);
        assert!(a.overlaps(&ByteRange::new(9, 1)));
        assert!(!a.overlaps(&ByteRange::new(10, 5)));
        assert!(!a.overlaps(&ByteRange::new(3, 0)));
    }
}
