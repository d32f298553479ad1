//! TIFF validation utilities
//!
//! This module provides validation functions for TIFF files
//! to ensure data integrity and prevent errors when processing
//! potentially malformed files. Every offset is checked before it is
//! followed, so a corrupt file fails with `MalformedContainer` instead of
//! sending a write somewhere unexpected.

use log::{debug, error};
use std::io::SeekFrom;

use crate::errors::{ScrubError, ScrubResult};
use crate::io::byte_order::ByteOrderHandler;
use crate::io::redactor::ByteRange;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;

/// Validates an IFD offset to ensure it's within the file and past the header
///
/// # Arguments
/// * `offset` - The offset to validate
/// * `header_size` - Size of the file header
/// * `file_size` - The file size for validation
pub fn validate_ifd_offset(offset: u64, header_size: u64, file_size: u64) -> ScrubResult<()> {
    if offset >= file_size || offset < header_size {
        return Err(ScrubError::malformed(format!(
            "Invalid IFD offset: {} (file size: {})",
            offset, file_size
        )));
    }

    Ok(())
}

/// Validates that a range lies entirely inside the file
///
/// # Arguments
/// * `range` - The range to check
/// * `file_size` - The file size for validation
/// * `what` - Description of the range for error messages
pub fn validate_range_in_file(range: ByteRange, file_size: u64, what: &str) -> ScrubResult<()> {
    if !range.fits_within(file_size) {
        return Err(ScrubError::malformed(format!(
            "{} {} lies outside the file (size: {})",
            what, range, file_size
        )));
    }

    Ok(())
}

/// Gets the file size for validation purposes
///
/// The reader position is restored afterwards.
pub fn get_file_size(reader: &mut dyn SeekableReader) -> ScrubResult<u64> {
    let current_position = reader.stream_position()?;
    let file_size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(current_position))?;

    Ok(file_size)
}

/// Validates the BigTIFF header
///
/// In BigTIFF, after the version number (43) comes the offset size
/// (must be 8) and a reserved value (must be 0).
///
/// # Arguments
/// * `reader` - The seekable reader to use
/// * `byte_order_handler` - Handler for the file's byte order
pub fn validate_bigtiff_header(
    reader: &mut dyn SeekableReader,
    byte_order_handler: &dyn ByteOrderHandler
) -> ScrubResult<()> {
    let offset_size = byte_order_handler.read_u16(reader)?;
    let zeros = byte_order_handler.read_u16(reader)?;

    debug!("BigTIFF offset size: {}", offset_size);
    debug!("BigTIFF zeros: {}", zeros);

    if offset_size != header::BIGTIFF_OFFSET_SIZE || zeros != 0 {
        error!("Invalid BigTIFF header: offset_size={}, zeros={}", offset_size, zeros);
        return Err(ScrubError::malformed(format!(
            "Invalid BigTIFF header: offset_size={}, reserved={}",
            offset_size, zeros
        )));
    }

    Ok(())
}
