//! TIFF format utilities
//!
//! Utilities for working with TIFF format specifics like
//! byte order detection and format detection.

use log::debug;

use crate::errors::{ScrubError, ScrubResult};
use crate::io::byte_order::ByteOrder;
use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;
use crate::tiff::types::TiffLayout;
use crate::tiff::validation;

/// Detects and returns the byte order for a TIFF file
pub fn detect_byte_order(reader: &mut dyn SeekableReader) -> ScrubResult<ByteOrder> {
    let byte_order = ByteOrder::detect(reader)?;
    debug!("Detected byte order: {}", byte_order.name());

    Ok(byte_order)
}

/// Detects whether a file is TIFF or BigTIFF based on its version number
///
/// The reader must be positioned right after the byte order marker.
///
/// # Arguments
/// * `reader` - The seekable reader to use
/// * `byte_order_handler` - Handler for the file's byte order
///
/// # Returns
/// The directory layout for the file (NDPI mode is decided later)
pub fn detect_tiff_format(
    reader: &mut dyn SeekableReader,
    byte_order_handler: &dyn ByteOrderHandler
) -> ScrubResult<TiffLayout> {
    let version = byte_order_handler.read_u16(reader)?;
    debug!("TIFF version: {}", version);

    match version {
        header::BIG_TIFF_VERSION => {
            debug!("Detected BigTIFF format");
            validation::validate_bigtiff_header(reader, byte_order_handler)?;
            Ok(TiffLayout::big_tiff())
        },
        header::TIFF_VERSION => {
            debug!("Detected standard TIFF format");
            Ok(TiffLayout::classic())
        },
        _ => Err(ScrubError::UnsupportedVersion(version)),
    }
}
