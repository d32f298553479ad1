//! IFD utilities
//!
//! Utilities for working with Image File Directories (IFDs) in TIFF files.

use crate::errors::ScrubResult;
use crate::io::byte_order::ByteOrderHandler;
use crate::io::redactor::PointerSlot;
use crate::io::seekable::SeekableReader;
use crate::tiff::types::TiffLayout;

/// Reads a pointer of the slot's width from the reader's current position
///
/// # Arguments
/// * `reader` - The seekable reader, positioned at the slot
/// * `slot` - The pointer slot being read
/// * `byte_order_handler` - Handler for the file's byte order
pub fn read_pointer(
    reader: &mut dyn SeekableReader,
    slot: PointerSlot,
    byte_order_handler: &dyn ByteOrderHandler
) -> ScrubResult<u64> {
    let value = if slot.width == 8 {
        byte_order_handler.read_u64(reader)?
    } else {
        byte_order_handler.read_u32(reader)? as u64
    };

    Ok(value)
}

/// Size of an IFD's entry table, from the count field up to (not including)
/// the next-IFD pointer
///
/// Returns None if the size overflows u64.
pub fn entry_table_size(entry_count: u64, layout: &TiffLayout) -> Option<u64> {
    entry_count
        .checked_mul(layout.entry_size())?
        .checked_add(layout.entry_count_size())
}
