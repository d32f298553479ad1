//! Core TIFF data structures

use std::fmt;

use crate::io::byte_order::ByteOrder;
use crate::io::redactor::PointerSlot;
use crate::tiff::constants::header;
use crate::tiff::ifd::IFD;

/// Physical layout of the directory structures in a TIFF file
///
/// Classic TIFF uses 2-byte entry counts, 12-byte entries and 4-byte
/// pointers. BigTIFF uses 8-byte counts, 20-byte entries and 8-byte
/// pointers. NDPI keeps the classic entry format but stores 8-byte
/// next-IFD pointers after the first directory, and its 32-bit data
/// offsets are relative to the 4 GiB segment they are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffLayout {
    /// BigTIFF (version 43) file
    pub is_big_tiff: bool,
    /// Hamamatsu NDPI extensions in effect
    pub is_ndpi: bool,
}

impl TiffLayout {
    pub fn classic() -> Self {
        TiffLayout { is_big_tiff: false, is_ndpi: false }
    }

    pub fn big_tiff() -> Self {
        TiffLayout { is_big_tiff: true, is_ndpi: false }
    }

    /// Size of the header in bytes
    pub fn header_size(&self) -> u64 {
        if self.is_big_tiff { header::BIG_TIFF_HEADER_SIZE } else { header::CLASSIC_HEADER_SIZE }
    }

    /// Slot holding the first IFD offset
    ///
    /// NDPI headers are classic headers, so this slot stays 4 bytes wide.
    pub fn header_slot(&self) -> PointerSlot {
        if self.is_big_tiff {
            PointerSlot::new(header::BIG_TIFF_FIRST_IFD_POINTER, 8)
        } else {
            PointerSlot::new(header::CLASSIC_FIRST_IFD_POINTER, 4)
        }
    }

    /// Size of the entry count field at the start of each IFD
    pub fn entry_count_size(&self) -> u64 {
        if self.is_big_tiff { 8 } else { 2 }
    }

    /// Size of a single IFD entry record
    pub fn entry_size(&self) -> u64 {
        if self.is_big_tiff { 20 } else { 12 }
    }

    /// Size of an entry's count field, which is also its value field size
    pub fn value_field_size(&self) -> u64 {
        if self.is_big_tiff { 8 } else { 4 }
    }

    /// Width of the next-IFD pointer trailing each directory
    pub fn next_pointer_width(&self) -> u8 {
        if self.is_big_tiff || self.is_ndpi { 8 } else { 4 }
    }
}

/// Decoded value of a TIFF tag
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// BYTE / UNDEFINED data
    Bytes(Vec<u8>),
    /// ASCII text with the terminating NUL removed
    Ascii(Vec<u8>),
    /// SHORT / LONG / LONG8 / IFD8 values
    Unsigned(Vec<u64>),
    /// SBYTE / SSHORT / SLONG / SLONG8 values
    Signed(Vec<i64>),
    /// FLOAT / DOUBLE / RATIONAL / SRATIONAL values
    Float(Vec<f64>),
}

impl TagValue {
    /// Raw bytes of BYTE, UNDEFINED or ASCII values
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TagValue::Bytes(b) | TagValue::Ascii(b) => Some(b),
            _ => None,
        }
    }

    /// First value as f64, whatever the numeric type
    pub fn first_as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Unsigned(v) => v.first().map(|&x| x as f64),
            TagValue::Signed(v) => v.first().map(|&x| x as f64),
            TagValue::Float(v) => v.first().copied(),
            TagValue::Bytes(v) => v.first().map(|&x| x as f64),
            TagValue::Ascii(_) => None,
        }
    }
}

/// Represents a TIFF file with its Image File Directories (IFDs)
#[derive(Debug)]
pub struct TIFF {
    /// Image File Directories in chain order
    pub ifds: Vec<IFD>,
    /// Directory layout in effect once the whole chain was read
    pub layout: TiffLayout,
    /// Byte order declared in the header
    pub byte_order: ByteOrder,
}

impl TIFF {
    /// Creates a new empty TIFF structure
    pub fn new(byte_order: ByteOrder, layout: TiffLayout) -> Self {
        TIFF {
            ifds: Vec::new(),
            layout,
            byte_order,
        }
    }

    /// Returns the number of IFDs in the TIFF file
    pub fn ifd_count(&self) -> usize {
        self.ifds.len()
    }

    /// Offsets of every IFD, in chain order
    pub fn ifd_offsets(&self) -> Vec<u64> {
        self.ifds.iter().map(|ifd| ifd.offset).collect()
    }
}

impl fmt::Display for TIFF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = if self.layout.is_big_tiff {
            "BigTIFF"
        } else if self.layout.is_ndpi {
            "NDPI"
        } else {
            "TIFF"
        };
        writeln!(f, "TIFF File:")?;
        writeln!(f, "  Format: {}", format)?;
        writeln!(f, "  Byte order: {}", self.byte_order.name())?;
        writeln!(f, "  Number of IFDs: {}", self.ifds.len())?;

        for ifd in &self.ifds {
            write!(f, "{}", ifd)?;
        }

        Ok(())
    }
}
