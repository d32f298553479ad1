//! Byte order handling for TIFF files
//!
//! This module implements the Strategy pattern for handling different
//! byte orders (little-endian vs big-endian) when reading TIFF data and
//! when rewriting directory pointers in place.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Result;

use crate::errors::{ScrubError, ScrubResult};
use crate::io::seekable::{SeekableReader, SeekableWriter};

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the TIFF header
    pub fn detect(reader: &mut dyn SeekableReader) -> ScrubResult<Self> {
        let byte_order = reader.read_u16::<LittleEndian>()?;
        match byte_order {
            0x4949 => Ok(ByteOrder::LittleEndian), // "II" (Intel)
            0x4D4D => Ok(ByteOrder::BigEndian),    // "MM" (Motorola)
            _ => Err(ScrubError::InvalidByteOrder(byte_order)),
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    /// Creates the appropriate handler for this byte order
    pub fn create_handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndianHandler),
            ByteOrder::BigEndian => Box::new(BigEndianHandler),
        }
    }
}

/// Trait for byte order handling strategies
pub trait ByteOrderHandler: Send + Sync {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16>;

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32>;

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64>;

    fn read_i16(&self, reader: &mut dyn SeekableReader) -> Result<i16>;

    fn read_i32(&self, reader: &mut dyn SeekableReader) -> Result<i32>;

    fn read_i64(&self, reader: &mut dyn SeekableReader) -> Result<i64>;

    fn read_f32(&self, reader: &mut dyn SeekableReader) -> Result<f32>;

    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64>;

    /// Write a u32 value (classic TIFF pointer)
    fn write_u32(&self, writer: &mut dyn SeekableWriter, value: u32) -> Result<()>;

    /// Write a u64 value (BigTIFF and NDPI pointer)
    fn write_u64(&self, writer: &mut dyn SeekableWriter, value: u64) -> Result<()>;
}

/// Little-endian byte order handler
pub struct LittleEndianHandler;

impl ByteOrderHandler for LittleEndianHandler {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        reader.read_u16::<LittleEndian>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        reader.read_u32::<LittleEndian>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        reader.read_u64::<LittleEndian>()
    }

    fn read_i16(&self, reader: &mut dyn SeekableReader) -> Result<i16> {
        reader.read_i16::<LittleEndian>()
    }

    fn read_i32(&self, reader: &mut dyn SeekableReader) -> Result<i32> {
        reader.read_i32::<LittleEndian>()
    }

    fn read_i64(&self, reader: &mut dyn SeekableReader) -> Result<i64> {
        reader.read_i64::<LittleEndian>()
    }

    fn read_f32(&self, reader: &mut dyn SeekableReader) -> Result<f32> {
        reader.read_f32::<LittleEndian>()
    }

    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
        reader.read_f64::<LittleEndian>()
    }

    fn write_u32(&self, writer: &mut dyn SeekableWriter, value: u32) -> Result<()> {
        writer.write_u32::<LittleEndian>(value)
    }

    fn write_u64(&self, writer: &mut dyn SeekableWriter, value: u64) -> Result<()> {
        writer.write_u64::<LittleEndian>(value)
    }
}

/// Big-endian byte order handler
pub struct BigEndianHandler;

impl ByteOrderHandler for BigEndianHandler {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        reader.read_u16::<BigEndian>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        reader.read_u32::<BigEndian>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        reader.read_u64::<BigEndian>()
    }

    fn read_i16(&self, reader: &mut dyn SeekableReader) -> Result<i16> {
        reader.read_i16::<BigEndian>()
    }

    fn read_i32(&self, reader: &mut dyn SeekableReader) -> Result<i32> {
        reader.read_i32::<BigEndian>()
    }

    fn read_i64(&self, reader: &mut dyn SeekableReader) -> Result<i64> {
        reader.read_i64::<BigEndian>()
    }

    fn read_f32(&self, reader: &mut dyn SeekableReader) -> Result<f32> {
        reader.read_f32::<BigEndian>()
    }

    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
        reader.read_f64::<BigEndian>()
    }

    fn write_u32(&self, writer: &mut dyn SeekableWriter, value: u32) -> Result<()> {
        writer.write_u32::<BigEndian>(value)
    }

    fn write_u64(&self, writer: &mut dyn SeekableWriter, value: u64) -> Result<()> {
        writer.write_u64::<BigEndian>(value)
    }
}
