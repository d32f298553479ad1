//! TIFF format constants
//!
//! This module defines constants used throughout the TIFF processing code,
//! making the code more readable and maintainable by replacing magic numbers
//! with descriptive names.

/// TIFF header constants
pub mod header {
    /// Standard TIFF version number (42)
    pub const TIFF_VERSION: u16 = 42;

    /// BigTIFF version number (43)
    pub const BIG_TIFF_VERSION: u16 = 43;

    /// BigTIFF offset size (8 bytes)
    pub const BIGTIFF_OFFSET_SIZE: u16 = 8;

    /// Classic header: byte order, version, first IFD offset
    pub const CLASSIC_HEADER_SIZE: u64 = 8;

    /// BigTIFF header: byte order, version, offset size, reserved, first IFD offset
    pub const BIG_TIFF_HEADER_SIZE: u64 = 16;

    /// Position of the first-IFD pointer in a classic header
    pub const CLASSIC_FIRST_IFD_POINTER: u64 = 4;

    /// Position of the first-IFD pointer in a BigTIFF header
    pub const BIG_TIFF_FIRST_IFD_POINTER: u64 = 8;
}

/// Field types as defined in the TIFF spec
pub mod field_types {
    pub const BYTE: u16 = 1;       // 8-bit unsigned integer
    pub const ASCII: u16 = 2;      // 8-bit byte containing ASCII character
    pub const SHORT: u16 = 3;      // 16-bit unsigned integer
    pub const LONG: u16 = 4;       // 32-bit unsigned integer
    pub const RATIONAL: u16 = 5;   // Two LONGs: numerator and denominator
    pub const SBYTE: u16 = 6;      // 8-bit signed integer
    pub const UNDEFINED: u16 = 7;  // 8-bit byte with unspecified format
    pub const SSHORT: u16 = 8;     // 16-bit signed integer
    pub const SLONG: u16 = 9;      // 32-bit signed integer
    pub const SRATIONAL: u16 = 10; // Two SLONGs: numerator and denominator
    pub const FLOAT: u16 = 11;     // Single precision IEEE floating point
    pub const DOUBLE: u16 = 12;    // Double precision IEEE floating point
    pub const LONG8: u16 = 16;     // BigTIFF 64-bit unsigned integer
    pub const SLONG8: u16 = 17;    // BigTIFF 64-bit signed integer
    pub const IFD8: u16 = 18;      // BigTIFF 64-bit IFD offset
}

/// TIFF tags the redaction pipelines look at
pub mod tags {
    pub const NEW_SUBFILE_TYPE: u16 = 254;         // Subfile data descriptor
    pub const IMAGE_WIDTH: u16 = 256;              // Width of the image in pixels
    pub const IMAGE_LENGTH: u16 = 257;             // Height of the image in pixels
    pub const COMPRESSION: u16 = 259;              // Compression scheme
    pub const IMAGE_DESCRIPTION: u16 = 270;        // Free-form description text
    pub const STRIP_OFFSETS: u16 = 273;            // Offsets to the data strips
    pub const STRIP_BYTE_COUNTS: u16 = 279;        // Bytes counts for strips
    pub const SOFTWARE: u16 = 305;                 // Software used to create the image
    pub const TILE_WIDTH: u16 = 322;               // Width of a tile
    pub const TILE_LENGTH: u16 = 323;              // Length of a tile
    pub const TILE_OFFSETS: u16 = 324;             // Offsets to the data tiles
    pub const TILE_BYTE_COUNTS: u16 = 325;         // Byte counts for tiles
    pub const XMP: u16 = 700;                      // XMP metadata packet

    // Hamamatsu NDPI private tags
    pub const NDPI_MAGIC: u16 = 65420;             // Present on every NDPI directory
    pub const NDPI_SOURCE_LENS: u16 = 65421;       // Objective magnification, -1 for the macro image
}

/// Leading bytes expected at the start of image payloads
pub mod markers {
    /// JPEG start-of-image marker
    pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
}

/// Structural limits applied while walking directory chains
pub mod limits {
    /// Maximum number of IFDs followed before the chain is declared corrupt
    pub const MAX_IFD_HOPS: usize = 4096;

    /// Size of one NDPI address segment; 32-bit offsets are relative to it
    pub const NDPI_SEGMENT_SIZE: u64 = 1 << 32;
}
