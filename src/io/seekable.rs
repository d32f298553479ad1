//! Seekable reader and writer traits
//!
//! These traits combine `Read`/`Write` with `Seek` so the parsers and the
//! redactor can work on files and in-memory cursors alike.

use std::io::{Read, Seek, Write};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send + Sync {}

// Blanket implementation for any type that implements the required traits
impl<T: Read + Seek + Send + Sync> SeekableReader for T {}

/// Trait for writers that can both write and seek
///
/// Redaction never appends, so every writer handed to the redactor
/// must be positioned explicitly before each write.
pub trait SeekableWriter: Write + Seek + Send + Sync {}

impl<T: Write + Seek + Send + Sync> SeekableWriter for T {}
