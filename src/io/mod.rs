//! I/O utilities for file handling
//!
//! Byte-order aware reading, seekable stream traits and the in-place
//! redaction primitives.

pub mod seekable;
pub mod byte_order;
pub mod redactor;

pub use redactor::{verify_prefix, write_pointer, zero_range, ByteRange, PointerSlot};
