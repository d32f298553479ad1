//! TIFF file format parsing module
//!
//! This module provides structures and functions for reading TIFF, BigTIFF
//! and NDPI directory chains, and for removing label directories from them.

pub mod constants;
pub mod ifd;
pub mod types;
pub mod reader;
pub mod locator;
pub mod redact;
pub(crate) mod validation;
#[cfg(test)]
mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use ifd::{IFD, IFDEntry};
pub use locator::LabelRule;
pub use reader::{DirectoryChain, TiffReader};
pub use redact::{find_and_redact, RedactionPlan};
pub use types::{TagValue, TiffLayout, TIFF};
