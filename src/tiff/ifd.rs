//! Image File Directory (IFD) structures and methods
//!
//! This module implements the core TIFF IFD (Image File Directory) structures.
//! Besides the tag entries, every IFD remembers where it sits in the
//! directory chain: the pointer slot that references it and the slot that
//! holds its own next-IFD pointer. Those two slots are all that is needed to
//! splice a directory out of the chain.

use std::collections::HashMap;
use std::fmt;
use log::{debug, trace};

use crate::io::redactor::PointerSlot;
use crate::tiff::constants::field_types;
use crate::utils::tag_utils;

/// Represents an Image File Directory (IFD) in a TIFF file
#[derive(Debug, Clone)]
pub struct IFD {
    /// Entries in this IFD, in file order
    pub entries: Vec<IFDEntry>,
    /// IFD number (0-based position in the chain)
    pub number: usize,
    /// Offset to this IFD in the file
    pub offset: u64,
    /// Pointer field that references this IFD (header or predecessor)
    pub in_slot: PointerSlot,
    /// Pointer field at the end of this IFD holding the next IFD offset
    pub next_slot: PointerSlot,
    /// Value stored in `next_slot` (0 terminates the chain)
    pub next_offset: u64,
    /// Cached entries for quick lookup
    tag_map: HashMap<u16, IFDEntry>,
}

/// Represents an entry in an Image File Directory (IFD)
///
/// For small values, value_offset contains the actual value bytes.
/// For larger values, it contains an offset to where the values are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Value or offset to values
    pub value_offset: u64,
    /// File offset of this 12-byte (or 20-byte BigTIFF) entry record
    pub position: u64,
}

impl IFDEntry {
    /// Creates a new IFD entry
    pub fn new(tag: u16, field_type: u16, count: u64, value_offset: u64, position: u64) -> Self {
        trace!("IFD entry: tag={} ({}), type={} ({}), count={}, offset/value={}",
               tag, tag_utils::get_tag_name(tag),
               field_type, tag_utils::get_field_type_name(field_type),
               count, value_offset);

        Self {
            tag,
            field_type,
            count,
            value_offset,
            position,
        }
    }

    /// Get the size in bytes of one value of this entry's field type
    ///
    /// Returns None for field types this crate does not decode.
    pub fn get_field_type_size(&self) -> Option<u64> {
        match self.field_type {
            field_types::BYTE | field_types::ASCII | field_types::SBYTE | field_types::UNDEFINED => Some(1),
            field_types::SHORT | field_types::SSHORT => Some(2),
            field_types::LONG | field_types::SLONG | field_types::FLOAT => Some(4),
            field_types::RATIONAL | field_types::SRATIONAL | field_types::DOUBLE => Some(8),
            field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => Some(8),
            _ => {
                debug!("Unknown field type: {}", self.field_type);
                None
            }
        }
    }

    /// Total size of the entry's values in bytes, if the type is known and
    /// the product does not overflow
    pub fn value_byte_size(&self) -> Option<u64> {
        self.get_field_type_size()?.checked_mul(self.count)
    }

    /// Determines if the value is stored inline in value_offset
    /// rather than at the offset location
    ///
    /// # Arguments
    /// * `inline_capacity` - Size of the value field (4 classic, 8 BigTIFF)
    pub fn is_value_inline(&self, inline_capacity: u64) -> bool {
        match self.value_byte_size() {
            Some(size) => size <= inline_capacity,
            None => false,
        }
    }

    /// Returns a human-readable description of this entry
    pub fn description(&self) -> String {
        format!("Tag: {} ({}), Type: {} ({}), Count: {}, Value/Offset: {}",
                self.tag, tag_utils::get_tag_name(self.tag),
                self.field_type, tag_utils::get_field_type_name(self.field_type),
                self.count, self.value_offset)
    }
}

impl IFD {
    /// Creates a new, empty IFD
    ///
    /// The next-pointer slot is filled in once the entry table has been read.
    pub fn new(number: usize, offset: u64, in_slot: PointerSlot) -> Self {
        debug!("Creating IFD #{} at offset {}", number, offset);

        Self {
            entries: Vec::new(),
            number,
            offset,
            in_slot,
            next_slot: PointerSlot::new(0, 0),
            next_offset: 0,
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry to this IFD
    ///
    /// If a tag occurs twice, lookups return the first occurrence.
    pub fn add_entry(&mut self, entry: IFDEntry) {
        trace!("Adding entry to IFD #{}: {}", self.number, entry.description());

        self.tag_map.entry(entry.tag).or_insert_with(|| entry.clone());
        self.entries.push(entry);
    }

    /// Checks if this IFD has a specific tag
    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    /// Gets an IFD entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag)
    }

    /// Gets the number of entries in this IFD
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if this IFD is the last one in the chain
    pub fn is_last(&self) -> bool {
        self.next_offset == 0
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IFD #{} (offset: {})", self.number, self.offset)?;
        writeln!(f, "  Number of entries: {}", self.entries.len())?;
        writeln!(f, "  Referenced from: {} ({} bytes)", self.in_slot.position, self.in_slot.width)?;
        writeln!(f, "  Next IFD: {}", self.next_offset)?;

        writeln!(f, "  Tags:")?;
        for entry in &self.entries {
            writeln!(f, "    {} ({}): {} [{}]",
                     entry.tag, tag_utils::get_tag_name(entry.tag), entry.value_offset,
                     tag_utils::get_field_type_name(entry.field_type))?;
        }

        Ok(())
    }
}
