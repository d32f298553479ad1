//! TIFF directory reader
//!
//! This module reads the TIFF header and walks the chain of Image File
//! Directories. The walk is exposed as a lazy iterator (`DirectoryChain`)
//! that yields each IFD together with the pointer slots linking it into the
//! chain; `TiffReader::read_chain` materializes it.
//!
//! Every offset is validated against the file size before it is followed,
//! the chain may not revisit an offset, and the number of hops is bounded.

use log::{debug, info, trace};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, SeekFrom};
use std::path::Path;

use crate::errors::{ScrubError, ScrubResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::redactor::{ByteRange, PointerSlot};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{header, limits, tags};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::{TagValue, TiffLayout, TIFF};
use crate::tiff::validation;
use crate::utils::{format_utils, ifd_utils, tag_utils};

/// Reader for TIFF, BigTIFF and NDPI files
pub struct TiffReader {
    /// Byte order declared in the header
    byte_order: ByteOrder,
    /// Byte order handler used for every multi-byte read
    handler: Box<dyn ByteOrderHandler>,
    /// Directory layout; NDPI mode is switched on while walking
    layout: TiffLayout,
    /// Size of the file when the header was read
    file_size: u64,
    /// Offset stored in the header's first-IFD slot
    first_ifd_offset: u64,
}

impl TiffReader {
    /// Reads and validates the TIFF header
    ///
    /// This handles the first part of reading a TIFF file:
    /// 1. Detect byte order (little/big endian)
    /// 2. Check for TIFF or BigTIFF format
    /// 3. Read the first IFD offset
    ///
    /// # Arguments
    /// * `reader` - Any struct implementing the SeekableReader trait
    pub fn open(reader: &mut dyn SeekableReader) -> ScrubResult<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let file_size = validation::get_file_size(reader)?;
        if file_size < header::CLASSIC_HEADER_SIZE {
            return Err(ScrubError::UnrecognizedFormat(format!(
                "{} bytes is too small for a TIFF header", file_size)));
        }

        let byte_order = format_utils::detect_byte_order(reader)?;
        let handler = byte_order.create_handler();
        let layout = format_utils::detect_tiff_format(reader, handler.as_ref())?;

        if file_size < layout.header_size() {
            return Err(ScrubError::malformed(format!(
                "{} bytes is too small for a BigTIFF header", file_size)));
        }

        let header_slot = layout.header_slot();
        reader.seek(SeekFrom::Start(header_slot.position))?;
        let first_ifd_offset = ifd_utils::read_pointer(reader, header_slot, handler.as_ref())?;
        debug!("First IFD offset: {}", first_ifd_offset);

        Ok(TiffReader {
            byte_order,
            handler,
            layout,
            file_size,
            first_ifd_offset,
        })
    }

    /// Loads the full directory chain of the TIFF file at `path`
    pub fn load(path: &Path) -> ScrubResult<(TiffReader, TIFF)> {
        info!("Loading TIFF file: {}", path.display());

        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);

        let mut tiff_reader = TiffReader::open(&mut reader)?;
        let tiff = tiff_reader.read_chain(&mut reader)?;
        Ok((tiff_reader, tiff))
    }

    /// Walks the directory chain lazily
    ///
    /// The returned iterator yields IFDs in chain order and stops after the
    /// first error. It borrows the reader mutably, so it can only be
    /// consumed once.
    pub fn walk<'a>(&'a mut self, reader: &'a mut dyn SeekableReader) -> DirectoryChain<'a> {
        let header_slot = self.layout.header_slot();
        DirectoryChain {
            pending: Some((self.first_ifd_offset, header_slot)),
            tiff: self,
            reader,
            visited: HashSet::new(),
            number: 0,
        }
    }

    /// Reads every IFD in the chain
    pub fn read_chain(&mut self, reader: &mut dyn SeekableReader) -> ScrubResult<TIFF> {
        let ifds = self.walk(reader).collect::<ScrubResult<Vec<IFD>>>()?;

        let mut tiff = TIFF::new(self.byte_order, self.layout);
        tiff.ifds = ifds;

        info!("Read {} IFDs ({})", tiff.ifd_count(),
              if self.layout.is_ndpi { "NDPI" } else if self.layout.is_big_tiff { "BigTIFF" } else { "TIFF" });
        Ok(tiff)
    }

    /// Reads an IFD's entry table
    ///
    /// The next-IFD pointer is not read here; `DirectoryChain` fills it in
    /// once the layout for this directory is settled.
    ///
    /// # Arguments
    /// * `reader` - The seekable reader to use
    /// * `offset` - Offset in the file where the IFD starts
    /// * `number` - The index of this IFD in the chain
    /// * `in_slot` - Pointer slot that referenced this IFD
    pub fn read_ifd(
        &self,
        reader: &mut dyn SeekableReader,
        offset: u64,
        number: usize,
        in_slot: PointerSlot,
    ) -> ScrubResult<IFD> {
        validation::validate_ifd_offset(offset, self.layout.header_size(), self.file_size)?;
        reader.seek(SeekFrom::Start(offset))?;

        let count_range = ByteRange::new(offset, self.layout.entry_count_size());
        validation::validate_range_in_file(count_range, self.file_size, "IFD entry count")?;
        let entry_count = self.read_ifd_entry_count(reader)?;
        debug!("IFD #{} at {}: {} entries", number, offset, entry_count);

        let table_size = ifd_utils::entry_table_size(entry_count, &self.layout)
            .ok_or_else(|| ScrubError::malformed(format!(
                "IFD #{} declares an impossible entry count {}", number, entry_count)))?;
        validation::validate_range_in_file(ByteRange::new(offset, table_size), self.file_size,
                                           &format!("IFD #{} entry table", number))?;

        let mut ifd = IFD::new(number, offset, in_slot);
        let first_entry = offset + self.layout.entry_count_size();
        for i in 0..entry_count {
            let position = first_entry + i * self.layout.entry_size();
            let entry = self.read_ifd_entry(reader, position)?;
            ifd.add_entry(entry);
        }

        Ok(ifd)
    }

    /// Reads the entry count from an IFD
    fn read_ifd_entry_count(&self, reader: &mut dyn SeekableReader) -> ScrubResult<u64> {
        if self.layout.is_big_tiff {
            Ok(self.handler.read_u64(reader)?)
        } else {
            Ok(self.handler.read_u16(reader)? as u64)
        }
    }

    /// Reads a single IFD entry located at `position`
    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader, position: u64) -> ScrubResult<IFDEntry> {
        let tag = self.handler.read_u16(reader)?;
        let field_type = self.handler.read_u16(reader)?;

        let (count, value_offset) = if self.layout.is_big_tiff {
            (self.handler.read_u64(reader)?, self.handler.read_u64(reader)?)
        } else {
            (self.handler.read_u32(reader)? as u64, self.handler.read_u32(reader)? as u64)
        };

        Ok(IFDEntry::new(tag, field_type, count, value_offset, position))
    }

    /// Reads and decodes the value of an IFD entry
    ///
    /// Values that fit in the entry's value field are read in place;
    /// larger values are read from the offset stored there.
    pub fn read_entry_value(&self, reader: &mut dyn SeekableReader, entry: &IFDEntry) -> ScrubResult<TagValue> {
        let unit_size = entry.get_field_type_size()
            .ok_or(ScrubError::UnsupportedFieldType(entry.field_type))?;
        let byte_size = unit_size.checked_mul(entry.count)
            .ok_or_else(|| ScrubError::malformed(format!(
                "tag {} declares an impossible value count {}", entry.tag, entry.count)))?;

        let inline_capacity = self.layout.value_field_size();
        let position = if entry.is_value_inline(inline_capacity) {
            entry.position + 4 + inline_capacity
        } else {
            self.near_pointer(entry.position, entry.value_offset)
        };

        validation::validate_range_in_file(
            ByteRange::new(position, byte_size), self.file_size,
            &format!("value of tag {} ({})", entry.tag, tag_utils::get_tag_name(entry.tag)))?;

        trace!("Reading tag {} value: {} bytes at {}", entry.tag, byte_size, position);
        reader.seek(SeekFrom::Start(position))?;
        tag_utils::read_tag_value(reader, entry, self.handler.as_ref())
    }

    /// Reads the value of `tag` in `ifd`, if the tag is present
    pub fn read_tag(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> ScrubResult<Option<TagValue>> {
        match ifd.get_entry(tag) {
            Some(entry) => self.read_entry_value(reader, entry).map(Some),
            None => Ok(None),
        }
    }

    /// Reads an unsigned integer array tag such as StripOffsets
    pub fn read_unsigned_tag(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> ScrubResult<Option<Vec<u64>>> {
        match self.read_tag(reader, ifd, tag)? {
            Some(TagValue::Unsigned(values)) => Ok(Some(values)),
            Some(_) => Err(ScrubError::malformed(format!(
                "tag {} ({}) in IFD #{} is not an unsigned integer array",
                tag, tag_utils::get_tag_name(tag), ifd.number))),
            None => Ok(None),
        }
    }

    /// Resolves a 32-bit NDPI offset against the structure it was read from
    ///
    /// NDPI files larger than 4 GiB store only the low 32 bits of data
    /// offsets. The real offset is the value with those low bits that lies
    /// within 4 GiB below `base`. Outside NDPI mode the offset is returned
    /// unchanged.
    pub fn near_pointer(&self, base: u64, offset: u64) -> u64 {
        if self.layout.is_ndpi && offset < base {
            let segments = (base - offset) / limits::NDPI_SEGMENT_SIZE;
            offset + segments * limits::NDPI_SEGMENT_SIZE
        } else {
            offset
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Returns the byte order handler for this file
    pub fn handler(&self) -> &dyn ByteOrderHandler {
        self.handler.as_ref()
    }

    pub fn layout(&self) -> TiffLayout {
        self.layout
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn first_ifd_offset(&self) -> u64 {
        self.first_ifd_offset
    }
}

/// Lazy, single-pass iterator over a TIFF directory chain
pub struct DirectoryChain<'a> {
    tiff: &'a mut TiffReader,
    reader: &'a mut dyn SeekableReader,
    /// Next IFD offset and the slot it was read from; None once finished
    pending: Option<(u64, PointerSlot)>,
    visited: HashSet<u64>,
    number: usize,
}

impl<'a> DirectoryChain<'a> {
    fn step(&mut self, offset: u64, in_slot: PointerSlot) -> ScrubResult<IFD> {
        if self.number >= limits::MAX_IFD_HOPS {
            return Err(ScrubError::malformed(format!(
                "directory chain longer than {} entries", limits::MAX_IFD_HOPS)));
        }
        if !self.visited.insert(offset) {
            return Err(ScrubError::malformed(format!(
                "directory chain loops back to offset {}", offset)));
        }

        let mut ifd = self.tiff.read_ifd(self.reader, offset, self.number, in_slot)?;

        if self.number == 0 && !self.tiff.layout.is_big_tiff && ifd.has_tag(tags::NDPI_MAGIC) {
            // Only detectable once the first directory is read; a first IFD
            // beyond 4 GiB cannot be reached.
            info!("Enabling NDPI mode");
            self.tiff.layout.is_ndpi = true;
        }

        let table_size = ifd_utils::entry_table_size(ifd.entry_count() as u64, &self.tiff.layout)
            .ok_or_else(|| ScrubError::malformed("IFD size overflows"))?;
        let next_slot = PointerSlot::new(offset + table_size, self.tiff.layout.next_pointer_width());
        validation::validate_range_in_file(next_slot.range(), self.tiff.file_size,
                                           &format!("IFD #{} next pointer", self.number))?;

        self.reader.seek(SeekFrom::Start(next_slot.position))?;
        let next_offset = ifd_utils::read_pointer(self.reader, next_slot, self.tiff.handler.as_ref())?;
        debug!("IFD #{} next IFD offset: {}", self.number, next_offset);

        ifd.next_slot = next_slot;
        ifd.next_offset = next_offset;
        if ifd.is_last() {
            debug!("IFD #{} ends the chain", self.number);
        }

        self.pending = Some((next_offset, next_slot));
        self.number += 1;
        Ok(ifd)
    }
}

impl<'a> Iterator for DirectoryChain<'a> {
    type Item = ScrubResult<IFD>;

    fn next(&mut self) -> Option<Self::Item> {
        let (offset, in_slot) = self.pending.take()?;
        if offset == 0 {
            return None;
        }

        // pending stays None after an error, which ends the iteration
        Some(self.step(offset, in_slot))
    }
}
