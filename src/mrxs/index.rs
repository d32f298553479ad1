//! MRXS slide layout and index file
//!
//! A slide `X.mrxs` keeps its data in the directory `X/`: `Slidedat.ini`
//! names an index file and a list of numbered data files. Non-hierarchical
//! levels (label, macro, thumbnails) are enumerated from Slidedat.ini; the
//! index file maps each level's global record number to a byte range in
//! one of the data files.
//!
//! Index layout, all values little-endian int32:
//!
//! ```text
//! @41                        table base
//! @table_base + 4 * record   list head
//! @list_head                 0, page
//! @page                      1, (ignored), 0, 0, position, size, file number
//! ```

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{self, BufReader, SeekFrom};
use std::path::{Path, PathBuf};

use crate::errors::{ScrubError, ScrubResult};
use crate::format::MRXS_EXTENSION;
use crate::io::redactor::ByteRange;
use crate::io::seekable::SeekableReader;
use crate::mrxs::slidedat::Slidedat;
use crate::tiff::validation;

pub const SLIDEDAT_FILE: &str = "Slidedat.ini";
pub const HIERARCHICAL: &str = "HIERARCHICAL";
pub const DATAFILE: &str = "DATAFILE";

/// Offset of the non-hierarchical table base in the index file
pub const NONHIER_ROOT_OFFSET: u64 = 41;

/// Layer holding the slide label
pub const LABEL_LAYER: &str = "Scan data layer";
/// Level holding the slide label
pub const LABEL_LEVEL: &str = "ScanDataLayer_SlideBarcode";

/// One level of a non-hierarchical layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonHierLevel {
    pub layer_id: usize,
    pub level_id: usize,
    /// Position among all levels of all layers
    pub record: usize,
    pub layer_name: String,
    pub name: String,
    /// Slidedat.ini section with the level's properties
    pub section: String,
}

/// Where a record's payload lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocation {
    pub data_file: PathBuf,
    pub file_number: usize,
    pub range: ByteRange,
}

/// An opened MRXS slide
#[derive(Debug)]
pub struct MrxsSlide {
    slide_dir: PathBuf,
    index_file: PathBuf,
    data_files: Vec<PathBuf>,
    levels: Vec<NonHierLevel>,
}

impl MrxsSlide {
    /// Reads the slide's Slidedat.ini
    ///
    /// A missing slide directory or Slidedat.ini means the path is not an
    /// MRXS slide; incomplete metadata is a malformed slide.
    pub fn open(path: &Path) -> ScrubResult<Self> {
        if path.extension().map_or(true, |ext| ext != MRXS_EXTENSION) {
            return Err(ScrubError::UnrecognizedFormat(format!(
                "{} does not have the .{} extension", path.display(), MRXS_EXTENSION)));
        }

        let slide_dir = path.with_extension("");
        let slidedat_path = slide_dir.join(SLIDEDAT_FILE);
        let slidedat = match Slidedat::load(&slidedat_path) {
            Ok(dat) => dat,
            Err(ScrubError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ScrubError::UnrecognizedFormat(format!(
                    "{} not found", slidedat_path.display())));
            },
            Err(e) => return Err(e),
        };

        Self::from_slidedat(slide_dir, &slidedat)
    }

    /// Builds the slide description from parsed Slidedat.ini contents
    pub fn from_slidedat(slide_dir: PathBuf, slidedat: &Slidedat) -> ScrubResult<Self> {
        let index_file = slide_dir.join(slidedat.require(HIERARCHICAL, "INDEXFILE")?);

        let file_count = slidedat.require_usize(DATAFILE, "FILE_COUNT")?;
        let data_files = (0..file_count)
            .map(|i| slidedat.require(DATAFILE, &format!("FILE_{}", i)).map(|name| slide_dir.join(name)))
            .collect::<ScrubResult<Vec<_>>>()?;

        let levels = read_levels(slidedat)?;
        debug!("MRXS slide {}: {} data files, {} non-hierarchical levels",
               slide_dir.display(), data_files.len(), levels.len());

        Ok(MrxsSlide {
            slide_dir,
            index_file,
            data_files,
            levels,
        })
    }

    pub fn slide_dir(&self) -> &Path {
        &self.slide_dir
    }

    pub fn index_file(&self) -> &Path {
        &self.index_file
    }

    pub fn data_files(&self) -> &[PathBuf] {
        &self.data_files
    }

    pub fn levels(&self) -> &[NonHierLevel] {
        &self.levels
    }

    pub fn find_level(&self, layer_name: &str, level_name: &str) -> Option<&NonHierLevel> {
        self.levels.iter().find(|l| l.layer_name == layer_name && l.name == level_name)
    }

    /// Resolves a record number to its payload in a data file
    pub fn locate_record(&self, record: usize) -> ScrubResult<RecordLocation> {
        let file = File::open(&self.index_file)?;
        let mut reader = BufReader::new(file);
        let (file_number, range) = read_record_location(&mut reader, record)?;

        let data_file = self.data_files.get(file_number).cloned()
            .ok_or_else(|| ScrubError::malformed(format!(
                "record {} refers to data file {} but the slide has {}",
                record, file_number, self.data_files.len())))?;

        let data_size = fs::metadata(&data_file)?.len();
        validation::validate_range_in_file(range, data_size, &format!("record {} payload", record))?;

        Ok(RecordLocation {
            data_file,
            file_number,
            range,
        })
    }

    /// Locates the slide label
    pub fn resolve_label(&self) -> ScrubResult<RecordLocation> {
        let level = self.find_level(LABEL_LAYER, LABEL_LEVEL)
            .ok_or_else(|| ScrubError::LabelNotFound(format!(
                "no {} level in layer '{}'", LABEL_LEVEL, LABEL_LAYER)))?;

        let location = self.locate_record(level.record)?;
        self.check_not_aliased(level.record, &location)?;
        info!("Label is record {}: {} bytes at {} in {}", level.record,
              location.range.length, location.range.offset, location.data_file.display());
        Ok(location)
    }

    /// Fails when another level's record shares bytes with `location`
    ///
    /// Records the index cannot resolve declare no range and are skipped.
    fn check_not_aliased(&self, record: usize, location: &RecordLocation) -> ScrubResult<()> {
        let file = File::open(&self.index_file)?;
        let mut reader = BufReader::new(file);

        for other in self.levels.iter().filter(|l| l.record != record) {
            let (file_number, range) = match read_record_location(&mut reader, other.record) {
                Ok(found) => found,
                Err(ScrubError::MalformedContainer(msg)) => {
                    debug!("Record {} ({}) not resolvable: {}", other.record, other.name, msg);
                    continue;
                },
                Err(e) => return Err(e),
            };

            if file_number == location.file_number && range.overlaps(&location.range) {
                return Err(ScrubError::malformed(format!(
                    "record {} ({}) at {}+{} overlaps the label at {}+{} in data file {}",
                    other.record, other.name, range.offset, range.length,
                    location.range.offset, location.range.length, file_number)));
            }
        }

        Ok(())
    }
}

/// Enumerates the levels of all non-hierarchical layers in record order
fn read_levels(slidedat: &Slidedat) -> ScrubResult<Vec<NonHierLevel>> {
    let mut levels = Vec::new();
    let layer_count = slidedat.require_usize(HIERARCHICAL, "NONHIER_COUNT")?;

    for layer_id in 0..layer_count {
        let level_count = slidedat.require_usize(HIERARCHICAL, &format!("NONHIER_{}_COUNT", layer_id))?;
        let layer_name = slidedat.require(HIERARCHICAL, &format!("NONHIER_{}_NAME", layer_id))?;

        for level_id in 0..level_count {
            let key = format!("NONHIER_{}_VAL_{}", layer_id, level_id);
            levels.push(NonHierLevel {
                layer_id,
                level_id,
                record: levels.len(),
                layer_name: layer_name.to_string(),
                name: slidedat.require(HIERARCHICAL, &key)?.to_string(),
                section: slidedat.require(HIERARCHICAL, &format!("{}_SECTION", key))?.to_string(),
            });
        }
    }

    Ok(levels)
}

/// Follows the index structures to a record's file number and byte range
pub fn read_record_location(reader: &mut dyn SeekableReader, record: usize) -> ScrubResult<(usize, ByteRange)> {
    reader.seek(SeekFrom::Start(NONHIER_ROOT_OFFSET))?;
    let table_base = read_offset(reader, "non-hierarchical table base")?;

    let slot = (record as u64).checked_mul(4)
        .and_then(|o| o.checked_add(table_base))
        .ok_or_else(|| ScrubError::malformed("record table offset overflows"))?;
    reader.seek(SeekFrom::Start(slot))?;
    let list_head = read_offset(reader, "record list head")?;

    reader.seek(SeekFrom::Start(list_head))?;
    expect_i32(reader, 0, "list head marker")?;
    let page = read_offset(reader, "data page pointer")?;

    reader.seek(SeekFrom::Start(page))?;
    expect_i32(reader, 1, "data page size")?;
    read_i32(reader, "data page link")?;
    expect_i32(reader, 0, "data page reserved field")?;
    expect_i32(reader, 0, "data page reserved field")?;

    let position = read_offset(reader, "record position")?;
    let size = read_offset(reader, "record size")?;
    let file_number = read_offset(reader, "record file number")? as usize;

    debug!("Record {}: file {} position {} size {}", record, file_number, position, size);
    Ok((file_number, ByteRange::new(position, size)))
}

fn read_i32(reader: &mut dyn SeekableReader, what: &str) -> ScrubResult<i32> {
    reader.read_i32::<LittleEndian>().map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ScrubError::malformed(format!("index file ends inside {}", what)),
        _ => ScrubError::IoError(e),
    })
}

/// Reads an int32 that must not be negative
fn read_offset(reader: &mut dyn SeekableReader, what: &str) -> ScrubResult<u64> {
    let value = read_i32(reader, what)?;
    u64::try_from(value).map_err(|_| ScrubError::malformed(format!("negative {} ({})", what, value)))
}

fn expect_i32(reader: &mut dyn SeekableReader, expected: i32, what: &str) -> ScrubResult<()> {
    let value = read_i32(reader, what)?;
    if value != expected {
        return Err(ScrubError::malformed(format!(
            "index file {} is {}, expected {}", what, value, expected)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn index_with_record(record: usize, position: i32, size: i32, fileno: i32) -> Vec<u8> {
        let mut data = vec![0u8; 41];
        let table_base = 64;
        data.write_i32::<LittleEndian>(table_base).unwrap();
        data.resize(table_base as usize, 0);
        let list_head = table_base + 4 * (record as i32 + 1);
        for _ in 0..=record {
            data.write_i32::<LittleEndian>(list_head).unwrap();
        }
        data.write_i32::<LittleEndian>(0).unwrap();
        data.write_i32::<LittleEndian>(list_head + 8).unwrap();
        for value in [1, 0, 0, 0, position, size, fileno] {
            data.write_i32::<LittleEndian>(value).unwrap();
        }
        data
    }

    #[test]
    fn test_read_record_location() {
        let mut cursor = Cursor::new(index_with_record(2, 1000, 250, 1));
        let (file, range) = read_record_location(&mut cursor, 2).unwrap();
        assert_eq!(file, 1);
        assert_eq!(range, ByteRange::new(1000, 250));
    }

    #[test]
    fn test_wrong_page_marker_is_malformed() {
        let mut data = index_with_record(0, 10, 10, 0);
        let len = data.len();
        // page size field sits seven ints before the end
        data[len - 28] = 2;
        let result = read_record_location(&mut Cursor::new(data), 0);
        assert!(matches!(result, Err(ScrubError::MalformedContainer(_))));
    }

    #[test]
    fn test_negative_values_are_malformed() {
        let data = index_with_record(0, -5, 10, 0);
        assert!(matches!(read_record_location(&mut Cursor::new(data), 0),
                         Err(ScrubError::MalformedContainer(_))));
    }

    #[test]
    fn test_truncated_index_is_malformed() {
        let mut data = index_with_record(0, 10, 10, 0);
        data.truncate(data.len() - 2);
        assert!(matches!(read_record_location(&mut Cursor::new(data), 0),
                         Err(ScrubError::MalformedContainer(_))));
    }

    #[test]
    fn test_levels_are_numbered_across_layers() {
        let dat = Slidedat::parse(
            "[HIERARCHICAL]\n\
             INDEXFILE = Index.dat\n\
             NONHIER_COUNT = 2\n\
             NONHIER_0_NAME = Slide zoom level\n\
             NONHIER_0_COUNT = 1\n\
             NONHIER_0_VAL_0 = ZoomLevel_0\n\
             NONHIER_0_VAL_0_SECTION = NONHIER_0_0\n\
             NONHIER_1_NAME = Scan data layer\n\
             NONHIER_1_COUNT = 2\n\
             NONHIER_1_VAL_0 = ScanDataLayer_SlideThumbnail\n\
             NONHIER_1_VAL_0_SECTION = NONHIER_1_0\n\
             NONHIER_1_VAL_1 = ScanDataLayer_SlideBarcode\n\
             NONHIER_1_VAL_1_SECTION = NONHIER_1_1\n\
             [DATAFILE]\n\
             FILE_COUNT = 1\n\
             FILE_0 = Data0000.dat\n").unwrap();
        let slide = MrxsSlide::from_slidedat(PathBuf::from("slide"), &dat).unwrap();

        assert_eq!(slide.levels().len(), 3);
        let label = slide.find_level(LABEL_LAYER, LABEL_LEVEL).unwrap();
        assert_eq!(label.record, 2);
        assert_eq!(label.level_id, 1);
        assert_eq!(label.section, "NONHIER_1_1");
        assert_eq!(slide.index_file(), Path::new("slide/Index.dat"));
        assert_eq!(slide.data_files(), &[PathBuf::from("slide/Data0000.dat")]);
    }
}
