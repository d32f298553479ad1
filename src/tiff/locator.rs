//! Label directory identification
//!
//! Each vendor marks its label image differently. The rules here are
//! evaluated against one IFD at a time; `find_unique` applies a rule to the
//! whole chain and refuses to pick between several matches.

use log::{debug, trace};

use crate::errors::{ScrubError, ScrubResult};
use crate::format::SlideFormat;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::tags;
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;
use crate::utils::string_utils;

/// Rule that recognizes one kind of associated image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRule {
    /// Aperio SVS: second ImageDescription line starts with `label `
    AperioLabel,
    /// Aperio SVS: second ImageDescription line starts with `macro `
    AperioMacro,
    /// Hamamatsu NDPI: source lens tag holds -1
    HamamatsuLabel,
    /// Ventana: first ImageDescription line starts with `Label_Image`
    VentanaLabel,
}

impl LabelRule {
    /// Rule locating the label image of a TIFF-based format
    pub fn label_rule_for(format: SlideFormat) -> Option<LabelRule> {
        match format {
            SlideFormat::Aperio => Some(LabelRule::AperioLabel),
            SlideFormat::Hamamatsu => Some(LabelRule::HamamatsuLabel),
            SlideFormat::Ventana => Some(LabelRule::VentanaLabel),
            SlideFormat::Mirax => None,
        }
    }

    /// Rule locating the macro (slide overview) image, where the format has one
    pub fn macro_rule_for(format: SlideFormat) -> Option<LabelRule> {
        match format {
            SlideFormat::Aperio => Some(LabelRule::AperioMacro),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LabelRule::AperioLabel => "label",
            LabelRule::AperioMacro => "macro",
            LabelRule::HamamatsuLabel => "label",
            LabelRule::VentanaLabel => "label",
        }
    }

    /// Evaluates the rule against one IFD
    pub fn matches(&self, tiff: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> ScrubResult<bool> {
        match self {
            LabelRule::AperioLabel => description_line_starts_with(tiff, reader, ifd, 1, b"label "),
            LabelRule::AperioMacro => description_line_starts_with(tiff, reader, ifd, 1, b"macro "),
            LabelRule::VentanaLabel => description_line_starts_with(tiff, reader, ifd, 0, b"Label_Image"),
            LabelRule::HamamatsuLabel => {
                match tiff.read_tag(reader, ifd, tags::NDPI_SOURCE_LENS)? {
                    Some(value) => Ok(value.first_as_f64() == Some(-1.0)),
                    None => Ok(false),
                }
            },
        }
    }
}

/// Checks whether line `line` of the IFD's ImageDescription starts with `prefix`
///
/// Directories without a description never match.
fn description_line_starts_with(
    tiff: &TiffReader,
    reader: &mut dyn SeekableReader,
    ifd: &IFD,
    line: usize,
    prefix: &[u8],
) -> ScrubResult<bool> {
    let value = match tiff.read_tag(reader, ifd, tags::IMAGE_DESCRIPTION)? {
        Some(value) => value,
        None => return Ok(false),
    };

    let mut text = value.as_bytes()
        .ok_or_else(|| ScrubError::malformed(format!(
            "ImageDescription of IFD #{} is not text", ifd.number)))?
        .to_vec();
    string_utils::trim_trailing_nulls(&mut text);

    let lines = string_utils::split_lines(&text);
    let found = lines.get(line).map_or(false, |l| l.starts_with(prefix));
    trace!("IFD #{} description line {}: {}", ifd.number, line,
           lines.get(line).map(|l| String::from_utf8_lossy(l).into_owned()).unwrap_or_default());

    Ok(found)
}

/// Finds the single IFD matching `rule`
///
/// # Returns
/// The index of the matching IFD in `ifds`, None when nothing matches, or
/// `MalformedContainer` when more than one directory matches.
pub fn find_unique(
    tiff: &TiffReader,
    reader: &mut dyn SeekableReader,
    ifds: &[IFD],
    rule: LabelRule,
) -> ScrubResult<Option<usize>> {
    let mut matches = Vec::new();
    for (index, ifd) in ifds.iter().enumerate() {
        if rule.matches(tiff, reader, ifd)? {
            debug!("IFD #{} matches the {} rule", ifd.number, rule.name());
            matches.push(index);
        }
    }

    match matches.as_slice() {
        [] => Ok(None),
        [index] => Ok(Some(*index)),
        _ => Err(ScrubError::malformed(format!(
            "{} directories look like the {} image (IFDs {:?}); refusing to guess",
            matches.len(), rule.name(),
            matches.iter().map(|&i| ifds[i].number).collect::<Vec<_>>()))),
    }
}
