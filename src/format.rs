//! Slide format detection

use log::debug;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::{ScrubError, ScrubResult};
use crate::tiff::constants::{markers, tags};
use crate::tiff::reader::TiffReader;
use crate::utils::xml_utils;

/// Extension identifying a 3DHistech MRXS slide
pub const MRXS_EXTENSION: &str = "mrxs";

/// Supported slide formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideFormat {
    Aperio,
    Hamamatsu,
    Ventana,
    Mirax,
}

impl SlideFormat {
    pub fn name(&self) -> &'static str {
        match self {
            SlideFormat::Aperio => "Aperio SVS",
            SlideFormat::Hamamatsu => "Hamamatsu NDPI",
            SlideFormat::Ventana => "Ventana TIFF",
            SlideFormat::Mirax => "3DHistech MRXS",
        }
    }

    /// Expected leading bytes of the label payload, where the format guarantees them
    pub fn payload_prefix(&self) -> Option<&'static [u8]> {
        match self {
            SlideFormat::Hamamatsu | SlideFormat::Mirax => Some(&markers::JPEG_SOI[..]),
            SlideFormat::Aperio | SlideFormat::Ventana => None,
        }
    }

    /// Determines the format of the slide at `path`
    ///
    /// `.mrxs` paths are classified by extension alone; the slide directory
    /// is checked later. Everything else must be a TIFF whose first
    /// directory carries a vendor signature.
    pub fn detect(path: &Path) -> ScrubResult<SlideFormat> {
        if path.extension().map_or(false, |ext| ext == MRXS_EXTENSION) {
            return Ok(SlideFormat::Mirax);
        }

        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut tiff = match TiffReader::open(&mut reader) {
            Ok(tiff) => tiff,
            Err(ScrubError::InvalidByteOrder(_))
            | Err(ScrubError::UnsupportedVersion(_))
            | Err(ScrubError::UnrecognizedFormat(_)) => {
                return Err(ScrubError::UnrecognizedFormat(format!(
                    "{} is neither a TIFF file nor an MRXS slide", path.display())));
            },
            Err(e) => return Err(e),
        };

        let first = match tiff.walk(&mut reader).next() {
            Some(ifd) => ifd?,
            None => return Err(ScrubError::malformed("TIFF file has no directories")),
        };

        if first.has_tag(tags::NDPI_MAGIC) {
            return Ok(SlideFormat::Hamamatsu);
        }

        if let Some(description) = tiff.read_tag(&mut reader, &first, tags::IMAGE_DESCRIPTION)? {
            if description.as_bytes().map_or(false, |d| d.starts_with(b"Aperio")) {
                return Ok(SlideFormat::Aperio);
            }
        }

        if let Some(xmp) = tiff.read_tag(&mut reader, &first, tags::XMP)? {
            if xmp.as_bytes().map_or(false, |x| xml_utils::contains_element(x, "iScan")) {
                return Ok(SlideFormat::Ventana);
            }
        }

        debug!("{}: TIFF without a known vendor signature", path.display());
        Err(ScrubError::UnrecognizedFormat(format!(
            "{} is a TIFF file from an unsupported vendor", path.display())))
    }
}

impl fmt::Display for SlideFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
