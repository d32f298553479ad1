//! MRXS label redaction

use log::{info, warn};
use std::fs::OpenOptions;
use std::path::Path;

use crate::config::RedactConfig;
use crate::errors::ScrubResult;
use crate::format::SlideFormat;
use crate::io::redactor;
use crate::mrxs::index::{MrxsSlide, RecordLocation};
use crate::report::RedactionReport;

/// Zeroes the payload at `location`
///
/// The payload must start with a JPEG SOI marker or already be zeroed.
pub fn redact(location: &RecordLocation) -> ScrubResult<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(&location.data_file)?;

    if let Some(expected) = SlideFormat::Mirax.payload_prefix() {
        redactor::verify_prefix(&mut file, location.range, expected)?;
    }
    redactor::zero_range(&mut file, location.range)?;
    file.sync_all()?;
    Ok(())
}

/// Finds and zeroes the label of the MRXS slide at `path`
///
/// Zeroing is the only mechanism MRXS supports, so it is applied whatever
/// the configured mode.
pub fn redact_label(path: &Path, config: &RedactConfig) -> ScrubResult<RedactionReport> {
    if !config.mode.zeroes() {
        warn!("{}: MRXS labels can only be zeroed; ignoring {} mode", path.display(), config.mode);
    }

    let slide = MrxsSlide::open(path)?;
    let location = slide.resolve_label()?;
    redact(&location)?;

    info!("{}: zeroed {} bytes at {} in {}", path.display(), location.range.length,
          location.range.offset, location.data_file.display());

    Ok(RedactionReport {
        path: path.to_path_buf(),
        format: SlideFormat::Mirax,
        modified_file: location.data_file,
        ranges: vec![location.range],
        unlinked: Vec::new(),
    })
}
