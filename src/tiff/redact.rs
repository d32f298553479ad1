//! Label removal for TIFF-based slides
//!
//! Redaction happens in two phases. `plan_redaction` reads everything it
//! needs (pixel ranges, pointer slots, content guard) and validates it; only
//! then does `apply_plan` open the file for writing. A plan that fails
//! validation leaves the file untouched.

use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::Path;

use crate::config::RedactConfig;
use crate::errors::{ScrubError, ScrubResult};
use crate::format::SlideFormat;
use crate::io::byte_order::ByteOrderHandler;
use crate::io::redactor::{self, ByteRange, PointerSlot};
use crate::io::seekable::{SeekableReader, SeekableWriter};
use crate::report::RedactionReport;
use crate::tiff::constants::tags;
use crate::tiff::ifd::IFD;
use crate::tiff::locator::{self, LabelRule};
use crate::tiff::reader::TiffReader;
use crate::tiff::types::TIFF;
use crate::tiff::validation;

/// One pointer field to overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerRewrite {
    pub slot: PointerSlot,
    pub value: u64,
}

/// Validated set of writes for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactionPlan {
    /// Pixel data to zero
    pub ranges: Vec<ByteRange>,
    /// Pointer fields to rewrite so the chain skips the removed IFDs
    pub rewrites: Vec<PointerRewrite>,
    /// Chain numbers of the IFDs being removed
    pub removed: Vec<usize>,
}

impl RedactionPlan {
    /// Total number of bytes the plan zeroes
    pub fn bytes_zeroed(&self) -> u64 {
        self.ranges.iter().map(|r| r.length).sum()
    }
}

/// Collects the pixel data ranges of an IFD from its strip or tile tags
///
/// Offsets are resolved relative to the IFD's next-pointer slot, which
/// matters only in NDPI mode.
pub fn pixel_ranges(tiff: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> ScrubResult<Vec<ByteRange>> {
    let (offsets_tag, counts_tag, kind) = if ifd.has_tag(tags::STRIP_OFFSETS) {
        (tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS, "strip")
    } else if ifd.has_tag(tags::TILE_OFFSETS) {
        (tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS, "tile")
    } else {
        return Err(ScrubError::malformed(format!(
            "IFD #{} has neither strips nor tiles", ifd.number)));
    };

    let offsets = tiff.read_unsigned_tag(reader, ifd, offsets_tag)?
        .ok_or_else(|| ScrubError::malformed(format!("IFD #{} has no {} offsets", ifd.number, kind)))?;
    let counts = tiff.read_unsigned_tag(reader, ifd, counts_tag)?
        .ok_or_else(|| ScrubError::malformed(format!("IFD #{} has no {} byte counts", ifd.number, kind)))?;

    if offsets.len() != counts.len() {
        return Err(ScrubError::malformed(format!(
            "IFD #{} has {} {} offsets but {} byte counts",
            ifd.number, offsets.len(), kind, counts.len())));
    }

    let mut ranges = Vec::with_capacity(offsets.len());
    for (i, (&offset, &length)) in offsets.iter().zip(counts.iter()).enumerate() {
        let range = ByteRange::new(tiff.near_pointer(ifd.next_slot.position, offset), length);
        validation::validate_range_in_file(range, tiff.file_size(),
                                           &format!("IFD #{} {} {}", ifd.number, kind, i))?;
        ranges.push(range);
    }

    debug!("IFD #{}: {} {} ranges, {} bytes", ifd.number, ranges.len(), kind,
           ranges.iter().map(|r| r.length).sum::<u64>());
    Ok(ranges)
}

/// Computes the pointer rewrites that splice `removed` out of the chain
///
/// Consecutive removed IFDs are handled as one run: the slot pointing at the
/// first one receives the next pointer of the last one.
pub fn unlink_rewrites(ifds: &[IFD], removed: &[usize]) -> ScrubResult<Vec<PointerRewrite>> {
    let removed: BTreeSet<usize> = removed.iter().copied().collect();
    if let Some(&bad) = removed.iter().find(|&&i| i >= ifds.len()) {
        return Err(ScrubError::malformed(format!("no IFD #{} in a chain of {}", bad, ifds.len())));
    }

    let mut rewrites = Vec::new();
    let mut i = 0;
    while i < ifds.len() {
        if !removed.contains(&i) {
            i += 1;
            continue;
        }

        let first = &ifds[i];
        while removed.contains(&(i + 1)) {
            i += 1;
        }
        let last = &ifds[i];

        if !first.in_slot.can_hold(last.next_offset) {
            return Err(ScrubError::malformed(format!(
                "cannot store offset {} in the {}-byte field at {}",
                last.next_offset, first.in_slot.width, first.in_slot.position)));
        }

        rewrites.push(PointerRewrite { slot: first.in_slot, value: last.next_offset });
        i += 1;
    }

    Ok(rewrites)
}

/// Builds and validates the writes that remove the IFDs at `targets`
///
/// # Arguments
/// * `targets` - Indices into `chain.ifds`
/// * `guard` - Expected first bytes of every pixel range, if the format has one
pub fn plan_redaction(
    tiff: &TiffReader,
    reader: &mut dyn SeekableReader,
    chain: &TIFF,
    targets: &[usize],
    config: &RedactConfig,
    guard: Option<&[u8]>,
) -> ScrubResult<RedactionPlan> {
    let mut plan = RedactionPlan::default();

    for &index in targets {
        let ifd = chain.ifds.get(index)
            .ok_or_else(|| ScrubError::malformed(format!("no IFD #{} in chain", index)))?;

        if config.mode.zeroes() {
            let ranges = pixel_ranges(tiff, reader, ifd)?;
            if let Some(expected) = guard {
                for range in &ranges {
                    redactor::verify_prefix(reader, *range, expected)?;
                }
            }
            plan.ranges.extend(ranges);
        }
        plan.removed.push(ifd.number);
    }

    if config.mode.unlinks() {
        plan.rewrites = unlink_rewrites(&chain.ifds, targets)?;
        for rewrite in &plan.rewrites {
            validation::validate_range_in_file(rewrite.slot.range(), tiff.file_size(), "pointer field")?;
        }
    }

    Ok(plan)
}

/// Performs the writes of a validated plan
///
/// Pixel data is zeroed before the chain is relinked.
pub fn apply_plan(
    writer: &mut dyn SeekableWriter,
    handler: &dyn ByteOrderHandler,
    plan: &RedactionPlan,
) -> ScrubResult<()> {
    for range in &plan.ranges {
        redactor::zero_range(writer, *range)?;
    }
    for rewrite in &plan.rewrites {
        redactor::write_pointer(writer, handler, rewrite.slot, rewrite.value)?;
    }
    Ok(())
}

/// Locates the label directory of a TIFF-based slide and removes it
///
/// With `include_macro`, a macro image is removed in the same pass when the
/// format has one; a missing macro is only logged.
pub fn find_and_redact(path: &Path, format: SlideFormat, config: &RedactConfig) -> ScrubResult<RedactionReport> {
    let label_rule = LabelRule::label_rule_for(format)
        .ok_or_else(|| ScrubError::UnrecognizedFormat(format!("{} is not a TIFF format", format.name())))?;

    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut tiff = TiffReader::open(&mut reader)?;
    let chain = tiff.read_chain(&mut reader)?;
    debug!("{}: {} IFDs at {:?}", path.display(), chain.ifd_count(), chain.ifd_offsets());

    let label = locator::find_unique(&tiff, &mut reader, &chain.ifds, label_rule)?
        .ok_or_else(|| ScrubError::LabelNotFound(format!(
            "no label directory in {} file", format.name())))?;
    let mut targets = vec![label];

    if config.include_macro {
        match LabelRule::macro_rule_for(format) {
            Some(rule) => match locator::find_unique(&tiff, &mut reader, &chain.ifds, rule)? {
                Some(index) => targets.push(index),
                None => warn!("{}: no macro directory found", path.display()),
            },
            None => debug!("{} files have no separate macro image", format.name()),
        }
    }

    let guard = format.payload_prefix();
    let plan = plan_redaction(&tiff, &mut reader, &chain, &targets, config, guard)?;
    drop(reader);

    info!("{}: removing IFD(s) {:?}, zeroing {} bytes in {} ranges, {} pointer rewrite(s)",
          path.display(), plan.removed, plan.bytes_zeroed(), plan.ranges.len(), plan.rewrites.len());

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    apply_plan(&mut file, tiff.handler(), &plan)?;
    file.sync_all()?;

    Ok(RedactionReport {
        path: path.to_path_buf(),
        format,
        modified_file: path.to_path_buf(),
        ranges: plan.ranges,
        unlinked: if config.mode.unlinks() { plan.removed } else { Vec::new() },
    })
}
