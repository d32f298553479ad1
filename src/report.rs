//! Per-file results and batch summaries

use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{ScrubError, ScrubResult};
use crate::format::SlideFormat;
use crate::io::redactor::ByteRange;

/// What was changed in one slide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionReport {
    /// Path given by the caller
    pub path: PathBuf,
    pub format: SlideFormat,
    /// File that was written to; the data file for MRXS slides
    pub modified_file: PathBuf,
    /// Ranges overwritten with zeros
    pub ranges: Vec<ByteRange>,
    /// Chain numbers of the IFDs spliced out of a TIFF directory chain
    pub unlinked: Vec<usize>,
}

impl RedactionReport {
    pub fn bytes_zeroed(&self) -> u64 {
        self.ranges.iter().map(|r| r.length).sum()
    }
}

impl fmt::Display for RedactionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} label removed: {} bytes zeroed", self.format.name(), self.bytes_zeroed())?;
        if self.modified_file != self.path {
            write!(f, " in {}", self.modified_file.display())?;
        }
        if !self.unlinked.is_empty() {
            write!(f, ", IFD(s) {:?} unlinked", self.unlinked)?;
        }
        Ok(())
    }
}

/// Classification of a per-file result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    LabelNotFound,
    MalformedContainer,
    IoError,
    UnrecognizedFormat,
}

impl Outcome {
    pub fn from_result<T>(result: &ScrubResult<T>) -> Outcome {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) => Outcome::from_error(e),
        }
    }

    pub fn from_error(error: &ScrubError) -> Outcome {
        match error {
            ScrubError::IoError(_) => Outcome::IoError,
            ScrubError::UnrecognizedFormat(_) => Outcome::UnrecognizedFormat,
            ScrubError::LabelNotFound(_) => Outcome::LabelNotFound,
            ScrubError::MalformedContainer(_)
            | ScrubError::InvalidByteOrder(_)
            | ScrubError::UnsupportedVersion(_)
            | ScrubError::UnsupportedFieldType(_) => Outcome::MalformedContainer,
            // Only produced while loading configuration, never per file
            ScrubError::InvalidConfig(_) => Outcome::MalformedContainer,
        }
    }

    /// A missing label is reported but not counted as a failure
    pub fn is_failure(&self) -> bool {
        !matches!(self, Outcome::Success | Outcome::LabelNotFound)
    }
}

/// Results of a batch run, in input order
#[derive(Debug, Default)]
pub struct BatchSummary {
    results: Vec<(PathBuf, ScrubResult<RedactionReport>)>,
}

impl BatchSummary {
    pub fn new() -> Self {
        BatchSummary::default()
    }

    pub fn record(&mut self, path: &Path, result: ScrubResult<RedactionReport>) {
        self.results.push((path.to_path_buf(), result));
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&Path, Outcome)> {
        self.results.iter().map(|(path, result)| (path.as_path(), Outcome::from_result(result)))
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| o == Outcome::Success)
    }

    pub fn warnings(&self) -> usize {
        self.count(|o| o == Outcome::LabelNotFound)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| o.is_failure())
    }

    /// True when no input failed; missing labels do not count
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, predicate: impl Fn(Outcome) -> bool) -> usize {
        self.outcomes().filter(|&(_, o)| predicate(o)).count()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} file(s): {} redacted, {} without label, {} failed",
               self.total(), self.succeeded(), self.warnings(), self.failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn report(path: &str) -> RedactionReport {
        RedactionReport {
            path: PathBuf::from(path),
            format: SlideFormat::Aperio,
            modified_file: PathBuf::from(path),
            ranges: vec![ByteRange::new(100, 20), ByteRange::new(300, 5)],
            unlinked: vec![2],
        }
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(Outcome::from_error(&ScrubError::LabelNotFound("x".into())), Outcome::LabelNotFound);
        assert_eq!(Outcome::from_error(&ScrubError::UnsupportedVersion(7)), Outcome::MalformedContainer);
        assert_eq!(Outcome::from_error(&io::Error::from(io::ErrorKind::NotFound).into()), Outcome::IoError);
        assert!(!Outcome::LabelNotFound.is_failure());
        assert!(Outcome::UnrecognizedFormat.is_failure());
    }

    #[test]
    fn test_batch_counts() {
        let mut summary = BatchSummary::new();
        summary.record(Path::new("a.svs"), Ok(report("a.svs")));
        summary.record(Path::new("b.svs"), Err(ScrubError::LabelNotFound("none".into())));
        summary.record(Path::new("c.txt"), Err(ScrubError::UnrecognizedFormat("text".into())));

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.warnings(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_clean());
        assert_eq!(summary.to_string(), "3 file(s): 1 redacted, 1 without label, 1 failed");
    }

    #[test]
    fn test_report_display() {
        assert_eq!(report("a.svs").bytes_zeroed(), 25);
        assert_eq!(report("a.svs").to_string(), "Aperio SVS label removed: 25 bytes zeroed, IFD(s) [2] unlinked");
    }
}
