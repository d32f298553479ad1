//! Per-path dispatch
//!
//! Classifies each input and hands it to the matching redaction pipeline.
//! Failures are contained per path: a batch always runs to the end.

use log::{debug, error, info, warn};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::RedactConfig;
use crate::errors::{ScrubError, ScrubResult};
use crate::format::SlideFormat;
use crate::mrxs;
use crate::report::{BatchSummary, RedactionReport};
use crate::tiff;

/// Removes the label from the slide at `path`, in place
///
/// `path` must name an existing file; wildcards are not expanded.
pub fn process(path: &Path, config: &RedactConfig) -> ScrubResult<RedactionReport> {
    if !path.exists() {
        return Err(ScrubError::IoError(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let format = SlideFormat::detect(path)?;
    debug!("{}: {}", path.display(), format.name());

    match format {
        SlideFormat::Mirax => mrxs::redact::redact_label(path, config),
        SlideFormat::Aperio | SlideFormat::Hamamatsu | SlideFormat::Ventana => {
            tiff::redact::find_and_redact(path, format, config)
        },
    }
}

/// Processes every path in order
pub fn process_all(paths: &[PathBuf], config: &RedactConfig) -> BatchSummary {
    process_all_with(paths, config, |_, _| {})
}

/// Processes every path in order, calling `on_done` after each one
pub fn process_all_with<F>(paths: &[PathBuf], config: &RedactConfig, mut on_done: F) -> BatchSummary
where
    F: FnMut(&Path, &ScrubResult<RedactionReport>),
{
    let mut summary = BatchSummary::new();

    for path in paths {
        let result = process(path, config);
        match &result {
            Ok(report) => info!("{}: {}", path.display(), report),
            Err(e) if e.is_warning() => warn!("{}: {}", path.display(), e),
            Err(e) => error!("{}: {}", path.display(), e),
        }

        on_done(path, &result);
        summary.record(path, result);
    }

    info!("{}", summary);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Outcome;

    #[test]
    fn test_missing_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.svs");
        let result = process(&missing, &RedactConfig::default());
        match result {
            Err(ScrubError::IoError(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_file_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"plain text, not a slide").unwrap();
        let missing = dir.path().join("gone.ndpi");

        let mut seen = Vec::new();
        let summary = process_all_with(&[text.clone(), missing.clone()], &RedactConfig::default(),
                                       |path, _| seen.push(path.to_path_buf()));

        assert_eq!(seen, vec![text, missing]);
        let outcomes: Vec<Outcome> = summary.outcomes().map(|(_, o)| o).collect();
        assert_eq!(outcomes, vec![Outcome::UnrecognizedFormat, Outcome::IoError]);
        assert_eq!(summary.failed(), 2);
    }

    #[test]
    fn test_mrxs_without_slide_directory_is_unrecognized() {
        let dir = tempfile::tempdir().unwrap();
        let slide = dir.path().join("lonely.mrxs");
        std::fs::write(&slide, b"").unwrap();
        assert!(matches!(process(&slide, &RedactConfig::default()),
                         Err(ScrubError::UnrecognizedFormat(_))));
    }
}
