//! In-place removal of label images from whole-slide images
//!
//! Supported containers are Aperio SVS, Hamamatsu NDPI and Ventana TIFF
//! files, and 3DHistech MRXS slides. Inputs are modified in place; no file
//! ever changes size.

pub mod errors;
pub mod io;
pub mod tiff;
pub mod mrxs;
pub mod format;
pub mod config;
pub mod report;
pub mod dispatch;
pub mod utils;

pub use config::{RedactConfig, RedactMode};
pub use dispatch::{process, process_all, process_all_with};
pub use errors::{ScrubError, ScrubResult};
pub use format::SlideFormat;
pub use report::{BatchSummary, Outcome, RedactionReport};
