//! 3DHistech MRXS slides
//!
//! The label of an MRXS slide is a JPEG stored in one of the slide's data
//! files. It is removed by zeroing its bytes; Slidedat.ini and the index
//! file are left untouched, so every file keeps its size.

pub mod slidedat;
pub mod index;
pub mod redact;

pub use index::{MrxsSlide, NonHierLevel, RecordLocation};
pub use slidedat::Slidedat;
