//! Slide file formats.
//!
//! TIFF and BigTIFF structure parsing lives in [`tiff`]. On top of it sit
//! the pieces specific to whole slide images: the Aperio SVS image
//! description (scanning magnification and friends) and JPEG tile decoding
//! with shared `JPEGTables`.

pub mod jpeg;
pub mod svs;
pub mod tiff;

pub use svs::SlideDescription;
