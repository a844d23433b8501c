//! # WSI Region
//!
//! Extracts fixed-size regions from pyramidal Whole Slide Images (WSI) at a
//! chosen magnification.
//!
//! A region is named by its level-0 top-left corner, its side at the
//! requested magnification, and the magnification itself. The engine picks
//! the pyramid level closest to that magnification, reads only the tiles
//! the region overlaps, and stitches them into one dense RGB buffer ready
//! for model inference.
//!
//! ## Features
//!
//! - **Format support**: TIFF and BigTIFF in either byte order, Aperio SVS
//! - **Codecs**: uncompressed and JPEG tiles decoded natively (with SVS
//!   `JPEGTables` merging), JPEG 2000 tiles through a pluggable block decoder
//! - **Bounded work**: one level, only the overlapped tiles, buffers reused
//!   across the tiles of a request
//!
//! ## Architecture
//!
//! - [`io`] - Range readers over local files and memory
//! - [`mod@format`] - TIFF parser, SVS description and JPEG handling
//! - [`slide`] - Directory-oriented slide reader
//! - [`codec`] - Block decoder seam, codec lifecycle and per-request strategy
//! - [`tile`] - Level selection, crop geometry, stitching and the output tile
//! - [`config`] - Extraction settings
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsi_region::{extract, CodecContext, Layout};
//!
//! fn main() -> Result<(), wsi_region::ExtractError> {
//!     let context = CodecContext::initialize();
//!
//!     // 224x224 region at 20x, top-left at level-0 pixel (4096, 2048)
//!     let tile = extract(&context, "slide.svs", 4096, 2048, 224, 20)?;
//!
//!     let side = tile.side() as usize;
//!     let interleaved = tile.to_layout(Layout::Interleaved).into_vec();
//!     assert_eq!(interleaved.len(), side * side * 3);
//!     Ok(())
//! }
//! ```

use std::path::Path;

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod slide;
pub mod tile;

// Re-export commonly used types
pub use codec::{BlockDecoder, CodecContext, DecodedPlanes, Jpeg2kDecoder, Plane};
pub use config::{ExtractConfig, DEFAULT_MAX_OUTPUT_SIDE, DEFAULT_TOLERANCE};
pub use error::{CodecError, ExtractError, IoError, TiffError};
pub use format::tiff::{Compression, Directory, TiffFile, ValidationError};
pub use format::SlideDescription;
pub use io::{BytesRangeReader, FileRangeReader, RangeReader};
pub use slide::{LevelInfo, SlideReader, TiffSlideReader};
pub use tile::{ExtractionRequest, Layout, NarrowStrategy, RegionExtractor, Tile};

/// Extract one region from the slide at `path` with default settings.
///
/// `x` and `y` are level-0 pixel coordinates of the top-left corner,
/// `output_side` is the region's side at `magnification`. The returned side
/// can differ from `output_side` when no level matches the magnification
/// within the default tolerance of 0.2.
pub fn extract(
    context: &CodecContext,
    path: impl AsRef<Path>,
    x: u64,
    y: u64,
    output_side: u32,
    magnification: u32,
) -> Result<Tile, ExtractError> {
    RegionExtractor::new(context).extract(path, x, y, output_side, magnification)
}
