//! Slide abstraction layer.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            RegionExtractor              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           SlideReader Trait             │
//! │   (current directory, tile by pixel)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │     TiffSlideReader<R: RangeReader>     │
//! │  (TIFF/BigTIFF, JPEG and raw tiles)     │
//! └─────────────────────────────────────────┘
//! ```

mod reader;
mod tiff_reader;

pub use reader::{LevelInfo, SlideReader};
pub use tiff_reader::TiffSlideReader;
