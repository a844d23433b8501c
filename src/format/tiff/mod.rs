//! TIFF parser for Whole Slide Images.
//!
//! This module handles parsing of TIFF and BigTIFF files, which is the
//! container used by Aperio SVS and generic pyramidal TIFF slides.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian, MM = big-endian)
//!   in the header. All multi-byte values must be read respecting this order.
//!
//! - **Classic TIFF vs BigTIFF**: Classic TIFF uses 32-bit offsets (max 4GB files),
//!   while BigTIFF uses 64-bit offsets. The parser handles both transparently.
//!
//! - **IFD (Image File Directory)**: Contains metadata and pointers to image data.
//!   Slides chain several IFDs: the pyramid levels, then label and macro images.
//!
//! - **Inline vs offset values**: Small values are stored inline in the IFD entry,
//!   larger values are stored at an offset pointed to by the entry.

mod directory;
mod parser;
mod tags;
mod validation;
mod values;

pub use directory::{Directory, TiffFile};
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use tags::{compression_name, Compression, FieldType, TiffTag};
pub use validation::{
    validate_sample_layout, ValidationError, PLANAR_CONTIGUOUS, SUPPORTED_BITS_PER_SAMPLE,
    SUPPORTED_SAMPLES_PER_PIXEL,
};
pub use values::{parse_u64_array, ValueReader};
