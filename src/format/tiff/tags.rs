//! TIFF tag and field type definitions.
//!
//! Field types that determine how values are encoded, the tag IDs read from
//! slide directories, and the compression schemes those directories declare.
//! The definitions support both classic TIFF and BigTIFF formats.

// =============================================================================
// TIFF Field Types
// =============================================================================

/// Entry field types the directory walker understands.
///
/// RATIONAL, FLOAT and the other numeric types never carry pyramid
/// structure, so entries using them are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Undefined = 7,

    /// BigTIFF only
    Long8 = 16,
}

impl FieldType {
    /// Bytes of the value/offset slot in a classic TIFF entry.
    pub const INLINE_THRESHOLD_TIFF: usize = 4;

    /// Bytes of the value/offset slot in a BigTIFF entry.
    pub const INLINE_THRESHOLD_BIGTIFF: usize = 8;

    /// Width of one element.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::Undefined => 1,
            FieldType::Short => 2,
            FieldType::Long => 4,
            FieldType::Long8 => 8,
        }
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            1 => FieldType::Byte,
            2 => FieldType::Ascii,
            3 => FieldType::Short,
            4 => FieldType::Long,
            7 => FieldType::Undefined,
            16 => FieldType::Long8,
            _ => return None,
        })
    }

    /// Whether `count` elements live in the entry itself rather than at an
    /// offset.
    #[inline]
    pub fn fits_inline(self, count: u64, is_bigtiff: bool) -> bool {
        let slot = if is_bigtiff {
            Self::INLINE_THRESHOLD_BIGTIFF
        } else {
            Self::INLINE_THRESHOLD_TIFF
        };
        (self.size_in_bytes() as u64).saturating_mul(count) <= slot as u64
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF tag IDs read while walking a slide's directories.
///
/// Tags not listed here are ignored during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    // -------------------------------------------------------------------------
    // Basic Image Structure
    // -------------------------------------------------------------------------
    /// Image width in pixels
    ImageWidth = 256,

    /// Image height (length) in pixels
    ImageLength = 257,

    /// Bits per sample, one value per component
    BitsPerSample = 258,

    /// Compression scheme used
    Compression = 259,

    /// Description string (carries AppMag and friends in SVS files)
    ImageDescription = 270,

    /// Number of components per pixel (e.g., 3 for RGB)
    SamplesPerPixel = 277,

    /// How components are organized (1 = contiguous, 2 = separate planes)
    PlanarConfiguration = 284,

    // -------------------------------------------------------------------------
    // Tile Organization (pyramid levels)
    // -------------------------------------------------------------------------
    /// Width of each tile in pixels
    TileWidth = 322,

    /// Height (length) of each tile in pixels
    TileLength = 323,

    /// Byte offsets of each tile in the file
    TileOffsets = 324,

    /// Byte counts of each tile
    TileByteCounts = 325,

    // -------------------------------------------------------------------------
    // JPEG Handling
    // -------------------------------------------------------------------------
    /// JPEG quantization and Huffman tables for abbreviated streams
    ///
    /// SVS tiles omit these tables; they must be merged with the tile data
    /// before decoding.
    JpegTables = 347,
}

impl TiffTag {
    /// Create a TiffTag from its numeric value.
    ///
    /// Returns `None` for unrecognized tags. Unknown tags are not an error;
    /// they are simply ignored during parsing.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            256 => Some(TiffTag::ImageWidth),
            257 => Some(TiffTag::ImageLength),
            258 => Some(TiffTag::BitsPerSample),
            259 => Some(TiffTag::Compression),
            270 => Some(TiffTag::ImageDescription),
            277 => Some(TiffTag::SamplesPerPixel),
            284 => Some(TiffTag::PlanarConfiguration),
            322 => Some(TiffTag::TileWidth),
            323 => Some(TiffTag::TileLength),
            324 => Some(TiffTag::TileOffsets),
            325 => Some(TiffTag::TileByteCounts),
            347 => Some(TiffTag::JpegTables),
            _ => None,
        }
    }

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Tag name for error messages.
    pub const fn name(self) -> &'static str {
        match self {
            TiffTag::ImageWidth => "ImageWidth",
            TiffTag::ImageLength => "ImageLength",
            TiffTag::BitsPerSample => "BitsPerSample",
            TiffTag::Compression => "Compression",
            TiffTag::ImageDescription => "ImageDescription",
            TiffTag::SamplesPerPixel => "SamplesPerPixel",
            TiffTag::PlanarConfiguration => "PlanarConfiguration",
            TiffTag::TileWidth => "TileWidth",
            TiffTag::TileLength => "TileLength",
            TiffTag::TileOffsets => "TileOffsets",
            TiffTag::TileByteCounts => "TileByteCounts",
            TiffTag::JpegTables => "JPEGTables",
        }
    }
}

// =============================================================================
// Compression Values
// =============================================================================

/// TIFF compression scheme identifiers seen in whole slide images.
///
/// Uncompressed and JPEG tiles are decoded by the slide reader itself and
/// come back as interleaved RGB. The JPEG 2000 family goes through a block
/// decoder and comes back as per-component planes. Anything else is
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Compression {
    /// No compression
    None = 1,

    /// LZW compression
    Lzw = 5,

    /// "Old-style" JPEG
    OldJpeg = 6,

    /// JPEG compression
    Jpeg = 7,

    /// Deflate/zlib compression
    Deflate = 8,

    /// Adobe Deflate
    AdobeDeflate = 32946,

    /// Aperio JPEG 2000, YCbCr components
    AperioJp2kYcc = 33003,

    /// Aperio JPEG 2000, RGB components
    AperioJp2kRgb = 33005,

    /// Generic JPEG 2000
    Jpeg2000 = 34712,
}

impl Compression {
    /// Create a Compression from its numeric value.
    ///
    /// Returns `None` for unrecognized compression values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Compression::None),
            5 => Some(Compression::Lzw),
            6 => Some(Compression::OldJpeg),
            7 => Some(Compression::Jpeg),
            8 => Some(Compression::Deflate),
            32946 => Some(Compression::AdobeDeflate),
            33003 => Some(Compression::AperioJp2kYcc),
            33005 => Some(Compression::AperioJp2kRgb),
            34712 => Some(Compression::Jpeg2000),
            _ => None,
        }
    }

    /// Tiles the slide reader decodes into interleaved RGB by itself.
    #[inline]
    pub const fn is_native(self) -> bool {
        matches!(self, Compression::None | Compression::Jpeg)
    }

    /// Tiles that need a block decoder and yield planar samples.
    #[inline]
    pub const fn is_block_codec(self) -> bool {
        matches!(
            self,
            Compression::AperioJp2kYcc | Compression::AperioJp2kRgb | Compression::Jpeg2000
        )
    }

    /// Get a human-readable name for the compression scheme.
    pub const fn name(self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::Lzw => "LZW",
            Compression::OldJpeg => "Old JPEG",
            Compression::Jpeg => "JPEG",
            Compression::Deflate => "Deflate",
            Compression::AdobeDeflate => "Adobe Deflate",
            Compression::AperioJp2kYcc => "Aperio JPEG 2000 (YCbCr)",
            Compression::AperioJp2kRgb => "Aperio JPEG 2000 (RGB)",
            Compression::Jpeg2000 => "JPEG 2000",
        }
    }
}

/// Human-readable name for a raw compression value, including unknown ones.
pub fn compression_name(value: u16) -> String {
    match Compression::from_u16(value) {
        Some(c) => c.name().to_string(),
        None => format!("unknown ({})", value),
    }
}

// =============================================================================
// Tests
// =============================================================================
