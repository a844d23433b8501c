use thiserror::Error;

/// I/O errors that can occur when reading slide bytes
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// File could not be opened
    #[error("File not found: {path} ({reason})")]
    NotFound { path: String, reason: String },

    /// Read failed after the file was opened
    #[error("Read error: {0}")]
    Read(String),
}

/// Errors that can occur when parsing TIFF files
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),

    /// Directory index past the end of the IFD chain
    #[error("Directory {index} out of range ({count} directories)")]
    DirectoryOutOfRange { index: usize, count: usize },

    /// Tile access on a directory that uses strips
    #[error("Directory {0} is not tiled")]
    NotTiled(usize),

    /// Pixel coordinate outside the directory's tile grid
    #[error("Tile at pixel ({x}, {y}) is outside directory {directory}")]
    TileOutOfRange { directory: usize, x: u64, y: u64 },

    /// Compression scheme the reader cannot decode itself
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    /// Tile payload could not be decoded to pixels
    #[error("Tile decode failed: {0}")]
    TileDecode(String),
}

/// Errors raised by the block decoder and the tile copy that consumes it
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// Block-codec tile requested without a codec context
    #[error("No codec context available for {0} tiles")]
    MissingContext(&'static str),

    /// Payload header could not be parsed
    #[error("Failed to read codestream header: {0}")]
    Header(String),

    /// Codestream body could not be decompressed
    #[error("Failed to decompress tile: {0}")]
    Decompress(String),

    /// Decoded image does not carry enough components
    #[error("Decoded tile has {found} components, expected at least {expected}")]
    Components { expected: usize, found: usize },

    /// Decoded samples do not cover the copy rectangle
    #[error("Decoded tile too small: need {needed} samples, have {available}")]
    PlaneTooSmall { needed: usize, available: usize },

    /// Natively decoded tile failed
    #[error("{0}")]
    Native(String),
}

/// Errors surfaced by a region extraction request.
///
/// Every variant is terminal for the request; nothing is retried.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// Slide path could not be opened
    #[error("File not found: {path} ({reason})")]
    FileNotFound { path: String, reason: String },

    /// No AppMag token in the image description
    #[error("AppMag not found in image description")]
    MissingMagnification,

    /// Source image shape or encoding is outside the supported subset
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    /// Output buffer could not be allocated
    #[error("Failed to allocate {bytes} bytes for the output tile")]
    AllocationFailure { bytes: usize },

    /// A source tile failed to decode
    #[error("Decode failure: {0}")]
    DecodeFailure(#[from] CodecError),

    /// Request parameters cannot produce a region
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Region needs a tile outside the selected level
    #[error("Region out of bounds: tile at level pixel ({x}, {y}) outside directory {directory}")]
    RegionOutOfBounds { directory: usize, x: u64, y: u64 },

    /// Malformed TIFF structure or read failure
    #[error("TIFF error: {0}")]
    Tiff(TiffError),
}

impl From<TiffError> for ExtractError {
    fn from(error: TiffError) -> Self {
        match error {
            TiffError::Io(IoError::NotFound { path, reason }) => {
                ExtractError::FileNotFound { path, reason }
            }
            TiffError::TileDecode(message) => {
                ExtractError::DecodeFailure(CodecError::Native(message))
            }
            TiffError::UnsupportedCompression(name) => ExtractError::UnsupportedFormat {
                reason: format!("compression {} is not supported", name),
            },
            TiffError::NotTiled(directory) => ExtractError::UnsupportedFormat {
                reason: format!("directory {} is not tiled", directory),
            },
            TiffError::TileOutOfRange { directory, x, y } => {
                ExtractError::RegionOutOfBounds { directory, x, y }
            }
            other => ExtractError::Tiff(other),
        }
    }
}
