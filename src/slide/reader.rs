//! SlideReader trait for directory-oriented slide access.
//!
//! A slide is a chain of TIFF directories with one of them current at any
//! time, the way a classic TIFF library exposes a file. The extraction
//! engine walks the chain to pick a pyramid level, leaves the reader
//! positioned there, and then reads tiles from the current directory by
//! level-space pixel coordinate.

use crate::error::TiffError;
use crate::format::tiff::Directory;

// =============================================================================
// Level Information
// =============================================================================

/// Snapshot of one tiled directory, for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelInfo {
    /// Index of the directory in the IFD chain
    pub directory: usize,

    /// Width of this level in pixels
    pub width: u32,

    /// Height of this level in pixels
    pub height: u32,

    /// Width of each tile in pixels
    pub tile_width: u32,

    /// Height of each tile in pixels
    pub tile_height: u32,

    /// Number of tile columns
    pub tiles_across: u64,

    /// Number of tile rows
    pub tiles_down: u64,

    /// `level0_width / width`, the same ratio level selection compares
    pub downsample: f32,
}

impl LevelInfo {
    /// Describe a tiled directory against the level-0 width.
    ///
    /// Returns `None` for stripped directories.
    pub fn from_directory(directory: &Directory, level0_width: u32) -> Option<Self> {
        let (tile_width, tile_height) = directory.tile_size().ok()?;
        Some(LevelInfo {
            directory: directory.index,
            width: directory.width,
            height: directory.height,
            tile_width,
            tile_height,
            tiles_across: directory.tiles_across(),
            tiles_down: directory.tiles_down(),
            downsample: level0_width as f32 / directory.width as f32,
        })
    }
}

// =============================================================================
// SlideReader Trait
// =============================================================================

/// Directory-oriented interface to a tiled slide file.
///
/// Implementations own their I/O handle; dropping the reader closes it.
/// The current directory is `&mut self` state, so a reader serves one
/// request at a time.
pub trait SlideReader {
    /// Identifier for logging (path or URI).
    fn identifier(&self) -> &str;

    /// Number of directories in the chain.
    fn directory_count(&self) -> usize;

    /// Index of the current directory.
    fn current_directory(&self) -> usize;

    /// Make directory `index` current.
    fn set_directory(&mut self, index: usize) -> Result<(), TiffError>;

    /// Advance to the next directory.
    ///
    /// Returns `false`, leaving the current directory unchanged, when the
    /// current one is the last.
    fn read_next_directory(&mut self) -> bool;

    /// Metadata of directory `index` without moving the cursor.
    fn directory_at(&self, index: usize) -> Option<&Directory>;

    /// Metadata of the current directory.
    fn directory(&self) -> &Directory;

    /// Read the tile containing level pixel `(x, y)` of the current
    /// directory, decoded to interleaved 8-bit RGB.
    ///
    /// `buf` is replaced with `tile_width * tile_height * 3` bytes. Only
    /// natively decodable compressions (none, JPEG) are supported.
    fn read_tile(&mut self, x: u64, y: u64, buf: &mut Vec<u8>) -> Result<(), TiffError>;

    /// Read the compressed payload of the tile containing level pixel
    /// `(x, y)` of the current directory.
    ///
    /// `buf` is replaced with the tile's bytes exactly as stored.
    fn read_raw_tile(&mut self, x: u64, y: u64, buf: &mut Vec<u8>) -> Result<(), TiffError>;
}

// =============================================================================
// Tests
// =============================================================================
