//! TIFF directory loading.
//!
//! A slide file is a chain of IFDs. Pyramid levels are tiled; label and
//! macro images are usually stripped. Every directory in the chain is loaded
//! here with its structure tags resolved, so the reader can step through
//! them in file order without going back to the raw entries.

use std::collections::HashSet;

use bytes::Bytes;
use tracing::warn;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{Ifd, TiffHeader, BIGTIFF_HEADER_SIZE};
use super::tags::{Compression, TiffTag};
use super::values::ValueReader;

// =============================================================================
// Constants
// =============================================================================

/// Maximum number of IFDs to follow in one file
const MAX_IFDS: usize = 100;

// TIFF 6.0 defaults for absent tags
const DEFAULT_BITS_PER_SAMPLE: u16 = 1;
const DEFAULT_SAMPLES_PER_PIXEL: u16 = 1;
const DEFAULT_PLANAR_CONFIGURATION: u16 = 1;
const DEFAULT_COMPRESSION: u16 = 1;

// =============================================================================
// Directory
// =============================================================================

/// One image in the TIFF directory chain.
#[derive(Debug, Clone)]
pub struct Directory {
    /// Position in the IFD chain (0 = first directory)
    pub index: usize,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Tile width, `None` for stripped images
    pub tile_width: Option<u32>,

    /// Tile height, `None` for stripped images
    pub tile_height: Option<u32>,

    /// First BitsPerSample value
    pub bits_per_sample: u16,

    pub samples_per_pixel: u16,

    /// 1 = contiguous (chunky), 2 = separate planes
    pub planar_configuration: u16,

    /// Raw Compression tag value
    pub compression: u16,

    /// ImageDescription text, if present
    pub description: Option<String>,

    /// Byte offset of each tile, row-major
    pub tile_offsets: Vec<u64>,

    /// Byte count of each tile, row-major
    pub tile_byte_counts: Vec<u64>,

    /// Shared JPEG tables for abbreviated tile streams
    pub jpeg_tables: Option<Bytes>,
}

impl Directory {
    /// Resolve a parsed IFD into a directory.
    pub fn load<R: RangeReader + ?Sized>(
        reader: &R,
        header: &TiffHeader,
        ifd: &Ifd,
        index: usize,
    ) -> Result<Self, TiffError> {
        let values = ValueReader::new(reader, header);

        let required_u32 = |tag: TiffTag| -> Result<u32, TiffError> {
            let entry = ifd
                .get_entry_by_tag(tag)
                .ok_or(TiffError::MissingTag(tag.name()))?;
            values.read_u32(entry)
        };
        let optional_u32 = |tag: TiffTag| -> Result<Option<u32>, TiffError> {
            ifd.get_entry_by_tag(tag)
                .map(|entry| values.read_u32(entry))
                .transpose()
        };

        let width = required_u32(TiffTag::ImageWidth)?;
        let height = required_u32(TiffTag::ImageLength)?;

        let (tile_width, tile_height) = if ifd.is_tiled() {
            (
                optional_u32(TiffTag::TileWidth)?,
                optional_u32(TiffTag::TileLength)?,
            )
        } else {
            (None, None)
        };

        let bits_per_sample = match ifd.get_entry_by_tag(TiffTag::BitsPerSample) {
            Some(entry) => values.read_first_u32(entry)? as u16,
            None => DEFAULT_BITS_PER_SAMPLE,
        };
        let samples_per_pixel = optional_u32(TiffTag::SamplesPerPixel)?
            .map_or(DEFAULT_SAMPLES_PER_PIXEL, |v| v as u16);
        let planar_configuration = optional_u32(TiffTag::PlanarConfiguration)?
            .map_or(DEFAULT_PLANAR_CONFIGURATION, |v| v as u16);
        let compression = optional_u32(TiffTag::Compression)?
            .map_or(DEFAULT_COMPRESSION, |v| v as u16);

        let description = ifd
            .get_entry_by_tag(TiffTag::ImageDescription)
            .map(|entry| values.read_string(entry))
            .transpose()?;

        let mut directory = Directory {
            index,
            width,
            height,
            tile_width,
            tile_height,
            bits_per_sample,
            samples_per_pixel,
            planar_configuration,
            compression,
            description,
            tile_offsets: Vec::new(),
            tile_byte_counts: Vec::new(),
            jpeg_tables: None,
        };

        if directory.is_tiled() {
            let offsets = ifd
                .get_entry_by_tag(TiffTag::TileOffsets)
                .ok_or(TiffError::MissingTag("TileOffsets"))?;
            let counts = ifd
                .get_entry_by_tag(TiffTag::TileByteCounts)
                .ok_or(TiffError::MissingTag("TileByteCounts"))?;

            directory.tile_offsets = values.read_u64_array(offsets)?;
            directory.tile_byte_counts = values.read_u64_array(counts)?;

            let expected = directory.tile_count();
            for (tag, len) in [
                ("TileOffsets", directory.tile_offsets.len()),
                ("TileByteCounts", directory.tile_byte_counts.len()),
            ] {
                if len < expected {
                    return Err(TiffError::InvalidTagValue {
                        tag,
                        message: format!("expected {} tiles, found {}", expected, len),
                    });
                }
            }

            directory.jpeg_tables = ifd
                .get_entry_by_tag(TiffTag::JpegTables)
                .map(|entry| values.read_bytes(entry))
                .transpose()?;
        }

        Ok(directory)
    }

    /// Whether the image is organized in tiles (pyramid levels are).
    #[inline]
    pub fn is_tiled(&self) -> bool {
        matches!((self.tile_width, self.tile_height), (Some(w), Some(h)) if w > 0 && h > 0)
    }

    /// Tile dimensions, or `NotTiled` for stripped images.
    pub fn tile_size(&self) -> Result<(u32, u32), TiffError> {
        match (self.tile_width, self.tile_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
            _ => Err(TiffError::NotTiled(self.index)),
        }
    }

    /// Number of tile columns.
    pub fn tiles_across(&self) -> u64 {
        match self.tile_width {
            Some(w) if w > 0 => (self.width as u64).div_ceil(w as u64),
            _ => 0,
        }
    }

    /// Number of tile rows.
    pub fn tiles_down(&self) -> u64 {
        match self.tile_height {
            Some(h) if h > 0 => (self.height as u64).div_ceil(h as u64),
            _ => 0,
        }
    }

    pub fn tile_count(&self) -> usize {
        (self.tiles_across() * self.tiles_down()) as usize
    }

    /// Index of the tile containing level pixel `(x, y)`.
    ///
    /// Returns `None` when the pixel lies outside the image.
    pub fn tile_index(&self, x: u64, y: u64) -> Option<usize> {
        let (tw, th) = self.tile_size().ok()?;
        if x >= self.width as u64 || y >= self.height as u64 {
            return None;
        }
        let col = x / tw as u64;
        let row = y / th as u64;
        Some((row * self.tiles_across() + col) as usize)
    }

    /// File offset and byte count of a tile.
    pub fn tile_location(&self, index: usize) -> Option<(u64, u64)> {
        Some((
            *self.tile_offsets.get(index)?,
            *self.tile_byte_counts.get(index)?,
        ))
    }

    /// Known compression scheme, `None` for values outside the table.
    pub fn compression_scheme(&self) -> Option<Compression> {
        Compression::from_u16(self.compression)
    }
}

// =============================================================================
// TiffFile
// =============================================================================

/// Header plus every directory in the IFD chain, in file order.
#[derive(Debug, Clone)]
pub struct TiffFile {
    pub header: TiffHeader,
    pub directories: Vec<Directory>,
}

impl TiffFile {
    /// Read the header and walk the IFD chain.
    pub fn parse<R: RangeReader + ?Sized>(reader: &R) -> Result<Self, TiffError> {
        let header_len = BIGTIFF_HEADER_SIZE.min(reader.size() as usize);
        let header_bytes = reader.read_exact_at(0, header_len)?;
        let header = TiffHeader::parse(&header_bytes, reader.size())?;

        let mut directories = Vec::new();
        let mut visited = HashSet::new();
        let mut offset = header.first_ifd_offset;

        while offset != 0 {
            if directories.len() == MAX_IFDS {
                warn!(
                    slide = reader.identifier(),
                    limit = MAX_IFDS,
                    "IFD chain truncated"
                );
                break;
            }
            if !visited.insert(offset) || offset >= reader.size() {
                return Err(TiffError::InvalidIfdOffset(offset));
            }

            let count_bytes = reader.read_exact_at(offset, header.ifd_count_size())?;
            let entry_count = if header.is_bigtiff {
                header.byte_order.read_u64(&count_bytes)
            } else {
                header.byte_order.read_u16(&count_bytes) as u64
            };

            let ifd_size = Ifd::calculate_size(entry_count, &header);
            let ifd_bytes = reader.read_exact_at(offset, ifd_size)?;
            let ifd = Ifd::parse(&ifd_bytes, &header)?;

            let directory = Directory::load(reader, &header, &ifd, directories.len())?;
            directories.push(directory);

            offset = ifd.next_ifd_offset;
        }

        if directories.is_empty() {
            return Err(TiffError::InvalidIfdOffset(header.first_ifd_offset));
        }

        Ok(TiffFile {
            header,
            directories,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
