//! TIFF-backed slide reader.
//!
//! Parses the whole IFD chain once when the slide is opened, then serves
//! tiles from the current directory through any [`RangeReader`].

use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::error::TiffError;
use crate::format::jpeg::decode_tile_rgb;
use crate::format::tiff::{compression_name, Compression, Directory, TiffFile, TiffHeader};
use crate::format::SlideDescription;
use crate::io::{BytesRangeReader, FileRangeReader, RangeReader};

use super::reader::{LevelInfo, SlideReader};

/// Bytes per decoded pixel (8-bit RGB)
const RGB_BYTES: usize = 3;

// =============================================================================
// TiffSlideReader
// =============================================================================

/// Reader for pyramidal TIFF and SVS slides.
///
/// Opening positions the reader at directory 0.
#[derive(Debug)]
pub struct TiffSlideReader<R: RangeReader> {
    reader: R,
    tiff: TiffFile,
    current: usize,

    /// Compressed payload reused across `read_tile` calls
    payload: Vec<u8>,
}

impl TiffSlideReader<FileRangeReader> {
    /// Open a slide file from disk.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, TiffError> {
        let reader = FileRangeReader::open(path)?;
        Self::open(reader)
    }
}

impl TiffSlideReader<BytesRangeReader> {
    /// Open a slide already held in memory.
    pub fn from_bytes(
        data: impl Into<Bytes>,
        identifier: impl Into<String>,
    ) -> Result<Self, TiffError> {
        Self::open(BytesRangeReader::new(data, identifier))
    }
}

impl<R: RangeReader> TiffSlideReader<R> {
    /// Parse the TIFF structure behind `reader`.
    pub fn open(reader: R) -> Result<Self, TiffError> {
        let tiff = TiffFile::parse(&reader)?;

        debug!(
            slide = reader.identifier(),
            directories = tiff.directories.len(),
            bigtiff = tiff.header.is_bigtiff,
            "Opened slide"
        );

        Ok(TiffSlideReader {
            reader,
            tiff,
            current: 0,
            payload: Vec::new(),
        })
    }

    /// Get the TIFF header.
    pub fn header(&self) -> &TiffHeader {
        &self.tiff.header
    }

    /// All directories in chain order.
    pub fn directories(&self) -> &[Directory] {
        &self.tiff.directories
    }

    /// Tiled directories with their downsample relative to directory 0.
    pub fn levels(&self) -> Vec<LevelInfo> {
        let level0_width = self.tiff.directories[0].width;
        self.tiff
            .directories
            .iter()
            .filter_map(|d| LevelInfo::from_directory(d, level0_width))
            .collect()
    }

    /// Parsed ImageDescription of directory 0, if it has one.
    pub fn description(&self) -> Option<SlideDescription> {
        self.tiff.directories[0]
            .description
            .as_deref()
            .map(SlideDescription::parse)
    }

    fn current_dir(&self) -> &Directory {
        &self.tiff.directories[self.current]
    }

    /// File location of the tile containing level pixel `(x, y)`.
    fn locate_tile(&self, x: u64, y: u64) -> Result<(u64, usize), TiffError> {
        let directory = self.current_dir();
        directory.tile_size()?;

        let out_of_range = TiffError::TileOutOfRange {
            directory: directory.index,
            x,
            y,
        };
        let (offset, count) = directory
            .tile_index(x, y)
            .and_then(|index| directory.tile_location(index))
            .ok_or(out_of_range)?;

        let len = usize::try_from(count).map_err(|_| TiffError::InvalidTagValue {
            tag: "TileByteCounts",
            message: format!("tile of {} bytes is too large", count),
        })?;

        Ok((offset, len))
    }
}

impl<R: RangeReader> SlideReader for TiffSlideReader<R> {
    fn identifier(&self) -> &str {
        self.reader.identifier()
    }

    fn directory_count(&self) -> usize {
        self.tiff.directories.len()
    }

    fn current_directory(&self) -> usize {
        self.current
    }

    fn set_directory(&mut self, index: usize) -> Result<(), TiffError> {
        if index >= self.tiff.directories.len() {
            return Err(TiffError::DirectoryOutOfRange {
                index,
                count: self.tiff.directories.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    fn read_next_directory(&mut self) -> bool {
        if self.current + 1 < self.tiff.directories.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn directory_at(&self, index: usize) -> Option<&Directory> {
        self.tiff.directories.get(index)
    }

    fn directory(&self) -> &Directory {
        self.current_dir()
    }

    fn read_raw_tile(&mut self, x: u64, y: u64, buf: &mut Vec<u8>) -> Result<(), TiffError> {
        let (offset, len) = self.locate_tile(x, y)?;
        let data = self.reader.read_exact_at(offset, len)?;

        buf.clear();
        buf.extend_from_slice(&data);
        Ok(())
    }

    fn read_tile(&mut self, x: u64, y: u64, buf: &mut Vec<u8>) -> Result<(), TiffError> {
        let directory = self.current_dir();
        let (tile_width, tile_height) = directory.tile_size()?;
        let compression = directory.compression;

        if directory.bits_per_sample != 8 || directory.samples_per_pixel != 3 {
            return Err(TiffError::TileDecode(format!(
                "decoded reads need 8-bit RGB, directory {} has {} bits x {} samples",
                directory.index, directory.bits_per_sample, directory.samples_per_pixel
            )));
        }

        let mut payload = std::mem::take(&mut self.payload);
        let result = match Compression::from_u16(compression) {
            Some(Compression::None) => self.read_raw_tile(x, y, &mut payload).and_then(|()| {
                let expected = tile_width as usize * tile_height as usize * RGB_BYTES;
                if payload.len() < expected {
                    return Err(TiffError::TileDecode(format!(
                        "uncompressed tile holds {} bytes, expected {}",
                        payload.len(),
                        expected
                    )));
                }
                buf.clear();
                buf.extend_from_slice(&payload[..expected]);
                Ok(())
            }),
            Some(Compression::Jpeg) => self.read_raw_tile(x, y, &mut payload).and_then(|()| {
                let tables = self.current_dir().jpeg_tables.as_deref();
                decode_tile_rgb(tables, &payload, tile_width, tile_height, buf)
            }),
            _ => Err(TiffError::UnsupportedCompression(compression_name(compression))),
        };
        self.payload = payload;

        result
    }
}

// =============================================================================
// Tests
// =============================================================================
