//! JPEG tile decoding.
//!
//! SVS files store tiles as "abbreviated JPEG streams": each tile lacks the
//! quantization (DQT) and Huffman (DHT) tables, which live once in the
//! directory's `JPEGTables` tag. Before a tile can be decoded the two are
//! spliced together:
//!
//! ```text
//! tables: SOI DQT DHT ... EOI
//! tile:   SOI SOS <scan data> EOI
//! merged: SOI DQT DHT ... SOS <scan data> EOI
//! ```
//!
//! Decoded tiles are handed to the extraction engine as interleaved RGB.

use std::io::Cursor;

use bytes::{Bytes, BytesMut};
use image::{ImageFormat, ImageReader};

use crate::error::TiffError;

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Define Huffman Table marker
pub const DHT: [u8; 2] = [0xFF, 0xC4];

/// Define Quantization Table marker
pub const DQT: [u8; 2] = [0xFF, 0xDB];

/// Start Of Scan marker
pub const SOS: [u8; 2] = [0xFF, 0xDA];

// =============================================================================
// Stream analysis
// =============================================================================

/// Whether a stream reaches its scan without defining any tables.
///
/// Marker segments between SOI and SOS are skipped by their length field.
pub fn is_abbreviated_stream(data: &[u8]) -> bool {
    if data.len() < 4 || data[0..2] != SOI {
        return false;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = [data[pos], data[pos + 1]];
        if marker == DQT || marker == DHT {
            return false;
        }
        if marker == SOS {
            return true;
        }

        // Standalone markers carry no length
        let standalone = matches!(marker[1], 0x00 | 0x01 | 0xD0..=0xD9 | 0xFF);
        if !standalone && pos + 3 < data.len() {
            let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            pos += 2 + length;
        } else {
            pos += 2;
        }
    }

    false
}

// =============================================================================
// Table merging
// =============================================================================

/// Splice `JPEGTables` in front of an abbreviated tile stream.
///
/// The tables' trailing EOI and the tile's leading SOI are dropped.
pub fn merge_jpeg_tables(tables: &[u8], tile_data: &[u8]) -> Bytes {
    if tables.is_empty() {
        return Bytes::copy_from_slice(tile_data);
    }
    if tile_data.is_empty() {
        return Bytes::new();
    }

    let tables_end = if tables.ends_with(&EOI) {
        tables.len() - 2
    } else {
        tables.len()
    };
    let tile_start = if tile_data.starts_with(&SOI) { 2 } else { 0 };

    let mut merged = BytesMut::with_capacity(tables_end + tile_data.len() - tile_start);
    merged.extend_from_slice(&tables[..tables_end]);
    merged.extend_from_slice(&tile_data[tile_start..]);
    merged.freeze()
}

/// Produce a self-contained JPEG stream for a tile.
///
/// Tables are merged only when the tile is abbreviated and the directory
/// carries `JPEGTables`; anything else is returned unchanged.
pub fn prepare_tile_jpeg(tables: Option<&[u8]>, tile_data: &[u8]) -> Bytes {
    match tables {
        Some(tables) if is_abbreviated_stream(tile_data) => merge_jpeg_tables(tables, tile_data),
        _ => Bytes::copy_from_slice(tile_data),
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode one JPEG tile into interleaved 8-bit RGB.
///
/// `out` is cleared and refilled with exactly `width * height * 3` bytes.
/// A decoded image whose dimensions differ from the directory's tile size is
/// a decode error.
pub fn decode_tile_rgb(
    tables: Option<&[u8]>,
    tile_data: &[u8],
    width: u32,
    height: u32,
    out: &mut Vec<u8>,
) -> Result<(), TiffError> {
    let stream = prepare_tile_jpeg(tables, tile_data);

    let image = ImageReader::with_format(Cursor::new(&stream[..]), ImageFormat::Jpeg)
        .decode()
        .map_err(|e| TiffError::TileDecode(e.to_string()))?
        .into_rgb8();

    if image.dimensions() != (width, height) {
        return Err(TiffError::TileDecode(format!(
            "decoded tile is {}x{}, expected {}x{}",
            image.width(),
            image.height(),
            width,
            height
        )));
    }

    out.clear();
    out.extend_from_slice(image.as_raw());
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
