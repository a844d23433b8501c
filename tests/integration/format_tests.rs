//! Format-specific integration tests.
//!
//! Tests verify:
//! - TIFF parser handles little-endian and big-endian files
//! - BigTIFF files are parsed correctly
//! - Level metadata and the SVS description are exposed by the reader
//! - SVS JPEGTables are merged into abbreviated tiles
//! - Tile access errors for stripped directories and out-of-grid pixels

use wsi_region::error::TiffError;
use wsi_region::format::tiff::ByteOrder;
use wsi_region::slide::{SlideReader, TiffSlideReader};

use super::test_utils::{
    encode_rgb_jpeg, flat_jpeg_tiles, flat_tile_color, pattern_pixel, small_tile_plane_slide,
    small_tile_raw_slide, split_jpeg_tables, svs_description, two_level_raw_slide,
    ByteOrderType, IfdBuilder, TiffBuilder,
};

fn open(data: Vec<u8>) -> TiffSlideReader<wsi_region::io::BytesRangeReader> {
    TiffSlideReader::from_bytes(data, "mem://slide").unwrap()
}

// =============================================================================
// TIFF Byte Order Tests
// =============================================================================

#[test]
fn test_little_endian_tiff() {
    let data = small_tile_raw_slide(ByteOrderType::LittleEndian, false);
    assert_eq!(&data[0..2], b"II");

    let slide = open(data);
    assert_eq!(slide.header().byte_order, ByteOrder::LittleEndian);
    assert!(!slide.header().is_bigtiff);
    assert_eq!(slide.directory_count(), 3);
}

#[test]
fn test_big_endian_tiff() {
    let data = small_tile_raw_slide(ByteOrderType::BigEndian, false);
    assert_eq!(&data[0..2], b"MM");

    let slide = open(data);
    assert_eq!(slide.header().byte_order, ByteOrder::BigEndian);
    assert_eq!(slide.directory_count(), 3);
    assert_eq!(slide.directory().width, 256);
    assert_eq!(slide.directory().tile_size().unwrap(), (32, 16));
}

#[test]
fn test_bigtiff_both_byte_orders() {
    for order in [ByteOrderType::LittleEndian, ByteOrderType::BigEndian] {
        let slide = open(small_tile_raw_slide(order, true));
        assert!(slide.header().is_bigtiff);
        assert_eq!(slide.directory_count(), 3);
        assert_eq!(slide.directories()[2].width, 64);
    }
}

#[test]
fn test_not_a_tiff() {
    let result = TiffSlideReader::from_bytes(b"not a tiff file".to_vec(), "mem://junk");
    assert!(result.is_err());
}

// =============================================================================
// Levels and Description
// =============================================================================

#[test]
fn test_levels_skip_stripped_directories() {
    let slide = open(two_level_raw_slide());
    assert_eq!(slide.directory_count(), 3);

    let levels = slide.levels();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].directory, 0);
    assert_eq!(levels[0].downsample, 1.0);
    assert_eq!(levels[1].directory, 1);
    assert_eq!(levels[1].downsample, 2.0);
    assert_eq!((levels[1].tiles_across, levels[1].tiles_down), (1, 1));
}

#[test]
fn test_svs_description() {
    let slide = open(two_level_raw_slide());
    let description = slide.description().unwrap();

    assert_eq!(description.app_mag().unwrap(), 40);
    assert_eq!(description.mpp, Some(0.252));
    assert_eq!(description.vendor.as_deref(), Some("Aperio"));
    assert_eq!(description.property("MPP"), Some("0.2520"));
}

#[test]
fn test_directory_cursor() {
    let mut slide = open(two_level_raw_slide());
    assert_eq!(slide.current_directory(), 0);

    assert!(slide.read_next_directory());
    assert!(slide.read_next_directory());
    assert_eq!(slide.current_directory(), 2);
    assert!(!slide.read_next_directory());
    assert_eq!(slide.current_directory(), 2);

    slide.set_directory(1).unwrap();
    assert_eq!(slide.directory().width, 256);
    assert_eq!(slide.directory_at(0).map(|d| d.width), Some(512));

    let err = slide.set_directory(3).unwrap_err();
    assert!(matches!(
        err,
        TiffError::DirectoryOutOfRange { index: 3, count: 3 }
    ));
    assert_eq!(slide.current_directory(), 1);
}

// =============================================================================
// Tile Reads
// =============================================================================

#[test]
fn test_read_uncompressed_tile() {
    let mut slide = open(small_tile_raw_slide(ByteOrderType::BigEndian, true));
    slide.set_directory(1).unwrap();

    // Pixel (40, 20) lies in tile column 1, row 1 of level 1
    let mut buf = Vec::new();
    slide.read_tile(40, 20, &mut buf).unwrap();
    assert_eq!(buf.len(), 32 * 16 * 3);

    for (x, y) in [(0usize, 0usize), (31, 0), (5, 15)] {
        let at = (y * 32 + x) * 3;
        assert_eq!(
            &buf[at..at + 3],
            &pattern_pixel(1, 32 + x as u64, 16 + y as u64)[..]
        );
    }
}

#[test]
fn test_svs_with_jpeg_tables() {
    let tiles = flat_jpeg_tiles(128, 64, 64, 64);
    let (tables, _) = split_jpeg_tables(&tiles[0]);
    let abbreviated: Vec<Vec<u8>> = tiles.iter().map(|t| split_jpeg_tables(t).1).collect();

    let mut slide = open(
        TiffBuilder::new()
            .add_ifd(
                IfdBuilder::tiled_level(128, 64, 64, 64, 7)
                    .description(&svs_description(20))
                    .jpeg_tables(tables)
                    .tiles(abbreviated),
            )
            .build(),
    );
    assert!(slide.directory().jpeg_tables.is_some());

    let mut buf = Vec::new();
    slide.read_tile(100, 10, &mut buf).unwrap();
    assert_eq!(buf.len(), 64 * 64 * 3);

    let expected = flat_tile_color(1);
    for (channel, value) in buf[..3].iter().enumerate() {
        assert!((*value as i32 - expected[channel] as i32).abs() <= 8);
    }
}

#[test]
fn test_complete_jpeg_tile_without_tables() {
    let color = [200, 40, 90];
    let mut slide = open(
        TiffBuilder::new()
            .add_ifd(
                IfdBuilder::tiled_level(16, 16, 16, 16, 7)
                    .tiles(vec![encode_rgb_jpeg(16, 16, color)]),
            )
            .build(),
    );

    let mut buf = Vec::new();
    slide.read_tile(0, 0, &mut buf).unwrap();
    assert_eq!(buf.len(), 16 * 16 * 3);
    for (channel, value) in buf[..3].iter().enumerate() {
        assert!((*value as i32 - color[channel] as i32).abs() <= 8);
    }
}

#[test]
fn test_raw_read_returns_stored_bytes() {
    let data = small_tile_plane_slide(33003);
    let mut slide = open(data);

    let mut raw = Vec::new();
    slide.read_raw_tile(0, 0, &mut raw).unwrap();
    // 12-byte header and 3 planes of 32x16 i32 samples
    assert_eq!(raw.len(), 12 + 3 * 32 * 16 * 4);

    // Block-codec tiles are not natively decodable
    let mut buf = Vec::new();
    let err = slide.read_tile(0, 0, &mut buf).unwrap_err();
    assert!(matches!(err, TiffError::UnsupportedCompression(_)));
}

// =============================================================================
// Tile Access Errors
// =============================================================================

#[test]
fn test_stripped_directory_is_not_tiled() {
    let mut slide = open(two_level_raw_slide());
    slide.set_directory(2).unwrap();

    let mut buf = Vec::new();
    let err = slide.read_tile(0, 0, &mut buf).unwrap_err();
    assert!(matches!(err, TiffError::NotTiled(2)));
}

#[test]
fn test_pixel_outside_tile_grid() {
    let mut slide = open(two_level_raw_slide());
    slide.set_directory(1).unwrap();

    let mut buf = Vec::new();
    let err = slide.read_raw_tile(0, 256, &mut buf).unwrap_err();
    assert!(matches!(
        err,
        TiffError::TileOutOfRange {
            directory: 1,
            x: 0,
            y: 256
        }
    ));
}
