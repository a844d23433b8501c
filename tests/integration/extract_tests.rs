//! End-to-end region extraction tests.
//!
//! Tests verify:
//! - Level selection, crop geometry and stitching against known pixel patterns
//! - Native (uncompressed, JPEG) and block-codec paths produce the same region
//! - Each failure kind surfaces as its `ExtractError` variant
//! - Path-based extraction from a file on disk

use std::io::Write;

use wsi_region::codec::CodecContext;
use wsi_region::error::{CodecError, ExtractError};
use wsi_region::slide::{SlideReader, TiffSlideReader};
use wsi_region::tile::{ExtractionRequest, Layout, NarrowStrategy, RegionExtractor, Tile};
use wsi_region::ExtractConfig;

use super::test_utils::{
    flat_jpeg_tiles, flat_tile_color, init_tracing, j2k_pattern_slide, pattern_pixel,
    small_tile_plane_slide, small_tile_raw_slide, split_jpeg_tables, svs_description,
    two_level_raw_slide, ByteOrderType, CountingSlide, FakePlaneDecoder, IfdBuilder, TiffBuilder,
};

fn open(data: Vec<u8>) -> CountingSlide<TiffSlideReader<wsi_region::io::BytesRangeReader>> {
    CountingSlide::new(TiffSlideReader::from_bytes(data, "mem://slide").unwrap())
}

fn fake_context() -> CodecContext {
    CodecContext::with_decoder(Box::new(FakePlaneDecoder))
}

/// Assert every output pixel equals the pattern of `level` starting at
/// level pixel `(origin_x, origin_y)`.
fn assert_pattern(tile: &Tile, level: u32, origin_x: u64, origin_y: u64) {
    for y in 0..tile.side() {
        for x in 0..tile.side() {
            assert_eq!(
                tile.pixel(x, y),
                Some(pattern_pixel(level, origin_x + x as u64, origin_y + y as u64)),
                "output pixel ({}, {})",
                x,
                y
            );
        }
    }
}

// =============================================================================
// Native Path
// =============================================================================

#[test]
fn test_two_level_region_from_one_tile() {
    init_tracing();
    let context = CodecContext::native_only();
    let mut slide = open(two_level_raw_slide());

    let tile = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(300, 10, 100, 20))
        .unwrap();

    assert_eq!(slide.current_directory(), 1);
    assert_eq!(tile.side(), 100);
    assert_eq!(tile.layout(), Layout::Interleaved);
    assert_eq!(tile.layout().first_dim(), 'H');
    assert_eq!(tile.as_bytes().len(), 100 * 100 * 3);
    assert_eq!(slide.decoded_reads, 1);
    assert_eq!(slide.raw_reads, 0);

    // Level 1 crop starts at (300 / 2, 10 / 2)
    assert_pattern(&tile, 1, 150, 5);
}

#[test]
fn test_region_across_many_tiles() {
    let context = CodecContext::native_only();
    let mut slide = open(small_tile_raw_slide(ByteOrderType::LittleEndian, false));

    let tile = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(45, 37, 70, 40))
        .unwrap();

    assert_eq!(slide.current_directory(), 0);
    assert_eq!(tile.side(), 70);
    // 3 tile columns (19 + 32 + 19) by 5 tile rows (11 + 16 + 16 + 16 + 11)
    assert_eq!(slide.decoded_reads, 15);
    assert_pattern(&tile, 0, 45, 37);
}

#[test]
fn test_region_on_downsampled_level() {
    let context = CodecContext::native_only();
    let mut slide = open(small_tile_raw_slide(ByteOrderType::LittleEndian, false));

    let tile = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(90, 60, 50, 20))
        .unwrap();

    assert_eq!(slide.current_directory(), 1);
    assert_eq!(tile.side(), 50);
    assert_pattern(&tile, 1, 45, 30);
}

#[test]
fn test_byte_orders_and_bigtiff_agree() {
    let context = CodecContext::native_only();
    let request = ExtractionRequest::new(33, 70, 40, 40);

    for (order, bigtiff) in [
        (ByteOrderType::LittleEndian, false),
        (ByteOrderType::BigEndian, false),
        (ByteOrderType::LittleEndian, true),
        (ByteOrderType::BigEndian, true),
    ] {
        let mut slide = open(small_tile_raw_slide(order, bigtiff));
        let tile = RegionExtractor::new(&context)
            .extract_from(&mut slide, &request)
            .unwrap();
        assert_pattern(&tile, 0, 33, 70);
    }
}

#[test]
fn test_upsampling_request_uses_level_zero() {
    let context = CodecContext::native_only();
    let mut slide = open(small_tile_raw_slide(ByteOrderType::LittleEndian, false));

    // 80x from a 40x scan: target 0.5, side 100 * 40 / (80 - 0.01) = 50
    let tile = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(10, 20, 100, 80))
        .unwrap();

    assert_eq!(slide.current_directory(), 0);
    assert_eq!(tile.side(), 50);
    assert_pattern(&tile, 0, 10, 20);
}

#[test]
fn test_magnification_below_pyramid_uses_coarsest_level() {
    let context = CodecContext::native_only();
    let mut slide = open(small_tile_raw_slide(ByteOrderType::LittleEndian, false));

    // 5x wants downsample 8, the coarsest level is 4: side 20 * 40 / (4 * 5 - 0.01) = 40
    let tile = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(40, 8, 20, 5))
        .unwrap();

    assert_eq!(slide.current_directory(), 2);
    assert_eq!(tile.side(), 40);
    assert_pattern(&tile, 2, 10, 2);
}

#[test]
fn test_reader_reused_across_requests() {
    let context = CodecContext::native_only();
    let extractor = RegionExtractor::new(&context);
    let mut slide = open(small_tile_raw_slide(ByteOrderType::LittleEndian, false));

    let coarse = extractor
        .extract_from(&mut slide, &ExtractionRequest::new(0, 0, 16, 10))
        .unwrap();
    assert_eq!(slide.current_directory(), 2);
    assert_pattern(&coarse, 2, 0, 0);

    let fine = extractor
        .extract_from(&mut slide, &ExtractionRequest::new(8, 8, 16, 40))
        .unwrap();
    assert_eq!(slide.current_directory(), 0);
    assert_pattern(&fine, 0, 8, 8);
}

// =============================================================================
// JPEG Tiles
// =============================================================================

fn assert_close(actual: [u8; 3], expected: [u8; 3]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (*a as i32 - e as i32).abs() <= 8,
            "{:?} not close to {:?}",
            actual,
            expected
        );
    }
}

#[test]
fn test_jpeg_tiles_with_shared_tables() {
    let tiles = flat_jpeg_tiles(128, 64, 64, 64);
    let (tables, _) = split_jpeg_tables(&tiles[0]);
    let abbreviated: Vec<Vec<u8>> = tiles.iter().map(|t| split_jpeg_tables(t).1).collect();

    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::tiled_level(128, 64, 64, 64, 7)
                .description(&svs_description(40))
                .jpeg_tables(tables)
                .tiles(abbreviated),
        )
        .build();

    let context = CodecContext::native_only();
    let mut slide = open(data);
    let tile = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(32, 0, 64, 40))
        .unwrap();

    assert_eq!(tile.side(), 64);
    assert_eq!(slide.decoded_reads, 2);
    for y in [0, 31, 63] {
        assert_close(tile.pixel(0, y).unwrap(), flat_tile_color(0));
        assert_close(tile.pixel(31, y).unwrap(), flat_tile_color(0));
        assert_close(tile.pixel(32, y).unwrap(), flat_tile_color(1));
        assert_close(tile.pixel(63, y).unwrap(), flat_tile_color(1));
    }
}

#[test]
fn test_complete_jpeg_tiles() {
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::tiled_level(128, 128, 64, 64, 7)
                .description(&svs_description(20))
                .tiles(flat_jpeg_tiles(128, 128, 64, 64)),
        )
        .build();

    let context = CodecContext::native_only();
    let mut slide = open(data);
    let tile = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(60, 60, 8, 20))
        .unwrap();

    assert_eq!(slide.decoded_reads, 4);
    assert_close(tile.pixel(0, 0).unwrap(), flat_tile_color(0));
    assert_close(tile.pixel(7, 0).unwrap(), flat_tile_color(1));
    assert_close(tile.pixel(0, 7).unwrap(), flat_tile_color(2));
    assert_close(tile.pixel(7, 7).unwrap(), flat_tile_color(3));
}

// =============================================================================
// Block-Codec Path
// =============================================================================

#[test]
fn test_block_codec_region_is_planar() {
    init_tracing();
    let context = fake_context();
    let mut slide = open(small_tile_plane_slide(33003));

    let tile = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(45, 37, 70, 40))
        .unwrap();

    assert_eq!(tile.layout(), Layout::Planar);
    assert_eq!(tile.layout().first_dim(), 'C');
    assert_eq!(slide.raw_reads, 15);
    assert_eq!(slide.decoded_reads, 0);
    assert_pattern(&tile, 0, 45, 37);
}

#[test]
fn test_block_and_native_paths_agree() {
    let request = ExtractionRequest::new(90, 60, 50, 20);

    let native_context = CodecContext::native_only();
    let native = RegionExtractor::new(&native_context)
        .extract_from(
            &mut open(small_tile_raw_slide(ByteOrderType::LittleEndian, false)),
            &request,
        )
        .unwrap();

    let block_context = fake_context();
    for compression in [33003, 33005, 34712] {
        let block = RegionExtractor::new(&block_context)
            .extract_from(&mut open(small_tile_plane_slide(compression)), &request)
            .unwrap();

        assert_eq!(block.to_layout(Layout::Interleaved), native);
        assert_eq!(native.to_layout(Layout::Planar), block);
    }
}

#[test]
fn test_narrowing_strategies_agree() {
    let context = fake_context();
    let request = ExtractionRequest::new(3, 5, 150, 40);

    let extract = |narrowing| {
        let config = ExtractConfig {
            narrowing,
            ..Default::default()
        };
        RegionExtractor::new(&context)
            .with_config(config)
            .extract_from(&mut open(small_tile_plane_slide(33005)), &request)
            .unwrap()
    };

    let chunked = extract(NarrowStrategy::Chunked);
    let scalar = extract(NarrowStrategy::Scalar);
    assert_eq!(chunked, scalar);
    assert_pattern(&chunked, 0, 3, 5);
}

#[test]
fn test_jpeg2000_region_end_to_end() {
    init_tracing();
    let context = CodecContext::initialize();
    let mut slide = open(j2k_pattern_slide());

    // Side 6 * 40 / (40 - 0.01) = 6, crossing all four 8x4 tiles
    let tile = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(5, 1, 6, 40))
        .unwrap();

    assert_eq!(tile.side(), 6);
    assert_eq!(tile.layout(), Layout::Planar);
    assert_eq!(slide.raw_reads, 4);
    assert_eq!(slide.decoded_reads, 0);
    assert_pattern(&tile, 0, 5, 1);
}

#[test]
fn test_block_codec_without_decoder() {
    let context = CodecContext::native_only();
    let mut slide = open(small_tile_plane_slide(33003));

    let result = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(0, 0, 10, 40));

    assert!(matches!(
        result,
        Err(ExtractError::DecodeFailure(CodecError::MissingContext(_)))
    ));
    assert_eq!(slide.tile_reads(), 0);
}

#[test]
fn test_block_decode_failure() {
    // Native payloads fed to the plane decoder do not parse
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::tiled_level(16, 16, 16, 16, 34712)
                .description(&svs_description(40))
                .tiles(vec![vec![1, 2, 3]]),
        )
        .build();

    let context = fake_context();
    let result = RegionExtractor::new(&context)
        .extract_from(&mut open(data), &ExtractionRequest::new(0, 0, 8, 40));

    assert!(matches!(
        result,
        Err(ExtractError::DecodeFailure(CodecError::Header(_)))
    ));
}

// =============================================================================
// Failures
// =============================================================================

fn single_level(ifd: IfdBuilder) -> Vec<u8> {
    TiffBuilder::new().add_ifd(ifd).build()
}

fn raw_level() -> IfdBuilder {
    IfdBuilder::tiled_level(32, 32, 32, 32, 1).tiles(vec![vec![0; 32 * 32 * 3]])
}

fn extract_native(data: Vec<u8>, request: ExtractionRequest) -> Result<Tile, ExtractError> {
    let context = CodecContext::native_only();
    RegionExtractor::new(&context).extract_from(&mut open(data), &request)
}

#[test]
fn test_missing_magnification() {
    let request = ExtractionRequest::new(0, 0, 8, 20);

    for ifd in [
        raw_level(),
        raw_level().description("Aperio Image Library|MPP = 0.25"),
        raw_level().description("AppMag = 0|MPP = 0.25"),
        raw_level().description("AppMag = x40"),
    ] {
        assert!(matches!(
            extract_native(single_level(ifd), request),
            Err(ExtractError::MissingMagnification)
        ));
    }
}

#[test]
fn test_fractional_app_mag_truncates() {
    let data = single_level(raw_level().description("AppMag = 20.5"));
    let tile = extract_native(data, ExtractionRequest::new(0, 0, 8, 20)).unwrap();
    assert_eq!(tile.side(), 8);
}

#[test]
fn test_unsupported_sample_layouts() {
    let request = ExtractionRequest::new(0, 0, 8, 40);
    let described = || raw_level().description(&svs_description(40));

    for ifd in [
        described().shorts(258, vec![16, 16, 16]),
        described().short(277, 4),
        described().short(284, 2),
    ] {
        assert!(matches!(
            extract_native(single_level(ifd), request),
            Err(ExtractError::UnsupportedFormat { .. })
        ));
    }
}

#[test]
fn test_unsupported_compression_reads_nothing() {
    let data = single_level(
        IfdBuilder::tiled_level(32, 32, 32, 32, 5)
            .description(&svs_description(40))
            .tiles(vec![vec![0; 16]]),
    );
    let context = CodecContext::native_only();
    let mut slide = open(data);

    let result = RegionExtractor::new(&context)
        .extract_from(&mut slide, &ExtractionRequest::new(0, 0, 8, 40));

    assert!(matches!(result, Err(ExtractError::UnsupportedFormat { .. })));
    assert_eq!(slide.tile_reads(), 0);
}

#[test]
fn test_slide_without_tiled_levels() {
    let data = single_level(IfdBuilder::stripped(64, 64).description(&svs_description(40)));
    assert!(matches!(
        extract_native(data, ExtractionRequest::new(0, 0, 8, 20)),
        Err(ExtractError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_region_outside_level() {
    let context = CodecContext::native_only();

    // Starts past the right edge of the 512-pixel level 0
    let result = RegionExtractor::new(&context)
        .extract_from(&mut open(two_level_raw_slide()), &ExtractionRequest::new(600, 0, 10, 40));
    assert!(matches!(
        result,
        Err(ExtractError::RegionOutOfBounds { directory: 0, x: 600, y: 0 })
    ));

    // Starts inside but runs off the right edge
    let result = RegionExtractor::new(&context)
        .extract_from(&mut open(two_level_raw_slide()), &ExtractionRequest::new(500, 0, 100, 40));
    assert!(matches!(
        result,
        Err(ExtractError::RegionOutOfBounds { directory: 0, x: 756, y: 0 })
    ));
}

#[test]
fn test_invalid_requests() {
    for request in [
        ExtractionRequest::new(0, 0, 0, 20),
        ExtractionRequest::new(0, 0, 10, 0),
        ExtractionRequest::new(0, 0, 10, 20).with_tolerance(f32::NAN),
    ] {
        assert!(matches!(
            extract_native(two_level_raw_slide(), request),
            Err(ExtractError::InvalidRequest { .. })
        ));
    }
}

#[test]
fn test_invalid_config_leaves_reader_untouched() {
    let context = CodecContext::native_only();
    let mut slide = open(two_level_raw_slide());
    slide.set_directory(2).unwrap();

    let config = ExtractConfig {
        tolerance: 5.0,
        ..Default::default()
    };
    let result = RegionExtractor::new(&context)
        .with_config(config)
        .extract_from(&mut slide, &ExtractionRequest::new(0, 0, 10, 40));

    assert!(matches!(result, Err(ExtractError::InvalidRequest { .. })));
    assert_eq!(slide.current_directory(), 2);
    assert_eq!(slide.tile_reads(), 0);
}

#[test]
fn test_output_side_limit() {
    let context = CodecContext::native_only();
    let config = ExtractConfig {
        max_output_side: 64,
        ..Default::default()
    };

    let result = RegionExtractor::new(&context)
        .with_config(config)
        .extract_from(&mut open(two_level_raw_slide()), &ExtractionRequest::new(0, 0, 65, 40));

    assert!(matches!(result, Err(ExtractError::InvalidRequest { .. })));
}

// =============================================================================
// Path-Based Extraction
// =============================================================================

#[test]
fn test_extract_from_file() {
    let mut file = tempfile::Builder::new().suffix(".svs").tempfile().unwrap();
    file.write_all(&two_level_raw_slide()).unwrap();
    file.flush().unwrap();

    let context = CodecContext::native_only();
    let tile = wsi_region::extract(&context, file.path(), 300, 10, 100, 20).unwrap();

    assert_eq!(tile.side(), 100);
    assert_pattern(&tile, 1, 150, 5);

    let bytes = tile.into_vec();
    assert_eq!(bytes.len(), 100 * 100 * 3);
}

#[test]
fn test_extract_with_configured_tolerance() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&small_tile_raw_slide(ByteOrderType::LittleEndian, false))
        .unwrap();
    file.flush().unwrap();

    let context = CodecContext::native_only();

    // 11x wants downsample 3.64: level 2 (4.0) overshoots it by 0.36
    let default = RegionExtractor::new(&context)
        .extract(file.path(), 0, 0, 22, 11)
        .unwrap();
    // Falls back to level 1: 22 * 40 / (2 * 11 - 0.01) = 40.02
    assert_eq!(default.side(), 40);
    assert_pattern(&default, 1, 0, 0);

    let config = ExtractConfig {
        tolerance: 0.5,
        ..Default::default()
    };
    assert!(config.validate().is_ok());
    let loose = RegionExtractor::new(&context)
        .with_config(config)
        .extract(file.path(), 0, 0, 22, 11)
        .unwrap();
    // Level 2 matches: 22 * 40 / (4 * 11 - 0.01) = 20.004
    assert_eq!(loose.side(), 20);
    assert_pattern(&loose, 2, 0, 0);
}

#[test]
fn test_extract_missing_file() {
    let context = CodecContext::native_only();
    let result = wsi_region::extract(&context, "/no/such/dir/slide.svs", 0, 0, 10, 20);
    assert!(matches!(result, Err(ExtractError::FileNotFound { .. })));
}
