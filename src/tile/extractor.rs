//! Region extraction pipeline.
//!
//! ```text
//! request ──► AppMag (directory 0) ──► select_level ──► validate layout
//!                                                            │
//!                 Tile ◄── TileStitcher ◄── CropPlan ◄── CodecAdapter
//! ```

use std::path::Path;

use tracing::debug;

use crate::codec::{CodecAdapter, CodecContext};
use crate::config::{ExtractConfig, DEFAULT_TOLERANCE};
use crate::error::ExtractError;
use crate::format::tiff::validate_sample_layout;
use crate::format::SlideDescription;
use crate::slide::{SlideReader, TiffSlideReader};

use super::buffer::Tile;
use super::geometry::{CropPlan, PlanInputs};
use super::level::select_level;
use super::stitch::TileStitcher;

// =============================================================================
// ExtractionRequest
// =============================================================================

/// One region to extract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionRequest {
    /// Level-0 column of the region's top-left corner
    pub x: u64,

    /// Level-0 row of the region's top-left corner
    pub y: u64,

    /// Side of the region at `magnification`
    pub output_side: u32,

    /// Requested objective magnification (e.g. 20 for 20x)
    pub magnification: u32,

    /// Level match tolerance
    pub tolerance: f32,
}

impl ExtractionRequest {
    /// Request with the default tolerance.
    pub fn new(x: u64, y: u64, output_side: u32, magnification: u32) -> Self {
        ExtractionRequest {
            x,
            y,
            output_side,
            magnification,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn check(&self) -> Result<(), ExtractError> {
        let reason = if self.output_side == 0 {
            "output side must be greater than 0".to_string()
        } else if self.magnification == 0 {
            "magnification must be greater than 0".to_string()
        } else if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            format!("tolerance {} is not a finite non-negative value", self.tolerance)
        } else {
            return Ok(());
        };
        Err(ExtractError::InvalidRequest { reason })
    }
}

// =============================================================================
// RegionExtractor
// =============================================================================

/// Extracts regions using a shared codec context.
///
/// # Example
///
/// ```ignore
/// use wsi_region::codec::CodecContext;
/// use wsi_region::tile::RegionExtractor;
///
/// let context = CodecContext::initialize();
/// let tile = RegionExtractor::new(&context).extract("slide.svs", 4096, 2048, 224, 20)?;
/// assert_eq!(tile.as_bytes().len(), 224 * 224 * 3);
/// ```
#[derive(Debug, Clone)]
pub struct RegionExtractor<'a> {
    context: &'a CodecContext,
    config: ExtractConfig,
}

impl<'a> RegionExtractor<'a> {
    pub fn new(context: &'a CodecContext) -> Self {
        RegionExtractor {
            context,
            config: ExtractConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExtractConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    fn check_config(&self) -> Result<(), ExtractError> {
        self.config
            .validate()
            .map_err(|reason| ExtractError::InvalidRequest {
                reason: format!("invalid extraction config: {}", reason),
            })
    }

    /// Open the slide at `path` and extract one region.
    ///
    /// The configuration is checked before the file is opened. The slide is
    /// closed again before returning.
    pub fn extract(
        &self,
        path: impl AsRef<Path>,
        x: u64,
        y: u64,
        output_side: u32,
        magnification: u32,
    ) -> Result<Tile, ExtractError> {
        self.check_config()?;
        let mut slide = TiffSlideReader::open_path(path)?;
        let request = ExtractionRequest::new(x, y, output_side, magnification)
            .with_tolerance(self.config.tolerance);
        self.extract_from(&mut slide, &request)
    }

    /// Extract one region from an open slide.
    ///
    /// The reader is rewound to directory 0 first and left on the selected
    /// level afterwards. An invalid [`ExtractConfig`] fails with
    /// `InvalidRequest` before the reader is touched.
    pub fn extract_from<S: SlideReader + ?Sized>(
        &self,
        slide: &mut S,
        request: &ExtractionRequest,
    ) -> Result<Tile, ExtractError> {
        self.check_config()?;
        request.check()?;
        slide.set_directory(0)?;

        let scan_magnification = slide
            .directory()
            .description
            .as_deref()
            .map(SlideDescription::parse)
            .ok_or(ExtractError::MissingMagnification)?
            .app_mag()?;

        let target = scan_magnification as f32 / request.magnification as f32;
        let downsample = select_level(slide, target, request.tolerance)?;

        let directory = slide.directory();
        validate_sample_layout(directory)?;
        let (tile_width, tile_height) = directory.tile_size()?;
        let level = directory.index;

        let mut adapter = CodecAdapter::select(directory, self.context, self.config.narrowing)?;

        let plan = CropPlan::compute(&PlanInputs {
            downsample,
            tile_width,
            tile_height,
            scan_magnification,
            magnification: request.magnification,
            requested_side: request.output_side,
            x: request.x,
            y: request.y,
            max_output_side: self.config.max_output_side,
        })?;

        debug!(
            slide = slide.identifier(),
            level,
            downsample,
            origin_x = plan.origin_x,
            origin_y = plan.origin_y,
            crop_left = plan.crop_left,
            crop_top = plan.crop_top,
            output_side = plan.output_side,
            "Planned region"
        );

        let mut tile = Tile::allocate(plan.output_side, adapter.layout())?;
        let tiles_read = TileStitcher::new(&plan).stitch(slide, &mut adapter, &mut tile)?;

        debug!(
            slide = slide.identifier(),
            x = request.x,
            y = request.y,
            magnification = request.magnification,
            level,
            tiles_read,
            layout = ?tile.layout(),
            "Extracted region"
        );

        Ok(tile)
    }
}
