//! Crop geometry of a region against a level's tile grid.
//!
//! A request names a level-0 coordinate and an output side at the caller's
//! magnification. Once a level is chosen, the region is re-expressed in that
//! level's pixel space:
//!
//! ```text
//!   level pixels                       tile grid (tile_width x tile_height)
//!   origin = floor(x / d, y / d)       +---------+---------+
//!                                      |  crop   |         |
//!   output side O =                    |  +------+---.     |
//!     T * S / (d * M - 0.01)           +--|------+---|-----+
//!                                      |  '----------'     |
//!                                      +---------+---------+
//! ```

use crate::error::ExtractError;

/// Subtracted from the effective downsample before dividing.
pub const OUTPUT_SIDE_EPSILON: f64 = 0.01;

/// Where a region sits in the selected level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPlan {
    /// Downsample of the selected level
    pub downsample: f32,

    /// Level-space column of the region's top-left pixel
    pub origin_x: u64,

    /// Level-space row of the region's top-left pixel
    pub origin_y: u64,

    /// Columns to skip in the first tile column
    pub crop_left: u32,

    /// Rows to skip in the first tile row
    pub crop_top: u32,

    pub tile_width: u32,
    pub tile_height: u32,

    /// Side of the square output in pixels
    pub output_side: u32,
}

/// Inputs to [`CropPlan::compute`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanInputs {
    pub downsample: f32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub scan_magnification: u32,
    pub magnification: u32,
    pub requested_side: u32,
    pub x: u64,
    pub y: u64,
    pub max_output_side: u32,
}

impl CropPlan {
    pub fn compute(inputs: &PlanInputs) -> Result<Self, ExtractError> {
        if inputs.tile_width == 0 || inputs.tile_height == 0 {
            return Err(ExtractError::UnsupportedFormat {
                reason: "level has zero tile size".to_string(),
            });
        }

        let output_side = output_side(
            inputs.requested_side,
            inputs.scan_magnification,
            inputs.downsample,
            inputs.magnification,
        )?;
        if output_side > inputs.max_output_side {
            return Err(ExtractError::InvalidRequest {
                reason: format!(
                    "output side {} exceeds the limit of {}",
                    output_side, inputs.max_output_side
                ),
            });
        }

        let origin_x = (inputs.x as f32 / inputs.downsample) as u64;
        let origin_y = (inputs.y as f32 / inputs.downsample) as u64;

        Ok(CropPlan {
            downsample: inputs.downsample,
            origin_x,
            origin_y,
            crop_left: (origin_x % inputs.tile_width as u64) as u32,
            crop_top: (origin_y % inputs.tile_height as u64) as u32,
            tile_width: inputs.tile_width,
            tile_height: inputs.tile_height,
            output_side,
        })
    }

    /// Level-space pixel that addresses tile `(col, row)` of the region.
    pub fn tile_origin(&self, col: u32, row: u32) -> (u64, u64) {
        (
            self.origin_x + col as u64 * self.tile_width as u64,
            self.origin_y + row as u64 * self.tile_height as u64,
        )
    }
}

/// Side of the output square for a level with downsample `downsample`.
pub fn output_side(
    requested_side: u32,
    scan_magnification: u32,
    downsample: f32,
    magnification: u32,
) -> Result<u32, ExtractError> {
    let numerator = requested_side as u64 * scan_magnification as u64;
    let denominator = (downsample * magnification as f32) as f64 - OUTPUT_SIDE_EPSILON;
    let side = (numerator as f64 / denominator).trunc();

    if !side.is_finite() || side < 1.0 {
        return Err(ExtractError::InvalidRequest {
            reason: format!(
                "side {} at {}x from a {}x scan with downsample {} gives no output",
                requested_side, magnification, scan_magnification, downsample
            ),
        });
    }
    if side > u32::MAX as f64 {
        return Err(ExtractError::InvalidRequest {
            reason: format!("output side {} is too large", side),
        });
    }

    Ok(side as u32)
}

// =============================================================================
// Tests
// =============================================================================
