//! Stitching source tiles into the output square.
//!
//! The output is filled one tile-grid cell at a time with two pixel
//! "budgets": `y_budget` is the number of output rows still to fill and
//! `x_budget` the number of columns still to fill in the current row group.
//! The first row and column of tiles are cropped by the plan's offsets;
//! every later tile starts at its own origin. Each step copies the smaller
//! of what the tile has left and what the budget still needs, so the output
//! is covered exactly once.
//!
//! ```text
//!   tile (0, 0)   tile (1, 0)
//!   +-----------+-----------+
//!   |  crop_top |           |
//!   |    +------+----+      |
//!   |    |  0   | 1  |      |   row group 0
//!   +----+------+----+------+
//!   |    |  2   | 3  |      |   row group 1
//!   |    +------+----+      |
//!   +-----------+-----------+
//!   crop_left
//! ```

use crate::codec::CodecAdapter;
use crate::error::ExtractError;
use crate::slide::SlideReader;

use super::buffer::Tile;
use super::geometry::CropPlan;

// =============================================================================
// Steps
// =============================================================================

/// One source tile's contribution to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileStep {
    /// Tile column relative to the region's first tile
    pub col: u32,

    /// Tile row relative to the region's first tile
    pub row: u32,

    /// First source column to copy
    pub src_left: u32,

    /// First source row to copy
    pub src_top: u32,

    /// Columns to copy
    pub copy_width: u32,

    /// Rows to copy
    pub copy_height: u32,

    /// Offset of the first destination pixel in one output plane
    pub dest_offset: usize,
}

/// Row-major iterator over the steps that fill a [`CropPlan`].
#[derive(Debug, Clone)]
pub struct StitchSteps {
    side: u32,
    tile_width: u32,
    tile_height: u32,
    crop_left: u32,
    crop_top: u32,

    row: u32,
    col: u32,
    y_budget: u32,
    x_budget: u32,
    row_count: u32,
}

impl StitchSteps {
    pub fn new(plan: &CropPlan) -> Self {
        let mut steps = StitchSteps {
            side: plan.output_side,
            tile_width: plan.tile_width,
            tile_height: plan.tile_height,
            crop_left: plan.crop_left,
            crop_top: plan.crop_top,
            row: 0,
            col: 0,
            y_budget: plan.output_side,
            x_budget: plan.output_side,
            row_count: 0,
        };
        steps.row_count = steps.rows_in_group();
        steps
    }

    fn rows_in_group(&self) -> u32 {
        let available = if self.row == 0 {
            self.tile_height - self.crop_top
        } else {
            self.tile_height
        };
        available.min(self.y_budget)
    }
}

impl Iterator for StitchSteps {
    type Item = TileStep;

    fn next(&mut self) -> Option<TileStep> {
        if self.y_budget == 0 {
            return None;
        }

        let (src_left, available) = if self.col == 0 {
            (self.crop_left, self.tile_width - self.crop_left)
        } else {
            (0, self.tile_width)
        };
        let copy_width = available.min(self.x_budget);
        let side = self.side as usize;

        let step = TileStep {
            col: self.col,
            row: self.row,
            src_left,
            src_top: if self.row == 0 { self.crop_top } else { 0 },
            copy_width,
            copy_height: self.row_count,
            dest_offset: (side - self.y_budget as usize) * side
                + (side - self.x_budget as usize),
        };

        self.x_budget -= copy_width;
        self.col += 1;
        if self.x_budget == 0 {
            self.y_budget -= self.row_count;
            self.row += 1;
            self.col = 0;
            self.x_budget = self.side;
            self.row_count = self.rows_in_group();
        }

        Some(step)
    }
}

// =============================================================================
// TileStitcher
// =============================================================================

/// Drives a [`CodecAdapter`] over every step of a plan.
#[derive(Debug, Clone, Copy)]
pub struct TileStitcher<'p> {
    plan: &'p CropPlan,
}

impl<'p> TileStitcher<'p> {
    pub fn new(plan: &'p CropPlan) -> Self {
        TileStitcher { plan }
    }

    pub fn steps(&self) -> StitchSteps {
        StitchSteps::new(self.plan)
    }

    /// Fill `out` from the slide's current directory.
    ///
    /// Returns the number of source tiles read.
    pub fn stitch<S: SlideReader + ?Sized>(
        &self,
        slide: &mut S,
        adapter: &mut CodecAdapter<'_>,
        out: &mut Tile,
    ) -> Result<usize, ExtractError> {
        let mut tiles_read = 0;
        for step in self.steps() {
            let (x, y) = self.plan.tile_origin(step.col, step.row);
            adapter.load(slide, x, y)?;
            adapter.copy_step(&step, self.plan, out)?;
            tiles_read += 1;
        }
        Ok(tiles_read)
    }
}

// =============================================================================
// Tests
// =============================================================================
