//! Region extraction engine.
//!
//! Turns "a `side` x `side` region at level-0 `(x, y)` seen at `M`x" into a
//! dense RGB buffer, reading only the tiles of one pyramid level that the
//! region overlaps.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            RegionExtractor              │
//! │  select_level ─► CropPlan ─► Stitcher   │
//! └──────────┬─────────────────────┬────────┘
//!            │                     │
//!            ▼                     ▼
//! ┌──────────────────┐   ┌──────────────────┐
//! │   SlideReader    │   │   CodecAdapter   │
//! │ (level metadata) │   │ native │ block   │
//! └──────────────────┘   └──────────────────┘
//! ```
//!
//! # Components
//!
//! - [`select_level`]: picks the pyramid level for a target downsample
//! - [`CropPlan`]: level-space origin, crop offsets and output side
//! - [`StitchSteps`] / [`TileStitcher`]: per-tile copy rectangles
//! - [`narrow`]: `i32` to `u8` sample narrowing for the block-codec path
//! - [`Tile`]: the returned buffer and its [`Layout`]

mod buffer;
mod extractor;
mod geometry;
mod level;
mod narrow;
mod stitch;

pub use buffer::{Layout, Tile, CHANNELS};
pub use extractor::{ExtractionRequest, RegionExtractor};
pub use geometry::{output_side, CropPlan, PlanInputs, OUTPUT_SIDE_EPSILON};
pub use level::select_level;
pub use narrow::{narrow, NarrowStrategy, NARROW_LANES};
pub use stitch::{StitchSteps, TileStep, TileStitcher};
