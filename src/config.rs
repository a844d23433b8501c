//! Extraction settings.
//!
//! [`ExtractConfig`] can be filled three ways:
//! - flattened into a host application's clap parser (`--tolerance`, ...)
//! - environment variables with the `WSI_` prefix
//! - JSON, with every field optional
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use wsi_region::config::ExtractConfig;
//!
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     extract: ExtractConfig,
//! }
//!
//! let cli = Cli::parse();
//! cli.extract.validate()?;
//! ```
//!
//! # Environment Variables
//!
//! - `WSI_MATCH_TOLERANCE` - Level match tolerance (default: 0.2)
//! - `WSI_MAX_OUTPUT_SIDE` - Largest output side in pixels (default: 16384)
//! - `WSI_NARROWING` - Block-codec narrowing, `chunked` or `scalar` (default: chunked)

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::tile::NarrowStrategy;

// =============================================================================
// Default Values
// =============================================================================

/// Default allowed difference between a level's downsample and the target.
pub const DEFAULT_TOLERANCE: f32 = 0.2;

/// Default largest output side in pixels.
pub const DEFAULT_MAX_OUTPUT_SIDE: u32 = 16384;

fn default_tolerance() -> f32 {
    DEFAULT_TOLERANCE
}

fn default_max_output_side() -> u32 {
    DEFAULT_MAX_OUTPUT_SIDE
}

// =============================================================================
// ExtractConfig
// =============================================================================

/// Settings shared by every request of a `RegionExtractor`.
#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Largest difference between a level's downsample and the target
    /// downsample that still counts as a match.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE, env = "WSI_MATCH_TOLERANCE")]
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Largest output side in pixels. Larger regions are rejected before
    /// anything is allocated.
    #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_SIDE, env = "WSI_MAX_OUTPUT_SIDE")]
    #[serde(default = "default_max_output_side")]
    pub max_output_side: u32,

    /// How JPEG 2000 samples are narrowed to bytes.
    #[arg(long, value_enum, default_value_t = NarrowStrategy::Chunked, env = "WSI_NARROWING")]
    #[serde(default)]
    pub narrowing: NarrowStrategy,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            tolerance: DEFAULT_TOLERANCE,
            max_output_side: DEFAULT_MAX_OUTPUT_SIDE,
            narrowing: NarrowStrategy::default(),
        }
    }
}

impl ExtractConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.tolerance.is_finite() || !(0.0..1.0).contains(&self.tolerance) {
            return Err(format!(
                "tolerance must be in [0, 1), got {}",
                self.tolerance
            ));
        }

        if self.max_output_side == 0 {
            return Err("max_output_side must be greater than 0".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
