//! Sample layout validation.
//!
//! The extraction engine only handles 8-bit RGB stored with contiguous
//! components. Levels outside that subset are rejected before any tile is
//! read.

use thiserror::Error;
use tracing::error;

use crate::error::ExtractError;

use super::directory::Directory;

// =============================================================================
// Constants
// =============================================================================

/// PlanarConfiguration value for interleaved (chunky) samples
pub const PLANAR_CONTIGUOUS: u16 = 1;

/// Required bits per sample
pub const SUPPORTED_BITS_PER_SAMPLE: u16 = 8;

/// Required samples per pixel (RGB)
pub const SUPPORTED_SAMPLES_PER_PIXEL: u16 = 3;

// =============================================================================
// ValidationError
// =============================================================================

/// A directory whose sample layout the engine cannot read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("samples are stored in separate planes (PlanarConfiguration = {planar})")]
    NotContiguous { planar: u16 },

    #[error("expected {SUPPORTED_BITS_PER_SAMPLE} bits per sample, found {found}")]
    BitsPerSample { found: u16 },

    #[error("expected {SUPPORTED_SAMPLES_PER_PIXEL} samples per pixel, found {found}")]
    SamplesPerPixel { found: u16 },
}

impl From<ValidationError> for ExtractError {
    fn from(error: ValidationError) -> Self {
        ExtractError::UnsupportedFormat {
            reason: error.to_string(),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Check that a directory holds contiguous 8-bit, 3-sample pixels.
///
/// Checks run in the order planar configuration, bits per sample, samples
/// per pixel; the first failure is reported.
pub fn validate_sample_layout(directory: &Directory) -> Result<(), ValidationError> {
    let result = if directory.planar_configuration != PLANAR_CONTIGUOUS {
        Err(ValidationError::NotContiguous {
            planar: directory.planar_configuration,
        })
    } else if directory.bits_per_sample != SUPPORTED_BITS_PER_SAMPLE {
        Err(ValidationError::BitsPerSample {
            found: directory.bits_per_sample,
        })
    } else if directory.samples_per_pixel != SUPPORTED_SAMPLES_PER_PIXEL {
        Err(ValidationError::SamplesPerPixel {
            found: directory.samples_per_pixel,
        })
    } else {
        Ok(())
    };

    if let Err(ref e) = result {
        error!(
            directory = directory.index,
            planar = directory.planar_configuration,
            bits_per_sample = directory.bits_per_sample,
            samples_per_pixel = directory.samples_per_pixel,
            "Unsupported sample layout: {}",
            e
        );
    }

    result
}

// =============================================================================
// Tests
// =============================================================================
