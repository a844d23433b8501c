//! Block decoder seam.
//!
//! JPEG 2000 tiles are decoded by an external codec into one signed 32-bit
//! plane per component. The extractor only sees this trait and the plane
//! buffers, so the codec behind it can be swapped (or faked in tests).

use crate::error::CodecError;

// =============================================================================
// Decoded planes
// =============================================================================

/// One decoded component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plane {
    /// Samples, row-major
    pub data: Vec<i32>,

    /// Samples per row in `data`
    pub stride: usize,
}

/// Output of one block decode, reused across tiles.
///
/// Plane vectors keep their capacity between decodes so a request's tiles
/// share one set of allocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedPlanes {
    pub width: u32,
    pub height: u32,
    pub planes: Vec<Plane>,
}

impl DecodedPlanes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a decode with `components` planes, keeping allocations.
    pub fn reset(&mut self, width: u32, height: u32, components: usize) {
        self.width = width;
        self.height = height;
        self.planes.resize_with(components, Plane::default);
        for plane in &mut self.planes {
            plane.data.clear();
            plane.stride = 0;
        }
    }

    pub fn component_count(&self) -> usize {
        self.planes.len()
    }
}

// =============================================================================
// BlockDecoder
// =============================================================================

/// A codec that turns one compressed tile into component planes.
pub trait BlockDecoder: Send + Sync {
    /// Codec name for logs and errors.
    fn name(&self) -> &'static str;

    /// Decode `payload` into `out`.
    ///
    /// On success `out` holds one plane per decoded component. On failure
    /// its contents are unspecified.
    fn decode_into(&self, payload: &[u8], out: &mut DecodedPlanes) -> Result<(), CodecError>;
}

// =============================================================================
// Tests
// =============================================================================
