//! JPEG 2000 block decoder backed by the `jpeg2k` crate (OpenJPEG).
//!
//! Aperio stores JPEG 2000 tiles (compression 33003/33005) as bare
//! codestreams; generic TIFF (34712) may wrap them in a JP2 box. Both are
//! accepted.

use tracing::trace;

use crate::error::CodecError;

use super::block::{BlockDecoder, DecodedPlanes};

/// JPEG 2000 decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jpeg2kDecoder;

impl Jpeg2kDecoder {
    pub fn new() -> Self {
        Jpeg2kDecoder
    }
}

impl BlockDecoder for Jpeg2kDecoder {
    fn name(&self) -> &'static str {
        "JPEG 2000"
    }

    fn decode_into(&self, payload: &[u8], out: &mut DecodedPlanes) -> Result<(), CodecError> {
        if payload.is_empty() {
            return Err(CodecError::Header("empty codestream".to_string()));
        }

        let image =
            jpeg2k::Image::from_bytes(payload).map_err(|e| CodecError::Decompress(e.to_string()))?;

        let components = image.components();
        out.reset(image.width(), image.height(), components.len());

        for (plane, component) in out.planes.iter_mut().zip(components) {
            plane.data.extend_from_slice(component.data());
            plane.stride = component.width() as usize;
        }

        trace!(
            width = out.width,
            height = out.height,
            components = out.component_count(),
            "Decoded JPEG 2000 tile"
        );

        Ok(())
    }
}
