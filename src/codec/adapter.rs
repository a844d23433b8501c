//! Per-request codec strategy.
//!
//! Tiles reach the stitcher through one of two paths, chosen from the
//! selected level's compression:
//!
//! - **Native**: the slide reader decodes the tile itself (uncompressed or
//!   JPEG) into interleaved RGB bytes, which are copied row by row. The
//!   output is `Interleaved`.
//! - **Block**: the slide reader hands over the raw payload, the block
//!   decoder expands it into `i32` component planes, and each plane is
//!   narrowed into its own section of the output. The output is `Planar`.
//!
//! Scratch buffers live in the adapter and are reused for every tile of a
//! request.

use crate::error::{CodecError, ExtractError};
use crate::format::tiff::{compression_name, Directory};
use crate::slide::SlideReader;
use crate::tile::{narrow, CropPlan, Layout, NarrowStrategy, Tile, TileStep, CHANNELS};

use super::block::{BlockDecoder, DecodedPlanes};
use super::context::CodecContext;

/// Codec strategy for one request.
pub enum CodecAdapter<'a> {
    Native {
        /// Decoded interleaved tile
        scratch: Vec<u8>,
    },
    Block {
        decoder: &'a dyn BlockDecoder,

        /// Compressed tile payload
        payload: Vec<u8>,

        planes: DecodedPlanes,
        narrowing: NarrowStrategy,
    },
}

impl<'a> CodecAdapter<'a> {
    /// Pick the strategy for `directory`'s compression.
    ///
    /// Compressions neither path handles are rejected here, before any tile
    /// is read.
    pub fn select(
        directory: &Directory,
        context: &'a CodecContext,
        narrowing: NarrowStrategy,
    ) -> Result<Self, ExtractError> {
        match directory.compression_scheme() {
            Some(scheme) if scheme.is_native() => Ok(CodecAdapter::Native {
                scratch: Vec::new(),
            }),
            Some(scheme) if scheme.is_block_codec() => {
                let decoder = context
                    .decoder()
                    .ok_or(CodecError::MissingContext(scheme.name()))?;
                Ok(CodecAdapter::Block {
                    decoder,
                    payload: Vec::new(),
                    planes: DecodedPlanes::new(),
                    narrowing,
                })
            }
            _ => Err(ExtractError::UnsupportedFormat {
                reason: format!(
                    "directory {} uses compression {}",
                    directory.index,
                    compression_name(directory.compression)
                ),
            }),
        }
    }

    /// Output layout this strategy produces.
    pub fn layout(&self) -> Layout {
        match self {
            CodecAdapter::Native { .. } => Layout::Interleaved,
            CodecAdapter::Block { .. } => Layout::Planar,
        }
    }

    /// Read and decode the tile containing level pixel `(x, y)`.
    pub fn load<S: SlideReader + ?Sized>(
        &mut self,
        slide: &mut S,
        x: u64,
        y: u64,
    ) -> Result<(), ExtractError> {
        match self {
            CodecAdapter::Native { scratch } => {
                slide.read_tile(x, y, scratch)?;
            }
            CodecAdapter::Block {
                decoder,
                payload,
                planes,
                ..
            } => {
                slide.read_raw_tile(x, y, payload)?;
                decoder.decode_into(payload, planes)?;

                if planes.component_count() < CHANNELS {
                    return Err(CodecError::Components {
                        expected: CHANNELS,
                        found: planes.component_count(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Copy the loaded tile's part of `step` into `out`.
    pub fn copy_step(
        &mut self,
        step: &TileStep,
        plan: &CropPlan,
        out: &mut Tile,
    ) -> Result<(), ExtractError> {
        let side = plan.output_side as usize;
        let width = step.copy_width as usize;
        let dest = out.as_bytes_mut();

        match self {
            CodecAdapter::Native { scratch } => {
                let row_bytes = plan.tile_width as usize * CHANNELS;
                let start =
                    step.src_top as usize * row_bytes + step.src_left as usize * CHANNELS;
                let needed = start + (step.copy_height as usize).saturating_sub(1) * row_bytes
                    + width * CHANNELS;
                if scratch.len() < needed {
                    return Err(CodecError::PlaneTooSmall {
                        needed,
                        available: scratch.len(),
                    }
                    .into());
                }

                for row in 0..step.copy_height as usize {
                    let src = start + row * row_bytes;
                    let dst = (step.dest_offset + row * side) * CHANNELS;
                    dest[dst..dst + width * CHANNELS]
                        .copy_from_slice(&scratch[src..src + width * CHANNELS]);
                }
            }
            CodecAdapter::Block {
                planes, narrowing, ..
            } => {
                let plane_len = side * side;
                for (channel, plane) in planes.planes.iter().take(CHANNELS).enumerate() {
                    let stride = plane.stride;
                    let columns = step.src_left as usize + width;
                    if stride < columns {
                        return Err(CodecError::PlaneTooSmall {
                            needed: columns,
                            available: stride,
                        }
                        .into());
                    }

                    let start = step.src_top as usize * stride + step.src_left as usize;
                    let needed =
                        start + (step.copy_height as usize).saturating_sub(1) * stride + width;
                    if plane.data.len() < needed {
                        return Err(CodecError::PlaneTooSmall {
                            needed,
                            available: plane.data.len(),
                        }
                        .into());
                    }

                    for row in 0..step.copy_height as usize {
                        let src = start + row * stride;
                        let dst = channel * plane_len + step.dest_offset + row * side;
                        narrow(
                            &plane.data[src..src + width],
                            &mut dest[dst..dst + width],
                            *narrowing,
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for CodecAdapter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecAdapter::Native { .. } => f.write_str("CodecAdapter::Native"),
            CodecAdapter::Block {
                decoder, narrowing, ..
            } => f
                .debug_struct("CodecAdapter::Block")
                .field("decoder", &decoder.name())
                .field("narrowing", narrowing)
                .finish(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
