//! Tile codecs.
//!
//! - [`BlockDecoder`]: seam for codecs that decode a payload into `i32`
//!   component planes ([`Jpeg2kDecoder`] for JPEG 2000)
//! - [`CodecContext`]: process-level codec lifecycle, shared by reference
//! - [`CodecAdapter`]: per-request choice between the reader's native
//!   decoding and the block decoder

mod adapter;
mod block;
mod context;
mod jpeg2000;

pub use adapter::CodecAdapter;
pub use block::{BlockDecoder, DecodedPlanes, Plane};
pub use context::CodecContext;
pub use jpeg2000::Jpeg2kDecoder;
