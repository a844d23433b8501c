//! Block-codec sample narrowing.
//!
//! The block decoder hands back `i32` samples; the output tile stores one
//! byte per sample. Narrowing keeps the low 8 bits (`as u8`), so values
//! outside `0..=255` wrap instead of saturating.

use serde::{Deserialize, Serialize};

/// Samples handled per chunk by [`NarrowStrategy::Chunked`]
pub const NARROW_LANES: usize = 64;

/// How `i32` samples are narrowed to bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NarrowStrategy {
    /// Fixed-width chunks the compiler can vectorize, then a scalar tail
    #[default]
    Chunked,

    /// One sample at a time
    Scalar,
}

/// Narrow `src` into `dst`, which must have the same length.
pub fn narrow(src: &[i32], dst: &mut [u8], strategy: NarrowStrategy) {
    debug_assert_eq!(src.len(), dst.len());

    match strategy {
        NarrowStrategy::Scalar => narrow_scalar(src, dst),
        NarrowStrategy::Chunked => narrow_chunked(src, dst),
    }
}

fn narrow_scalar(src: &[i32], dst: &mut [u8]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = s as u8;
    }
}

fn narrow_chunked(src: &[i32], dst: &mut [u8]) {
    let mut src_chunks = src.chunks_exact(NARROW_LANES);
    let mut dst_chunks = dst.chunks_exact_mut(NARROW_LANES);

    for (d, s) in (&mut dst_chunks).zip(&mut src_chunks) {
        for (out, &sample) in d.iter_mut().zip(s) {
            *out = sample as u8;
        }
    }

    narrow_scalar(src_chunks.remainder(), dst_chunks.into_remainder());
}
