//! Codec library lifecycle.
//!
//! A [`CodecContext`] brackets use of the block codec: create one at
//! startup, share it by reference with every [`RegionExtractor`], and drop
//! it at shutdown. Creating a second context while one is alive works but
//! is logged, since it usually means a host set up the codec twice.
//!
//! [`RegionExtractor`]: crate::tile::RegionExtractor

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};

use super::block::BlockDecoder;
use super::jpeg2000::Jpeg2kDecoder;

/// Number of contexts currently alive in the process
static LIVE_CONTEXTS: AtomicUsize = AtomicUsize::new(0);

/// Process-level handle to the block codec.
pub struct CodecContext {
    decoder: Option<Box<dyn BlockDecoder>>,
}

impl CodecContext {
    /// Set up the JPEG 2000 codec.
    pub fn initialize() -> Self {
        Self::register(Some(Box::new(Jpeg2kDecoder::new())))
    }

    /// Use a custom block decoder.
    pub fn with_decoder(decoder: Box<dyn BlockDecoder>) -> Self {
        Self::register(Some(decoder))
    }

    /// A context with no block codec.
    ///
    /// Slides stored with native compressions extract normally; block-codec
    /// slides fail with [`CodecError::MissingContext`].
    ///
    /// [`CodecError::MissingContext`]: crate::error::CodecError::MissingContext
    pub fn native_only() -> Self {
        Self::register(None)
    }

    fn register(decoder: Option<Box<dyn BlockDecoder>>) -> Self {
        let previous = LIVE_CONTEXTS.fetch_add(1, Ordering::SeqCst);
        let codec = decoder.as_ref().map(|d| d.name()).unwrap_or("none");

        if previous > 0 {
            warn!(
                live = previous + 1,
                codec, "Codec context created while another is alive"
            );
        } else {
            debug!(codec, "Codec context initialized");
        }

        CodecContext { decoder }
    }

    /// The block decoder, if this context has one.
    pub fn decoder(&self) -> Option<&dyn BlockDecoder> {
        self.decoder.as_deref()
    }

    /// Contexts alive in this process.
    pub fn live_count() -> usize {
        LIVE_CONTEXTS.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for CodecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecContext")
            .field("decoder", &self.decoder.as_ref().map(|d| d.name()))
            .finish()
    }
}

impl Drop for CodecContext {
    fn drop(&mut self) {
        let remaining = LIVE_CONTEXTS.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!(remaining, "Codec context released");
    }
}
