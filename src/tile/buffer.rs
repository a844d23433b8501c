//! Output tile buffer.

use crate::error::ExtractError;

/// Channels per output pixel
pub const CHANNELS: usize = 3;

// =============================================================================
// Layout
// =============================================================================

/// Memory order of a [`Tile`]'s samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Height x width x channel (`RGBRGB...`)
    Interleaved,

    /// Channel x height x width (`RR..GG..BB..`)
    Planar,
}

impl Layout {
    /// Leading dimension tag: `'H'` for interleaved, `'C'` for planar.
    pub const fn first_dim(&self) -> char {
        match self {
            Layout::Interleaved => 'H',
            Layout::Planar => 'C',
        }
    }
}

// =============================================================================
// Tile
// =============================================================================

/// Square RGB region returned by an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    data: Vec<u8>,
    side: u32,
    layout: Layout,
}

impl Tile {
    /// Allocate a zeroed `side * side * 3` buffer.
    ///
    /// Fails with [`ExtractError::AllocationFailure`] instead of aborting
    /// when the allocator refuses.
    pub fn allocate(side: u32, layout: Layout) -> Result<Self, ExtractError> {
        let bytes = (side as usize)
            .checked_mul(side as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or(ExtractError::AllocationFailure { bytes: usize::MAX })?;

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| ExtractError::AllocationFailure { bytes })?;
        data.resize(bytes, 0);

        Ok(Tile { data, side, layout })
    }

    /// Wrap an existing buffer; `None` if its length is not `side * side * 3`.
    pub fn from_vec(data: Vec<u8>, side: u32, layout: Layout) -> Option<Self> {
        let expected = (side as usize)
            .checked_mul(side as usize)?
            .checked_mul(CHANNELS)?;
        (data.len() == expected).then_some(Tile { data, side, layout })
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Take ownership of the samples.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// RGB value at `(x, y)`, whatever the layout.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.side || y >= self.side {
            return None;
        }

        let side = self.side as usize;
        let (x, y) = (x as usize, y as usize);
        let pixel = match self.layout {
            Layout::Interleaved => {
                let i = (y * side + x) * CHANNELS;
                [self.data[i], self.data[i + 1], self.data[i + 2]]
            }
            Layout::Planar => {
                let plane = side * side;
                let i = y * side + x;
                [
                    self.data[i],
                    self.data[plane + i],
                    self.data[2 * plane + i],
                ]
            }
        };
        Some(pixel)
    }

    /// Copy of this tile reordered into `layout`.
    pub fn to_layout(&self, layout: Layout) -> Tile {
        if layout == self.layout {
            return self.clone();
        }

        let plane = self.side as usize * self.side as usize;
        let mut data = vec![0u8; self.data.len()];
        match layout {
            Layout::Planar => {
                for (i, px) in self.data.chunks_exact(CHANNELS).enumerate() {
                    for (c, &value) in px.iter().enumerate() {
                        data[c * plane + i] = value;
                    }
                }
            }
            Layout::Interleaved => {
                for (i, px) in data.chunks_exact_mut(CHANNELS).enumerate() {
                    for (c, value) in px.iter_mut().enumerate() {
                        *value = self.data[c * plane + i];
                    }
                }
            }
        }

        Tile {
            data,
            side: self.side,
            layout,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
