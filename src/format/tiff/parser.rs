//! TIFF header and IFD decoding.
//!
//! ```text
//!            0    2    4         8                16
//! TIFF     : II|MM  42   ifd offset
//! BigTIFF  : II|MM  43   8   0   ifd offset (u64)
//! ```
//!
//! Classic IFD entries are 12 bytes (tag, type, u32 count, 4-byte slot),
//! BigTIFF entries are 20 bytes (tag, type, u64 count, 8-byte slot).

use std::collections::HashMap;

use crate::error::TiffError;
use crate::io::{read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le};

use super::tags::{FieldType, TiffTag};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
const VERSION_TIFF: u16 = 42;

/// Version number for BigTIFF
const VERSION_BIGTIFF: u16 = 43;

/// Size of classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of BigTIFF header in bytes
pub const BIGTIFF_HEADER_SIZE: usize = 16;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF file.
///
/// TIFF files declare their byte order in the first two bytes of the header.
/// All multi-byte values in the file must be read respecting this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => read_u32_le(bytes),
            ByteOrder::BigEndian => read_u32_be(bytes),
        }
    }

    /// Read a u64 from a byte slice using this byte order.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => read_u64_le(bytes),
            ByteOrder::BigEndian => read_u64_be(bytes),
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header: byte order, container flavor and the first IFD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Whether this is a BigTIFF file (64-bit offsets)
    pub is_bigtiff: bool,

    /// Offset to the first IFD in the file
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Parse the header from the first bytes of a file of `file_size` bytes.
    ///
    /// Pass at least [`BIGTIFF_HEADER_SIZE`] bytes when the file is that
    /// large. The reserved BigTIFF word is not checked. A first IFD offset
    /// at or past the end of the file is `InvalidIfdOffset`.
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, TiffError> {
        require_len(bytes, TIFF_HEADER_SIZE)?;

        // Byte order marks are palindromes, any reading order works
        let byte_order = match u16::from_le_bytes([bytes[0], bytes[1]]) {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            other => return Err(TiffError::InvalidMagic(other)),
        };

        let (is_bigtiff, first_ifd_offset) = match byte_order.read_u16(&bytes[2..4]) {
            VERSION_TIFF => (false, byte_order.read_u32(&bytes[4..8]) as u64),
            VERSION_BIGTIFF => {
                require_len(bytes, BIGTIFF_HEADER_SIZE)?;
                let offset_size = byte_order.read_u16(&bytes[4..6]);
                if offset_size != 8 {
                    return Err(TiffError::InvalidBigTiffOffsetSize(offset_size));
                }
                (true, byte_order.read_u64(&bytes[8..16]))
            }
            version => return Err(TiffError::InvalidVersion(version)),
        };

        if first_ifd_offset >= file_size {
            return Err(TiffError::InvalidIfdOffset(first_ifd_offset));
        }

        Ok(TiffHeader {
            byte_order,
            is_bigtiff,
            first_ifd_offset,
        })
    }

    /// Width of offsets, counts and the value/offset slot: 4 or 8 bytes.
    #[inline]
    pub const fn word_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }

    /// Bytes per IFD entry: tag and type, then a count and a value slot.
    #[inline]
    pub const fn ifd_entry_size(&self) -> usize {
        4 + 2 * self.word_size()
    }

    /// Bytes of the entry count that opens an IFD.
    #[inline]
    pub const fn ifd_count_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            2
        }
    }

    /// Read one offset-sized word (u32 or u64) from `bytes`.
    #[inline]
    fn read_word(&self, bytes: &[u8]) -> u64 {
        if self.is_bigtiff {
            self.byte_order.read_u64(bytes)
        } else {
            self.byte_order.read_u32(bytes) as u64
        }
    }
}

fn require_len(bytes: &[u8], required: usize) -> Result<(), TiffError> {
    if bytes.len() < required {
        return Err(TiffError::FileTooSmall {
            required: required as u64,
            actual: bytes.len() as u64,
        });
    }
    Ok(())
}

// =============================================================================
// IfdEntry
// =============================================================================

/// One IFD entry with its value slot kept as raw bytes.
///
/// Whether the slot holds the value itself or a file offset depends on the
/// field type and count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Numeric tag ID
    pub tag_id: u16,

    /// Decoded field type, `None` for types we don't read
    pub field_type: Option<FieldType>,

    /// Field type as stored in the file
    pub field_type_raw: u16,

    /// Number of values
    pub count: u64,

    /// Raw value slot (4 bytes for TIFF, 8 for BigTIFF)
    pub value_offset_bytes: Vec<u8>,

    /// Whether the value lives in `value_offset_bytes`
    pub is_inline: bool,
}

impl IfdEntry {
    /// Decode an entry from `header.ifd_entry_size()` bytes.
    pub fn parse(bytes: &[u8], header: &TiffHeader) -> Self {
        let word = header.word_size();
        let field_type_raw = header.byte_order.read_u16(&bytes[2..4]);
        let field_type = FieldType::from_u16(field_type_raw);
        let count = header.read_word(&bytes[4..4 + word]);

        IfdEntry {
            tag_id: header.byte_order.read_u16(&bytes[0..2]),
            field_type,
            field_type_raw,
            count,
            value_offset_bytes: bytes[4 + word..4 + 2 * word].to_vec(),
            // Unknown types are never read
            is_inline: field_type.map_or(true, |ft| ft.fits_inline(count, header.is_bigtiff)),
        }
    }

    pub fn tag(&self) -> Option<TiffTag> {
        TiffTag::from_u16(self.tag_id)
    }

    /// Total size of the value in bytes, or `None` for unknown field types.
    pub fn value_byte_size(&self) -> Option<u64> {
        self.field_type
            .map(|ft| (ft.size_in_bytes() as u64).saturating_mul(self.count))
    }

    /// The value slot read as a file offset.
    pub fn value_offset(&self, byte_order: ByteOrder) -> u64 {
        if self.value_offset_bytes.len() >= 8 {
            byte_order.read_u64(&self.value_offset_bytes)
        } else {
            byte_order.read_u32(&self.value_offset_bytes) as u64
        }
    }

    /// The single inline Short or Long this entry holds, if that is what it
    /// holds.
    pub fn inline_u32(&self, byte_order: ByteOrder) -> Option<u32> {
        if !self.is_inline || self.count != 1 {
            return None;
        }
        match self.field_type? {
            FieldType::Short => Some(byte_order.read_u16(&self.value_offset_bytes) as u32),
            FieldType::Long => Some(byte_order.read_u32(&self.value_offset_bytes)),
            _ => None,
        }
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed Image File Directory and the link to the next one (0 ends the
/// chain).
#[derive(Debug, Clone, Default)]
pub struct Ifd {
    /// Entries in file order
    pub entries: Vec<IfdEntry>,

    /// First entry index per tag ID
    entries_by_tag: HashMap<u16, usize>,

    /// Offset of the next IFD (0 if this is the last one)
    pub next_ifd_offset: u64,
}

impl Ifd {
    /// Bytes occupied by an IFD with `entry_count` entries.
    pub fn calculate_size(entry_count: u64, header: &TiffHeader) -> usize {
        header.ifd_count_size()
            + (entry_count as usize).saturating_mul(header.ifd_entry_size())
            + header.word_size()
    }

    /// Parse an IFD from bytes starting at its entry count.
    ///
    /// When a tag appears twice the first entry wins lookups.
    pub fn parse(bytes: &[u8], header: &TiffHeader) -> Result<Self, TiffError> {
        let count_size = header.ifd_count_size();
        require_len(bytes, count_size)?;

        let entry_count = if header.is_bigtiff {
            header.byte_order.read_u64(&bytes[..8])
        } else {
            header.byte_order.read_u16(&bytes[..2]) as u64
        };
        require_len(bytes, Self::calculate_size(entry_count, header))?;

        let entry_size = header.ifd_entry_size();
        let entries: Vec<IfdEntry> = bytes[count_size..]
            .chunks_exact(entry_size)
            .take(entry_count as usize)
            .map(|chunk| IfdEntry::parse(chunk, header))
            .collect();

        let mut entries_by_tag = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            entries_by_tag.entry(entry.tag_id).or_insert(i);
        }

        let next_at = count_size + entries.len() * entry_size;
        let next_ifd_offset = header.read_word(&bytes[next_at..]);

        Ok(Ifd {
            entries,
            entries_by_tag,
            next_ifd_offset,
        })
    }

    pub fn get_entry(&self, tag_id: u16) -> Option<&IfdEntry> {
        self.entries_by_tag.get(&tag_id).map(|&i| &self.entries[i])
    }

    pub fn get_entry_by_tag(&self, tag: TiffTag) -> Option<&IfdEntry> {
        self.get_entry(tag.as_u16())
    }

    /// Whether both tile dimension tags are present.
    pub fn is_tiled(&self) -> bool {
        self.get_entry_by_tag(TiffTag::TileWidth).is_some()
            && self.get_entry_by_tag(TiffTag::TileLength).is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
