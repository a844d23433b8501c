//! TIFF tag value reading.
//!
//! Values are stored either inline in the IFD entry (for small values)
//! or at an offset in the file (for larger values like arrays). Array values
//! such as TileOffsets are fetched with a single range read.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, IfdEntry, TiffHeader};
use super::tags::{FieldType, TiffTag};

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from a TIFF file.
///
/// Combines a RangeReader with the header so values are decoded in the
/// file's byte order.
pub struct ValueReader<'a, R: RangeReader + ?Sized> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader + ?Sized> ValueReader<'a, R> {
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Read raw bytes for an IFD entry's value.
    ///
    /// Inline values come from the entry itself; offset values are fetched
    /// from the file.
    pub fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ))
        } else {
            let offset = entry.value_offset(self.header.byte_order);
            let len = usize::try_from(size).map_err(|_| TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: format!("value of {} bytes is too large", size),
            })?;
            Ok(self.reader.read_exact_at(offset, len)?)
        }
    }

    /// Read a single Short or Long value.
    pub fn read_u32(&self, entry: &IfdEntry) -> Result<u32, TiffError> {
        if let Some(value) = entry.inline_u32(self.header.byte_order) {
            return Ok(value);
        }

        let values = self.read_u64_array(entry)?;
        match values.as_slice() {
            [value] => u32::try_from(*value).map_err(|_| TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: format!("value {} does not fit in 32 bits", value),
            }),
            _ => Err(TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: format!("expected count 1, got {}", entry.count),
            }),
        }
    }

    /// Read the first value of a Short/Long array.
    ///
    /// BitsPerSample carries one value per component, and with three
    /// components the array no longer fits inline.
    pub fn read_first_u32(&self, entry: &IfdEntry) -> Result<u32, TiffError> {
        if entry.count == 0 {
            return Err(TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: "empty value".to_string(),
            });
        }
        let values = self.read_u64_array(entry)?;
        Ok(values[0] as u32)
    }

    /// Read an array of Short, Long or Long8 values as u64.
    ///
    /// This is the primary method for reading TileOffsets and TileByteCounts.
    pub fn read_u64_array(&self, entry: &IfdEntry) -> Result<Vec<u64>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if !matches!(
            field_type,
            FieldType::Short | FieldType::Long | FieldType::Long8
        ) {
            return Err(TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: format!("expected Short, Long, or Long8, got {:?}", field_type),
            });
        }

        if entry.count == 0 {
            return Ok(Vec::new());
        }

        let bytes = self.read_bytes(entry)?;
        Ok(parse_u64_array(
            &bytes,
            entry.count as usize,
            field_type,
            self.header.byte_order,
        ))
    }

    /// Read an ASCII value, stripping the trailing NUL.
    pub fn read_string(&self, entry: &IfdEntry) -> Result<String, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if field_type != FieldType::Ascii {
            return Err(TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: format!("expected Ascii, got {:?}", field_type),
            });
        }

        let bytes = self.read_bytes(entry)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

fn tag_name(entry: &IfdEntry) -> &'static str {
    entry.tag().map(TiffTag::name).unwrap_or("unknown")
}

// =============================================================================
// Raw array parsing
// =============================================================================

/// Parse an array of u64 values from raw bytes.
///
/// Stops early if `bytes` holds fewer than `count` values.
pub fn parse_u64_array(
    bytes: &[u8],
    count: usize,
    field_type: FieldType,
    byte_order: ByteOrder,
) -> Vec<u64> {
    let width = field_type.size_in_bytes();
    bytes
        .chunks_exact(width)
        .take(count)
        .filter_map(|chunk| match field_type {
            FieldType::Short => Some(byte_order.read_u16(chunk) as u64),
            FieldType::Long => Some(byte_order.read_u32(chunk) as u64),
            FieldType::Long8 => Some(byte_order.read_u64(chunk)),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
