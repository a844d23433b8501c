use std::fs::File;
use std::path::Path;

use bytes::Bytes;

use super::range_reader::{check_range, RangeReader};
use crate::error::IoError;

/// Local file implementation of RangeReader.
///
/// Uses positional reads so the handle carries no cursor state. The file
/// size is captured once when the file is opened.
#[derive(Debug)]
pub struct FileRangeReader {
    file: File,
    size: u64,
    identifier: String,
}

impl FileRangeReader {
    /// Open a file for range reads.
    ///
    /// Any failure to open or stat the file is reported as `NotFound`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let identifier = path.display().to_string();

        let not_found = |e: std::io::Error| IoError::NotFound {
            path: identifier.clone(),
            reason: e.to_string(),
        };

        let file = File::open(path).map_err(not_found)?;
        let size = file.metadata().map_err(not_found)?.len();

        Ok(Self {
            file,
            size,
            identifier,
        })
    }
}

impl RangeReader for FileRangeReader {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.size)?;

        let mut buf = vec![0u8; len];
        read_at(&self.file, &mut buf, offset).map_err(|e| IoError::Read(e.to_string()))?;
        Ok(Bytes::from(buf))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => return Err(std::io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// In-memory implementation of RangeReader.
///
/// Serves slides that are already resident (embedded fixtures, buffers
/// handed over by a host application). Reads are zero-copy slices.
#[derive(Debug, Clone)]
pub struct BytesRangeReader {
    data: Bytes,
    identifier: String,
}

impl BytesRangeReader {
    pub fn new(data: impl Into<Bytes>, identifier: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            identifier: identifier.into(),
        }
    }
}

impl RangeReader for BytesRangeReader {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.data.len() as u64)?;
        let start = offset as usize;
        Ok(self.data.slice(start..start + len))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
