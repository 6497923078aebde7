//! Buffer-backed memory with read/write permissions.

use super::{check_access, MemoryUnit};
use crate::{NesError, Result};

/// A fixed-size block of memory, such as internal RAM or a ROM bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedMemory {
    data: Vec<u8>,
    can_read: bool,
    can_write: bool,
}

impl FixedMemory {
    /// Zero-filled, readable and writable memory.
    pub fn new(size: usize) -> Self {
        Self::with_permissions(size, true, true)
    }

    pub fn with_permissions(size: usize, can_read: bool, can_write: bool) -> Self {
        Self {
            data: vec![0; size],
            can_read,
            can_write,
        }
    }

    /// Readable and writable memory initialized with `data`.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            can_read: true,
            can_write: true,
        }
    }

    /// Read-only memory initialized with `data` (ROM).
    pub fn read_only(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            can_read: true,
            can_write: false,
        }
    }

    pub fn can_read(&self) -> bool {
        self.can_read
    }

    pub fn can_write(&self) -> bool {
        self.can_write
    }

    /// Raw contents, bypassing permissions.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl MemoryUnit for FixedMemory {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read(&mut self, offset: usize, buffer: &mut [u8]) -> Result<()> {
        if !self.can_read {
            return Err(NesError::ReadNotPermitted);
        }
        let end = check_access(offset, buffer.len(), self.data.len())?;

        log::trace!(
            "Reading ${:04X}-${:04X} ({} bytes)",
            offset,
            end,
            buffer.len()
        );
        buffer.copy_from_slice(&self.data[offset..end]);
        Ok(())
    }

    fn write(&mut self, offset: usize, buffer: &[u8]) -> Result<()> {
        if !self.can_write {
            return Err(NesError::WriteNotPermitted);
        }
        let end = check_access(offset, buffer.len(), self.data.len())?;

        log::trace!(
            "Writing ${:04X}-${:04X} ({} bytes)",
            offset,
            end,
            buffer.len()
        );
        self.data[offset..end].copy_from_slice(buffer);
        Ok(())
    }
}
