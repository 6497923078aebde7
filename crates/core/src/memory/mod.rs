//! # Memory Bus
//!
//! The CPU sees a single address space assembled from [`MemoryUnit`]s:
//!
//! - [`FixedMemory`] owns a buffer (RAM, ROM banks)
//! - [`MirroredMemory`] repeats a smaller unit over a larger window
//! - [`VirtualMemory`] maps units at offsets, leaving unmapped gaps readable as zero
//!
//! Every access is bounds-checked and returns a [`Result`]; there is no silent
//! truncation. Fixed-width integer accessors live in [`MemoryExt`].

mod ext;
mod fixed;
mod mirrored;
mod virtual_memory;

pub use ext::MemoryExt;
pub use fixed::FixedMemory;
pub use mirrored::MirroredMemory;
pub use virtual_memory::{MemoryMapEvent, SharedMemory, VirtualMemory};

use crate::{NesError, Result};

/// A contiguous, byte-addressable block of memory.
///
/// Offsets are relative to the start of the unit. `read` takes `&mut self`
/// because reads from memory-mapped hardware may have side effects.
pub trait MemoryUnit {
    /// Number of addressable bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fills `buffer` with the bytes starting at `offset`.
    fn read(&mut self, offset: usize, buffer: &mut [u8]) -> Result<()>;

    /// Stores `buffer` starting at `offset`.
    fn write(&mut self, offset: usize, buffer: &[u8]) -> Result<()>;
}

impl<M: MemoryUnit + ?Sized> MemoryUnit for Box<M> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn read(&mut self, offset: usize, buffer: &mut [u8]) -> Result<()> {
        (**self).read(offset, buffer)
    }

    fn write(&mut self, offset: usize, buffer: &[u8]) -> Result<()> {
        (**self).write(offset, buffer)
    }
}

impl<M: MemoryUnit + ?Sized> MemoryUnit for &mut M {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn read(&mut self, offset: usize, buffer: &mut [u8]) -> Result<()> {
        (**self).read(offset, buffer)
    }

    fn write(&mut self, offset: usize, buffer: &[u8]) -> Result<()> {
        (**self).write(offset, buffer)
    }
}

/// Validates an access of `length` bytes at `offset` against a unit of `len`
/// bytes and returns the exclusive end offset.
pub(crate) fn check_access(offset: usize, length: usize, len: usize) -> Result<usize> {
    let end = offset
        .checked_add(length)
        .ok_or(NesError::OffsetOutOfRange { offset, length })?;
    if end > len {
        return Err(NesError::OutOfBounds {
            offset,
            length,
            len,
        });
    }
    Ok(end)
}
