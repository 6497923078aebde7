//! Mirrored memory: a small unit repeated across a larger window.

use super::{check_access, MemoryUnit};
use crate::{NesError, Result};

/// Exposes `len` bytes backed by `inner`, wrapping offsets modulo the inner
/// length. The NES maps its 2 KiB of RAM this way over `$0000-$1FFF`.
#[derive(Debug, Clone)]
pub struct MirroredMemory<M> {
    inner: M,
    len: usize,
}

impl<M: MemoryUnit> MirroredMemory<M> {
    pub fn new(len: usize, inner: M) -> Self {
        Self { inner, len }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }

    /// Validates an access of `length` bytes at `offset`.
    fn check(&self, offset: usize, length: usize) -> Result<()> {
        check_access(offset, length, self.len)?;
        if length > 0 && self.inner.len() == 0 {
            return Err(NesError::OutOfBounds {
                offset,
                length,
                len: 0,
            });
        }
        Ok(())
    }
}

impl<M: MemoryUnit> MemoryUnit for MirroredMemory<M> {
    fn len(&self) -> usize {
        self.len
    }

    fn read(&mut self, offset: usize, buffer: &mut [u8]) -> Result<()> {
        self.check(offset, buffer.len())?;
        if buffer.is_empty() {
            return Ok(());
        }

        // 最初の区間以降はミラーの先頭から
        let inner_len = self.inner.len();
        let mut mirrored = offset % inner_len;
        let mut filled = 0;
        while filled < buffer.len() {
            let count = (buffer.len() - filled).min(inner_len - mirrored);
            self.inner
                .read(mirrored, &mut buffer[filled..filled + count])?;
            filled += count;
            mirrored = 0;
        }
        Ok(())
    }

    fn write(&mut self, offset: usize, buffer: &[u8]) -> Result<()> {
        self.check(offset, buffer.len())?;
        if buffer.is_empty() {
            return Ok(());
        }

        let inner_len = self.inner.len();
        let mut mirrored = offset % inner_len;
        let mut written = 0;
        while written < buffer.len() {
            let count = (buffer.len() - written).min(inner_len - mirrored);
            self.inner
                .write(mirrored, &buffer[written..written + count])?;
            written += count;
            mirrored = 0;
        }
        Ok(())
    }
}
