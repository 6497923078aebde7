//! 命令テスト用のヘルパー

use super::{decode, execute, State};
use crate::memory::{FixedMemory, MemoryUnit};
use crate::Result;

/// Wraps a memory unit and records every byte written through it.
pub(crate) struct TrackingMemory<M> {
    inner: M,
    writes: Vec<(usize, u8)>,
}

impl<M: MemoryUnit> TrackingMemory<M> {
    pub(crate) fn new(inner: M) -> Self {
        Self {
            inner,
            writes: Vec::new(),
        }
    }
}

impl<M: MemoryUnit> MemoryUnit for TrackingMemory<M> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn read(&mut self, offset: usize, buffer: &mut [u8]) -> Result<()> {
        self.inner.read(offset, buffer)
    }

    fn write(&mut self, offset: usize, buffer: &[u8]) -> Result<()> {
        self.inner.write(offset, buffer)?;
        self.writes
            .extend(buffer.iter().enumerate().map(|(i, &b)| (offset + i, b)));
        Ok(())
    }
}

/// 64 KiB of zeroed memory with `bytes` placed at the given addresses.
pub(crate) fn flat_memory(bytes: &[(u16, &[u8])]) -> FixedMemory {
    let mut memory = FixedMemory::new(0x10000);
    for &(address, data) in bytes {
        let start = usize::from(address);
        memory.data_mut()[start..start + data.len()].copy_from_slice(data);
    }
    memory
}

pub(crate) struct Outcome {
    pub state: State,
    pub writes: Vec<(usize, u8)>,
    pub memory: FixedMemory,
}

/// Builds a flat address space, places one instruction at PC and executes it.
pub(crate) struct InstructionTest {
    memory: FixedMemory,
    state: State,
}

impl InstructionTest {
    /// Instruction at $0000, power-up registers.
    pub(crate) fn new(program: &[u8]) -> Self {
        Self::at(0, program)
    }

    pub(crate) fn at(pc: u16, program: &[u8]) -> Self {
        Self {
            memory: flat_memory(&[(pc, program)]),
            state: State::POWER_UP.with_pc(pc),
        }
    }

    pub(crate) fn with_state(mut self, f: impl FnOnce(State) -> State) -> Self {
        self.state = f(self.state);
        self
    }

    pub(crate) fn with_bytes(mut self, address: u16, bytes: &[u8]) -> Self {
        let start = usize::from(address);
        self.memory.data_mut()[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub(crate) fn run(self) -> Result<Outcome> {
        let mut memory = TrackingMemory::new(self.memory);
        let instruction = decode(&mut memory, usize::from(self.state.pc()))?;
        let state = execute(instruction, self.state, &mut memory)?;
        Ok(Outcome {
            state,
            writes: memory.writes,
            memory: memory.inner,
        })
    }
}
