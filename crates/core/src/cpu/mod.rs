//! # 6502 CPU Implementation
//!
//! デコーダ・実行エンジン・レジスタ状態から成る。
//! [`decode`] で命令を引き、[`execute`] で新しい [`State`] を得る。
//! [`Cpu`] はその2つを [`Cpu::step`] にまとめたもの。

mod decoder;
mod executor;
mod flags;
mod instruction;
mod operations;
mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use decoder::{decode, lookup};
pub use executor::{execute, resolve_address};
pub use flags::Flags;
pub use instruction::{AddressingMode, Instruction, Operation};
pub use state::State;

use crate::memory::{MemoryExt, MemoryUnit};
use crate::Result;

/// Address of the little-endian reset vector.
pub const RESET_VECTOR: u16 = 0xFFFC;

/// Receives every executed instruction with the state before and after it.
pub trait CpuObserver {
    fn on_step(&mut self, instruction: &Instruction, old: &State, new: &State);
}

impl<F: FnMut(&Instruction, &State, &State)> CpuObserver for F {
    fn on_step(&mut self, instruction: &Instruction, old: &State, new: &State) {
        self(instruction, old, new)
    }
}

pub struct Cpu<M: MemoryUnit> {
    memory: M,
    current_state: State,
    observer: Option<Box<dyn CpuObserver>>,
}

impl<M: MemoryUnit> Cpu<M> {
    /// 電源投入状態でCPUを作成
    pub fn new(memory: M) -> Self {
        Self::with_state(State::POWER_UP, memory)
    }

    pub fn with_state(state: State, memory: M) -> Self {
        Self {
            memory,
            current_state: state,
            observer: None,
        }
    }

    pub fn state(&self) -> State {
        self.current_state
    }

    pub fn set_state(&mut self, state: State) {
        self.current_state = state;
    }

    pub fn pc(&self) -> u16 {
        self.current_state.pc()
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn into_memory(self) -> M {
        self.memory
    }

    pub fn set_observer(&mut self, observer: impl CpuObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Loads PC from the reset vector. Other registers are left alone.
    pub fn reset(&mut self) -> Result<()> {
        let pc = self.memory.read_u16_le(usize::from(RESET_VECTOR))?;
        log::info!("CPU reset: PC=${:04X}", pc);
        self.current_state = self.current_state.with_pc(pc);
        Ok(())
    }

    /// Decodes and executes the instruction at PC.
    ///
    /// If execution fails the current state is kept as it was.
    pub fn step(&mut self) -> Result<Instruction> {
        let old = self.current_state;
        let instruction = decode(&mut self.memory, usize::from(old.pc()))?;
        let new = execute(instruction, old, &mut self.memory)?;

        if let Some(observer) = self.observer.as_mut() {
            observer.on_step(&instruction, &old, &new);
        }

        self.current_state = new;
        Ok(instruction)
    }

    /// Runs up to `count` instructions, stopping at the first error.
    pub fn run(&mut self, count: usize) -> Result<u64> {
        let start = self.current_state.clock();
        for _ in 0..count {
            self.step()?;
        }
        Ok(self.current_state.clock() - start)
    }
}

impl<M: MemoryUnit + std::fmt::Debug> std::fmt::Debug for Cpu<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("memory", &self.memory)
            .field("current_state", &self.current_state)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
