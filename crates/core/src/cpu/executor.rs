//! # Execution Engine
//!
//! 命令1つを状態とメモリに対して実行し、新しい状態を返す。
//! 実行順序:
//! 1. 実行前のPCでオペランドのアドレスを解決
//! 2. PCを命令サイズ分進め、基本サイクル (+ページ跨ぎペナルティ) を加算
//! 3. 操作ごとのハンドラへディスパッチ

use super::operations::{self, Operand};
use super::{AddressingMode, Instruction, State};
use crate::memory::{MemoryExt, MemoryUnit};
use crate::Result;

/// Executes `instruction`, which must sit at `state.pc()`.
///
/// On error `state` is untouched, but memory writes already made by the
/// handler stay applied.
pub fn execute<M: MemoryUnit + ?Sized>(
    instruction: Instruction,
    state: State,
    memory: &mut M,
) -> Result<State> {
    log::trace!("Executing {} (Current CPU State: {})", instruction, state);

    let (address, crosses_page_boundary) = resolve_address(instruction.mode, state, memory)?;

    let mut cycles = u64::from(instruction.cycles);
    if crosses_page_boundary && instruction.operation.reads_operand() {
        cycles += 1;
    }

    let advanced = state
        .with_pc(state.pc().wrapping_add(u16::from(instruction.size)))
        .tick(cycles);

    let operand = Operand {
        instruction,
        address,
        origin: state.pc(),
    };
    let new_state = operations::dispatch(operand, advanced, memory)?;

    log::debug!("Executed {} (New CPU State: {})", instruction, new_state);
    Ok(new_state)
}

/// Computes the effective address for `mode` from the operand bytes after
/// the opcode at `state.pc()`, and whether indexing crossed a page.
///
/// Implicit and Accumulator resolve to `(0, false)`.
pub fn resolve_address<M: MemoryUnit + ?Sized>(
    mode: AddressingMode,
    state: State,
    memory: &mut M,
) -> Result<(u16, bool)> {
    let pc = state.pc();
    let operand = pc.wrapping_add(1);

    let resolved = match mode {
        AddressingMode::Implicit | AddressingMode::Accumulator => (0, false),
        AddressingMode::Immediate => (operand, false),
        AddressingMode::ZeroPage => (u16::from(read_byte(memory, operand)?), false),
        AddressingMode::ZeroPageX => {
            let base = read_byte(memory, operand)?;
            (u16::from(base.wrapping_add(state.x())), false)
        }
        AddressingMode::ZeroPageY => {
            let base = read_byte(memory, operand)?;
            (u16::from(base.wrapping_add(state.y())), false)
        }
        AddressingMode::Relative => {
            let displacement = read_byte(memory, operand)? as i8;
            let next = pc.wrapping_add(2);
            (next.wrapping_add_signed(i16::from(displacement)), false)
        }
        AddressingMode::Absolute => (read_word(memory, operand)?, false),
        AddressingMode::AbsoluteX => offset(read_word(memory, operand)?, state.x()),
        AddressingMode::AbsoluteY => offset(read_word(memory, operand)?, state.y()),
        AddressingMode::Indirect => {
            let pointer = read_word(memory, operand)?;
            (read_word_within_page(memory, pointer)?, false)
        }
        AddressingMode::IndexedIndirect => {
            let pointer = read_byte(memory, operand)?.wrapping_add(state.x());
            (read_zero_page_word(memory, pointer)?, false)
        }
        AddressingMode::IndirectIndexed => {
            let pointer = read_byte(memory, operand)?;
            offset(read_zero_page_word(memory, pointer)?, state.y())
        }
    };

    log::trace!("Resolved {:?} at {:#06x} to {:#06x}", mode, pc, resolved.0);
    Ok(resolved)
}

/// Whether two addresses lie on different pages.
pub(crate) fn cross(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

fn offset(base: u16, index: u8) -> (u16, bool) {
    let address = base.wrapping_add(u16::from(index));
    (address, cross(base, address))
}

pub(crate) fn read_byte<M: MemoryUnit + ?Sized>(memory: &mut M, address: u16) -> Result<u8> {
    memory.read_u8(usize::from(address))
}

/// Little-endian word; the high byte address wraps at $FFFF.
pub(crate) fn read_word<M: MemoryUnit + ?Sized>(memory: &mut M, address: u16) -> Result<u16> {
    let lo = read_byte(memory, address)?;
    let hi = read_byte(memory, address.wrapping_add(1))?;
    Ok(u16::from_le_bytes([lo, hi]))
}

/// JMP ($xxFF) fetches the high byte from $xx00, not the next page.
fn read_word_within_page<M: MemoryUnit + ?Sized>(memory: &mut M, address: u16) -> Result<u16> {
    let lo = read_byte(memory, address)?;
    let hi_address = (address & 0xFF00) | (address.wrapping_add(1) & 0x00FF);
    let hi = read_byte(memory, hi_address)?;
    Ok(u16::from_le_bytes([lo, hi]))
}

fn read_zero_page_word<M: MemoryUnit + ?Sized>(memory: &mut M, pointer: u8) -> Result<u16> {
    let lo = read_byte(memory, u16::from(pointer))?;
    let hi = read_byte(memory, u16::from(pointer.wrapping_add(1)))?;
    Ok(u16::from_le_bytes([lo, hi]))
}
