//! 各命令のハンドラ
//!
//! ハンドラはPC前進・サイクル加算済みの状態を受け取り、
//! 論理演算に必要な読み書きだけを行う (ダミーサイクルは無し)。

use super::executor::{cross, read_byte, read_word};
use super::{AddressingMode, Flags, Instruction, Operation, State};
use crate::memory::{MemoryExt, MemoryUnit};
use crate::{NesError, Result};

const STACK_BASE: u16 = 0x0100;
const IRQ_VECTOR: u16 = 0xFFFE;
const XAA_MAGIC: u8 = 0xEE;

/// The resolved operand of one instruction.
#[derive(Debug, Clone, Copy)]
pub(super) struct Operand {
    pub instruction: Instruction,
    pub address: u16,
    /// Address of the opcode byte.
    pub origin: u16,
}

impl Operand {
    fn mode(&self) -> AddressingMode {
        self.instruction.mode
    }

    fn unsupported(&self) -> NesError {
        NesError::UnsupportedAddressingMode {
            operation: self.instruction.operation,
            mode: self.instruction.mode,
        }
    }

    fn high_byte(&self) -> u8 {
        (self.address >> 8) as u8
    }

    /// Reads the operand from memory.
    fn read<M: MemoryUnit + ?Sized>(&self, memory: &mut M) -> Result<u8> {
        match self.mode() {
            AddressingMode::Implicit | AddressingMode::Accumulator | AddressingMode::Relative => {
                Err(self.unsupported())
            }
            _ => read_byte(memory, self.address),
        }
    }

    /// Stores to memory; register and immediate operands cannot be written.
    fn write<M: MemoryUnit + ?Sized>(&self, memory: &mut M, value: u8) -> Result<()> {
        match self.mode() {
            AddressingMode::Implicit
            | AddressingMode::Accumulator
            | AddressingMode::Immediate
            | AddressingMode::Relative => Err(self.unsupported()),
            _ => memory.write_u8(usize::from(self.address), value),
        }
    }

    /// Read-modify-write source: A in Accumulator mode, memory otherwise.
    fn read_target<M: MemoryUnit + ?Sized>(&self, state: State, memory: &mut M) -> Result<u8> {
        match self.mode() {
            AddressingMode::Accumulator => Ok(state.a()),
            AddressingMode::Immediate => Err(self.unsupported()),
            _ => self.read(memory),
        }
    }

    fn write_target<M: MemoryUnit + ?Sized>(
        &self,
        state: State,
        memory: &mut M,
        value: u8,
    ) -> Result<State> {
        match self.mode() {
            AddressingMode::Accumulator => Ok(state.with_a(value)),
            _ => {
                self.write(memory, value)?;
                Ok(state)
            }
        }
    }
}

pub(super) fn dispatch<M: MemoryUnit + ?Sized>(
    operand: Operand,
    state: State,
    memory: &mut M,
) -> Result<State> {
    use Operation::*;

    match operand.instruction.operation {
        Adc => adc(operand, state, memory),
        Ahx => ahx(operand, state, memory),
        Alr => alr(operand, state, memory),
        Anc => anc(operand, state, memory),
        And => and(operand, state, memory),
        Arr => arr(operand, state, memory),
        Asl => asl(operand, state, memory),
        Axs => axs(operand, state, memory),
        Bcc => branch(operand, state, !state.p().is_set(Flags::CARRY)),
        Bcs => branch(operand, state, state.p().is_set(Flags::CARRY)),
        Beq => branch(operand, state, state.p().is_set(Flags::ZERO)),
        Bit => bit(operand, state, memory),
        Bmi => branch(operand, state, state.p().is_set(Flags::NEGATIVE)),
        Bne => branch(operand, state, !state.p().is_set(Flags::ZERO)),
        Bpl => branch(operand, state, !state.p().is_set(Flags::NEGATIVE)),
        Brk => brk(state, memory),
        Bvc => branch(operand, state, !state.p().is_set(Flags::OVERFLOW)),
        Bvs => branch(operand, state, state.p().is_set(Flags::OVERFLOW)),
        Clc => Ok(state.with_p(state.p().without(Flags::CARRY))),
        Cld => Ok(state.with_p(state.p().without(Flags::DECIMAL))),
        Cli => Ok(state.with_p(state.p().without(Flags::INTERRUPT_DISABLE))),
        Clv => Ok(state.with_p(state.p().without(Flags::OVERFLOW))),
        Cmp => {
            let m = operand.read(memory)?;
            Ok(compare(state, state.a(), m))
        }
        Cpx => {
            let m = operand.read(memory)?;
            Ok(compare(state, state.x(), m))
        }
        Cpy => {
            let m = operand.read(memory)?;
            Ok(compare(state, state.y(), m))
        }
        Dcp => dcp(operand, state, memory),
        Dec => dec(operand, state, memory),
        Dex => Ok(load_x(state, state.x().wrapping_sub(1))),
        Dey => Ok(load_y(state, state.y().wrapping_sub(1))),
        Eor => {
            let m = operand.read(memory)?;
            Ok(load_a(state, state.a() ^ m))
        }
        Inc => inc(operand, state, memory),
        Inx => Ok(load_x(state, state.x().wrapping_add(1))),
        Iny => Ok(load_y(state, state.y().wrapping_add(1))),
        Isc => isc(operand, state, memory),
        Jmp => jmp(operand, state),
        Jsr => jsr(operand, state, memory),
        Kil => Err(NesError::Halted {
            opcode: operand.instruction.opcode,
            address: operand.origin,
        }),
        Las => las(operand, state, memory),
        Lax => {
            let m = operand.read(memory)?;
            Ok(load_x(load_a(state, m), m))
        }
        Lda => {
            let m = operand.read(memory)?;
            Ok(load_a(state, m))
        }
        Ldx => {
            let m = operand.read(memory)?;
            Ok(load_x(state, m))
        }
        Ldy => {
            let m = operand.read(memory)?;
            Ok(load_y(state, m))
        }
        Lsr => lsr(operand, state, memory),
        Nop => nop(operand, state, memory),
        Ora => {
            let m = operand.read(memory)?;
            Ok(load_a(state, state.a() | m))
        }
        Pha => push(state, memory, state.a()),
        Php => push(state, memory, (state.p() | Flags::BREAK | Flags::RESERVED).bits()),
        Pla => {
            let (state, value) = pull(state, memory)?;
            Ok(load_a(state, value))
        }
        Plp => {
            let (state, value) = pull(state, memory)?;
            Ok(state.with_p(pulled_flags(value)))
        }
        Rla => rla(operand, state, memory),
        Rol => rol(operand, state, memory),
        Ror => ror(operand, state, memory),
        Rra => rra(operand, state, memory),
        Rti => rti(state, memory),
        Rts => rts(state, memory),
        Sax => {
            operand.write(memory, state.a() & state.x())?;
            Ok(state)
        }
        Sbc => {
            let m = operand.read(memory)?;
            Ok(add_with_carry(state, !m))
        }
        Sec => Ok(state.with_p(state.p().with(Flags::CARRY))),
        Sed => Ok(state.with_p(state.p().with(Flags::DECIMAL))),
        Sei => Ok(state.with_p(state.p().with(Flags::INTERRUPT_DISABLE))),
        Shx => {
            operand.write(memory, state.x() & operand.high_byte())?;
            Ok(state)
        }
        Shy => {
            operand.write(memory, state.y() & operand.high_byte())?;
            Ok(state)
        }
        Slo => slo(operand, state, memory),
        Sre => sre(operand, state, memory),
        Sta => {
            operand.write(memory, state.a())?;
            Ok(state)
        }
        Stx => {
            operand.write(memory, state.x())?;
            Ok(state)
        }
        Sty => {
            operand.write(memory, state.y())?;
            Ok(state)
        }
        Tas => tas(operand, state, memory),
        Tax => Ok(load_x(state, state.a())),
        Tay => Ok(load_y(state, state.a())),
        Tsx => Ok(load_x(state, state.s())),
        Txa => Ok(load_a(state, state.x())),
        Txs => Ok(state.with_s(state.x())),
        Tya => Ok(load_a(state, state.y())),
        Xaa => {
            let m = operand.read(memory)?;
            Ok(load_a(state, (state.a() | XAA_MAGIC) & state.x() & m))
        }
    }
}

fn load_a(state: State, value: u8) -> State {
    state
        .with_a(value)
        .with_p(state.p().with_zero_negative(value))
}

fn load_x(state: State, value: u8) -> State {
    state
        .with_x(value)
        .with_p(state.p().with_zero_negative(value))
}

fn load_y(state: State, value: u8) -> State {
    state
        .with_y(value)
        .with_p(state.p().with_zero_negative(value))
}

fn carry(state: State) -> u8 {
    u8::from(state.p().is_set(Flags::CARRY))
}

/// A + M + C. SBC passes `!M`. Decimal mode does not exist on the NES.
fn add_with_carry(state: State, m: u8) -> State {
    let a = state.a();
    let sum = u16::from(a) + u16::from(m) + u16::from(carry(state));
    let r = sum as u8;

    // 同符号同士の加算で符号が変わったらオーバーフロー
    let overflow = (a ^ m) & 0x80 == 0 && (a ^ r) & 0x80 != 0;

    let flags = state
        .p()
        .set_if(sum > 0xFF, Flags::CARRY)
        .with_zero_negative(r)
        .set_if(overflow, Flags::OVERFLOW);
    state.with_a(r).with_p(flags)
}

fn compare(state: State, register: u8, m: u8) -> State {
    let flags = state
        .p()
        .set_if(register >= m, Flags::CARRY)
        .with_zero_negative(register.wrapping_sub(m));
    state.with_p(flags)
}

fn adc<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let m = operand.read(memory)?;
    Ok(add_with_carry(state, m))
}

fn ahx<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let value = state.a() & state.x() & operand.high_byte();
    operand.write(memory, value)?;
    Ok(state)
}

fn alr<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let t = state.a() & operand.read(memory)?;
    let r = t >> 1;
    let flags = state
        .p()
        .set_if(t & 0x01 != 0, Flags::CARRY)
        .with_zero_negative(r);
    Ok(state.with_a(r).with_p(flags))
}

fn anc<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let r = state.a() & operand.read(memory)?;
    let flags = state
        .p()
        .with_zero_negative(r)
        .set_if(r & 0x80 != 0, Flags::CARRY);
    Ok(state.with_a(r).with_p(flags))
}

fn and<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let m = operand.read(memory)?;
    Ok(load_a(state, state.a() & m))
}

fn arr<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let t = state.a() & operand.read(memory)?;
    let r = (t >> 1) | (carry(state) << 7);
    let bit6 = r & 0x40 != 0;
    let bit5 = r & 0x20 != 0;
    let flags = state
        .p()
        .with_zero_negative(r)
        .set_if(bit6, Flags::CARRY)
        .set_if(bit6 != bit5, Flags::OVERFLOW);
    Ok(state.with_a(r).with_p(flags))
}

/// Zero is only updated when shifting the accumulator.
fn asl<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let value = operand.read_target(state, memory)?;
    let r = value << 1;

    let mut flags = state.p().set_if(value & 0x80 != 0, Flags::CARRY);
    if operand.mode() == AddressingMode::Accumulator {
        flags = flags.set_if(r == 0, Flags::ZERO);
    }
    flags = flags.set_if(r & 0x80 != 0, Flags::NEGATIVE);

    let state = operand.write_target(state, memory, r)?;
    Ok(state.with_p(flags))
}

fn axs<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let m = operand.read(memory)?;
    let t = state.a() & state.x();
    let r = t.wrapping_sub(m);
    let flags = state
        .p()
        .set_if(t >= m, Flags::CARRY)
        .with_zero_negative(r);
    Ok(state.with_x(r).with_p(flags))
}

/// Taken: +1 cycle, +1 more when the target is on another page than the
/// next instruction.
fn branch(operand: Operand, state: State, condition: bool) -> Result<State> {
    if operand.mode() != AddressingMode::Relative {
        return Err(operand.unsupported());
    }
    if !condition {
        return Ok(state);
    }

    let target = operand.address;
    let penalty = if cross(state.pc(), target) { 2 } else { 1 };
    Ok(state.with_pc(target).tick(penalty))
}

fn bit<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let m = operand.read(memory)?;
    let flags = state
        .p()
        .set_if(state.a() & m == 0, Flags::ZERO)
        .set_if(m & 0x40 != 0, Flags::OVERFLOW)
        .set_if(m & 0x80 != 0, Flags::NEGATIVE);
    Ok(state.with_p(flags))
}

fn brk<M: MemoryUnit + ?Sized>(state: State, memory: &mut M) -> Result<State> {
    // BRK は1バイト命令だが、戻りアドレスはパディングバイトの次
    let state = push_word(state, memory, state.pc().wrapping_add(1))?;
    let state = push(state, memory, (state.p() | Flags::BREAK | Flags::RESERVED).bits())?;
    let pc = read_word(memory, IRQ_VECTOR)?;
    Ok(state
        .with_p(state.p().with(Flags::INTERRUPT_DISABLE))
        .with_pc(pc))
}

fn dcp<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let r = operand.read(memory)?.wrapping_sub(1);
    operand.write(memory, r)?;
    Ok(compare(state, state.a(), r))
}

fn dec<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let r = operand.read(memory)?.wrapping_sub(1);
    operand.write(memory, r)?;
    Ok(state.with_p(state.p().with_zero_negative(r)))
}

fn inc<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let r = operand.read(memory)?.wrapping_add(1);
    operand.write(memory, r)?;
    Ok(state.with_p(state.p().with_zero_negative(r)))
}

fn isc<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let r = operand.read(memory)?.wrapping_add(1);
    operand.write(memory, r)?;
    Ok(add_with_carry(state, !r))
}

fn jmp(operand: Operand, state: State) -> Result<State> {
    match operand.mode() {
        AddressingMode::Absolute | AddressingMode::Indirect => Ok(state.with_pc(operand.address)),
        _ => Err(operand.unsupported()),
    }
}

fn jsr<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    if operand.mode() != AddressingMode::Absolute {
        return Err(operand.unsupported());
    }
    // 戻りアドレス - 1 を積む (RTS で +1 される)
    let state = push_word(state, memory, state.pc().wrapping_sub(1))?;
    Ok(state.with_pc(operand.address))
}

fn las<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let r = operand.read(memory)? & state.s();
    Ok(load_x(load_a(state, r), r).with_s(r))
}

fn lsr<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let value = operand.read_target(state, memory)?;
    let r = value >> 1;
    let flags = state
        .p()
        .set_if(value & 0x01 != 0, Flags::CARRY)
        .with_zero_negative(r);
    let state = operand.write_target(state, memory, r)?;
    Ok(state.with_p(flags))
}

fn nop<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    if operand.mode() != AddressingMode::Implicit {
        operand.read(memory)?;
    }
    Ok(state)
}

fn rla<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let value = operand.read(memory)?;
    let r = (value << 1) | carry(state);
    operand.write(memory, r)?;
    let state = load_a(state, state.a() & r);
    Ok(state.with_p(state.p().set_if(value & 0x80 != 0, Flags::CARRY)))
}

fn rol<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let value = operand.read_target(state, memory)?;
    let r = (value << 1) | carry(state);
    let flags = state
        .p()
        .set_if(value & 0x80 != 0, Flags::CARRY)
        .with_zero_negative(r);
    let state = operand.write_target(state, memory, r)?;
    Ok(state.with_p(flags))
}

fn ror<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let value = operand.read_target(state, memory)?;
    let r = (value >> 1) | (carry(state) << 7);
    let flags = state
        .p()
        .set_if(value & 0x01 != 0, Flags::CARRY)
        .with_zero_negative(r);
    let state = operand.write_target(state, memory, r)?;
    Ok(state.with_p(flags))
}

fn rra<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let value = operand.read(memory)?;
    let r = (value >> 1) | (carry(state) << 7);
    operand.write(memory, r)?;
    let state = state.with_p(state.p().set_if(value & 0x01 != 0, Flags::CARRY));
    Ok(add_with_carry(state, r))
}

fn rti<M: MemoryUnit + ?Sized>(state: State, memory: &mut M) -> Result<State> {
    let (state, flags) = pull(state, memory)?;
    let (state, pc) = pull_word(state, memory)?;
    Ok(state.with_p(pulled_flags(flags)).with_pc(pc))
}

fn rts<M: MemoryUnit + ?Sized>(state: State, memory: &mut M) -> Result<State> {
    let (state, pc) = pull_word(state, memory)?;
    Ok(state.with_pc(pc.wrapping_add(1)))
}

fn slo<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let value = operand.read(memory)?;
    let r = value << 1;
    operand.write(memory, r)?;
    let state = load_a(state, state.a() | r);
    Ok(state.with_p(state.p().set_if(value & 0x80 != 0, Flags::CARRY)))
}

fn sre<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let value = operand.read(memory)?;
    let r = value >> 1;
    operand.write(memory, r)?;
    let state = load_a(state, state.a() ^ r);
    Ok(state.with_p(state.p().set_if(value & 0x01 != 0, Flags::CARRY)))
}

fn tas<M: MemoryUnit + ?Sized>(operand: Operand, state: State, memory: &mut M) -> Result<State> {
    let s = state.a() & state.x();
    operand.write(memory, s & operand.high_byte())?;
    Ok(state.with_s(s))
}

/// B only exists on the stack copy; bit 5 always reads back as 1.
fn pulled_flags(value: u8) -> Flags {
    Flags::from_bits_retain(value)
        .without(Flags::BREAK)
        .with(Flags::RESERVED)
}

fn stack_address(s: u8) -> usize {
    usize::from(STACK_BASE | u16::from(s))
}

fn push<M: MemoryUnit + ?Sized>(state: State, memory: &mut M, value: u8) -> Result<State> {
    memory.write_u8(stack_address(state.s()), value)?;
    Ok(state.with_s(state.s().wrapping_sub(1)))
}

fn pull<M: MemoryUnit + ?Sized>(state: State, memory: &mut M) -> Result<(State, u8)> {
    let s = state.s().wrapping_add(1);
    let value = memory.read_u8(stack_address(s))?;
    Ok((state.with_s(s), value))
}

fn push_word<M: MemoryUnit + ?Sized>(state: State, memory: &mut M, value: u16) -> Result<State> {
    let [lo, hi] = value.to_le_bytes();
    let state = push(state, memory, hi)?;
    push(state, memory, lo)
}

fn pull_word<M: MemoryUnit + ?Sized>(state: State, memory: &mut M) -> Result<(State, u16)> {
    let (state, lo) = pull(state, memory)?;
    let (state, hi) = pull(state, memory)?;
    Ok((state, u16::from_le_bytes([lo, hi])))
}
