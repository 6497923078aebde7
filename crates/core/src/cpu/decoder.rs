//! # Decoder
//!
//! オペコード1バイトから命令を引く。4つの並列テーブルを使う。
//! 非公式命令を含む標準のオペコード表に従い、KIL (ジャム) のサイズのみ 0。

use super::instruction::AddressingMode::{self, *};
use super::instruction::Operation::{self, *};
use super::Instruction;
use crate::memory::{MemoryExt, MemoryUnit};
use crate::Result;

/// Reads the opcode byte at `offset` and looks it up.
pub fn decode<M: MemoryUnit + ?Sized>(memory: &mut M, offset: usize) -> Result<Instruction> {
    let opcode = memory.read_u8(offset)?;
    Ok(lookup(opcode))
}

/// Table lookup without touching memory.
pub const fn lookup(opcode: u8) -> Instruction {
    let index = opcode as usize;
    Instruction {
        opcode,
        operation: OPERATIONS[index],
        mode: ADDRESSING_MODES[index],
        cycles: CYCLES[index],
        size: SIZES[index],
    }
}

pub(super) const OPERATIONS: [Operation; 256] = [
    //  x0   x1   x2   x3   x4   x5   x6   x7   x8   x9   xA   xB   xC   xD   xE   xF
    Brk, Ora, Kil, Slo, Nop, Ora, Asl, Slo, Php, Ora, Asl, Anc, Nop, Ora, Asl, Slo, // 0x
    Bpl, Ora, Kil, Slo, Nop, Ora, Asl, Slo, Clc, Ora, Nop, Slo, Nop, Ora, Asl, Slo, // 1x
    Jsr, And, Kil, Rla, Bit, And, Rol, Rla, Plp, And, Rol, Anc, Bit, And, Rol, Rla, // 2x
    Bmi, And, Kil, Rla, Nop, And, Rol, Rla, Sec, And, Nop, Rla, Nop, And, Rol, Rla, // 3x
    Rti, Eor, Kil, Sre, Nop, Eor, Lsr, Sre, Pha, Eor, Lsr, Alr, Jmp, Eor, Lsr, Sre, // 4x
    Bvc, Eor, Kil, Sre, Nop, Eor, Lsr, Sre, Cli, Eor, Nop, Sre, Nop, Eor, Lsr, Sre, // 5x
    Rts, Adc, Kil, Rra, Nop, Adc, Ror, Rra, Pla, Adc, Ror, Arr, Jmp, Adc, Ror, Rra, // 6x
    Bvs, Adc, Kil, Rra, Nop, Adc, Ror, Rra, Sei, Adc, Nop, Rra, Nop, Adc, Ror, Rra, // 7x
    Nop, Sta, Nop, Sax, Sty, Sta, Stx, Sax, Dey, Nop, Txa, Xaa, Sty, Sta, Stx, Sax, // 8x
    Bcc, Sta, Kil, Ahx, Sty, Sta, Stx, Sax, Tya, Sta, Txs, Tas, Shy, Sta, Shx, Ahx, // 9x
    Ldy, Lda, Ldx, Lax, Ldy, Lda, Ldx, Lax, Tay, Lda, Tax, Lax, Ldy, Lda, Ldx, Lax, // Ax
    Bcs, Lda, Kil, Lax, Ldy, Lda, Ldx, Lax, Clv, Lda, Tsx, Las, Ldy, Lda, Ldx, Lax, // Bx
    Cpy, Cmp, Nop, Dcp, Cpy, Cmp, Dec, Dcp, Iny, Cmp, Dex, Axs, Cpy, Cmp, Dec, Dcp, // Cx
    Bne, Cmp, Kil, Dcp, Nop, Cmp, Dec, Dcp, Cld, Cmp, Nop, Dcp, Nop, Cmp, Dec, Dcp, // Dx
    Cpx, Sbc, Nop, Isc, Cpx, Sbc, Inc, Isc, Inx, Sbc, Nop, Sbc, Cpx, Sbc, Inc, Isc, // Ex
    Beq, Sbc, Kil, Isc, Nop, Sbc, Inc, Isc, Sed, Sbc, Nop, Isc, Nop, Sbc, Inc, Isc, // Fx
];

pub(super) const ADDRESSING_MODES: [AddressingMode; 256] = [
    Implicit,        IndexedIndirect, Implicit,        IndexedIndirect, ZeroPage,        ZeroPage,        ZeroPage,        ZeroPage, // 00
    Implicit,        Immediate,       Accumulator,     Immediate,       Absolute,        Absolute,        Absolute,        Absolute, // 08
    Relative,        IndirectIndexed, Implicit,        IndirectIndexed, ZeroPageX,       ZeroPageX,       ZeroPageX,       ZeroPageX, // 10
    Implicit,        AbsoluteY,       Implicit,        AbsoluteY,       AbsoluteX,       AbsoluteX,       AbsoluteX,       AbsoluteX, // 18
    Absolute,        IndexedIndirect, Implicit,        IndexedIndirect, ZeroPage,        ZeroPage,        ZeroPage,        ZeroPage, // 20
    Implicit,        Immediate,       Accumulator,     Immediate,       Absolute,        Absolute,        Absolute,        Absolute, // 28
    Relative,        IndirectIndexed, Implicit,        IndirectIndexed, ZeroPageX,       ZeroPageX,       ZeroPageX,       ZeroPageX, // 30
    Implicit,        AbsoluteY,       Implicit,        AbsoluteY,       AbsoluteX,       AbsoluteX,       AbsoluteX,       AbsoluteX, // 38
    Implicit,        IndexedIndirect, Implicit,        IndexedIndirect, ZeroPage,        ZeroPage,        ZeroPage,        ZeroPage, // 40
    Implicit,        Immediate,       Accumulator,     Immediate,       Absolute,        Absolute,        Absolute,        Absolute, // 48
    Relative,        IndirectIndexed, Implicit,        IndirectIndexed, ZeroPageX,       ZeroPageX,       ZeroPageX,       ZeroPageX, // 50
    Implicit,        AbsoluteY,       Implicit,        AbsoluteY,       AbsoluteX,       AbsoluteX,       AbsoluteX,       AbsoluteX, // 58
    Implicit,        IndexedIndirect, Implicit,        IndexedIndirect, ZeroPage,        ZeroPage,        ZeroPage,        ZeroPage, // 60
    Implicit,        Immediate,       Accumulator,     Immediate,       Indirect,        Absolute,        Absolute,        Absolute, // 68
    Relative,        IndirectIndexed, Implicit,        IndirectIndexed, ZeroPageX,       ZeroPageX,       ZeroPageX,       ZeroPageX, // 70
    Implicit,        AbsoluteY,       Implicit,        AbsoluteY,       AbsoluteX,       AbsoluteX,       AbsoluteX,       AbsoluteX, // 78
    Immediate,       IndexedIndirect, Immediate,       IndexedIndirect, ZeroPage,        ZeroPage,        ZeroPage,        ZeroPage, // 80
    Implicit,        Immediate,       Implicit,        Immediate,       Absolute,        Absolute,        Absolute,        Absolute, // 88
    Relative,        IndirectIndexed, Implicit,        IndirectIndexed, ZeroPageX,       ZeroPageX,       ZeroPageY,       ZeroPageY, // 90
    Implicit,        AbsoluteY,       Implicit,        AbsoluteY,       AbsoluteX,       AbsoluteX,       AbsoluteY,       AbsoluteY, // 98
    Immediate,       IndexedIndirect, Immediate,       IndexedIndirect, ZeroPage,        ZeroPage,        ZeroPage,        ZeroPage, // A0
    Implicit,        Immediate,       Implicit,        Immediate,       Absolute,        Absolute,        Absolute,        Absolute, // A8
    Relative,        IndirectIndexed, Implicit,        IndirectIndexed, ZeroPageX,       ZeroPageX,       ZeroPageY,       ZeroPageY, // B0
    Implicit,        AbsoluteY,       Implicit,        AbsoluteY,       AbsoluteX,       AbsoluteX,       AbsoluteY,       AbsoluteY, // B8
    Immediate,       IndexedIndirect, Immediate,       IndexedIndirect, ZeroPage,        ZeroPage,        ZeroPage,        ZeroPage, // C0
    Implicit,        Immediate,       Implicit,        Immediate,       Absolute,        Absolute,        Absolute,        Absolute, // C8
    Relative,        IndirectIndexed, Implicit,        IndirectIndexed, ZeroPageX,       ZeroPageX,       ZeroPageX,       ZeroPageX, // D0
    Implicit,        AbsoluteY,       Implicit,        AbsoluteY,       AbsoluteX,       AbsoluteX,       AbsoluteX,       AbsoluteX, // D8
    Immediate,       IndexedIndirect, Immediate,       IndexedIndirect, ZeroPage,        ZeroPage,        ZeroPage,        ZeroPage, // E0
    Implicit,        Immediate,       Implicit,        Immediate,       Absolute,        Absolute,        Absolute,        Absolute, // E8
    Relative,        IndirectIndexed, Implicit,        IndirectIndexed, ZeroPageX,       ZeroPageX,       ZeroPageX,       ZeroPageX, // F0
    Implicit,        AbsoluteY,       Implicit,        AbsoluteY,       AbsoluteX,       AbsoluteX,       AbsoluteX,       AbsoluteX, // F8
];

pub(super) const CYCLES: [u8; 256] = [
    // 0 1  2  3  4  5  6  7  8  9  A  B  C  D  E  F
    7, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6, // 0x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 1x
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6, // 2x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 3x
    6, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6, // 4x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 5x
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6, // 6x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 7x
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // 8x
    2, 6, 2, 6, 4, 4, 4, 4, 2, 5, 2, 5, 5, 5, 5, 5, // 9x
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // Ax
    2, 5, 2, 5, 4, 4, 4, 4, 2, 4, 2, 4, 4, 4, 4, 4, // Bx
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // Cx
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // Dx
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // Ex
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // Fx
];

pub(super) const SIZES: [u8; 256] = [
    // 0 1  2  3  4  5  6  7  8  9  A  B  C  D  E  F
    1, 2, 0, 2, 2, 2, 2, 2, 1, 2, 1, 2, 3, 3, 3, 3, // 0x
    2, 2, 0, 2, 2, 2, 2, 2, 1, 3, 1, 3, 3, 3, 3, 3, // 1x
    3, 2, 0, 2, 2, 2, 2, 2, 1, 2, 1, 2, 3, 3, 3, 3, // 2x
    2, 2, 0, 2, 2, 2, 2, 2, 1, 3, 1, 3, 3, 3, 3, 3, // 3x
    1, 2, 0, 2, 2, 2, 2, 2, 1, 2, 1, 2, 3, 3, 3, 3, // 4x
    2, 2, 0, 2, 2, 2, 2, 2, 1, 3, 1, 3, 3, 3, 3, 3, // 5x
    1, 2, 0, 2, 2, 2, 2, 2, 1, 2, 1, 2, 3, 3, 3, 3, // 6x
    2, 2, 0, 2, 2, 2, 2, 2, 1, 3, 1, 3, 3, 3, 3, 3, // 7x
    2, 2, 2, 2, 2, 2, 2, 2, 1, 2, 1, 2, 3, 3, 3, 3, // 8x
    2, 2, 0, 2, 2, 2, 2, 2, 1, 3, 1, 3, 3, 3, 3, 3, // 9x
    2, 2, 2, 2, 2, 2, 2, 2, 1, 2, 1, 2, 3, 3, 3, 3, // Ax
    2, 2, 0, 2, 2, 2, 2, 2, 1, 3, 1, 3, 3, 3, 3, 3, // Bx
    2, 2, 2, 2, 2, 2, 2, 2, 1, 2, 1, 2, 3, 3, 3, 3, // Cx
    2, 2, 0, 2, 2, 2, 2, 2, 1, 3, 1, 3, 3, 3, 3, 3, // Dx
    2, 2, 2, 2, 2, 2, 2, 2, 1, 2, 1, 2, 3, 3, 3, 3, // Ex
    2, 2, 0, 2, 2, 2, 2, 2, 1, 3, 1, 3, 3, 3, 3, 3, // Fx
];
