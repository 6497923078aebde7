//! # Debug
//! メモリダンプと逆アセンブル

use std::fmt::Write;

use crate::cpu::{decode, AddressingMode, Instruction};
use crate::memory::{MemoryExt, MemoryUnit};

/// 16 bytes per line with an ASCII gutter. `start` is the address printed
/// for `bytes[0]`; at most `length` bytes are dumped.
///
/// ```text
/// 8000: 78 D8 A9 10 8D 00 20 A2  FF 9A AD 02 20 10 FB AD  |x..... ..... ...|
/// ```
pub fn hex_dump(bytes: &[u8], start: u16, length: usize) -> String {
    let bytes = &bytes[..length.min(bytes.len())];
    let mut out = String::new();

    for (line, chunk) in bytes.chunks(16).enumerate() {
        let address = start.wrapping_add((line * 16) as u16);
        let _ = write!(out, "{:04X}: ", address);

        for i in 0..16 {
            match chunk.get(i) {
                Some(b) => {
                    let _ = write!(out, "{:02X} ", b);
                }
                None => out.push_str("   "),
            }
            if i == 7 {
                out.push(' ');
            }
        }

        out.push_str(" |");
        out.extend(chunk.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        out.push_str("|\n");
    }

    out
}

/// Disassembles up to `count` instructions starting at `start`.
///
/// Stops early when the opcode byte cannot be read. Operand bytes beyond the
/// end of memory show as `??`.
pub fn disassemble<M: MemoryUnit + ?Sized>(
    memory: &mut M,
    start: u16,
    count: usize,
) -> Vec<(u16, String)> {
    let mut result = Vec::with_capacity(count);
    let mut pc = start;

    for _ in 0..count {
        let Ok(instruction) = decode(memory, usize::from(pc)) else {
            break;
        };

        let operands: Vec<Option<u8>> = (1..=u16::from(instruction.mode.operand_len()))
            .map(|i| memory.read_u8(usize::from(pc.wrapping_add(i))).ok())
            .collect();

        result.push((pc, format_instruction(&instruction, pc, &operands)));
        // ジャム命令はサイズ0なので1バイト進める
        pc = pc.wrapping_add(u16::from(instruction.size.max(1)));
    }

    result
}

/// Assembler syntax for one instruction at `address` with its operand bytes.
/// Undocumented mnemonics are prefixed with `*`.
pub fn format_instruction(instruction: &Instruction, address: u16, operands: &[Option<u8>]) -> String {
    let byte = |i: usize| match operands.get(i).copied().flatten() {
        Some(b) => format!("{:02X}", b),
        None => "??".to_string(),
    };
    let word = || format!("{}{}", byte(1), byte(0));

    let operand = match instruction.mode {
        AddressingMode::Implicit => String::new(),
        AddressingMode::Accumulator => " A".to_string(),
        AddressingMode::Immediate => format!(" #${}", byte(0)),
        AddressingMode::ZeroPage => format!(" ${}", byte(0)),
        AddressingMode::ZeroPageX => format!(" ${},X", byte(0)),
        AddressingMode::ZeroPageY => format!(" ${},Y", byte(0)),
        AddressingMode::Relative => match operands.first().copied().flatten() {
            Some(b) => {
                let target = address.wrapping_add(2).wrapping_add_signed(i16::from(b as i8));
                format!(" ${:04X}", target)
            }
            None => " $????".to_string(),
        },
        AddressingMode::Absolute => format!(" ${}", word()),
        AddressingMode::AbsoluteX => format!(" ${},X", word()),
        AddressingMode::AbsoluteY => format!(" ${},Y", word()),
        AddressingMode::Indirect => format!(" (${})", word()),
        AddressingMode::IndexedIndirect => format!(" (${},X)", byte(0)),
        AddressingMode::IndirectIndexed => format!(" (${}),Y", byte(0)),
    };

    let marker = if instruction.operation.is_unofficial() {
        "*"
    } else {
        ""
    };
    format!("{}{}{}", marker, instruction.operation, operand)
}
