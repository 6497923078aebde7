//! 命令の表現: 操作・アドレッシングモード・サイクル数・サイズ

use std::fmt;

/// Every mnemonic the 6502 executes, including the undocumented ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    Adc,
    Ahx,
    Alr,
    Anc,
    And,
    Arr,
    Asl,
    Axs,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dcp,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Isc,
    Jmp,
    Jsr,
    Kil,
    Las,
    Lax,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rla,
    Rol,
    Ror,
    Rra,
    Rti,
    Rts,
    Sax,
    Sbc,
    Sec,
    Sed,
    Sei,
    Shx,
    Shy,
    Slo,
    Sre,
    Sta,
    Stx,
    Sty,
    Tas,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    Xaa,
}

impl Operation {
    /// Operations that spend an extra cycle when indexing crosses a page.
    pub const fn reads_operand(self) -> bool {
        use Operation::*;
        matches!(
            self,
            Adc | And | Cmp | Eor | Las | Lax | Lda | Ldx | Ldy | Nop | Ora | Sbc
        )
    }

    pub const fn is_branch(self) -> bool {
        use Operation::*;
        matches!(self, Bcc | Bcs | Beq | Bmi | Bne | Bpl | Bvc | Bvs)
    }

    /// Undocumented mnemonics. Unofficial aliases of official ones ($EB SBC,
    /// the extra NOPs) report `false`.
    pub const fn is_unofficial(self) -> bool {
        use Operation::*;
        matches!(
            self,
            Ahx | Alr | Anc | Arr | Axs | Dcp | Isc | Kil | Las | Lax | Rla | Rra | Sax | Shx
                | Shy | Slo | Sre | Tas | Xaa
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format!("{self:?}").to_ascii_uppercase())
    }
}

/// アドレッシングモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressingMode {
    Implicit,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect,
    IndirectIndexed,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    pub const fn operand_len(self) -> u8 {
        use AddressingMode::*;
        match self {
            Implicit | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | Relative | IndexedIndirect
            | IndirectIndexed => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A decoded opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    pub opcode: u8,
    pub operation: Operation,
    pub mode: AddressingMode,
    /// Cycles before page-cross and branch penalties.
    pub cycles: u8,
    /// Total length in bytes; 0 for the jam opcodes.
    pub size: u8,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${:02X} {} ({}, Base Cycles: {})",
            self.opcode, self.operation, self.mode, self.cycles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let instruction = Instruction {
            opcode: 0x69,
            operation: Operation::Adc,
            mode: AddressingMode::Immediate,
            cycles: 2,
            size: 2,
        };
        assert_eq!(instruction.to_string(), "$69 ADC (Immediate, Base Cycles: 2)");
    }

    #[test]
    fn test_operation_mnemonics() {
        assert_eq!(Operation::Sed.to_string(), "SED");
        assert_eq!(Operation::Sei.to_string(), "SEI");
        assert_ne!(Operation::Sed, Operation::Sei);
        assert_eq!(Operation::Kil.to_string(), "KIL");
    }

    #[test]
    fn test_operand_len() {
        assert_eq!(AddressingMode::Accumulator.operand_len(), 0);
        assert_eq!(AddressingMode::Relative.operand_len(), 1);
        assert_eq!(AddressingMode::Indirect.operand_len(), 2);
    }

    #[test]
    fn test_read_class() {
        assert!(Operation::Lda.reads_operand());
        assert!(!Operation::Sta.reads_operand());
        assert!(!Operation::Asl.reads_operand());
        assert!(Operation::Beq.is_branch());
    }

    #[test]
    fn test_unofficial() {
        assert!(Operation::Lax.is_unofficial());
        assert!(Operation::Kil.is_unofficial());
        assert!(!Operation::Nop.is_unofficial());
        assert!(!Operation::Sbc.is_unofficial());
    }
}
