//! エラー型の定義

use thiserror::Error;

use crate::cpu::AddressingMode;
use crate::cpu::Operation;

/// エミュレータコアのエラー型
#[derive(Error, Debug)]
pub enum NesError {
    #[error("Offset {offset:#06x} + {length} bytes is not addressable")]
    OffsetOutOfRange { offset: usize, length: usize },

    #[error("Access of {length} bytes at {offset:#06x} goes out of the bounds of the memory ({len} bytes)")]
    OutOfBounds {
        offset: usize,
        length: usize,
        len: usize,
    },

    #[error("Reading from this memory is not permitted")]
    ReadNotPermitted,

    #[error("Writing to this memory is not permitted")]
    WriteNotPermitted,

    #[error("Cannot attach memory at {start:#06x}-{end:#06x}: overlaps existing unit at {existing_start:#06x}-{existing_end:#06x}")]
    Overlap {
        start: usize,
        end: usize,
        existing_start: usize,
        existing_end: usize,
    },

    #[error("Cannot write to {0:#06x}, there is no memory there")]
    UnmappedWrite(usize),

    #[error("Cannot detach memory unit, it is not attached")]
    NotAttached,

    #[error("Addressing mode {mode:?} is not supported by {operation}")]
    UnsupportedAddressingMode {
        operation: Operation,
        mode: AddressingMode,
    },

    #[error("Value {value} is out of the allowed range for register {register}")]
    RegisterOutOfRange { register: &'static str, value: i64 },

    #[error("CPU halted by {opcode:#04x} at {address:#06x}")]
    Halted { opcode: u8, address: u16 },

    #[error("Invalid ROM format: {0}")]
    InvalidRom(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result型のエイリアス
pub type Result<T> = std::result::Result<T, NesError>;
