//! # System
//!
//! NES の CPU アドレス空間を組み立てる。
//!
//! | 範囲          | 内容                                    |
//! |---------------|-----------------------------------------|
//! | $0000-$1FFF   | 内部RAM 2KB (4回ミラー)                  |
//! | $2000-$3FFF   | PPUレジスタ 8バイト (ミラー, 値を保持するだけ) |
//! | $4000-$401F   | APU/IOレジスタ (値を保持するだけ)         |
//! | $6000-$7FFF   | PRG RAM 8KB                             |
//! | $8000-$FFFF   | PRG ROM (読み取り専用, 16KBならミラー)    |

use crate::memory::{FixedMemory, MirroredMemory, VirtualMemory};
use crate::rom::Rom;
use crate::{NesError, Result};

pub const RAM_SIZE: usize = 0x0800;
pub const RAM_WINDOW: usize = 0x2000;
pub const PPU_REGISTERS_START: usize = 0x2000;
pub const PPU_REGISTER_COUNT: usize = 8;
pub const IO_REGISTERS_START: usize = 0x4000;
pub const IO_REGISTER_COUNT: usize = 0x20;
pub const PRG_RAM_START: usize = 0x6000;
pub const PRG_RAM_SIZE: usize = 0x2000;
pub const PRG_ROM_START: usize = 0x8000;
pub const PRG_ROM_WINDOW: usize = 0x8000;

/// Builds the CPU memory map for `rom`.
///
/// The PPU and APU are not emulated: their register windows only latch the
/// last byte written so that programs touching them keep running.
pub fn nes_memory_map(rom: &Rom) -> Result<VirtualMemory> {
    if rom.prg_rom.is_empty() {
        return Err(NesError::InvalidRom("ROM has no PRG banks".to_string()));
    }
    if rom.header.mapper != 0 {
        log::warn!(
            "Mapper {} is not supported, mapping the first {} KiB of PRG ROM as NROM",
            rom.header.mapper,
            PRG_ROM_WINDOW / 1024
        );
    }

    let mut memory = VirtualMemory::new();
    memory.attach_unit(0, MirroredMemory::new(RAM_WINDOW, FixedMemory::new(RAM_SIZE)))?;
    memory.attach_unit(
        PPU_REGISTERS_START,
        MirroredMemory::new(
            IO_REGISTERS_START - PPU_REGISTERS_START,
            FixedMemory::new(PPU_REGISTER_COUNT),
        ),
    )?;
    memory.attach_unit(IO_REGISTERS_START, FixedMemory::new(IO_REGISTER_COUNT))?;
    memory.attach_unit(PRG_RAM_START, FixedMemory::new(PRG_RAM_SIZE))?;

    let prg_len = rom.prg_rom.len().min(PRG_ROM_WINDOW);
    let prg = FixedMemory::read_only(&rom.prg_rom[..prg_len]);
    memory.attach_unit(PRG_ROM_START, MirroredMemory::new(PRG_ROM_WINDOW, prg))?;

    Ok(memory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryExt, MemoryUnit};
    use crate::rom::{RomHeader, PRG_ROM_BANK_SIZE};

    fn test_rom(prg: Vec<u8>) -> Rom {
        let mut header = [0u8; 16];
        header[..4].copy_from_slice(b"NES\x1A");
        header[4] = (prg.len() / PRG_ROM_BANK_SIZE) as u8;
        Rom {
            header: RomHeader::parse(&header).unwrap(),
            prg_rom: prg,
            chr_rom: Vec::new(),
        }
    }

    #[test]
    fn test_map_covers_64k() {
        let memory = nes_memory_map(&test_rom(vec![0; PRG_ROM_BANK_SIZE])).unwrap();
        assert_eq!(memory.len(), 0x10000);
        assert_eq!(
            memory.regions(),
            vec![
                (0x0000, 0x2000),
                (0x2000, 0x2000),
                (0x4000, 0x20),
                (0x6000, 0x2000),
                (0x8000, 0x8000),
            ]
        );
    }

    #[test]
    fn test_ram_is_mirrored() {
        let mut memory = nes_memory_map(&test_rom(vec![0; PRG_ROM_BANK_SIZE])).unwrap();
        memory.write_u8(0x0001, 0x42).unwrap();
        assert_eq!(memory.read_u8(0x0801).unwrap(), 0x42);
        assert_eq!(memory.read_u8(0x1801).unwrap(), 0x42);
    }

    #[test]
    fn test_16k_prg_is_mirrored_and_read_only() {
        let mut prg = vec![0; PRG_ROM_BANK_SIZE];
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0xC0;
        let mut memory = nes_memory_map(&test_rom(prg)).unwrap();

        assert_eq!(memory.read_u16_le(0xBFFC).unwrap(), 0xC000);
        assert_eq!(memory.read_u16_le(0xFFFC).unwrap(), 0xC000);
        assert!(matches!(
            memory.write_u8(0x8000, 1),
            Err(NesError::WriteNotPermitted)
        ));
    }

    #[test]
    fn test_gap_reads_zero_and_rejects_writes() {
        let mut memory = nes_memory_map(&test_rom(vec![0; PRG_ROM_BANK_SIZE])).unwrap();
        assert_eq!(memory.read_u8(0x5000).unwrap(), 0);
        assert!(matches!(
            memory.write_u8(0x5000, 1),
            Err(NesError::UnmappedWrite(0x5000))
        ));
    }

    #[test]
    fn test_register_windows_latch() {
        let mut memory = nes_memory_map(&test_rom(vec![0; PRG_ROM_BANK_SIZE])).unwrap();
        memory.write_u8(0x2000, 0x80).unwrap();
        assert_eq!(memory.read_u8(0x3FF8).unwrap(), 0x80);
        memory.write_u8(0x4014, 0x02).unwrap();
        assert_eq!(memory.read_u8(0x4014).unwrap(), 0x02);
    }

    #[test]
    fn test_empty_prg_rejected() {
        assert!(matches!(
            nes_memory_map(&test_rom(Vec::new())),
            Err(NesError::InvalidRom(_))
        ));
    }
}
