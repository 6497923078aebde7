//! # ROM
//!
//! iNES / NES 2.0 形式のROMイメージを読み込む。
//! ヘッダ (16バイト) → トレーナー (任意, 512バイト) → PRG ROM → CHR ROM の順。
//! 参考: https://www.nesdev.org/wiki/NES_2.0

use std::fmt;
use std::path::Path;

use bitflags::bitflags;

use crate::{NesError, Result};

pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_ROM_BANK_SIZE: usize = 16 * 1024;
pub const CHR_ROM_BANK_SIZE: usize = 8 * 1024;

const MAGIC: &[u8; 4] = b"NES\x1A";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RomVersion {
    INes,
    Nes20,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CpuTiming {
    Ntsc,
    Pal,
    MultiRegion,
    Dendy,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ConsoleType {
    Nes,
    VsSystem,
    Playchoice10,
    Extended,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

bitflags! {
    /// Low nibble of header byte 6.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct RomFlags: u8 {
        const VERTICAL_MIRRORING = 0b0000_0001;
        const BATTERY            = 0b0000_0010;
        const TRAINER            = 0b0000_0100;
        const FOUR_SCREEN        = 0b0000_1000;
    }
}

/// ROM bank count plus volatile / battery-backed RAM sizes, in bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MemorySizes {
    pub rom_banks: usize,
    pub ram: usize,
    pub nv_ram: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RomHeader {
    pub version: RomVersion,
    pub program: MemorySizes,
    pub character: MemorySizes,
    pub mapper: u16,
    pub submapper: u8,
    pub cpu_timing: CpuTiming,
    pub flags: RomFlags,
    pub console: ConsoleType,
    pub console_type_detail: u8,
    pub misc_rom_count: u8,
    pub default_expansion_device: u8,
}

/// `64 << n` bytes, or none at all when the shift count is 0.
fn ram_size(shift: u8) -> usize {
    if shift == 0 {
        0
    } else {
        64 << shift
    }
}

impl RomHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(NesError::InvalidRom(format!(
                "header must be at least {} bytes, got {}",
                HEADER_SIZE,
                data.len()
            )));
        }
        if &data[0..4] != MAGIC {
            return Err(NesError::InvalidRom("invalid magic number".to_string()));
        }

        // NES 2.0 はバイト7の bit 3 が立ち bit 2 が落ちている
        let version = if data[7] & 0x0C == 0x08 {
            RomVersion::Nes20
        } else {
            RomVersion::INes
        };

        let mut prg_banks = usize::from(data[4]);
        let mut chr_banks = usize::from(data[5]);
        if version == RomVersion::Nes20 {
            prg_banks |= usize::from(data[9] & 0x0F) << 8;
            chr_banks |= usize::from(data[9] & 0xF0) << 4;
        }

        let mapper =
            u16::from(data[6] >> 4) | u16::from(data[7] & 0xF0) | (u16::from(data[8] & 0x0F) << 8);

        let cpu_timing = match data[12] & 0x03 {
            0 => CpuTiming::Ntsc,
            1 => CpuTiming::Pal,
            2 => CpuTiming::MultiRegion,
            _ => CpuTiming::Dendy,
        };
        let console = match data[7] & 0x03 {
            0 => ConsoleType::Nes,
            1 => ConsoleType::VsSystem,
            2 => ConsoleType::Playchoice10,
            _ => ConsoleType::Extended,
        };

        Ok(Self {
            version,
            program: MemorySizes {
                rom_banks: prg_banks,
                ram: ram_size(data[10] & 0x0F),
                nv_ram: ram_size(data[10] >> 4),
            },
            character: MemorySizes {
                rom_banks: chr_banks,
                ram: ram_size(data[11] & 0x0F),
                nv_ram: ram_size(data[11] >> 4),
            },
            mapper,
            submapper: data[8] >> 4,
            cpu_timing,
            flags: RomFlags::from_bits_truncate(data[6]),
            console,
            console_type_detail: data[13],
            misc_rom_count: data[14] & 0x03,
            default_expansion_device: data[15] & 0x3F,
        })
    }

    pub fn mirroring(&self) -> Mirroring {
        if self.flags.contains(RomFlags::FOUR_SCREEN) {
            Mirroring::FourScreen
        } else if self.flags.contains(RomFlags::VERTICAL_MIRRORING) {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }

    pub fn prg_rom_size(&self) -> usize {
        self.program.rom_banks * PRG_ROM_BANK_SIZE
    }

    pub fn chr_rom_size(&self) -> usize {
        self.character.rom_banks * CHR_ROM_BANK_SIZE
    }
}

impl fmt::Display for RomHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Version:       {:?}", self.version)?;
        writeln!(f, "Mapper:        {} (submapper {})", self.mapper, self.submapper)?;
        writeln!(
            f,
            "PRG ROM:       {} x 16 KiB (RAM {} B, NVRAM {} B)",
            self.program.rom_banks, self.program.ram, self.program.nv_ram
        )?;
        writeln!(
            f,
            "CHR ROM:       {} x 8 KiB (RAM {} B, NVRAM {} B)",
            self.character.rom_banks, self.character.ram, self.character.nv_ram
        )?;
        writeln!(f, "Mirroring:     {:?}", self.mirroring())?;
        writeln!(f, "Battery:       {}", self.flags.contains(RomFlags::BATTERY))?;
        writeln!(f, "Trainer:       {}", self.flags.contains(RomFlags::TRAINER))?;
        writeln!(f, "CPU timing:    {:?}", self.cpu_timing)?;
        writeln!(f, "Console:       {:?}", self.console)?;
        if matches!(self.console, ConsoleType::VsSystem | ConsoleType::Extended) {
            writeln!(f, "  Detail:      {:#X}", self.console_type_detail)?;
        }
        writeln!(f, "Misc ROMs:     {}", self.misc_rom_count)?;
        write!(f, "Expansion:     {:#04X}", self.default_expansion_device)
    }
}

/// Parsed ROM image.
#[derive(Debug, Clone)]
pub struct Rom {
    pub header: RomHeader,
    pub prg_rom: Vec<u8>,
    pub chr_rom: Vec<u8>,
}

impl Rom {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = RomHeader::parse(data)?;

        let mut start = HEADER_SIZE;
        if header.flags.contains(RomFlags::TRAINER) {
            start += TRAINER_SIZE;
        }

        let prg_rom = slice(data, start, header.prg_rom_size(), "PRG ROM")?.to_vec();
        start += prg_rom.len();
        let chr_rom = slice(data, start, header.chr_rom_size(), "CHR ROM")?.to_vec();

        log::info!(
            "ROM loaded: mapper {}, PRG {} bytes, CHR {} bytes",
            header.mapper,
            prg_rom.len(),
            chr_rom.len()
        );

        Ok(Self {
            header,
            prg_rom,
            chr_rom,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }
}

fn slice<'a>(data: &'a [u8], start: usize, len: usize, what: &str) -> Result<&'a [u8]> {
    data.get(start..start + len).ok_or_else(|| {
        NesError::InvalidRom(format!(
            "{} truncated: need {} bytes at {:#x}, file is {} bytes",
            what,
            len,
            start,
            data.len()
        ))
    })
}
