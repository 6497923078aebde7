//! # NES Core
//!
//! NES (MOS 6502) の命令実行コア。
//!
//! - [`memory`]: メモリバス (固定・ミラー・仮想)
//! - [`cpu`]: デコーダ・実行エンジン・[`cpu::Cpu`]
//! - [`rom`]: iNES / NES 2.0 パーサ
//! - [`system`]: NES のメモリマップ
//! - [`debug`]: ダンプと逆アセンブル

pub mod cpu;
pub mod debug;
pub mod error;
pub mod memory;
pub mod rom;
pub mod system;

pub use error::{NesError, Result};

use cpu::{Cpu, Instruction, State};
use memory::{MemoryUnit, VirtualMemory};
use rom::{Rom, RomHeader};

/// NESエミュレータのメインインスタンス
pub struct Nes {
    cpu: Cpu<VirtualMemory>,
    header: Option<RomHeader>,
}

impl Nes {
    /// ROM未ロードのインスタンスを作成
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(VirtualMemory::new()),
            header: None,
        }
    }

    /// ROMイメージをパースしてロードし、リセットする
    pub fn load_rom(&mut self, rom_data: &[u8]) -> Result<()> {
        self.load(Rom::parse(rom_data)?)
    }

    /// パース済みのROMをロードし、リセットする
    pub fn load(&mut self, rom: Rom) -> Result<()> {
        let memory = system::nes_memory_map(&rom)?;
        self.cpu = Cpu::new(memory);
        self.header = Some(rom.header);
        self.reset()
    }

    /// リセットベクタからPCを読み直す
    pub fn reset(&mut self) -> Result<()> {
        self.cpu.reset()
    }

    /// 1命令実行し、消費したサイクル数を返す
    pub fn step(&mut self) -> Result<u32> {
        let start_cycles = self.cpu.state().clock();
        self.cpu.step()?;
        Ok((self.cpu.state().clock() - start_cycles) as u32)
    }

    /// 1命令実行し、実行した命令を返す
    pub fn step_instruction(&mut self) -> Result<Instruction> {
        self.cpu.step()
    }

    /// CPU状態の取得（デバッグ用）
    pub fn cpu_state(&self) -> State {
        self.cpu.state()
    }

    pub fn cpu(&self) -> &Cpu<VirtualMemory> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu<VirtualMemory> {
        &mut self.cpu
    }

    pub fn header(&self) -> Option<&RomHeader> {
        self.header.as_ref()
    }

    // ========== メモリエディタ API ==========

    /// メモリ範囲を読み取り。未マップ領域は0
    pub fn read_memory_range(&mut self, start: u16, length: usize) -> Result<Vec<u8>> {
        let memory = self.cpu.memory_mut();
        let end = usize::from(start).saturating_add(length).min(memory.len());
        let mut buffer = vec![0; end.saturating_sub(usize::from(start))];
        memory.read(usize::from(start), &mut buffer)?;
        Ok(buffer)
    }

    /// メモリダンプを16進数文字列で取得
    pub fn hex_dump(&mut self, start: u16, length: usize) -> Result<String> {
        let memory = self.read_memory_range(start, length)?;
        Ok(debug::hex_dump(&memory, start, memory.len()))
    }

    /// 逆アセンブル
    pub fn disassemble(&mut self, start: u16, count: usize) -> Vec<(u16, String)> {
        debug::disassemble(self.cpu.memory_mut(), start, count)
    }

    /// 現在のPCから逆アセンブル
    pub fn disassemble_at_pc(&mut self, count: usize) -> Vec<(u16, String)> {
        let pc = self.cpu.pc();
        self.disassemble(pc, count)
    }
}

impl Default for Nes {
    fn default() -> Self {
        Self::new()
    }
}
