//! # NES CLI
//!
//! ROMの情報表示と、CPUのステップ実行トレース。
//!
//! ```text
//! nest rom dump game.nes
//! RUST_LOG=debug nest run game.nes --steps 100 --pc C000
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nest_core::cpu::{Instruction, State};
use nest_core::rom::Rom;
use nest_core::{debug, Nes};
use serde::Serialize;

/// NES CPU エミュレータ CLI
#[derive(Parser, Debug)]
#[command(name = "nest")]
#[command(about = "NES (MOS 6502) instruction-execution core", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// ROMファイルの操作
    Rom {
        #[command(subcommand)]
        command: RomCommand,
    },
    /// ROMをロードしてCPUをステップ実行する
    Run {
        /// ROMファイルのパス
        #[arg(value_name = "FILE")]
        rom_path: PathBuf,

        /// 実行する命令数
        #[arg(short, long, default_value = "100")]
        steps: usize,

        /// リセットベクタの代わりに使う開始アドレス (16進)
        #[arg(long, value_parser = parse_address)]
        pc: Option<u16>,

        /// 1命令ごとにJSONで出力
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum RomCommand {
    /// ヘッダ情報を表示
    Dump {
        /// ROMファイルのパス
        #[arg(value_name = "FILE")]
        rom_path: PathBuf,

        /// PRG ROM の先頭から表示するバイト数
        #[arg(long, default_value = "0")]
        hex: usize,
    },
}

/// `C000`, `$C000` and `0xC000` are all accepted.
fn parse_address(s: &str) -> std::result::Result<u16, String> {
    let digits = s
        .strip_prefix('$')
        .or_else(|| s.strip_prefix("0x"))
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid address '{}': {}", s, e))
}

#[derive(Serialize)]
struct TraceLine<'a> {
    step: usize,
    address: u16,
    disassembly: &'a str,
    instruction: &'a Instruction,
    state: &'a State,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Rom {
            command: RomCommand::Dump { rom_path, hex },
        } => dump(&rom_path, hex),
        Command::Run {
            rom_path,
            steps,
            pc,
            json,
        } => run(&rom_path, steps, pc, json),
    }
}

fn read_rom(path: &Path) -> Result<Rom> {
    let rom = Rom::from_file(path).with_context(|| format!("failed to load ROM {:?}", path))?;
    log::info!("Loaded ROM: {:?}", path);
    Ok(rom)
}

fn dump(path: &Path, hex: usize) -> Result<()> {
    let rom = read_rom(path)?;
    println!("{}", rom.header);
    if hex > 0 {
        println!();
        print!("{}", debug::hex_dump(&rom.prg_rom, 0x8000, hex));
    }
    Ok(())
}

fn run(path: &Path, steps: usize, pc: Option<u16>, json: bool) -> Result<()> {
    let rom = read_rom(path)?;
    let mut nes = Nes::new();
    nes.load(rom)?;

    if let Some(pc) = pc {
        let state = nes.cpu_state().with_pc(pc);
        nes.cpu_mut().set_state(state);
        log::info!("Starting at ${:04X}", pc);
    }

    log::info!("Starting emulation...");

    for step in 0..steps {
        let address = nes.cpu_state().pc();
        let disassembly = nes
            .disassemble_at_pc(1)
            .pop()
            .map(|(_, text)| text)
            .unwrap_or_default();

        let instruction = match nes.step_instruction() {
            Ok(instruction) => instruction,
            Err(e) => {
                log::error!("Emulation error at ${:04X}: {}", address, e);
                return Err(e).with_context(|| format!("execution stopped after {} steps", step));
            }
        };

        let state = nes.cpu_state();
        if json {
            let line = TraceLine {
                step,
                address,
                disassembly: &disassembly,
                instruction: &instruction,
                state: &state,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("{:04X}  {:<14} {}", address, disassembly, state);
        }
    }

    log::info!("Emulation stopped");
    Ok(())
}
