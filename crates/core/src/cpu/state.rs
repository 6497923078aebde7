//! # CPU State
//!
//! レジスタのスナップショット。`Copy` な値で、命令の実行は古い状態から
//! 新しい状態を作る。

use std::fmt;

use super::Flags;
use crate::{NesError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    a: u8,
    x: u8,
    y: u8,
    pc: u16,
    s: u8,
    p: Flags,
    clock: u64,
}

impl State {
    /// 電源投入直後の状態
    pub const POWER_UP: State = State::new(0, 0, 0, 0, 0xFD, Flags::POWER_UP);

    pub const fn new(a: u8, x: u8, y: u8, pc: u16, s: u8, p: Flags) -> Self {
        Self {
            a,
            x,
            y,
            pc,
            s,
            p,
            clock: 0,
        }
    }

    /// Builds a state from wide integers, rejecting values that do not fit
    /// their register.
    pub fn try_new(a: i64, x: i64, y: i64, pc: i64, s: i64, p: i64) -> Result<Self> {
        fn narrow<T: TryFrom<i64>>(register: &'static str, value: i64) -> Result<T> {
            T::try_from(value).map_err(|_| NesError::RegisterOutOfRange { register, value })
        }

        Ok(Self::new(
            narrow("A", a)?,
            narrow("X", x)?,
            narrow("Y", y)?,
            narrow("PC", pc)?,
            narrow("S", s)?,
            Flags::from_bits_retain(narrow("P", p)?),
        ))
    }

    pub const fn a(&self) -> u8 {
        self.a
    }

    pub const fn x(&self) -> u8 {
        self.x
    }

    pub const fn y(&self) -> u8 {
        self.y
    }

    pub const fn pc(&self) -> u16 {
        self.pc
    }

    pub const fn s(&self) -> u8 {
        self.s
    }

    pub const fn p(&self) -> Flags {
        self.p
    }

    /// Total cycles consumed since power-up.
    pub const fn clock(&self) -> u64 {
        self.clock
    }

    #[must_use]
    pub const fn with_a(self, a: u8) -> Self {
        Self { a, ..self }
    }

    #[must_use]
    pub const fn with_x(self, x: u8) -> Self {
        Self { x, ..self }
    }

    #[must_use]
    pub const fn with_y(self, y: u8) -> Self {
        Self { y, ..self }
    }

    #[must_use]
    pub const fn with_pc(self, pc: u16) -> Self {
        Self { pc, ..self }
    }

    #[must_use]
    pub const fn with_s(self, s: u8) -> Self {
        Self { s, ..self }
    }

    #[must_use]
    pub const fn with_p(self, p: Flags) -> Self {
        Self { p, ..self }
    }

    #[must_use]
    pub const fn with_clock(self, clock: u64) -> Self {
        Self { clock, ..self }
    }

    /// Advances the clock by `cycles`.
    #[must_use]
    pub(crate) const fn tick(self, cycles: u64) -> Self {
        self.with_clock(self.clock.wrapping_add(cycles))
    }
}

impl Default for State {
    fn default() -> Self {
        Self::POWER_UP
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[A:${:02X} X:${:02X} Y:${:02X} PC:${:04X} S:${:02X} P:${:02X} ({})] @{}",
            self.a,
            self.x,
            self.y,
            self.pc,
            self.s,
            self.p.bits(),
            self.p,
            self.clock
        )
    }
}
