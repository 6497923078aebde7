//! ステータスレジスタ (P)

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// 6502 status flags, bit 0 (Carry) through bit 7 (Negative).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Flags: u8 {
        const CARRY             = 0b0000_0001;
        const ZERO              = 0b0000_0010;
        const INTERRUPT_DISABLE = 0b0000_0100;
        const DECIMAL           = 0b0000_1000;
        const BREAK             = 0b0001_0000;
        const RESERVED          = 0b0010_0000;
        const OVERFLOW          = 0b0100_0000;
        const NEGATIVE          = 0b1000_0000;
    }
}

/// Letters printed by [`Flags::display_string`], lowest bit first.
const LETTERS: [(Flags, char); 8] = [
    (Flags::CARRY, 'C'),
    (Flags::ZERO, 'Z'),
    (Flags::INTERRUPT_DISABLE, 'I'),
    (Flags::DECIMAL, 'D'),
    (Flags::BREAK, 'B'),
    (Flags::RESERVED, 'R'),
    (Flags::OVERFLOW, 'V'),
    (Flags::NEGATIVE, 'N'),
];

impl Flags {
    /// 電源投入時の値 ($34)
    pub const POWER_UP: Flags = Flags::RESERVED
        .union(Flags::BREAK)
        .union(Flags::INTERRUPT_DISABLE);

    /// Returns a copy with `flag` set.
    #[must_use]
    pub const fn with(self, flag: Flags) -> Flags {
        self.union(flag)
    }

    /// Returns a copy with `flag` cleared.
    #[must_use]
    pub const fn without(self, flag: Flags) -> Flags {
        self.difference(flag)
    }

    /// Sets `flag` when `condition` holds, clears it otherwise.
    #[must_use]
    pub const fn set_if(self, condition: bool, flag: Flags) -> Flags {
        if condition {
            self.with(flag)
        } else {
            self.without(flag)
        }
    }

    pub const fn is_set(self, flag: Flags) -> bool {
        self.contains(flag)
    }

    /// Updates Zero and Negative from `value`.
    #[must_use]
    pub(crate) const fn with_zero_negative(self, value: u8) -> Flags {
        self.set_if(value == 0, Flags::ZERO)
            .set_if(value & 0x80 != 0, Flags::NEGATIVE)
    }

    /// One letter per bit in `CZIDBRVN` order, uppercase when set.
    pub fn display_string(self) -> String {
        LETTERS
            .iter()
            .map(|&(flag, letter)| {
                if self.is_set(flag) {
                    letter
                } else {
                    letter.to_ascii_lowercase()
                }
            })
            .collect()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}
