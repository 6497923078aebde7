//! Fixed-width integer accessors on top of [`MemoryUnit`].

use super::MemoryUnit;
use crate::Result;

macro_rules! byte_order_accessors {
    ($($read:ident / $write:ident: $ty:ty => $from:ident, $to:ident;)*) => {
        $(
            fn $read(&mut self, offset: usize) -> Result<$ty> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                self.read(offset, &mut buf)?;
                Ok(<$ty>::$from(buf))
            }

            fn $write(&mut self, offset: usize, value: $ty) -> Result<()> {
                self.write(offset, &value.$to())
            }
        )*
    };
}

/// Byte and multi-byte reads/writes through a stack buffer.
///
/// The 6502 is little-endian, so the CPU only uses the `_le` forms; the
/// big-endian ones exist for file formats.
pub trait MemoryExt: MemoryUnit {
    fn read_u8(&mut self, offset: usize) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read(offset, &mut buf)?;
        Ok(buf[0])
    }

    fn write_u8(&mut self, offset: usize, value: u8) -> Result<()> {
        self.write(offset, &[value])
    }

    byte_order_accessors! {
        read_u16_le / write_u16_le: u16 => from_le_bytes, to_le_bytes;
        read_u16_be / write_u16_be: u16 => from_be_bytes, to_be_bytes;
        read_i16_le / write_i16_le: i16 => from_le_bytes, to_le_bytes;
        read_i16_be / write_i16_be: i16 => from_be_bytes, to_be_bytes;
        read_u32_le / write_u32_le: u32 => from_le_bytes, to_le_bytes;
        read_u32_be / write_u32_be: u32 => from_be_bytes, to_be_bytes;
        read_i32_le / write_i32_le: i32 => from_le_bytes, to_le_bytes;
        read_i32_be / write_i32_be: i32 => from_be_bytes, to_be_bytes;
        read_u64_le / write_u64_le: u64 => from_le_bytes, to_le_bytes;
        read_u64_be / write_u64_be: u64 => from_be_bytes, to_be_bytes;
        read_i64_le / write_i64_le: i64 => from_le_bytes, to_le_bytes;
        read_i64_be / write_i64_be: i64 => from_be_bytes, to_be_bytes;
    }
}

impl<M: MemoryUnit + ?Sized> MemoryExt for M {}
