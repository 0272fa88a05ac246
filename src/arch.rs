//! Architecture descriptor: how wide guest pointers are and how they're laid out

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchType {
    X86,
    X8664,
    Arm,
    Arm64,
    Mips,
    Riscv64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// The subset of an architecture that string marshalling cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arch {
    pub kind: ArchType,
    endian: Endian,
}

impl Arch {
    pub fn new(kind: ArchType) -> Self {
        Arch {
            kind,
            endian: Endian::Little,
        }
    }

    pub fn with_endian(kind: ArchType, endian: Endian) -> Self {
        Arch { kind, endian }
    }

    /// Native address width in bits
    pub fn bits(&self) -> u32 {
        match self.kind {
            ArchType::X86 | ArchType::Arm | ArchType::Mips => 32,
            ArchType::X8664 | ArchType::Arm64 | ArchType::Riscv64 => 64,
        }
    }

    /// Size of a guest pointer in bytes
    pub fn pointer_size(&self) -> usize {
        (self.bits() / 8) as usize
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Assemble a pointer-sized integer from raw guest bytes.
    /// Only the first `pointer_size()` bytes are used.
    pub fn unpack_ptr(&self, bytes: &[u8]) -> u64 {
        let size = self.pointer_size().min(bytes.len());
        let raw = &bytes[..size];
        let fold = |acc: u64, b: &u8| (acc << 8) | *b as u64;

        match self.endian {
            Endian::Little => raw.iter().rev().fold(0, fold),
            Endian::Big => raw.iter().fold(0, fold),
        }
    }

    /// Inverse of [`unpack_ptr`](Self::unpack_ptr); truncates to pointer width
    pub fn pack_ptr(&self, value: u64) -> Vec<u8> {
        let size = self.pointer_size();
        match self.endian {
            Endian::Little => value.to_le_bytes()[..size].to_vec(),
            Endian::Big => value.to_be_bytes()[8 - size..].to_vec(),
        }
    }
}

impl Default for Arch {
    fn default() -> Self {
        Arch::new(ArchType::X8664)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind {
            ArchType::X86 => "x86",
            ArchType::X8664 => "x8664",
            ArchType::Arm => "arm",
            ArchType::Arm64 => "arm64",
            ArchType::Mips => "mips",
            ArchType::Riscv64 => "riscv64",
        };
        let endian = match self.endian {
            Endian::Little => "el",
            Endian::Big => "eb",
        };
        write!(f, "{}/{}", name, endian)
    }
}

impl FromStr for ArchType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86" | "i386" => Ok(ArchType::X86),
            "x8664" | "x86_64" | "amd64" => Ok(ArchType::X8664),
            "arm" => Ok(ArchType::Arm),
            "arm64" | "aarch64" => Ok(ArchType::Arm64),
            "mips" => Ok(ArchType::Mips),
            "riscv64" => Ok(ArchType::Riscv64),
            _ => Err(ConfigError::UnknownArch(s.to_string())),
        }
    }
}

impl FromStr for Endian {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "little" | "el" => Ok(Endian::Little),
            "big" | "eb" => Ok(Endian::Big),
            _ => Err(ConfigError::UnknownEndian(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_pointer_sizes() {
        assert_eq!(Arch::new(ArchType::X86).pointer_size(), 4);
        assert_eq!(Arch::new(ArchType::Mips).bits(), 32);
        assert_eq!(Arch::new(ArchType::X8664).pointer_size(), 8);
        assert_eq!(Arch::new(ArchType::Arm64).bits(), 64);
    }

    #[test]
    fn test_unpack_respects_endianness() {
        let bytes = [0x78, 0x56, 0x34, 0x12, 0xff, 0xff, 0xff, 0xff];

        let le = Arch::new(ArchType::X86);
        assert_eq!(le.unpack_ptr(&bytes), 0x12345678);

        let be = Arch::with_endian(ArchType::Mips, Endian::Big);
        assert_eq!(be.unpack_ptr(&bytes), 0x78563412);

        let wide = Arch::new(ArchType::X8664);
        assert_eq!(wide.unpack_ptr(&bytes), 0xffffffff12345678);
    }

    #[test]
    fn test_pack_truncates_to_pointer_width() {
        let arch = Arch::new(ArchType::Arm);
        assert_eq!(arch.pack_ptr(0x1_0000_2000), vec![0x00, 0x20, 0x00, 0x00]);

        let be = Arch::with_endian(ArchType::Arm, Endian::Big);
        assert_eq!(be.pack_ptr(0x2000), vec![0x00, 0x00, 0x20, 0x00]);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("amd64".parse::<ArchType>().unwrap(), ArchType::X8664);
        assert_eq!("AArch64".parse::<ArchType>().unwrap(), ArchType::Arm64);
        assert!("z80".parse::<ArchType>().is_err());
        assert_eq!("big".parse::<Endian>().unwrap(), Endian::Big);
    }
}
