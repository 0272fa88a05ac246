//! GUID structures as Windows lays them out in memory

use crate::error::MemoryError;
use crate::memory::GuestMemory;
use crate::os::OsUtils;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// First three fields little-endian, last eight bytes as-is
    pub fn from_bytes_le(raw: &[u8; 16]) -> Self {
        let data4 = [
            raw[8], raw[9], raw[10], raw[11], raw[12], raw[13], raw[14], raw[15],
        ];
        Guid {
            data1: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            data2: u16::from_le_bytes([raw[4], raw[5]]),
            data3: u16::from_le_bytes([raw[6], raw[7]]),
            data4,
        }
    }

    pub fn to_bytes_le(&self) -> [u8; 16] {
        let mut raw = [0u8; 16];
        raw[..4].copy_from_slice(&self.data1.to_le_bytes());
        raw[4..6].copy_from_slice(&self.data2.to_le_bytes());
        raw[6..8].copy_from_slice(&self.data3.to_le_bytes());
        raw[8..].copy_from_slice(&self.data4);
        raw
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-",
            self.data1, self.data2, self.data3, self.data4[0], self.data4[1]
        )?;
        for b in &self.data4[2..] {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl<M: GuestMemory, S, W> OsUtils<M, S, W> {
    pub fn read_guid(&self, address: u64) -> Result<Guid, MemoryError> {
        let raw = self.mem.read(address, 16)?;
        let bytes: [u8; 16] = raw
            .as_slice()
            .try_into()
            .map_err(|_| MemoryError::Unmapped {
                address: address + raw.len() as u64,
                length: 16,
            })?;
        Ok(Guid::from_bytes_le(&bytes))
    }
}
