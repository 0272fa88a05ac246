//! Guest address space access
//!
//! Everything in this crate touches guest memory through [`GuestMemory`].
//! [`MappedMemory`] is a simple region-mapped implementation used by tests
//! and by hosts that don't bring their own memory manager.

use crate::arch::Arch;
use crate::error::MemoryError;
use log::trace;
use std::collections::BTreeMap;
use std::fmt;

/// Narrow view of the emulator's memory subsystem
pub trait GuestMemory {
    /// Read `length` bytes starting at `address`
    fn read(&self, address: u64, length: usize) -> Result<Vec<u8>, MemoryError>;

    /// Write `bytes` starting at `address`
    fn write(&mut self, address: u64, bytes: &[u8]) -> Result<(), MemoryError>;

    /// Read one pointer-sized value laid out per `arch`
    fn read_ptr(&self, address: u64, arch: &Arch) -> Result<u64, MemoryError> {
        let raw = self.read(address, arch.pointer_size())?;
        Ok(arch.unpack_ptr(&raw))
    }

    /// Write one pointer-sized value laid out per `arch`
    fn write_ptr(&mut self, address: u64, value: u64, arch: &Arch) -> Result<(), MemoryError> {
        self.write(address, &arch.pack_ptr(value))
    }
}

struct Region {
    data: Vec<u8>,
    label: String,
}

impl Region {
    fn end(&self, base: u64) -> u64 {
        base + self.data.len() as u64
    }
}

/// Sparse guest address space made of non-overlapping, zero-filled regions
#[derive(Default)]
pub struct MappedMemory {
    regions: BTreeMap<u64, Region>,
}

impl MappedMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a zero-filled region of `size` bytes at `base`
    pub fn map(&mut self, base: u64, size: usize, label: &str) -> Result<(), MemoryError> {
        if size == 0 {
            return Err(MemoryError::EmptyMapping { base });
        }
        let end = base
            .checked_add(size as u64)
            .ok_or(MemoryError::Overlap { base, size })?;

        // The closest region starting below `end` is the only one that can collide
        if let Some((other_base, other)) = self.regions.range(..end).next_back() {
            if other.end(*other_base) > base {
                return Err(MemoryError::Overlap { base, size });
            }
        }

        trace!("map 0x{:08x}-0x{:08x} [{}]", base, end, label);
        self.regions.insert(
            base,
            Region {
                data: vec![0u8; size],
                label: label.to_string(),
            },
        );
        Ok(())
    }

    /// Map a region and fill it with `bytes`
    pub fn map_with(&mut self, base: u64, bytes: &[u8], label: &str) -> Result<(), MemoryError> {
        self.map(base, bytes.len(), label)?;
        self.write(base, bytes)
    }

    /// True when every byte of `[address, address + length)` is mapped
    pub fn is_mapped(&self, address: u64, length: usize) -> bool {
        self.first_unmapped(address, length).is_none()
    }

    /// (base, end, label) for every region, in address order
    pub fn regions(&self) -> Vec<(u64, u64, &str)> {
        self.regions
            .iter()
            .map(|(&base, region)| (base, region.end(base), region.label.as_str()))
            .collect()
    }

    fn containing(&self, address: u64) -> Option<(u64, &Region)> {
        self.regions
            .range(..=address)
            .next_back()
            .filter(|(base, region)| address < region.end(**base))
            .map(|(base, region)| (*base, region))
    }

    fn first_unmapped(&self, address: u64, length: usize) -> Option<u64> {
        let end = match address.checked_add(length as u64) {
            Some(end) => end,
            None => return Some(address),
        };
        let mut cursor = address;
        while cursor < end {
            match self.containing(cursor) {
                Some((base, region)) => cursor = region.end(base),
                None => return Some(cursor),
            }
        }
        None
    }

    fn check(&self, address: u64, length: usize) -> Result<(), MemoryError> {
        match self.first_unmapped(address, length) {
            Some(bad) => Err(MemoryError::Unmapped {
                address: bad,
                length,
            }),
            None => Ok(()),
        }
    }
}

impl GuestMemory for MappedMemory {
    fn read(&self, address: u64, length: usize) -> Result<Vec<u8>, MemoryError> {
        self.check(address, length)?;

        let mut out = Vec::with_capacity(length);
        let mut cursor = address;
        while out.len() < length {
            // check() guarantees every byte is covered
            let (base, region) = self.containing(cursor).ok_or(MemoryError::Unmapped {
                address: cursor,
                length,
            })?;
            let offset = (cursor - base) as usize;
            let take = (region.data.len() - offset).min(length - out.len());
            out.extend_from_slice(&region.data[offset..offset + take]);
            cursor += take as u64;
        }
        Ok(out)
    }

    fn write(&mut self, address: u64, bytes: &[u8]) -> Result<(), MemoryError> {
        self.check(address, bytes.len())?;

        let mut written = 0;
        while written < bytes.len() {
            let cursor = address + written as u64;
            let (&base, region) = self
                .regions
                .range_mut(..=cursor)
                .next_back()
                .ok_or(MemoryError::Unmapped {
                    address: cursor,
                    length: bytes.len(),
                })?;
            let offset = (cursor - base) as usize;
            let take = (region.data.len() - offset).min(bytes.len() - written);
            region.data[offset..offset + take].copy_from_slice(&bytes[written..written + take]);
            written += take;
        }
        Ok(())
    }
}

impl fmt::Display for MappedMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    base        end         size")?;
        for (base, end, label) in self.regions() {
            writeln!(
                f,
                "    {:#010x}  {:#010x}  {:#08x}   {}",
                base,
                end,
                end - base,
                label
            )?;
        }
        Ok(())
    }
}
