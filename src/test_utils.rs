// Test utilities for building an OsUtils over a small mapped address space
use crate::arch::{Arch, ArchType};
use crate::memory::{GuestMemory, MappedMemory};
use crate::os::{OsUtils, StringStats};
use crate::strings::StringWidth;

/// Where `utils_with_data` places its bytes
pub const DATA_BASE: u64 = 0x1000;
/// Always-mapped, zeroed area for output buffers and va_lists
pub const SCRATCH_BASE: u64 = 0x8000;
pub const SCRATCH_SIZE: usize = 0x1000;

pub type TestUtils = OsUtils<MappedMemory, StringStats, Vec<u8>>;

pub fn utils_for_arch(arch: Arch) -> TestUtils {
    let mut mem = MappedMemory::new();
    mem.map(SCRATCH_BASE, SCRATCH_SIZE, "scratch").unwrap();
    OsUtils::new(mem, arch, StringStats::new(), Vec::new())
}

/// x86-64 utils with `bytes` mapped at DATA_BASE, and nothing after them
pub fn utils_with_data(bytes: &[u8]) -> TestUtils {
    let mut utils = utils_for_arch(Arch::new(ArchType::X8664));
    utils.mem.map_with(DATA_BASE, bytes, "data").unwrap();
    utils
}

/// Lay out terminated strings back to back from DATA_BASE and return their addresses
pub fn place_strings(utils: &mut TestUtils, strings: &[&str], width: StringWidth) -> Vec<u64> {
    let mut addrs = Vec::new();
    let mut blob = Vec::new();
    for s in strings {
        addrs.push(DATA_BASE + blob.len() as u64);
        blob.extend(width.encode_terminated(s));
    }
    utils.mem.map_with(DATA_BASE, &blob, "strings").unwrap();
    addrs
}

/// Write pointer-sized `values` at `address` the way a guest va_list holds them
pub fn write_va_list(utils: &mut TestUtils, address: u64, values: &[u64]) {
    let arch = utils.arch;
    for (i, v) in values.iter().enumerate() {
        utils
            .mem
            .write_ptr(address + (i * arch.pointer_size()) as u64, *v, &arch)
            .unwrap();
    }
}
