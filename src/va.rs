//! Variadic argument marshalling from a guest `va_list`

use crate::error::MemoryError;
use crate::format::FormatArg;
use crate::memory::GuestMemory;
use crate::os::OsUtils;
use log::debug;

impl<M: GuestMemory, S, W> OsUtils<M, S, W> {
    /// Read one pointer-sized slot per `%` in `format`, starting at `pointer`.
    ///
    /// The count is naive: `%%` counts as two slots, so a format containing a
    /// literal percent over-reads and later fails substitution with
    /// [`FormatError::Arity`](crate::error::FormatError::Arity).
    pub fn va_list(&self, format: &str, pointer: u64) -> Result<Vec<FormatArg>, MemoryError> {
        let count = format.matches('%').count();
        let stride = self.arch.pointer_size() as u64;

        debug!(
            "va_list: {} slots of {} bytes at 0x{:08x}",
            count, stride, pointer
        );

        (0..count as u64)
            .map(|i| {
                self.mem
                    .read_ptr(pointer + i * stride, &self.arch)
                    .map(FormatArg::Int)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::arch::{Arch, ArchType};
    use crate::format::FormatArg;
    use crate::memory::GuestMemory;
    use crate::test_utils::{utils_for_arch, SCRATCH_BASE};
    use test_log::test;

    #[test]
    fn test_reads_one_slot_per_conversion() {
        let mut utils = utils_for_arch(Arch::new(ArchType::X8664));
        for (i, v) in [0x1111u64, 0x2222, 0x3333].iter().enumerate() {
            let arch = utils.arch;
            utils
                .mem
                .write_ptr(SCRATCH_BASE + i as u64 * 8, *v, &arch)
                .unwrap();
        }

        let args = utils.va_list("%d and %x", SCRATCH_BASE).unwrap();
        assert_eq!(args, vec![FormatArg::Int(0x1111), FormatArg::Int(0x2222)]);

        let args = utils.va_list("%s%s%s", SCRATCH_BASE).unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args[2], FormatArg::Int(0x3333));
    }

    #[test]
    fn test_stride_follows_pointer_width() {
        let mut utils = utils_for_arch(Arch::new(ArchType::X86));
        utils
            .mem
            .write(SCRATCH_BASE, &[1, 0, 0, 0, 2, 0, 0, 0])
            .unwrap();

        let args = utils.va_list("%d %d", SCRATCH_BASE).unwrap();
        assert_eq!(args, vec![FormatArg::Int(1), FormatArg::Int(2)]);
    }

    #[test]
    fn test_literal_percent_is_counted() {
        let utils = utils_for_arch(Arch::new(ArchType::X86));
        assert_eq!(utils.va_list("100%% %d", SCRATCH_BASE).unwrap().len(), 3);
        assert!(utils.va_list("no conversions", SCRATCH_BASE).unwrap().is_empty());
    }

    #[test]
    fn test_unmapped_va_list() {
        let utils = utils_for_arch(Arch::new(ArchType::X86));
        assert!(utils.va_list("%d", 0xdead_0000).is_err());
    }
}
