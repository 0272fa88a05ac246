//! printf/sprintf against guest memory
//!
//! `%s` arguments arrive as guest pointers. They are dereferenced into text
//! first, then the format is normalized for the host (`%llx` is plain `%x`
//! here, `%p` renders as `0x...`) and handed to [`format::substitute`].

use crate::error::FormatError;
use crate::format::{self, FormatArg};
use crate::memory::GuestMemory;
use crate::os::{OsUtils, StatsCollector};
use crate::strings::StringWidth;
use log::debug;
use std::io::Write;

impl<M: GuestMemory, S: StatsCollector, W> OsUtils<M, S, W> {
    /// Resolve `%s` pointers in `args` and render `format`.
    ///
    /// `args` is updated in place: every slot that backs a `%s` ends up as
    /// [`FormatArg::Str`].
    pub fn interpret(
        &mut self,
        format: &str,
        args: &mut [FormatArg],
        width: StringWidth,
    ) -> Result<String, FormatError> {
        let supplied = args.len();

        // Piece i follows the i-th '%'; its slot lines up with va_list's i-th read
        for (i, piece) in format.split('%').skip(1).enumerate() {
            if !piece.starts_with('s') {
                continue;
            }
            let slot = args.get_mut(i).ok_or(FormatError::Arity {
                expected: i + 1,
                supplied,
            })?;
            if let FormatArg::Int(address) = *slot {
                let text = self.read_str(address, width)?;
                debug!("%s slot {} at 0x{:08x} -> {:?}", i, address, text);
                *slot = FormatArg::Str(text);
            }
        }

        let host_format = format.replace("%llx", "%x").replace("%p", "%#x");
        debug!(
            "interpret {:?} [{}]",
            host_format,
            args.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        format::substitute(&host_format, args)
    }

    /// Format into guest memory at `buffer`, terminator included.
    /// Returns the number of characters written, terminator excluded.
    pub fn sprintf(
        &mut self,
        buffer: u64,
        format: &str,
        args: &mut [FormatArg],
        width: StringWidth,
    ) -> Result<usize, FormatError> {
        let out = self.interpret(format, args, width)?;
        let encoded = width.encode_terminated(&out);

        debug!(
            "sprintf 0x{:08x} <- {:?} ({} bytes)",
            buffer,
            out,
            encoded.len()
        );
        self.mem.write(buffer, &encoded)?;

        Ok(out.chars().count())
    }

    /// [`sprintf`](Self::sprintf) with arguments pulled from a guest `va_list`
    pub fn vsprintf(
        &mut self,
        buffer: u64,
        format: &str,
        va_ptr: u64,
        width: StringWidth,
    ) -> Result<usize, FormatError> {
        let mut args = self.va_list(format, va_ptr)?;
        self.sprintf(buffer, format, &mut args, width)
    }
}

impl<M: GuestMemory, S: StatsCollector, W: Write> OsUtils<M, S, W> {
    /// Format to the process's stdout. Output is always UTF-8; `width` only
    /// selects how `%s` arguments are read from the guest.
    pub fn printf(
        &mut self,
        format: &str,
        args: &mut [FormatArg],
        width: StringWidth,
    ) -> Result<usize, FormatError> {
        let out = self.interpret(format, args, width)?;

        debug!("printf -> {:?}", out);
        self.stdout.write_all(out.as_bytes())?;
        self.stdout.flush()?;

        Ok(out.chars().count())
    }

    /// [`printf`](Self::printf) with arguments pulled from a guest `va_list`
    pub fn vprintf(
        &mut self,
        format: &str,
        va_ptr: u64,
        width: StringWidth,
    ) -> Result<usize, FormatError> {
        let mut args = self.va_list(format, va_ptr)?;
        self.printf(format, &mut args, width)
    }
}
